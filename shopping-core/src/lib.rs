//! Shopping List Core
//!
//! Layered architecture:
//! - domain: Shopping item entity and its rules
//! - repository: Document-store access (memory, Firestore REST)
//! - state: List state holder (actor + published state)
//! - commands: Intent handlers for the UI surface

use std::sync::Arc;

pub mod config;
pub mod domain;
pub mod repository;
pub mod state;
pub mod commands;

use config::{AppConfig, BackendConfig};
use domain::DomainResult;
use repository::{DocumentStore, FirestoreStore, MemoryStore, ShoppingListRepository, StoreResult};
use state::ShoppingList;

const APP_NAME: &str = "ShoppingList";

/// Running app: configuration plus the live list
#[derive(Clone)]
pub struct ShoppingApp {
    pub config: AppConfig,
    pub list: ShoppingList,
}

impl ShoppingApp {
    /// Connect the configured backend and start syncing.
    /// Must be called from within a tokio runtime.
    pub fn start(config: AppConfig) -> DomainResult<Self> {
        let store = build_store(&config.backend)?;
        Ok(Self::with_store(config, store))
    }

    /// Start against an already-built store
    pub fn with_store(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        log::info!(
            "Starting shopping list on collection {}",
            config.collection
        );
        let repo = ShoppingListRepository::new(store, config.collection.clone());
        let list = ShoppingList::start(Arc::new(repo));
        Self { config, list }
    }

    /// Drag threshold for `commands::swipe_item`
    pub fn swipe_threshold(&self) -> f32 {
        self.config.swipe_threshold
    }
}

/// Build the document store selected in config
pub fn build_store(backend: &BackendConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    match backend {
        BackendConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        BackendConfig::Firestore(fs) => {
            log::info!("Using Firestore project {}", fs.project_id);
            Ok(Arc::new(FirestoreStore::new(fs)?))
        }
    }
}

/// Start file logging when a log dir is configured
pub fn init_logging(config: &AppConfig) -> Result<(), String> {
    match &config.log_dir {
        Some(dir) => {
            rolling_logger::init_logger(dir, APP_NAME)?;
            rolling_logger::info(&format!("Logging initialized in {}", dir.display()))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemDraft;
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_with_memory_backend() {
        let app = ShoppingApp::start(AppConfig::default()).unwrap();
        assert_eq!(app.swipe_threshold(), domain::DEFAULT_SWIPE_THRESHOLD);

        app.list.add_item(ItemDraft::new("Milk", "2").unwrap()).unwrap();
        let state = tokio::time::timeout(
            Duration::from_secs(2),
            app.list.wait_for(|s| s.items.len() == 1),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(state.items[0].quantity, 2);
        assert!(state.items[0].id.is_some());
    }

    #[test]
    fn test_logging_is_optional() {
        assert!(init_logging(&AppConfig::default()).is_ok());
    }

    // The only test in this crate that installs the global logger
    #[test]
    fn test_logging_writes_to_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            log_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        };

        init_logging(&config).unwrap();
        assert!(rolling_logger::is_initialized());
        assert!(rolling_logger::recent_lines()
            .iter()
            .any(|l| l.contains("Logging initialized")));
        assert!(dir.path().join(format!("{}.log", APP_NAME)).exists());

        assert!(init_logging(&config).is_err());
    }
}
