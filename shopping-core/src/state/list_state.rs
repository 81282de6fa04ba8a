//! Published List State
//!
//! What the UI renders: the item sequence, the loading flag and the most
//! recent sync failure.

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, ShoppingItem};

/// Which sync step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Fetch,
    Add,
    Remove,
    Save,
    Recolor,
}

/// A failed store call the UI may choose to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncError {
    pub operation: SyncOperation,
    pub error: DomainError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListState {
    /// Delivery order, never re-sorted locally
    pub items: Vec<ShoppingItem>,
    /// True until the first snapshot arrives
    pub loading: bool,
    pub last_error: Option<SyncError>,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            last_error: None,
        }
    }
}

impl ListState {
    pub fn find(&self, id: &str) -> Option<&ShoppingItem> {
        self.items.iter().find(|i| i.id.as_deref() == Some(id))
    }

    pub(crate) fn position_of(&self, item: &ShoppingItem) -> Option<usize> {
        self.items.iter().position(|i| i.same_entry(item))
    }

    pub(crate) fn position_of_id(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id.as_deref() == Some(id))
    }

    /// Replace everything with a fresh snapshot
    pub(crate) fn apply_snapshot(&mut self, items: Vec<ShoppingItem>) {
        self.items = items;
        self.loading = false;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_loading_and_empty() {
        let state = ListState::default();
        assert!(state.loading);
        assert!(state.is_empty());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_empty_snapshot_clears_loading() {
        let mut state = ListState::default();
        state.apply_snapshot(Vec::new());
        assert!(!state.loading);
        assert!(state.is_empty());
    }

    #[test]
    fn test_lookup_by_id() {
        let mut state = ListState::default();
        state.apply_snapshot(vec![
            ShoppingItem::new("Milk", 1).with_id("A1"),
            ShoppingItem::new("Eggs", 6).with_id("B2"),
        ]);
        assert_eq!(state.find("B2").map(|i| i.name.as_str()), Some("Eggs"));
        assert_eq!(state.position_of_id("B2"), Some(1));
        assert_eq!(state.position_of(&ShoppingItem::new("x", 9).with_id("A1")), Some(0));
        assert!(state.find("C3").is_none());
    }
}
