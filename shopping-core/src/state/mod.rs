//! List State Holder
//!
//! Single source of truth for the UI-visible shopping list. A `ShoppingList`
//! handle forwards intents to the list actor and exposes the published
//! state; clones share the same actor.

mod list_actor;
mod list_state;


use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::domain::{DomainError, DomainResult, ItemDraft, ShoppingItem, SwipeColor};
use crate::repository::{RecolorRepository, Subscription};
use list_actor::{ListActor, Message};

pub use list_state::{ListState, SyncError, SyncOperation};

#[derive(Clone)]
pub struct ShoppingList {
    tx: mpsc::UnboundedSender<Message>,
    state: watch::Receiver<ListState>,
    /// Ends with the last handle, which lets the actor wind down
    _subscription: Arc<Subscription>,
}

impl ShoppingList {
    /// Spawn the actor and subscribe to the collection.
    /// `loading` stays true until the first snapshot lands.
    pub fn start(repo: Arc<dyn RecolorRepository>) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        let (publisher, state) = watch::channel(ListState::default());

        let actor = ListActor::new(repo.clone(), publisher, inbox, tx.downgrade());
        tokio::spawn(actor.run());

        let snapshots = tx.clone();
        let subscription = repo.observe(Box::new(move |items| {
            let _ = snapshots.send(Message::Snapshot(items));
        }));

        Self {
            tx,
            state,
            _subscription: Arc::new(subscription),
        }
    }

    fn post(&self, msg: Message) -> DomainResult<()> {
        self.tx
            .send(msg)
            .map_err(|_| DomainError::Internal("shopping list actor stopped".to_string()))
    }

    /// Persist a new item, then refresh to learn its id
    pub fn add_item(&self, draft: ItemDraft) -> DomainResult<()> {
        self.post(Message::Add(draft))
    }

    /// Delete remotely; the local copy goes once the store confirms
    pub fn remove_item(&self, item: ShoppingItem) -> DomainResult<()> {
        self.post(Message::Remove(item))
    }

    /// Flip selection locally right away, persist, roll back on failure
    pub fn toggle_selection(&self, item: ShoppingItem) -> DomainResult<()> {
        self.post(Message::ToggleSelection(item))
    }

    /// Persist a new swipe color; the local copy changes once confirmed
    pub fn update_swipe_color(&self, item: ShoppingItem, color: SwipeColor) -> DomainResult<()> {
        self.post(Message::Recolor(item, color))
    }

    /// One-shot fetch replacing the local sequence
    pub fn refresh(&self) -> DomainResult<()> {
        self.post(Message::Refresh)
    }

    pub fn dismiss_error(&self) -> DomainResult<()> {
        self.post(Message::DismissError)
    }

    /// Current published state
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every published change
    pub fn subscribe_state(&self) -> watch::Receiver<ListState> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for(&self, mut predicate: impl FnMut(&ListState) -> bool) -> DomainResult<ListState> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| DomainError::Internal("shopping list actor stopped".to_string()))?;
        Ok((*state).clone())
    }
}
