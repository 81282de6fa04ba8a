//! List Actor
//!
//! Sole owner of the item sequence. Intents, subscription snapshots and
//! store-call completions all arrive as messages on one inbox and are
//! applied in order; store calls run on spawned tasks that post their
//! result back.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::list_state::{ListState, SyncError, SyncOperation};
use crate::domain::{DomainError, DomainResult, ItemDraft, ShoppingItem, SwipeColor};
use crate::repository::RecolorRepository;

pub(crate) enum Message {
    // Intents
    Add(ItemDraft),
    Remove(ShoppingItem),
    ToggleSelection(ShoppingItem),
    Recolor(ShoppingItem, SwipeColor),
    Refresh,
    DismissError,

    // Deliveries
    Snapshot(Vec<ShoppingItem>),
    Fetched(DomainResult<Vec<ShoppingItem>>),
    Added(DomainResult<()>),
    Removed {
        item: ShoppingItem,
        result: DomainResult<()>,
    },
    SelectionSaved {
        id: String,
        previous: bool,
        result: DomainResult<()>,
    },
    Recolored {
        item: ShoppingItem,
        color: SwipeColor,
        result: DomainResult<()>,
    },
}

pub(crate) struct ListActor {
    repo: Arc<dyn RecolorRepository>,
    state: ListState,
    publisher: watch::Sender<ListState>,
    inbox: mpsc::UnboundedReceiver<Message>,
    /// Weak so the actor alone never keeps its inbox open
    outbox: mpsc::WeakUnboundedSender<Message>,
}

impl ListActor {
    pub(crate) fn new(
        repo: Arc<dyn RecolorRepository>,
        publisher: watch::Sender<ListState>,
        inbox: mpsc::UnboundedReceiver<Message>,
        outbox: mpsc::WeakUnboundedSender<Message>,
    ) -> Self {
        let state = publisher.borrow().clone();
        Self {
            repo,
            state,
            publisher,
            inbox,
            outbox,
        }
    }

    pub(crate) async fn run(mut self) {
        while let Some(msg) = self.inbox.recv().await {
            if self.handle(msg) {
                self.publisher.send_replace(self.state.clone());
            }
        }
        log::debug!("List actor stopped");
    }

    /// Run a store call off the actor and post its completion back
    fn spawn_call<F>(&self, call: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        let Some(tx) = self.outbox.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let _ = tx.send(call.await);
        });
    }

    fn record_error(&mut self, operation: SyncOperation, error: DomainError) {
        log::warn!("{:?} failed: {}", operation, error);
        self.state.last_error = Some(SyncError { operation, error });
    }

    fn fetch(&self) {
        let repo = self.repo.clone();
        self.spawn_call(async move { Message::Fetched(repo.fetch_all().await) });
    }

    /// Apply one message; returns whether the published state changed
    fn handle(&mut self, msg: Message) -> bool {
        match msg {
            Message::Snapshot(items) => {
                self.state.apply_snapshot(items);
                true
            }

            Message::Refresh => {
                self.fetch();
                false
            }
            Message::Fetched(Ok(items)) => {
                self.state.apply_snapshot(items);
                true
            }
            Message::Fetched(Err(e)) => {
                self.record_error(SyncOperation::Fetch, e);
                true
            }

            Message::Add(draft) => {
                let repo = self.repo.clone();
                let item = draft.into_item();
                self.spawn_call(async move { Message::Added(repo.add(&item).await) });
                false
            }
            // The store does not hand back the new id; a refresh brings it in
            Message::Added(Ok(())) => {
                self.fetch();
                false
            }
            Message::Added(Err(e)) => {
                self.record_error(SyncOperation::Add, e);
                true
            }

            Message::Remove(item) => {
                if !item.is_persisted() {
                    log::debug!("Ignoring remove of unsaved item {:?}", item.name);
                    return false;
                }
                let repo = self.repo.clone();
                self.spawn_call(async move {
                    let result = repo.remove(&item).await;
                    Message::Removed { item, result }
                });
                false
            }
            Message::Removed { item, result: Ok(()) } => {
                let before = self.state.items.len();
                self.state.items.retain(|i| !i.same_entry(&item));
                self.state.items.len() != before
            }
            Message::Removed { result: Err(e), .. } => {
                self.record_error(SyncOperation::Remove, e);
                true
            }

            Message::ToggleSelection(item) => {
                // Flip the actor's copy; the caller's may predate queued toggles
                let index = self.state.position_of(&item);
                let current = match index {
                    Some(i) => self.state.items[i].clone(),
                    None => item,
                };
                let updated = current.toggled();
                if let Some(i) = index {
                    self.state.items[i] = updated.clone();
                }
                if let Some(id) = updated.id.clone() {
                    let repo = self.repo.clone();
                    let previous = current.is_selected;
                    self.spawn_call(async move {
                        let result = repo.save(&updated).await;
                        Message::SelectionSaved { id, previous, result }
                    });
                }
                index.is_some()
            }
            Message::SelectionSaved { result: Ok(()), .. } => false,
            Message::SelectionSaved {
                id,
                previous,
                result: Err(e),
            } => {
                // Roll back only if nothing newer replaced the optimistic value
                if let Some(index) = self.state.position_of_id(&id) {
                    let local = &mut self.state.items[index];
                    if local.is_selected != previous {
                        local.is_selected = previous;
                    }
                }
                self.record_error(SyncOperation::Save, e);
                true
            }

            Message::Recolor(item, color) => {
                if !item.is_persisted() {
                    return false;
                }
                let repo = self.repo.clone();
                self.spawn_call(async move {
                    let result = repo.save_color(&item, &color).await;
                    Message::Recolored { item, color, result }
                });
                false
            }
            Message::Recolored {
                item,
                color,
                result: Ok(()),
            } => match self.state.position_of(&item) {
                Some(index) if self.state.items[index].swipe_color != color => {
                    self.state.items[index].swipe_color = color;
                    true
                }
                _ => false,
            },
            Message::Recolored { result: Err(e), .. } => {
                self.record_error(SyncOperation::Recolor, e);
                true
            }

            Message::DismissError => self.state.last_error.take().is_some(),
        }
    }
}
