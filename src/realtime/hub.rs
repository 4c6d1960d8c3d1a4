//! In-process change fan-out.
//!
//! Backs the local backend's realtime feed: writers publish a payload for a
//! list and every live subscription on that list receives it.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use super::source::{channel_name, ChangeEventSource, Subscription};
use crate::domain::{DomainResult, ListId};

struct Channel {
    list_id: ListId,
    sender: mpsc::UnboundedSender<Value>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    channels: HashMap<u64, Channel>,
}

/// Registry of open change channels, cheap to clone
#[derive(Clone, Default)]
pub struct ChangeHub {
    inner: Arc<Mutex<HubState>>,
}

fn lock(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel for `list_id`; dropping the subscription removes it
    pub fn open(&self, list_id: &ListId) -> Subscription {
        let (sender, events) = mpsc::unbounded_channel();
        let id = {
            let mut state = lock(&self.inner);
            state.next_id += 1;
            let id = state.next_id;
            state.channels.insert(
                id,
                Channel {
                    list_id: list_id.clone(),
                    sender,
                },
            );
            id
        };

        let registry = Arc::downgrade(&self.inner);
        Subscription::new(channel_name(list_id), events, move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).channels.remove(&id);
            }
        })
    }

    /// Deliver `payload` to every channel on `list_id`, returning how many got it
    pub fn publish(&self, list_id: &ListId, payload: &Value) -> usize {
        let mut state = lock(&self.inner);
        let mut delivered = 0;
        state.channels.retain(|_, channel| {
            if &channel.list_id != list_id {
                return true;
            }
            match channel.sender.send(payload.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    pub fn subscriber_count(&self, list_id: &ListId) -> usize {
        lock(&self.inner)
            .channels
            .values()
            .filter(|channel| &channel.list_id == list_id)
            .count()
    }
}

impl ChangeEventSource for ChangeHub {
    fn subscribe(&self, list_id: &ListId) -> DomainResult<Subscription> {
        Ok(self.open(list_id))
    }
}
