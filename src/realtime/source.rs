//! Change event subscriptions.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::domain::{DomainResult, ListId};

/// Provider of per-list change streams
pub trait ChangeEventSource: Send + Sync {
    /// Start receiving changes for the tasks of `list_id`.
    ///
    /// The stream stays open until the returned `Subscription` is dropped.
    fn subscribe(&self, list_id: &ListId) -> DomainResult<Subscription>;
}

/// Channel name used for a list's task changes
pub fn channel_name(list_id: &ListId) -> String {
    format!("todos-{}", list_id)
}

type Release = Box<dyn FnOnce() + Send>;

/// Live change stream for one list.
///
/// Dropping the subscription runs its release hook exactly once, which
/// unregisters the channel at the source.
pub struct Subscription {
    channel: String,
    events: mpsc::UnboundedReceiver<Value>,
    release: Option<Release>,
}

impl Subscription {
    pub fn new(
        channel: String,
        events: mpsc::UnboundedReceiver<Value>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            channel,
            events,
            release: Some(Box::new(release)),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next raw payload; `None` once the source has closed the stream
    pub async fn recv(&mut self) -> Option<Value> {
        self.events.recv().await
    }

    /// Next queued payload without waiting
    pub fn try_recv(&mut self) -> Option<Value> {
        self.events.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            log::debug!("Releasing channel {}", self.channel);
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("released", &self.release.is_none())
            .finish()
    }
}
