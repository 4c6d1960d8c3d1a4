//! Open list session
//!
//! Scoped handle pairing a synchronizer with its change subscription. The
//! subscription lives exactly as long as the session: dropping or closing the
//! session releases it, and a failed open never leaks one.

use std::ops::Deref;
use std::sync::Arc;

use super::synchronizer::ListSynchronizer;
use crate::domain::{DomainResult, ListId, UserId};
use crate::realtime::{ChangeEventSource, Subscription};
use crate::repository::TaskRepository;

pub struct ListSession<R: ?Sized> {
    sync: Arc<ListSynchronizer<R>>,
    subscription: Subscription,
}

impl<R: TaskRepository + ?Sized> ListSession<R> {
    /// Subscribe to `list_id`'s changes, then load its tasks.
    ///
    /// Subscribing first means nothing committed during the load is missed;
    /// replayed inserts are absorbed by the synchronizer.
    pub async fn open<E>(list_id: ListId, author: UserId, repo: Arc<R>, events: &E) -> DomainResult<Self>
    where
        E: ChangeEventSource + ?Sized,
    {
        let subscription = events.subscribe(&list_id)?;
        let tasks = repo.list_tasks(&list_id).await?;

        log::info!(
            "Opened list {} with {} tasks on {}",
            list_id,
            tasks.len(),
            subscription.channel()
        );
        Ok(Self {
            sync: Arc::new(ListSynchronizer::new(list_id, author, repo, tasks)),
            subscription,
        })
    }

    /// Shared handle for issuing operations while the session pumps events
    pub fn synchronizer(&self) -> Arc<ListSynchronizer<R>> {
        self.sync.clone()
    }

    pub fn channel(&self) -> &str {
        self.subscription.channel()
    }

    /// Wait for the next change and merge it. Returns `false` once the source
    /// has closed the stream.
    pub async fn pump(&mut self) -> bool {
        match self.subscription.recv().await {
            Some(payload) => {
                self.sync.apply_payload(&payload).await;
                true
            }
            None => false,
        }
    }

    /// Merge every change already queued; returns how many were processed
    pub async fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Some(payload) = self.subscription.try_recv() {
            self.sync.apply_payload(&payload).await;
            processed += 1;
        }
        processed
    }

    /// Release the subscription now
    pub fn close(self) {
        log::info!("Closing list {}", self.sync.list_id());
    }
}

impl<R: ?Sized> Deref for ListSession<R> {
    type Target = ListSynchronizer<R>;

    fn deref(&self) -> &Self::Target {
        &self.sync
    }
}
