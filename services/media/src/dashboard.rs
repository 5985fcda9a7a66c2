//! A viewer's video library kept in sync with the server
//!
//! The dashboard owns the collection and the query view. Refreshes, deletes
//! and pushed status events all go through `&mut self`, so they are applied
//! one at a time in the order they are handed over.

use std::future::Future;
use std::time::Duration;

use common::error::{TransportError, TransportResult};
use futures::{Stream, StreamExt};
use reqwest::Url;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collection::MediaCollection;
use crate::error::SyncError;
use crate::live::{LiveUpdateSource, Subscription};
use crate::models::{MediaItem, StatusEvent};
use crate::query::{QueryState, QueryView, ViewResult};
use crate::transport::MediaTransport;

/// Why [`Dashboard::watch`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    /// The shutdown future completed; the subscription was released
    Shutdown,
    /// The server side of the subscription went away
    StreamEnded,
    /// A refresh was refused because the token is no longer accepted
    Unauthorized,
}

/// What changed the collection during [`Dashboard::watch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Patched(StatusEvent),
    Refreshed,
}

/// Refresh requests at a fixed period, the first one after `period`
pub fn refresh_every(period: Duration) -> impl Stream<Item = ()> {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    futures::stream::unfold(interval, |mut interval| async move {
        interval.tick().await;
        Some(((), interval))
    })
}

pub struct Dashboard<T> {
    transport: T,
    collection: MediaCollection,
    view: QueryView,
}

impl<T: MediaTransport> Dashboard<T> {
    pub fn new(transport: T) -> Self {
        Self::with_query(transport, QueryState::default())
    }

    pub fn with_query(transport: T, query: QueryState) -> Self {
        Self {
            transport,
            collection: MediaCollection::new(),
            view: QueryView::new(query),
        }
    }

    /// Replace the collection with the server's list
    ///
    /// On failure the collection is left as it was.
    pub async fn load(&mut self, token: &str) -> TransportResult<usize> {
        let items = self.transport.list(token).await?;
        self.collection.replace(items);
        info!("Loaded {} videos", self.collection.len());
        Ok(self.collection.len())
    }

    /// Subscribe to live updates, then load the list
    ///
    /// Status changes emitted while the list is in flight stay buffered in the
    /// returned subscription and are applied on top of it by [`watch`](Self::watch).
    /// A failed load releases the subscription.
    pub async fn connect<L>(&mut self, token: &str, live: &L) -> Result<Subscription, SyncError>
    where
        L: LiveUpdateSource + ?Sized,
    {
        let subscription = live.subscribe().await?;
        self.load(token).await?;
        Ok(subscription)
    }

    /// Delete a video remotely, then drop it locally
    pub async fn delete(&mut self, token: &str, id: Uuid) -> TransportResult<Option<MediaItem>> {
        self.transport.delete(token, id).await?;
        Ok(self.collection.remove(id))
    }

    pub fn apply(&mut self, event: &StatusEvent) -> bool {
        self.collection.apply(event)
    }

    /// Apply pushed events and refresh requests until `shutdown` resolves or
    /// the event stream ends
    ///
    /// Events and refreshes are applied in the order they are picked up, so
    /// whichever completes last wins. A failed refresh keeps the collection;
    /// an unauthorized one ends the watch. `on_change` runs after every call
    /// that changed the collection.
    pub async fn watch<R, F, C>(
        &mut self,
        token: &str,
        mut subscription: Subscription,
        refresh: R,
        shutdown: F,
        mut on_change: C,
    ) -> WatchEnd
    where
        R: Stream<Item = ()>,
        F: Future<Output = ()>,
        C: FnMut(&Self, Change),
    {
        tokio::pin!(refresh);
        tokio::pin!(shutdown);
        let mut refresh_open = true;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    subscription.close();
                    debug!("Stopped watching live updates");
                    return WatchEnd::Shutdown;
                }
                event = subscription.next() => match event {
                    Some(event) => {
                        if self.apply(&event) {
                            on_change(self, Change::Patched(event));
                        }
                    }
                    None => {
                        info!("Live update stream ended");
                        return WatchEnd::StreamEnded;
                    }
                },
                request = refresh.next(), if refresh_open => match request {
                    Some(()) => match self.load(token).await {
                        Ok(_) => on_change(self, Change::Refreshed),
                        Err(TransportError::Unauthorized) => {
                            subscription.close();
                            warn!("Refresh refused, token no longer accepted");
                            return WatchEnd::Unauthorized;
                        }
                        Err(e) => warn!("Refresh failed, keeping current list: {}", e),
                    },
                    None => refresh_open = false,
                },
            }
        }
    }

    /// Videos passing the current query, in view order
    pub fn visible(&self) -> ViewResult<'_> {
        self.view.derive(&self.collection)
    }

    /// Streaming address of a video that is present and playable
    pub fn playback_url(&self, token: &str, id: Uuid) -> Option<TransportResult<Url>> {
        let item = self.collection.get(id)?;
        if !item.status.is_playable() {
            return None;
        }
        Some(self.transport.stream_url(token, id))
    }

    pub fn collection(&self) -> &MediaCollection {
        &self.collection
    }

    pub fn query(&self) -> &QueryView {
        &self.view
    }

    pub fn query_mut(&mut self) -> &mut QueryView {
        &mut self.view
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
