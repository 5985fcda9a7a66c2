//! Push channel of server-side status changes
//!
//! A [`LiveUpdateSource`] opens a [`Subscription`]; events come out of it in
//! the order the server emitted them. Dropping or closing the subscription
//! stops delivery and tears down whatever task feeds it.

pub mod socketio;

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::LiveUpdateError;
use crate::models::StatusEvent;

pub use socketio::SocketIoChannel;

/// Open subscription to status events
pub struct Subscription {
    events: mpsc::Receiver<StatusEvent>,
    task: Option<JoinHandle<()>>,
    closed: bool,
}

impl Subscription {
    /// In-process subscription fed through the returned sender
    pub fn channel(capacity: usize) -> (mpsc::Sender<StatusEvent>, Subscription) {
        let (sender, events) = mpsc::channel(capacity.max(1));
        (sender, Self::from_parts(events, None))
    }

    pub(crate) fn from_parts(
        events: mpsc::Receiver<StatusEvent>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            events,
            task,
            closed: false,
        }
    }

    /// Next event, or `None` once the channel is closed or released
    pub async fn next(&mut self) -> Option<StatusEvent> {
        if self.closed {
            return None;
        }
        self.events.recv().await
    }

    /// Release the subscription; buffered events are discarded
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.events.close();
        while self.events.try_recv().is_ok() {}
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!("Live update subscription released");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl Stream for Subscription {
    type Item = StatusEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.closed {
            return Poll::Ready(None);
        }
        self.events.poll_recv(cx)
    }
}

/// Something that can push status changes to this client
#[async_trait]
pub trait LiveUpdateSource: Send + Sync {
    async fn subscribe(&self) -> Result<Subscription, LiveUpdateError>;
}
