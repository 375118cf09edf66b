//! Live socket connection types

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::{Error, Result};
use crate::message::Frame;
use crate::subscription::Subscription;

/// Unique connection identity
pub type ConnectionId = String;

/// What the hub hands back on registration
pub type ConnectionHandle = Arc<Connection>;

/// Metadata about a connection
#[derive(Debug, Clone)]
pub struct ConnectionMetadata {
    /// When the connection was established
    pub connected_at: chrono::DateTime<chrono::Utc>,
    /// Client IP address (if available)
    pub client_ip: Option<String>,
    /// User agent (if available)
    pub user_agent: Option<String>,
}

impl ConnectionMetadata {
    pub fn new(client_ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            connected_at: chrono::Utc::now(),
            client_ip,
            user_agent,
        }
    }
}

impl Default for ConnectionMetadata {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Liveness of a connection as seen by the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    /// The client said goodbye; the socket task is winding down
    Closing,
    /// The receiving side is gone
    Closed,
}

/// A live channel to one client
#[derive(Debug)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Connection metadata
    pub metadata: ConnectionMetadata,
    /// Taken on close so the socket task's receiver ends
    sender: RwLock<Option<mpsc::Sender<Frame>>>,
    subscription: RwLock<Subscription>,
    closing: AtomicBool,
}

impl Connection {
    /// Create a connection with an all-searches filter and an outbound queue of `capacity` frames
    pub fn new(metadata: ConnectionMetadata, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let connection = Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata,
            sender: RwLock::new(Some(sender)),
            subscription: RwLock::new(Subscription::AllSearches),
            closing: AtomicBool::new(false),
        };
        (connection, receiver)
    }

    pub fn state(&self) -> ConnectionState {
        let open = self.sender.read().as_ref().is_some_and(|s| !s.is_closed());
        if !open {
            ConnectionState::Closed
        } else if self.closing.load(Ordering::Acquire) {
            ConnectionState::Closing
        } else {
            ConnectionState::Open
        }
    }

    /// Check if the connection is still open
    pub fn is_active(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Drop the outbound sender. Frames already queued stay readable, then the receiver ends.
    pub fn close(&self) {
        self.sender.write().take();
    }

    pub fn mark_closing(&self) {
        self.closing.store(true, Ordering::Release);
    }

    /// Snapshot of the current filter
    pub fn subscription(&self) -> Subscription {
        self.subscription.read().clone()
    }

    /// Swap in a new filter in one step
    pub fn replace_subscription(&self, subscription: Subscription) {
        *self.subscription.write() = subscription;
    }

    pub fn wants_search(&self, search_id: &str) -> bool {
        self.subscription.read().matches(search_id)
    }

    /// Queue a frame without waiting
    pub fn try_send(&self, frame: Frame) -> Result<()> {
        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            return Err(Error::Closed(self.id.clone()));
        };
        sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => Error::Backpressure(self.id.clone()),
            TrySendError::Closed(_) => Error::Closed(self.id.clone()),
        })
    }
}
