//! Broadcast hub: the registry of live socket connections

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{
    Connection, ConnectionHandle, ConnectionId, ConnectionMetadata, ConnectionState,
};
use crate::message::{ClientMessage, Frame, SearchScoped, ServerMessage};
use crate::subscription::Subscription;

/// Outbound frames a connection may have queued before it counts as stuck
pub const DEFAULT_SEND_BUFFER: usize = 100;

/// Receives each detection once it has been durably written.
///
/// The case service only ever talks to the hub through this.
pub trait DetectionSink<D: ?Sized>: Send + Sync {
    fn on_detection_persisted(&self, detection: &D);
}

/// Receives alerts raised by the case service
pub trait AlertSink<A: ?Sized>: Send + Sync {
    fn on_alert_raised(&self, alert: &A);
}

/// Owns every live connection and delivers events to the matching subset.
///
/// Delivery is best effort: one non-blocking send per connection, no retry,
/// and a connection that cannot take a frame is dropped from the registry.
#[derive(Clone)]
pub struct BroadcastHub {
    connections: Arc<DashMap<ConnectionId, ConnectionHandle>>,
    send_buffer: usize,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_BUFFER)
    }
}

impl BroadcastHub {
    /// Create a hub whose connections queue up to `send_buffer` frames each
    pub fn new(send_buffer: usize) -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            send_buffer,
        }
    }

    /// Register a new connection with an all-searches filter.
    ///
    /// The `connected` greeting is already queued on the returned receiver.
    pub fn register(&self, metadata: ConnectionMetadata) -> (ConnectionHandle, mpsc::Receiver<Frame>) {
        let (connection, receiver) = Connection::new(metadata, self.send_buffer);
        let connection = Arc::new(connection);

        // Queue the greeting before any broadcast can see the connection
        match ServerMessage::connected().encode() {
            Ok(frame) => {
                if let Err(e) = connection.try_send(frame) {
                    warn!(connection_id = %connection.id, error = %e, "Failed to queue greeting");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode greeting"),
        }

        self.connections
            .insert(connection.id.clone(), connection.clone());

        info!(
            connection_id = %connection.id,
            client_ip = ?connection.metadata.client_ip,
            total_connections = self.connections.len(),
            "Socket connection registered"
        );

        (connection, receiver)
    }

    /// Apply one inbound text frame from `handle`'s client
    pub fn handle_incoming(&self, handle: &ConnectionHandle, raw: &str) {
        let Some(message) = ClientMessage::parse(raw) else {
            debug!(connection_id = %handle.id, "Discarding malformed socket message");
            return;
        };

        match message {
            ClientMessage::Subscribe { search_ids } => {
                let subscription = Subscription::from_search_ids(search_ids.unwrap_or_default());
                debug!(
                    connection_id = %handle.id,
                    all_searches = subscription.is_all(),
                    "Subscription replaced"
                );
                handle.replace_subscription(subscription);
            }
            ClientMessage::Ping => self.reply(handle, ServerMessage::pong()),
            ClientMessage::Unknown => {
                debug!(connection_id = %handle.id, raw, "Ignoring unknown socket message type");
            }
        }
    }

    /// Remove a connection and close its outbound channel. Safe to call more than once.
    pub fn unregister(&self, handle: &ConnectionHandle) {
        self.unregister_id(&handle.id);
    }

    fn unregister_id(&self, connection_id: &str) {
        if let Some((_, connection)) = self.connections.remove(connection_id) {
            connection.close();
            info!(
                connection_id,
                remaining_connections = self.connections.len(),
                "Socket connection unregistered"
            );
        } else {
            debug!(connection_id, "Connection already unregistered");
        }
    }

    /// Push a detection to every open connection whose filter accepts its search.
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast_detection<D>(&self, detection: &D) -> usize
    where
        D: SearchScoped + Serialize + ?Sized,
    {
        let frame = match ServerMessage::detection(detection).and_then(|m| m.encode()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode detection, skipping broadcast");
                return 0;
            }
        };

        let search_id = detection.search_id();
        let sent = self.deliver(&frame, |connection| connection.wants_search(search_id));
        debug!(search_id, sent_count = sent, "Detection broadcast");
        sent
    }

    /// Push an alert to every open connection, ignoring filters
    pub fn broadcast_alert<A>(&self, alert: &A) -> usize
    where
        A: Serialize + ?Sized,
    {
        let frame = match ServerMessage::alert(alert).and_then(|m| m.encode()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode alert, skipping broadcast");
                return 0;
            }
        };

        let sent = self.deliver(&frame, |_| true);
        debug!(sent_count = sent, "Alert broadcast");
        sent
    }

    /// Get total connection count
    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }

    /// List all connections
    pub fn list_connections(&self) -> Vec<ConnectionHandle> {
        self.connections.iter().map(|e| e.value().clone()).collect()
    }

    /// Drop connections whose receiving side has gone away. Returns how many were removed.
    pub fn cleanup_dead_connections(&self) -> usize {
        let dead_ids: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|e| e.value().state() == ConnectionState::Closed)
            .map(|e| e.key().clone())
            .collect();

        for id in &dead_ids {
            self.unregister_id(id);
        }
        dead_ids.len()
    }

    fn reply(&self, handle: &ConnectionHandle, message: ServerMessage) {
        let kind = message.kind();
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(connection_id = %handle.id, kind, error = %e, "Failed to encode reply");
                return;
            }
        };
        if let Err(e) = handle.try_send(frame) {
            warn!(connection_id = %handle.id, kind, error = %e, "Reply failed, dropping connection");
            self.unregister(handle);
        }
    }

    fn deliver(&self, frame: &Frame, wants: impl Fn(&Connection) -> bool) -> usize {
        let mut sent = 0;
        let mut dropped = Vec::new();

        for entry in self.connections.iter() {
            let connection = entry.value();
            match connection.state() {
                ConnectionState::Open => {}
                ConnectionState::Closing => continue,
                ConnectionState::Closed => {
                    dropped.push(connection.id.clone());
                    continue;
                }
            }
            if !wants(connection) {
                continue;
            }
            match connection.try_send(frame.clone()) {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(connection_id = %connection.id, error = %e, "Delivery failed, dropping connection");
                    dropped.push(connection.id.clone());
                }
            }
        }

        // Removal happens after the iteration releases its shard locks
        for id in dropped {
            self.unregister_id(&id);
        }
        sent
    }
}

impl<D> DetectionSink<D> for BroadcastHub
where
    D: SearchScoped + Serialize + ?Sized,
{
    fn on_detection_persisted(&self, detection: &D) {
        self.broadcast_detection(detection);
    }
}

impl<A> AlertSink<A> for BroadcastHub
where
    A: Serialize + ?Sized,
{
    fn on_alert_raised(&self, alert: &A) {
        self.broadcast_alert(alert);
    }
}
