//! # Tracker Hub
//!
//! Real-time delivery of detection and alert events to browser sockets.
//!
//! Each live connection carries a [`Subscription`]: either every search, or
//! an explicit set of search ids sent by the client in a `subscribe`
//! message. A detection reaches a connection only if its search passes that
//! filter; alerts reach everyone.
//!
//! ## Socket protocol
//!
//! | Direction | `type` | Payload |
//! |---|---|---|
//! | server → client | `connected` | `{message, timestamp}` |
//! | client → server | `subscribe` | `{searchIds: [string]}` |
//! | client → server | `ping` | `{}` |
//! | server → client | `pong` | `{timestamp}` |
//! | server → client | `detection` | `{data, timestamp}` |
//! | server → client | `alert` | `{data, timestamp}` |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use tracker_hub::BroadcastHub;
//!
//! # async fn run() -> std::io::Result<()> {
//! let hub = BroadcastHub::default();
//! let app = Router::new()
//!     .route("/ws", get(tracker_hub::ws_connect))
//!     .with_state(hub.clone());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

mod connection;
mod error;
mod hub;
mod message;
mod subscription;

#[cfg(feature = "server")]
mod handler;

// Re-exports
pub use connection::{
    Connection, ConnectionHandle, ConnectionId, ConnectionMetadata, ConnectionState,
};
pub use error::{Error, Result};
pub use hub::{AlertSink, BroadcastHub, DetectionSink, DEFAULT_SEND_BUFFER};
pub use message::{ClientMessage, Frame, SearchScoped, ServerMessage, CONNECTED_GREETING};
pub use subscription::Subscription;

#[cfg(feature = "server")]
pub use handler::{serve_socket, ws_connect};
