//! Vehicle search tracking backend.
//!
//! HTTP API over [`tracker_store`], with detections and alerts pushed to
//! browser sockets through [`tracker_hub`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use routes::build_router;
pub use state::AppState;
