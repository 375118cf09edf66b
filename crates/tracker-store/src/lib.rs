//! # Tracker Store
//!
//! SQLite persistence for the vehicle tracker, plus [`CaseService`], which
//! records detections and hands each committed one to a
//! [`tracker_hub::DetectionSink`].
//!
//! Every query lives in an `impl Store` block in the module for its table.

mod alerts;
mod analytics;
mod cameras;
mod detections;
mod error;
mod models;
mod schema;
mod searches;
mod service;
mod store;
mod users;

pub use alerts::DEFAULT_SEVERITY;
pub use error::{Result, StoreError};
pub use models::*;
pub use schema::SAMPLE_CAMERAS;
pub use searches::DEFAULT_PRIORITY;
pub use service::{CaseService, SIMULATED_CONFIDENCE};
pub use store::Store;
pub use users::{ADMIN_EMAIL, ADMIN_USERNAME};
