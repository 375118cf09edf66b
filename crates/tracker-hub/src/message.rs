//! Socket message types and framing
//!
//! Every message on the socket is a JSON object tagged by `"type"`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// Greeting carried by the `connected` message
pub const CONNECTED_GREETING: &str = "Connected to Vehicle Tracker WebSocket";

/// An encoded text frame, shared by every recipient of one broadcast
pub type Frame = Arc<str>;

/// A payload that belongs to exactly one search.
///
/// Detection records implement this so the hub can filter them.
pub trait SearchScoped {
    fn search_id(&self) -> &str;
}

/// Messages a client may send
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Replace the connection's filter. Missing or null `searchIds` means all.
    Subscribe {
        #[serde(default, rename = "searchIds")]
        search_ids: Option<Vec<String>>,
    },
    /// Liveness check, answered with `pong`
    Ping,
    /// Any other `type` value
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a raw text frame. `None` when the payload is not a tagged JSON object.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Messages the server pushes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Connected {
        message: String,
        timestamp: String,
    },
    Pong {
        /// Unix epoch milliseconds
        timestamp: i64,
    },
    Detection {
        data: serde_json::Value,
        timestamp: String,
    },
    Alert {
        data: serde_json::Value,
        timestamp: String,
    },
}

impl ServerMessage {
    pub fn connected() -> Self {
        ServerMessage::Connected {
            message: CONNECTED_GREETING.to_string(),
            timestamp: iso_now(),
        }
    }

    pub fn pong() -> Self {
        ServerMessage::Pong {
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn detection<D: Serialize + ?Sized>(detection: &D) -> Result<Self> {
        Ok(ServerMessage::Detection {
            data: serde_json::to_value(detection)?,
            timestamp: iso_now(),
        })
    }

    pub fn alert<A: Serialize + ?Sized>(alert: &A) -> Result<Self> {
        Ok(ServerMessage::Alert {
            data: serde_json::to_value(alert)?,
            timestamp: iso_now(),
        })
    }

    /// The `type` tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::Pong { .. } => "pong",
            ServerMessage::Detection { .. } => "detection",
            ServerMessage::Alert { .. } => "alert",
        }
    }

    /// Encode into a text frame
    pub fn encode(&self) -> Result<Frame> {
        Ok(Arc::from(serde_json::to_string(self)?))
    }
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
