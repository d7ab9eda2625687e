//! `WebSocket` wire shapes.

use serde::{Deserialize, Serialize};

/// Inbound client message. Only the `event` name is read; any other
/// fields are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    /// Name of the requested event.
    pub event: String,
}

/// Outbound message used for both replies and interval pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name the data belongs to.
    pub event: String,
    /// Expanded mock data.
    pub data: serde_json::Value,
}

impl Envelope {
    /// Create an envelope for `event` carrying `data`.
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}
