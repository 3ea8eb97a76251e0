//! Push-channel envelopes and inbound frame parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wfmon_core::{Event, EventDraft, MonitorState};

/// Frame sent from the gateway to a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushFrame {
    /// Handshake snapshot, sent once right after a viewer connects.
    Init {
        events: Vec<Event>,
        state: MonitorState,
    },
    /// One appended event, fanned out to every live viewer.
    Event { event: Event },
    /// Reply to a bad inbound frame, sent to its sender only.
    Error { message: String },
}

impl PushFrame {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Why an inbound push-channel frame could not be turned into a draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboundError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("invalid event payload: {0}")]
    InvalidPayload(String),
}

/// Parse an inbound text frame as a draft event.
///
/// Validation of required fields is left to ingest.
pub fn parse_inbound(text: &str) -> Result<EventDraft, InboundError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_| InboundError::InvalidJson)?;
    serde_json::from_value(value).map_err(|e| InboundError::InvalidPayload(e.to_string()))
}
