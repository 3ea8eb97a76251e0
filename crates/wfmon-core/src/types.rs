use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, string-keyed metadata attached to an event.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ─── Action ───────────────────────────────────────────────────────

/// Classification of an event's `action` string.
///
/// The wire value stays a free-form string; only these three are
/// meaningful to the reducer. Anything else is `Other` and passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Start,
    End,
    Error,
    Other,
}

impl ActionKind {
    pub fn parse(action: &str) -> Self {
        match action {
            "start" => Self::Start,
            "end" => Self::End,
            "error" => Self::Error,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Error => "error",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Draft ────────────────────────────────────────────────────────

/// Producer-supplied event before it is stamped and stored.
///
/// `agent` and `action` are optional at the type level so that a payload
/// missing them deserializes and is then rejected by [`EventDraft::validate`]
/// with a field-specific error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl EventDraft {
    pub fn new(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            agent: Some(agent.into()),
            action: Some(action.into()),
            ..Self::default()
        }
    }

    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.workflow = Some(workflow.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check that `agent` and `action` are present and not blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(self.agent.as_deref()) {
            return Err(ValidationError::MissingField("agent"));
        }
        if is_blank(self.action.as_deref()) {
            return Err(ValidationError::MissingField("action"));
        }
        Ok(())
    }

    /// Validate and turn the draft into an immutable [`Event`].
    ///
    /// `now` is used only when the draft carries no timestamp of its own.
    pub fn into_event(self, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        self.validate()?;
        Ok(Event {
            timestamp: self.timestamp.unwrap_or(now),
            agent: self.agent.unwrap_or_default(),
            action: self.action.unwrap_or_default(),
            workflow: self.workflow,
            parent: self.parent,
            metadata: self.metadata,
        })
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

// ─── Event ────────────────────────────────────────────────────────

/// One agent/workflow lifecycle transition, as stored and broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub action: String,
    pub workflow: Option<String>,
    /// Supervising agent. Informational only.
    pub parent: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Event {
    pub fn kind(&self) -> ActionKind {
        ActionKind::parse(&self.action)
    }
}

// ─── Error ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
