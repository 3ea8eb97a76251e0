//! Derived "what is running now" projection and its reducer.
//!
//! Two phases: `Idle` (no active agent) and `Active(agent, workflow)`.
//!
//! | current         | event         | next            |
//! |-----------------|---------------|-----------------|
//! | any             | start(A, W)   | Active(A, W)    |
//! | Active(A, _)    | end(A)        | Idle            |
//! | Active(A, _)    | end(B), B ≠ A | Active(A, _)    |
//! | Idle            | end(_)        | Idle            |
//! | any             | error / other | unchanged       |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ActionKind, Event};

/// Current status projection, rebuilt incrementally from the event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    pub active_agent: Option<String>,
    pub active_workflow: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Number of events currently retained by the log.
    pub event_count: usize,
}

/// Borrowed view of the state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase<'a> {
    Idle,
    Active {
        agent: &'a str,
        workflow: Option<&'a str>,
    },
}

impl MonitorState {
    pub fn phase(&self) -> Phase<'_> {
        match self.active_agent.as_deref() {
            None => Phase::Idle,
            Some(agent) => Phase::Active {
                agent,
                workflow: self.active_workflow.as_deref(),
            },
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active_agent.is_none()
    }

    /// Fold one event into the active-session fields.
    ///
    /// `event_count` is left to the owning log, which knows the retained length.
    pub fn apply(&mut self, event: &Event) {
        match event.kind() {
            ActionKind::Start => {
                self.active_agent = Some(event.agent.clone());
                self.active_workflow = event.workflow.clone();
                self.started_at = Some(event.timestamp);
            }
            ActionKind::End => {
                if self.active_agent.as_deref() == Some(event.agent.as_str()) {
                    self.active_agent = None;
                    self.active_workflow = None;
                    self.started_at = None;
                }
            }
            // Errors leave the session visible for diagnosis.
            ActionKind::Error | ActionKind::Other => {}
        }
    }
}
