//! Bounded, append-only event log paired with its derived state.
//!
//! The log and the [`MonitorState`] live in one struct so that every
//! mutation updates both in a single `&mut self` call. Wrapping the log in
//! one lock is enough to make `(events, state)` pairs consistent.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::state::MonitorState;
use crate::types::{Event, EventDraft, ValidationError};

/// Default number of retained events.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<Event>,
    state: MonitorState,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventLog {
    /// Create an empty log. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            state: MonitorState::default(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Validate, stamp and store a draft, then fold it into the state.
    ///
    /// At capacity the oldest event is evicted silently. On validation
    /// failure nothing is mutated.
    pub fn append(&mut self, draft: EventDraft, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        let event = draft.into_event(now)?;

        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());

        self.state.apply(&event);
        self.state.event_count = self.events.len();

        Ok(event)
    }

    /// Most recent `limit` events in insertion order, or the whole log when
    /// `limit` is `None` or zero.
    pub fn events(&self, limit: Option<usize>) -> Vec<Event> {
        let skip = match limit {
            Some(n) if n > 0 => self.events.len().saturating_sub(n),
            _ => 0,
        };
        self.events.iter().skip(skip).cloned().collect()
    }

    pub fn state(&self) -> MonitorState {
        self.state.clone()
    }

    /// Recent events and the current state, read together.
    pub fn snapshot(&self, limit: Option<usize>) -> (Vec<Event>, MonitorState) {
        (self.events(limit), self.state())
    }

    /// Drop every event and reset the state to idle with a zero count.
    pub fn clear(&mut self) {
        self.events.clear();
        self.state = MonitorState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append(log: &mut EventLog, agent: &str, action: &str) -> Event {
        log.append(EventDraft::new(agent, action), Utc::now()).unwrap()
    }

    #[test]
    fn start_then_state_reports_active_session() {
        let mut log = EventLog::default();
        let ev = log
            .append(
                EventDraft::new("architect", "start").with_workflow("design-feature"),
                Utc::now(),
            )
            .unwrap();

        let state = log.state();
        assert_eq!(state.active_agent.as_deref(), Some("architect"));
        assert_eq!(state.active_workflow.as_deref(), Some("design-feature"));
        assert_eq!(state.started_at, Some(ev.timestamp));
        assert_eq!(state.event_count, 1);
    }

    #[test]
    fn start_end_scenario() {
        let mut log = EventLog::default();
        log.append(
            EventDraft::new("architect", "start").with_workflow("design-feature"),
            Utc::now(),
        )
        .unwrap();
        append(&mut log, "architect", "end");

        let state = log.state();
        assert_eq!(state.event_count, 2);
        assert!(state.active_agent.is_none());
    }

    #[test]
    fn overflow_evicts_oldest_in_order() {
        let mut log = EventLog::new(3);
        for i in 0..4 {
            append(&mut log, &format!("agent-{i}"), "progress");
        }
        let agents: Vec<String> = log.events(None).into_iter().map(|e| e.agent).collect();
        assert_eq!(agents, vec!["agent-1", "agent-2", "agent-3"]);
        assert_eq!(log.state().event_count, 3);
    }

    #[test]
    fn eviction_does_not_touch_active_session() {
        let mut log = EventLog::new(2);
        append(&mut log, "architect", "start");
        append(&mut log, "coder", "progress");
        append(&mut log, "coder", "progress");
        // the start event is gone but the session it opened is still current
        assert_eq!(log.state().active_agent.as_deref(), Some("architect"));
        assert_eq!(log.state().event_count, 2);
    }

    #[test]
    fn events_limit_returns_tail() {
        let mut log = EventLog::default();
        for i in 0..5 {
            append(&mut log, &format!("a{i}"), "progress");
        }
        let tail: Vec<String> = log.events(Some(2)).into_iter().map(|e| e.agent).collect();
        assert_eq!(tail, vec!["a3", "a4"]);
        assert_eq!(log.events(Some(0)).len(), 5);
        assert_eq!(log.events(Some(50)).len(), 5);
    }

    #[test]
    fn rejected_draft_leaves_log_untouched() {
        let mut log = EventLog::default();
        append(&mut log, "architect", "start");
        let before = log.state();

        let err = log.append(EventDraft::default(), Utc::now()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("agent"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.state(), before);
    }

    #[test]
    fn clear_resets_log_and_state() {
        let mut log = EventLog::default();
        append(&mut log, "architect", "start");
        append(&mut log, "architect", "error");
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.state(), MonitorState::default());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut log = EventLog::new(0);
        append(&mut log, "a", "start");
        append(&mut log, "b", "start");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.events(None)[0].agent, "b");
    }
}
