use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use wfmon_core::{EventDraft, EventLog};

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    #[allow(dead_code)]
    description: String,
    capacity: usize,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    event: EventDraft,
    expected: Expected,
}

/// Subset of `MonitorState` a step asserts on; `started_at` is checked
/// against the step's own event instead.
#[derive(Debug, Deserialize)]
struct Expected {
    active_agent: Option<String>,
    active_workflow: Option<String>,
    event_count: usize,
}

fn scenarios_dir() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../fixtures/scenarios")
}

fn load_scenarios() -> Vec<Scenario> {
    let dir = scenarios_dir();
    let mut scenarios = Vec::new();
    if !dir.exists() {
        return scenarios;
    }
    for entry in fs::read_dir(&dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let content = fs::read_to_string(&path).unwrap_or_else(|e| {
                panic!("failed to read scenario {:?}: {}", path, e);
            });
            let scenario: Scenario = serde_json::from_str(&content).unwrap_or_else(|e| {
                panic!("failed to parse scenario {:?}: {}", path, e);
            });
            scenarios.push(scenario);
        }
    }
    scenarios
}

#[test]
fn test_all_scenarios() {
    let scenarios = load_scenarios();
    assert!(
        !scenarios.is_empty(),
        "no scenarios found in {:?}",
        scenarios_dir()
    );

    let base: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
    let mut total_steps = 0;

    for scenario in &scenarios {
        let mut log = EventLog::new(scenario.capacity);

        for (i, step) in scenario.steps.iter().enumerate() {
            let now = base + Duration::seconds(i as i64);
            let stored = log.append(step.event.clone(), now).unwrap_or_else(|e| {
                panic!("scenario {} step {}: append rejected: {}", scenario.name, i, e);
            });
            let state = log.state();

            assert_eq!(
                state.active_agent, step.expected.active_agent,
                "scenario {} step {}: active_agent",
                scenario.name, i
            );
            assert_eq!(
                state.active_workflow, step.expected.active_workflow,
                "scenario {} step {}: active_workflow",
                scenario.name, i
            );
            assert_eq!(
                state.event_count, step.expected.event_count,
                "scenario {} step {}: event_count",
                scenario.name, i
            );
            assert_eq!(state.event_count, log.len());
            if stored.action == "start" {
                assert_eq!(state.started_at, Some(now), "scenario {} step {}", scenario.name, i);
            }
            if state.active_agent.is_none() {
                assert!(state.started_at.is_none());
            }
            total_steps += 1;
        }
    }

    assert!(total_steps > 0);
}
