//! `wfmon emit`: one-shot event report from a shell or hook script.

use wfmon_core::{EventDraft, Metadata};
use wfmon_emitter::{EmitOutcome, EmitStatus, Emitter, EmitterConfig, URL_ENV};

use crate::cli::EmitOpts;

pub(crate) fn parse_metadata(raw: Option<&str>) -> anyhow::Result<Metadata> {
    let Some(raw) = raw else {
        return Ok(Metadata::new());
    };
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("--metadata must be a JSON object, got {other}"),
    }
}

pub(crate) fn build_draft(opts: &EmitOpts) -> anyhow::Result<EventDraft> {
    let mut draft = EventDraft::new(opts.agent.as_str(), opts.action.as_str())
        .with_metadata(parse_metadata(opts.metadata.as_deref())?);
    if let Some(workflow) = &opts.workflow {
        draft = draft.with_workflow(workflow.as_str());
    }
    if let Some(parent) = &opts.parent {
        draft = draft.with_parent(parent.as_str());
    }
    Ok(draft)
}

/// `WFMON_URL` wins over the `--host`/`--port` pair.
fn emitter_config(cli_base_url: &str) -> EmitterConfig {
    let config = EmitterConfig::from_env().with_enabled(true);
    if std::env::var_os(URL_ENV).is_some() {
        config
    } else {
        config.with_base_url(cli_base_url)
    }
}

/// Only bad CLI input is an error. An offline or failing monitor is
/// reported on stderr and the command still exits 0, so hook scripts
/// running under `set -e` are unaffected.
pub async fn cmd_emit(base_url: &str, opts: &EmitOpts) -> anyhow::Result<EmitOutcome> {
    let draft = build_draft(opts)?;
    let emitter = Emitter::new(emitter_config(base_url));

    let outcome = emitter.emit(draft).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    match outcome.status {
        EmitStatus::Offline => eprintln!("[WARN] {}", outcome.message),
        EmitStatus::Error => eprintln!("[ERROR] {}", outcome.message),
        EmitStatus::Success | EmitStatus::Disabled => {}
    }
    Ok(outcome)
}
