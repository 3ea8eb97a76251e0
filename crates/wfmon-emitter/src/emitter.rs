//! Producer-side client for instrumented processes.
//!
//! `emit` never fails its caller: every outcome, including a disabled gate
//! or an unreachable monitor, comes back as an [`EmitOutcome`].

use std::borrow::Cow;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use wfmon_core::{Event, EventDraft};

use crate::config::EmitterConfig;
use crate::liveness::LivenessCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitStatus {
    Disabled,
    Offline,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmitOutcome {
    pub status: EmitStatus,
    pub message: Cow<'static, str>,
    /// Stored event on success, the locally built event on offline/error.
    pub event: Option<Event>,
}

impl EmitOutcome {
    fn disabled() -> Self {
        Self {
            status: EmitStatus::Disabled,
            message: Cow::Borrowed("Monitoring disabled"),
            event: None,
        }
    }

    fn offline(event: Event) -> Self {
        Self {
            status: EmitStatus::Offline,
            message: Cow::Borrowed("Monitor server not running"),
            event: Some(event),
        }
    }

    fn success(event: Event) -> Self {
        Self {
            status: EmitStatus::Success,
            message: Cow::Borrowed("Event emitted"),
            event: Some(event),
        }
    }

    fn error(message: String, event: Option<Event>) -> Self {
        Self {
            status: EmitStatus::Error,
            message: Cow::Owned(message),
            event,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EmitStatus::Success
    }
}

#[derive(Debug, thiserror::Error)]
enum EmitError {
    #[error("monitor unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("monitor answered {0}")]
    Status(reqwest::StatusCode),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl EmitError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        // is_request covers a pooled connection dropped by a stopped server
        if e.is_connect() || e.is_timeout() || e.is_request() {
            Self::Unreachable(e)
        } else {
            Self::Request(e)
        }
    }
}

pub struct Emitter {
    config: EmitterConfig,
    client: Option<reqwest::Client>,
    liveness: Mutex<LivenessCache>,
}

impl Emitter {
    /// Emitter configured from `WFMON_MONITOR` / `WFMON_URL`.
    pub fn from_env() -> Self {
        Self::new(EmitterConfig::from_env())
    }

    pub fn new(config: EmitterConfig) -> Self {
        // No client at all while disabled.
        let client = if config.enabled {
            match reqwest::Client::builder().no_proxy().build() {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to build monitor http client");
                    None
                }
            }
        } else {
            None
        };
        Self {
            liveness: Mutex::new(LivenessCache::new(config.probe_ttl)),
            config,
            client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Report one event to the monitor.
    pub async fn emit(&self, draft: EventDraft) -> EmitOutcome {
        if !self.config.enabled {
            return EmitOutcome::disabled();
        }

        let local = match draft.clone().into_event(Utc::now()) {
            Ok(event) => event,
            Err(e) => return EmitOutcome::error(format!("invalid event: {e}"), None),
        };

        let Some(client) = &self.client else {
            return EmitOutcome::error("monitor http client unavailable".to_string(), Some(local));
        };

        if !self.is_reachable(client).await {
            return EmitOutcome::offline(local);
        }

        match self.post_event(client, &draft).await {
            Ok(stored) => EmitOutcome::success(stored),
            Err(e) => {
                if matches!(e, EmitError::Unreachable(_)) {
                    self.liveness.lock().await.invalidate(Instant::now());
                }
                tracing::debug!(error = %e, agent = %local.agent, "emit failed");
                EmitOutcome::error(format!("Failed to emit event: {e}"), Some(local))
            }
        }
    }

    /// Cached liveness, refreshed by a short health probe once per TTL.
    ///
    /// The cache lock is held across the probe, so concurrent callers on a
    /// stale cache wait for one probe instead of each sending their own.
    async fn is_reachable(&self, client: &reqwest::Client) -> bool {
        let mut cache = self.liveness.lock().await;
        if let Some(reachable) = cache.cached(Instant::now()) {
            return reachable;
        }

        let reachable = self.probe(client).await;
        cache.record(reachable, Instant::now());
        reachable
    }

    async fn probe(&self, client: &reqwest::Client) -> bool {
        let result = client
            .get(self.config.endpoint("/health"))
            .timeout(self.config.probe_timeout)
            .send()
            .await;
        match result {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "monitor health probe failed");
                false
            }
        }
    }

    async fn post_event(&self, client: &reqwest::Client, draft: &EventDraft) -> Result<Event, EmitError> {
        let resp = client
            .post(self.config.endpoint("/api/events"))
            .timeout(self.config.emit_timeout)
            .json(draft)
            .send()
            .await
            .map_err(EmitError::from_reqwest)?;

        if !resp.status().is_success() {
            return Err(EmitError::Status(resp.status()));
        }
        resp.json::<Event>().await.map_err(EmitError::from_reqwest)
    }
}
