//! Best-effort event reporting for instrumented agent processes.
//!
//! Emission is opt-in via `WFMON_MONITOR`. A disabled or unreachable monitor
//! never raises into the caller; see [`EmitStatus`] for the outcomes.

pub mod config;
pub mod emitter;
pub mod liveness;

pub use config::{DEFAULT_URL, ENABLE_ENV, EmitterConfig, URL_ENV, is_truthy};
pub use emitter::{EmitOutcome, EmitStatus, Emitter};
pub use liveness::LivenessCache;
pub use wfmon_core::EventDraft;
