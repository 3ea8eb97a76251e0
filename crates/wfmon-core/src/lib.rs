//! wfmon-core: event model, state reducer and the bounded event log.
//!
//! Pure library with no async runtime and no IO. The gateway wraps
//! [`EventLog`] in a single lock; everything here is plain `&mut self`.

pub mod log;
pub mod state;
pub mod types;

pub use log::{DEFAULT_CAPACITY, EventLog};
pub use state::{MonitorState, Phase};
pub use types::{ActionKind, Event, EventDraft, Metadata, ValidationError};
