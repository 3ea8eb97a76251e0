//! wfmon-gateway: ingests lifecycle events over HTTP and WebSocket, keeps the
//! bounded log, and fans every new event out to the live viewers.

pub mod config;
pub mod context;
pub mod error;
pub mod frame;
pub mod registry;
pub mod routes;
pub mod server;
pub mod ws;

#[cfg(test)]
mod test_support;

pub use config::{DEFAULT_PORT, GatewayConfig};
pub use context::MonitorContext;
pub use error::{DeliveryError, GatewayError};
pub use frame::PushFrame;
pub use registry::{BroadcastReport, Connection, ConnectionId, ConnectionRegistry, Registration};
pub use server::GatewayServer;
pub use wfmon_core as core;
