use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use wfmon_core::DEFAULT_CAPACITY;

/// Default HTTP/WebSocket port.
pub const DEFAULT_PORT: u16 = 8000;

/// Number of recent events carried by the `init` handshake frame.
pub const INIT_EVENT_LIMIT: usize = 100;

/// Default maximum number of concurrent viewer connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Default depth of each viewer's outbound frame queue.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    /// Retained events before the oldest is evicted.
    pub capacity: usize,
    pub init_limit: usize,
    pub max_connections: usize,
    /// Frames a viewer may fall behind before it is dropped as too slow.
    pub outbound_queue: usize,
    /// Pre-built dashboard bundle served under `/`.
    pub dashboard_dir: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            capacity: DEFAULT_CAPACITY,
            init_limit: INIT_EVENT_LIMIT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            dashboard_dir: None,
        }
    }
}

impl GatewayConfig {
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_dashboard_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dashboard_dir = Some(dir.into());
        self
    }
}
