//! CLI definition using clap derive.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wfmon_core::DEFAULT_CAPACITY;
use wfmon_gateway::DEFAULT_PORT;
use wfmon_gateway::config::DEFAULT_MAX_CONNECTIONS;

#[derive(Parser)]
#[command(name = "wfmon", about = "Real-time monitor for multi-agent workflows")]
pub struct Cli {
    /// Gateway host
    #[arg(long, global = true, env = "WFMON_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Gateway port
    #[arg(long, short = 'p', global = true, env = "WFMON_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr())
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway (HTTP ingest, WebSocket push, dashboard) until ctrl-c
    Serve(ServeOpts),
    /// Report one lifecycle event to a running gateway
    Emit(EmitOpts),
    /// Open the dashboard in the default browser
    Open,
    /// Print retained events (JSON)
    Events(EventsOpts),
    /// Print the current workflow state (JSON)
    State,
    /// Drop all retained events and reset state
    Clear,
}

#[derive(clap::Args)]
pub struct ServeOpts {
    /// Events retained before the oldest is evicted
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Directory holding the pre-built dashboard bundle
    #[arg(long, env = "WFMON_DASHBOARD_DIR")]
    pub dashboard_dir: Option<PathBuf>,

    /// Concurrent WebSocket viewers
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,

    /// Open the dashboard once the gateway is listening
    #[arg(long)]
    pub open: bool,
}

#[derive(clap::Args)]
pub struct EmitOpts {
    #[arg(long)]
    pub agent: String,

    /// start | end | error, or any progress label
    #[arg(long)]
    pub action: String,

    #[arg(long)]
    pub workflow: Option<String>,

    #[arg(long)]
    pub parent: Option<String>,

    /// JSON object attached to the event
    #[arg(long)]
    pub metadata: Option<String>,
}

#[derive(clap::Args)]
pub struct EventsOpts {
    /// Only the most recent N events
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}
