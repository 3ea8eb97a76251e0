//! `wfmon serve`: gateway lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use wfmon_gateway::{GatewayConfig, GatewayServer};

use crate::browser;
use crate::cli::ServeOpts;

pub(crate) fn gateway_config(addr: SocketAddr, opts: &ServeOpts) -> GatewayConfig {
    let config = GatewayConfig::default()
        .with_addr(addr)
        .with_capacity(opts.capacity)
        .with_max_connections(opts.max_connections);
    match &opts.dashboard_dir {
        Some(dir) => config.with_dashboard_dir(dir.clone()),
        None => config,
    }
}

/// Serve until ctrl-c, then close every viewer and exit.
pub async fn cmd_serve(addr: SocketAddr, opts: &ServeOpts) -> anyhow::Result<()> {
    if let Some(dir) = &opts.dashboard_dir
        && !dir.is_dir()
    {
        anyhow::bail!("dashboard directory not found: {}", dir.display());
    }

    let cancel = CancellationToken::new();
    let server = Arc::new(GatewayServer::with_cancel(
        gateway_config(addr, opts),
        cancel.clone(),
    ));

    let (listener, local_addr) = server
        .bind()
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind {addr}: {e}"))?;
    println!("wfmon listening on http://{local_addr}");

    if opts.open
        && let Err(e) = browser::open_url(&format!("http://{local_addr}/"))
    {
        tracing::warn!(error = %e, "could not open dashboard");
    }

    let serve = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve(listener).await })
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();

    serve.await??;
    Ok(())
}
