use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::context::MonitorContext;
use crate::routes::router;

/// HTTP + WebSocket gateway bound to one address.
///
/// Owns the [`MonitorContext`] for its lifetime and tears it down when the
/// shutdown token fires.
pub struct GatewayServer {
    config: GatewayConfig,
    ctx: Arc<MonitorContext>,
    cancel: CancellationToken,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_cancel(config, CancellationToken::new())
    }

    pub fn with_cancel(config: GatewayConfig, cancel: CancellationToken) -> Self {
        let ctx = Arc::new(MonitorContext::new(&config, cancel.clone()));
        Self { config, ctx, cancel }
    }

    pub fn context(&self) -> Arc<MonitorContext> {
        Arc::clone(&self.ctx)
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Bind the listener and serve until cancelled.
    pub async fn run(&self) -> std::io::Result<()> {
        let (listener, _) = self.bind().await?;
        self.serve(listener).await
    }

    /// Bind to the configured address and return the actual local address.
    /// Useful when binding to port 0 to get an OS-assigned ephemeral port.
    pub async fn bind(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.config.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            capacity = self.config.capacity,
            max_connections = self.config.max_connections,
            dashboard = ?self.config.dashboard_dir,
            "gateway bound"
        );
        Ok((listener, local_addr))
    }

    /// Run the HTTP server on a pre-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        let app = router(Arc::clone(&self.ctx), self.config.dashboard_dir.as_deref());
        let cancel = self.cancel.clone();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await;

        tracing::info!("gateway: shutting down");
        self.ctx.shutdown();
        result
    }
}
