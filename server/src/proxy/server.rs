//! HTTP Server
//!
//! Binds the configured address and serves the router until the shutdown
//! signal fires.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use super::{router, AppState};

/// Server wrapper owning the shutdown channel
pub struct ProxyServer {
    state: Arc<AppState>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,
}

impl ProxyServer {
    pub fn new(state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { state, shutdown_tx }
    }

    /// Get a shutdown receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(self.state.config.bind_addr).await
    }

    /// Serve on `listener` until `shutdown` is called.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        let addr: SocketAddr = listener.local_addr()?;
        info!("HTTP server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, router(Arc::clone(&self.state)))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutting down");
            })
            .await
    }
}
