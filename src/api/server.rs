//! API server.
//!
//! Binds the router, layers the middleware stack, and serves until a
//! shutdown signal arrives. Shutdown is broadcast over a watch channel so
//! the integrity watchdog stops with the server.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::RgsConfig;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tokio::sync::watch;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

pub struct ApiServer {
    config: Arc<RgsConfig>,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: Arc<RgsConfig>, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// The full application with middleware. Exposed separately so tests can
    /// drive it without a socket.
    pub fn app(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
            // Request ID middleware (first for tracing)
            .layer(axum::middleware::from_fn(request_id_middleware))
            // CORS layer (before timeout to handle preflight)
            .layer(create_cors_layer(self.config.server.allowed_origins.clone()))
            // Timeout layer
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.server.request_timeout_secs,
            )))
            // Tracing layer (last for complete request tracing)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until ctrl-c/SIGTERM, then broadcast shutdown.
    pub async fn run(
        self,
        shutdown_tx: watch::Sender<bool>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.app();
        let addr = self.socket_addr()?;

        info!("Starting RGS API server");
        info!("   Listen: http://{}", addr);
        info!("   Dev mode: {}", self.config.dev);
        info!(
            "   Integrity verification: {}",
            if self.config.security.disable_hash_verification {
                "disabled"
            } else {
                "enabled"
            }
        );
        self.log_endpoints();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                // Stops the integrity watchdog alongside request handling.
                let _ = shutdown_tx.send(true);
            })
            .await?;

        info!("API server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.server.listen_address.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        )))
    }

    fn log_endpoints(&self) {
        info!("Available endpoints:");
        info!("   GET  /health                 - Health check");
        info!("   GET  /idle/:gameid/:session  - Game availability");
        info!("   POST /initialize             - Start a game round");
        info!("   POST /play                   - Play a game round");
        info!("   POST /recall                 - Recall past rounds");
        info!("   POST /recovery               - Recover an interrupted round");
        info!("   GET  /rng/:min/:max          - Uniform draws");
        info!("   GET  /shuffle/:list          - Shuffle a list");
        info!("   POST /distribution           - Weighted sample");
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
