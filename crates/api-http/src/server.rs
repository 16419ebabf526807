//! HTTP Server
//!
//! Binds the router and serves it until the shutdown token fires.

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use stemflow_core::application::ShutdownToken;

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 3000;

/// HTTP Server Configuration
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig) -> Self {
        Self { config }
    }

    /// Serve `router` until `shutdown` fires, then drain gracefully.
    pub async fn start(self, router: Router, mut shutdown: ShutdownToken) -> Result<(), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind {addr}: {e}"))?;

        info!(addr = %addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| format!("HTTP server error: {e}"))
    }
}
