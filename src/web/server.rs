//! Web server for ijara.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::auth::PhoneVerificationStore;
use crate::config::Config;
use crate::{IjaraError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::{create_health_router, create_router, create_swagger_router};

/// Sweep interval for expired verifications and idle rate limiters.
const CLEANUP_INTERVAL_SECS: u64 = 60;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Login rate limiting state.
    rate_limit: Arc<RateLimitState>,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| IjaraError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            rate_limit: Arc::new(RateLimitState::new(config.auth.login_rate_limit)),
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the cleanup background task.
    ///
    /// Drops expired phone verifications and rate limiters nobody holds.
    fn start_cleanup_task(
        verifications: Arc<PhoneVerificationStore>,
        rate_limit: Arc<RateLimitState>,
    ) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let removed = verifications.sweep();
                if removed > 0 {
                    tracing::info!(removed_count = removed, "Swept expired phone verifications");
                } else {
                    tracing::debug!("No expired phone verifications to sweep");
                }

                rate_limit.cleanup();
            }
        });
    }

    /// Assemble the full router and start the cleanup task.
    fn into_router(self) -> axum::Router {
        let verifications = self.app_state.verifications.clone();
        Self::start_cleanup_task(verifications, self.rate_limit.clone());

        create_router(self.app_state, self.rate_limit, &self.cors_origins)
            .merge(create_health_router())
            .merge(create_swagger_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.into_router();
        tracing::info!("Cleanup task started (runs every {}s)", CLEANUP_INTERVAL_SECS);
        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.into_router();
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            let service = router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
