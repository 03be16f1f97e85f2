//! Gateway server assembly: middleware layers, bind, graceful shutdown.

use std::future::Future;

use axum::Router;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{ConfigError, GatewayConfig};
use crate::router::{build_router, AppState};

/// Errors raised while starting the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid gateway config: {0}")]
    Config(#[from] ConfigError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve the API until `shutdown` resolves.
pub async fn serve(
    config: &GatewayConfig,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), GatewayError> {
    config.validate()?;

    let mut router: Router = build_router(state).layer(TraceLayer::new_for_http());
    if config.cors {
        router = router.layer(CorsLayer::permissive());
    }

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("gateway stopped");
    Ok(())
}
