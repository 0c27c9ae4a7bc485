//! # HTTP server
//!
//! Builds the axum router with its middleware stack and serves it until ctrl-c.

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::from_fn;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::request_id::request_id_middleware;
use super::routes::create_routes;
use crate::app::AppContext;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::{linfo, lwarn, logging::{LogComponent, LogStage}};

/// Handler state: a cheap handle on the shared [`AppContext`].
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if config.cors_origins.is_empty() {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Startup,
                    LogComponent::ServerSetup,
                    "cors_config",
                    &format!("ignoring invalid CORS origin '{origin}': {e}")
                );
                None
            }
        })
        .collect();
    Some(layer.allow_origin(origins))
}

/// Full application router with tracing, CORS and request ids.
pub fn build_router(context: Arc<AppContext>) -> Router {
    let cors = cors_layer(&context.config.server);
    let mut app = create_routes(AppState::new(context));

    if let Some(cors) = cors {
        app = app.layer(cors);
    }
    app.layer(
        ServiceBuilder::new()
            .layer(from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http()),
    )
}

/// Bind the configured address and serve until shutdown is requested.
pub async fn serve(context: Arc<AppContext>) -> Result<()> {
    let bind_address = context.config.server.bind_address();
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        AppError::config_with_source(format!("invalid bind address '{bind_address}'"), e)
    })?;

    let listener = TcpListener::bind(addr).await?;
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::ServerSetup,
        "server_start",
        &format!("listening on {addr}")
    );

    axum::serve(listener, build_router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "server_stop",
        "server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "shutdown_signal",
            &format!("could not listen for ctrl-c: {e}")
        );
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_disabled_without_origins() {
        let config = ServerConfig {
            cors_origins: Vec::new(),
            ..ServerConfig::default()
        };
        assert!(cors_layer(&config).is_none());

        let config = ServerConfig {
            cors_origins: vec!["https://app.example.com".to_string(), "bad\nvalue".to_string()],
            ..ServerConfig::default()
        };
        assert!(cors_layer(&config).is_some());
    }
}
