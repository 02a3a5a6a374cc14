//! HTTP dev server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Serve the plugin's `build/` folder
//! - Expose the enqueue plan per hook as JSON
//! - Wire up middleware (header filters, timeout, tracing)
//! - Apply configuration reloads without restarting

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use arc_swap::ArcSwap;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::middleware::header_filter_middleware;
use crate::security::filters::FilterChain;
use crate::site::{AssetHook, AssetQueue, Environment, PluginAssets};

/// Everything derived from one configuration snapshot.
pub struct Runtime {
    pub config: AppConfig,
    pub filters: FilterChain,
    pub assets: PluginAssets,
}

impl Runtime {
    pub fn new(config: AppConfig) -> Self {
        let filters = FilterChain::for_config(&config.headers, &config.dev);
        let assets = PluginAssets::new(config.build_paths());
        Self { config, filters, assets }
    }

    pub fn environment(&self) -> Environment {
        self.config.site.environment
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    runtime: Arc<ArcSwap<Runtime>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            runtime: Arc::new(ArcSwap::from_pointee(Runtime::new(config))),
        }
    }

    /// Current configuration snapshot.
    pub fn runtime(&self) -> Arc<Runtime> {
        self.runtime.load_full()
    }

    /// Swap in a new configuration and rebuild the filter chain.
    pub fn reload(&self, config: AppConfig) {
        let previous = self.runtime();
        if previous.config.server != config.server {
            tracing::warn!("Server settings changed; restart to apply bind address and timeout");
        }
        if previous.config.site.plugin_path != config.site.plugin_path {
            tracing::warn!("Plugin path changed; restart to serve the new build folder");
        }
        let runtime = Runtime::new(config);
        tracing::info!(
            environment = %runtime.environment(),
            filters = ?runtime.filters.stage_names(),
            "Configuration reloaded"
        );
        self.runtime.store(Arc::new(runtime));
    }
}

/// Development server for the plugin's build artifacts.
pub struct DevServer {
    router: Router,
    state: AppState,
}

impl DevServer {
    /// Create a new dev server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let state = AppState::new(config.clone());
        let router = Self::build_router(&config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let build_dir = config.build_paths().build_file_path("");

        let routes = Router::new()
            .route("/health", get(health_handler))
            .route("/assets/{hook}", get(assets_handler))
            .nest_service("/build", ServeDir::new(build_dir));
        Self::with_layers(routes, config, state)
    }

    /// Header filters wrap the timeout so 408 responses are filtered too.
    #[allow(deprecated)]
    fn with_layers(routes: Router<AppState>, config: &AppConfig, state: AppState) -> Router {
        routes
            .with_state(state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(middleware::from_fn_with_state(state, header_filter_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Router for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.state.runtime().environment(),
            "Dev server starting"
        );

        let state = self.state.clone();
        let reloads = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.reload(config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloads.abort();
        tracing::info!("Dev server stopped");
        Ok(())
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "environment": state.runtime().environment(),
    }))
}

async fn assets_handler(State(state): State<AppState>, Path(hook): Path<String>) -> Response {
    match hook.parse::<AssetHook>() {
        Ok(hook) => {
            let runtime = state.runtime();
            Json(AssetQueue::for_hook(&runtime.assets, hook)).into_response()
        }
        Err(e) => {
            tracing::debug!(hook = %hook, "Unknown asset hook requested");
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_timeout_response_is_filtered() {
        let mut config = AppConfig::default();
        config.site.environment = Environment::Local;
        config.server.request_timeout_secs = 1;
        config.headers.content_security_policy = Some("connect-src 'self'".to_string());
        config.dev.ports = vec![3000];

        let routes = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );
        let app = DevServer::with_layers(routes, &config, AppState::new(config.clone()));

        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers()[header::CONTENT_SECURITY_POLICY],
            "connect-src 'self' ws://localhost:3000 wss://localhost:3000 http://localhost:3000 https://localhost:3000 "
        );
    }
}
