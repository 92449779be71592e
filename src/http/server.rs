//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with redirect middleware and the forwarding handler
//! - Wire up tower-http layers (tracing, request ID, timeout)
//! - Forward pass-through requests to the upstream application
//! - Swap the site snapshot when a reloaded config arrives
//! - Stop accepting on the shutdown signal

use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::validation::{validate_config, ValidationError};
use crate::config::{ConfigError, GatewayConfig};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::observability::metrics;
use crate::redirect::{legacy_redirects, mark_admin_area, url_redirects, RedirectState, Site};

/// State for the forwarding handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server for the redirect gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    redirects: RedirectState,
}

impl HttpServer {
    /// Create a new HTTP server. An invalid site or upstream is fatal here.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let site = Site::from_config(&config.site)
            .map_err(|e| ConfigError::Validation(vec![ValidationError::SiteUrl(e)]))?;
        let upstream = Authority::from_str(&config.upstream.address).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::Address {
                field: "upstream.address",
                value: config.upstream.address.clone(),
            }])
        })?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = AppState { client, upstream };
        let redirects = RedirectState::new(site);

        let router = Self::build_router(&config, state, redirects.clone());
        Ok(Self {
            router,
            config,
            redirects,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, redirects: RedirectState) -> Router {
        Router::new()
            .fallback(forward_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(redirects.clone(), url_redirects))
            .layer(middleware::from_fn_with_state(redirects.clone(), mark_admin_area))
            .layer(middleware::from_fn_with_state(redirects, legacy_redirects))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires, applying config reloads as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let Self {
            router,
            config,
            redirects,
        } = self;

        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            site_url = %config.site.url,
            upstream = %config.upstream.address,
            "HTTP server starting"
        );

        let reload_task = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_reload(&redirects, &config, &new_config);
            }
        });

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Handle on the live redirect state (for programmatic reloads).
    pub fn redirect_state(&self) -> RedirectState {
        self.redirects.clone()
    }
}

fn apply_reload(redirects: &RedirectState, running: &GatewayConfig, new_config: &GatewayConfig) {
    if new_config.listener.bind_address != running.listener.bind_address
        || new_config.upstream.address != running.upstream.address
    {
        tracing::warn!("Listener and upstream changes take effect after a restart");
    }

    match Site::from_config(&new_config.site) {
        Ok(site) => {
            redirects.store(site);
            tracing::info!(site_url = %new_config.site.url, "Site configuration reloaded");
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected reloaded site configuration");
        }
    }
}

/// Forward a request that was not redirected to the upstream application.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (mut parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Failed to build upstream URI");
            metrics::record_request(&method, 502, start_time);
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Forwarding request");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Upstream error");
            metrics::record_request(&method, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
