//! HTTP ingress: owns the listener and the middleware stack shared by every route.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{middleware::from_fn, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod error;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Resolve the listen address: `bind_addr` when set, else `host:port`.
    pub fn resolve_bind_addr(&self, host: &str, port: u16) -> Result<SocketAddr> {
        let raw = match &self.config.bind_addr {
            Some(addr) => addr.clone(),
            None => format!("{host}:{port}"),
        };
        raw.parse()
            .with_context(|| format!("Invalid bind address '{raw}'"))
    }

    /// Wrap the application routes with `/health` and the middleware stack.
    pub fn build_router(&self, app: Router) -> Result<Router> {
        tracing::debug!("Building router");
        let mut router = app.route("/health", get(web::health_check));

        // Outermost to innermost:
        // PropagateRequestId -> SetRequestId -> push_req_id_to_extensions -> Trace -> Timeout -> CORS -> BodyLimit
        // The last layer added is the outermost.
        let x_request_id = request_id::header();

        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if let Some(cors) = self.cors_layer()? {
            router = router.layer(cors);
        }

        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            self.config.request_timeout_secs,
        )));
        router = router.layer(request_id::create_trace_layer());
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            request_id::MakeReqId,
        ));
        router = router.layer(PropagateRequestIdLayer::new(x_request_id));

        Ok(router)
    }

    fn cors_layer(&self) -> Result<Option<CorsLayer>> {
        let origins = &self.config.cors_allowed_origins;
        if origins.is_empty() {
            return Ok(None);
        }
        if origins.iter().any(|o| o == "*") {
            return Ok(Some(CorsLayer::permissive()));
        }

        let parsed = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{o}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        ))
    }

    /// Serve `router` on `addr` until `cancel` fires.
    pub async fn serve(router: Router, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);

        // Graceful shutdown on cancel
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
