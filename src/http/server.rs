//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: every method and path goes to the pipeline
//! - Wire up middleware (request ID, tracing span per request)
//! - Serve on a listener until the shutdown broadcast fires

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;
use crate::http::forward::{Forward, HttpForwarder};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::pipeline::Gateway;

/// HTTP front of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    gateway: Arc<Gateway>,
}

impl HttpServer {
    /// Build a server that forwards over the pooled HTTP client.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let forwarder = Arc::new(HttpForwarder::new(&config.timeouts));
        Self::with_forwarder(config, forwarder)
    }

    /// Build a server around a custom transport.
    pub fn with_forwarder(config: GatewayConfig, forwarder: Arc<dyn Forward>) -> Result<Self, ConfigError> {
        let gateway = Arc::new(Gateway::from_config(&config, forwarder)?);
        let router = Self::build_router(gateway.clone());

        tracing::info!(routes = gateway.routes().len(), "Route table compiled");
        for rule in gateway.routes().rules() {
            tracing::debug!(
                route = %rule.name,
                prefix = %rule.matcher.prefix(),
                service = %rule.upstream.service,
                permission = rule.permission.as_deref().unwrap_or("-"),
                "Route"
            );
        }

        Ok(Self {
            router,
            config,
            gateway,
        })
    }

    fn build_router(gateway: Arc<Gateway>) -> Router {
        let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "request",
                request_id = %request_id,
                method = %request.method(),
                path = %request.uri().path(),
            )
        });

        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(gateway)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(trace)
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn gateway_handler(State(gateway): State<Arc<Gateway>>, request: Request<Body>) -> Response<Body> {
    gateway.handle(request).await
}
