//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that funnels every method and path into one handler
//! - Wire up tower layers (tracing, request timeout)
//! - Assign or propagate the request ID
//! - Hand structured requests to the event router
//! - Serve until the shutdown signal fires, draining in-flight requests

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::deps::HandlerDependencies;
use crate::event;
use crate::http::adapter::{from_structured_response, to_structured_request};
use crate::http::{InvocationSource, RequestContext, X_REQUEST_ID};
use crate::routing::Router as EventRouter;

/// Application state injected into the catch-all handler.
#[derive(Clone)]
pub struct GatewayState {
    pub router: Arc<EventRouter>,
    pub deps: Arc<HandlerDependencies>,
    pub body_limit: usize,
    pub request_timeout: Duration,
}

/// Local HTTP front end for an [`EventRouter`].
pub struct GatewayServer {
    app: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server for a fully registered router.
    pub fn new(
        config: GatewayConfig,
        router: Arc<EventRouter>,
        deps: Arc<HandlerDependencies>,
    ) -> Self {
        let state = GatewayState {
            router,
            deps,
            body_limit: config.listener.max_body_bytes,
            request_timeout: config.timeouts.request_timeout(),
        };
        let app = Self::build_app(&config, state);
        Self { app, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &GatewayConfig, state: GatewayState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(config.timeouts.request_timeout())),
            )
    }

    /// The Axum application, for embedding or in-process testing.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            max_body_bytes = self.config.listener.max_body_bytes,
            "HTTP server starting"
        );

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: adapt, dispatch, adapt back.
async fn gateway_handler(State(state): State<GatewayState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext::with_request_id(InvocationSource::Http, request_id)
        .with_timeout(state.request_timeout);

    let structured = to_structured_request(request, state.body_limit).await;
    let response = event::handle_event(&state.router, &ctx, &state.deps, structured).await;

    let mut response = from_structured_response(response);
    if let Ok(value) = HeaderValue::from_str(ctx.request_id()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{handler_fn, NotFound};
    use tower::ServiceExt;

    fn server() -> GatewayServer {
        let mut router = EventRouter::new(NotFound);
        router.get(
            "/hello/:name",
            handler_fn(|_ctx, _deps, req, res, _params| {
                Box::pin(async move {
                    let name = req.path_param("name").unwrap_or_default().to_string();
                    res.set_header("Content-Type", "text/plain").text(format!("hello {name}"));
                    Ok(())
                })
            }),
        );
        GatewayServer::new(
            GatewayConfig::default(),
            Arc::new(router),
            Arc::new(HandlerDependencies::new()),
        )
    }

    #[tokio::test]
    async fn test_routes_through_event_router() {
        let response = server()
            .app()
            .oneshot(
                Request::builder()
                    .uri("/hello/ada")
                    .header(X_REQUEST_ID, "req-7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[X_REQUEST_ID], "req-7");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello ada");
    }

    #[tokio::test]
    async fn test_generates_request_id_and_maps_405() {
        let response = server()
            .app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/hello/ada")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 405);
        assert_eq!(response.headers()["allow"], "GET");
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }
}
