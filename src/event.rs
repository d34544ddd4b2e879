//! Structured-event entry point.
//!
//! # Data Flow
//! ```text
//! JSON envelope ──▶ handle_event_json ──┐
//!                                       ├──▶ handle_event ──▶ Router::dispatch
//! HTTP (adapter) ───────────────────────┘          │
//!                                                  ▼
//!                             ProxyResponse (dispatch errors mapped to 405/500)
//! ```
//!
//! Both the socket server and envelope invocations finish here, so the same
//! handlers produce the same responses on either path.

use std::time::Duration;

use thiserror::Error;
use tracing::Instrument;

use crate::deps::HandlerDependencies;
use crate::http::{InvocationSource, ProxyRequest, ProxyResponse, RequestContext, X_REQUEST_ID};
use crate::observability::{logging, metrics};
use crate::routing::{DispatchError, Router};

/// Errors on the envelope path. Dispatch failures are not errors here; they
/// are mapped onto the response.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("invalid event envelope: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode response envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Dispatch one structured request and produce its response.
///
/// A base64 request body is decoded first, so handlers see the same bytes
/// they would over the socket.
pub async fn handle_event(
    router: &Router,
    ctx: &RequestContext,
    deps: &HandlerDependencies,
    mut request: ProxyRequest,
) -> ProxyResponse {
    let mut response = ProxyResponse::new();
    let span = logging::request_span(ctx, &request);

    if let Err(e) = request.decode_body() {
        tracing::warn!(
            request_id = %ctx.request_id(),
            error = %e,
            "Invalid base64 body, treating as empty"
        );
    }

    let result = router
        .dispatch(ctx, deps, &mut request, &mut response)
        .instrument(span)
        .await;
    let outcome = match result {
        Ok(dispatch) => dispatch.as_str(),
        Err(err) => {
            match &err {
                DispatchError::MethodNotAllowed { .. } => tracing::debug!(
                    request_id = %ctx.request_id(),
                    error = %err,
                    "Dispatch rejected"
                ),
                DispatchError::Handler(_) => tracing::error!(
                    request_id = %ctx.request_id(),
                    method = %request.http_method,
                    path = %request.path,
                    error = %err,
                    "Handler failed"
                ),
            }
            response.apply_dispatch_error(&err);
            err.as_str()
        }
    };

    metrics::record_dispatch(
        &request.http_method,
        ctx.source(),
        outcome,
        response.status_code,
        ctx.started_at(),
    );

    response
}

/// Decode a JSON envelope, dispatch it and encode the response envelope.
///
/// Binary response bodies come back base64 encoded with `isBase64Encoded`
/// set.
///
/// The request ID comes from the envelope's `X-Request-Id` header when one
/// is present.
pub async fn handle_event_json(
    router: &Router,
    deps: &HandlerDependencies,
    payload: &[u8],
    timeout: Option<Duration>,
) -> Result<Vec<u8>, EventError> {
    let request: ProxyRequest = serde_json::from_slice(payload).map_err(EventError::Decode)?;

    let mut ctx = match request.header(X_REQUEST_ID) {
        Some(id) => RequestContext::with_request_id(InvocationSource::Event, id),
        None => RequestContext::new(InvocationSource::Event),
    };
    if let Some(timeout) = timeout {
        ctx = ctx.with_timeout(timeout);
    }

    let mut response = handle_event(router, &ctx, deps, request).await;
    response.encode_body();
    serde_json::to_vec(&response).map_err(EventError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{handler_fn, HandlerError, NotFound};
    use base64::prelude::*;

    fn router() -> Router {
        let mut router = Router::new(NotFound);
        router.get(
            "/users/:id",
            handler_fn(|ctx, _deps, req, res, _params| {
                Box::pin(async move {
                    res.json(&serde_json::json!({
                        "id": req.path_param("id"),
                        "requestId": ctx.request_id(),
                    }))?;
                    Ok(())
                })
            }),
        );
        router.post(
            "/fail",
            handler_fn(|_ctx, _deps, _req, _res, _params| {
                Box::pin(async move { Err(HandlerError::msg("boom")) })
            }),
        );
        router.post(
            "/echo",
            handler_fn(|_ctx, _deps, req, res, _params| {
                Box::pin(async move {
                    res.body = req.body.clone();
                    Ok(())
                })
            }),
        );
        router.get(
            "/logo.png",
            handler_fn(|_ctx, _deps, _req, res, _params| {
                Box::pin(async move {
                    res.set_header("Content-Type", "image/png");
                    res.body = vec![0x89, 0x50, 0xff, 0xfe, 0x00];
                    Ok(())
                })
            }),
        );
        router
    }

    #[tokio::test]
    async fn test_json_envelope_round_trip() {
        let router = router();
        let deps = HandlerDependencies::new();
        let payload = br#"{
            "httpMethod": "GET",
            "path": "/users/42",
            "headers": {"X-Request-Id": "evt-1"},
            "body": null,
            "isBase64Encoded": false
        }"#;

        let out = handle_event_json(&router, &deps, payload, None).await.unwrap();
        let response: ProxyResponse = serde_json::from_slice(&out).unwrap();
        assert_eq!(response.status_code, 200);

        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["id"], "42");
        assert_eq!(body["requestId"], "evt-1");
    }

    #[tokio::test]
    async fn test_dispatch_errors_become_statuses() {
        let router = router();
        let deps = HandlerDependencies::new();
        let ctx = RequestContext::new(InvocationSource::Event);

        let res = handle_event(&router, &ctx, &deps, ProxyRequest::new("DELETE", "/users/1")).await;
        assert_eq!(res.status_code, 405);
        assert_eq!(res.header("Allow"), Some("GET"));

        let res = handle_event(&router, &ctx, &deps, ProxyRequest::new("POST", "/fail")).await;
        assert_eq!(res.status_code, 500);

        let res = handle_event(&router, &ctx, &deps, ProxyRequest::new("GET", "/elsewhere")).await;
        assert_eq!(res.status_code, 404);
    }

    #[tokio::test]
    async fn test_base64_request_body_is_decoded() {
        let router = router();
        let deps = HandlerDependencies::new();
        let payload = br#"{"httpMethod": "POST", "path": "/echo", "body": "aGVsbG8=", "isBase64Encoded": true}"#;

        let out = handle_event_json(&router, &deps, payload, None).await.unwrap();
        let response: ProxyResponse = serde_json::from_slice(&out).unwrap();
        assert_eq!(response.body, b"hello");
        assert!(!response.is_base64_encoded);
    }

    #[tokio::test]
    async fn test_binary_response_body_is_base64_encoded() {
        let router = router();
        let deps = HandlerDependencies::new();
        let payload = br#"{"httpMethod": "GET", "path": "/logo.png"}"#;

        let out = handle_event_json(&router, &deps, payload, None).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(envelope["isBase64Encoded"], true);

        let encoded = envelope["body"].as_str().unwrap();
        assert_eq!(
            BASE64_STANDARD.decode(encoded).unwrap(),
            vec![0x89, 0x50, 0xff, 0xfe, 0x00]
        );
    }

    #[tokio::test]
    async fn test_malformed_envelope() {
        let router = router();
        let deps = HandlerDependencies::new();
        let err = handle_event_json(&router, &deps, b"not json", None).await.unwrap_err();
        assert!(matches!(err, EventError::Decode(_)));
    }
}
