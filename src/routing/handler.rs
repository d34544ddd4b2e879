//! Terminal handler and middleware roles.
//!
//! Both roles receive the same five arguments: execution context, handler
//! dependencies, request, response and captured parameters. The response is
//! one request-scoped object mutated in place by every step, so a later step
//! observes everything an earlier one wrote.
//!
//! # Example
//!
//! ```rust,ignore
//! use event_router::routing::{handler_fn, middleware_fn};
//!
//! let show_user = handler_fn(|_ctx, _deps, _req, res, params| {
//!     Box::pin(async move {
//!         let id = params.get("id").unwrap_or_default();
//!         res.json(&serde_json::json!({ "id": id }))?;
//!         Ok(())
//!     })
//! });
//!
//! let require_json = middleware_fn(|_ctx, _deps, req, res, _params| {
//!     Box::pin(async move {
//!         if req.header("content-type") == Some("application/json") {
//!             return true;
//!         }
//!         res.set_status(415).text("expected application/json");
//!         false
//!     })
//! });
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::deps::HandlerDependencies;
use crate::http::{ProxyRequest, ProxyResponse, RequestContext};
use crate::routing::Params;

/// Failure reported by a terminal handler.
///
/// Dispatch hands it back to its caller unchanged; whatever the handler
/// already wrote to the response stays there.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }

    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        HandlerError::Other(Box::new(err))
    }
}

/// The terminal step of a route.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        req: &ProxyRequest,
        res: &mut ProxyResponse,
        params: &Params,
    ) -> Result<(), HandlerError>;
}

/// An interceptor run before the terminal handler.
///
/// Returns `true` to continue with the next step. Returning `false` halts
/// the chain; the middleware must have written a complete response first.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        req: &mut ProxyRequest,
        res: &mut ProxyResponse,
        params: &Params,
    ) -> bool;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn call(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        req: &ProxyRequest,
        res: &mut ProxyResponse,
        params: &Params,
    ) -> Result<(), HandlerError> {
        (**self).call(ctx, deps, req, res, params).await
    }
}

#[async_trait]
impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    async fn handle(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        req: &mut ProxyRequest,
        res: &mut ProxyResponse,
        params: &Params,
    ) -> bool {
        (**self).handle(ctx, deps, req, res, params).await
    }
}

/// Handler built from a closure. See [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap a closure returning a boxed future as a [`Handler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(
            &'a RequestContext,
            &'a HandlerDependencies,
            &'a ProxyRequest,
            &'a mut ProxyResponse,
            &'a Params,
        ) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync,
{
    HandlerFn { f }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(
            &'a RequestContext,
            &'a HandlerDependencies,
            &'a ProxyRequest,
            &'a mut ProxyResponse,
            &'a Params,
        ) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync,
{
    async fn call(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        req: &ProxyRequest,
        res: &mut ProxyResponse,
        params: &Params,
    ) -> Result<(), HandlerError> {
        (self.f)(ctx, deps, req, res, params).await
    }
}

/// Middleware built from a closure. See [`middleware_fn`].
pub struct MiddlewareFn<F> {
    f: F,
}

/// Wrap a closure returning a boxed future as a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> MiddlewareFn<F>
where
    F: for<'a> Fn(
            &'a RequestContext,
            &'a HandlerDependencies,
            &'a mut ProxyRequest,
            &'a mut ProxyResponse,
            &'a Params,
        ) -> BoxFuture<'a, bool>
        + Send
        + Sync,
{
    MiddlewareFn { f }
}

#[async_trait]
impl<F> Middleware for MiddlewareFn<F>
where
    F: for<'a> Fn(
            &'a RequestContext,
            &'a HandlerDependencies,
            &'a mut ProxyRequest,
            &'a mut ProxyResponse,
            &'a Params,
        ) -> BoxFuture<'a, bool>
        + Send
        + Sync,
{
    async fn handle(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        req: &mut ProxyRequest,
        res: &mut ProxyResponse,
        params: &Params,
    ) -> bool {
        (self.f)(ctx, deps, req, res, params).await
    }
}

/// Fallthrough handler that answers `404` with a JSON error body.
pub struct NotFound;

#[async_trait]
impl Handler for NotFound {
    async fn call(
        &self,
        _ctx: &RequestContext,
        _deps: &HandlerDependencies,
        req: &ProxyRequest,
        res: &mut ProxyResponse,
        _params: &Params,
    ) -> Result<(), HandlerError> {
        res.set_status(404);
        res.json(&serde_json::json!({
            "error": "not found",
            "status": 404,
            "path": req.path,
        }))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::InvocationSource;

    #[tokio::test]
    async fn test_handler_fn_writes_response() {
        let handler = handler_fn(|_ctx, _deps, req, res, params| {
            Box::pin(async move {
                let name = params.get("name").unwrap_or("anonymous");
                res.set_status(201).text(format!("{} {}", req.http_method, name));
                Ok(())
            })
        });

        let ctx = RequestContext::new(InvocationSource::Event);
        let deps = HandlerDependencies::new();
        let req = ProxyRequest::new("POST", "/greet/ada");
        let mut res = ProxyResponse::new();
        let params: Params = [("name", "ada")].into_iter().collect();

        handler.call(&ctx, &deps, &req, &mut res, &params).await.unwrap();
        assert_eq!(res.status_code, 201);
        assert_eq!(res.body, b"POST ada");
    }

    #[tokio::test]
    async fn test_middleware_fn_can_mutate_request() {
        let tag = middleware_fn(|_ctx, _deps, req, _res, _params| {
            Box::pin(async move {
                req.headers.insert("X-Tagged".into(), "yes".into());
                true
            })
        });

        let ctx = RequestContext::new(InvocationSource::Http);
        let deps = HandlerDependencies::new();
        let mut req = ProxyRequest::new("GET", "/");
        let mut res = ProxyResponse::new();

        assert!(tag.handle(&ctx, &deps, &mut req, &mut res, &Params::new()).await);
        assert_eq!(req.header("x-tagged"), Some("yes"));
    }

    #[tokio::test]
    async fn test_not_found_handler() {
        let ctx = RequestContext::new(InvocationSource::Event);
        let deps = HandlerDependencies::new();
        let req = ProxyRequest::new("GET", "/missing");
        let mut res = ProxyResponse::new();

        NotFound.call(&ctx, &deps, &req, &mut res, &Params::new()).await.unwrap();
        assert_eq!(res.status_code, 404);
        let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body["path"], "/missing");
    }
}
