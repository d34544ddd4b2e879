//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Register routes per HTTP verb, with optional route-scoped middleware
//! - Hold the global middleware list and the fallthrough handler
//! - Resolve an inbound (method, path) and run the pipeline
//!
//! # Design Decisions
//! - Registration takes `&mut self`, dispatch takes `&self`: once the router
//!   is frozen behind an `Arc`, nothing can be registered concurrently
//! - No process-wide router; callers own their instances
//! - No match goes straight to the fallthrough handler, without middleware
//! - A matched path without the requested method is a distinct error, so the
//!   adapter can answer 405 instead of 404

use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::deps::HandlerDependencies;
use crate::http::{ProxyRequest, ProxyResponse, RequestContext};
use crate::routing::middleware::run_middleware;
use crate::routing::tree::{split_path, PathTree};
use crate::routing::{Handler, HandlerError, Middleware, Params};

/// A registered route: verb, pattern, terminal handler and route-scoped
/// middleware. Immutable once the router is frozen.
pub struct Route {
    method: Method,
    pattern: String,
    handler: Arc<dyn Handler>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Route-scoped middleware in execution order.
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Handle returned by registration, used to attach route-scoped middleware.
pub struct RouteHandle<'r> {
    route: &'r mut Route,
}

impl RouteHandle<'_> {
    /// Append a route-scoped middleware. Runs after all global middleware,
    /// in the order attached.
    pub fn with(self, middleware: impl Middleware + 'static) -> Self {
        self.route.middleware.push(Arc::new(middleware));
        self
    }
}

/// How a dispatch ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The terminal handler ran.
    Handled,
    /// A middleware halted the chain; its response stands.
    Halted,
    /// No route matched; the fallthrough handler ran.
    Fallthrough,
}

impl Dispatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dispatch::Handled => "handled",
            Dispatch::Halted => "halted",
            Dispatch::Fallthrough => "fallthrough",
        }
    }
}

/// Dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The path matched but nothing is registered for the method.
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed {
        method: String,
        path: String,
        allowed: Vec<Method>,
    },

    /// The terminal (or fallthrough) handler failed.
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

impl DispatchError {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchError::MethodNotAllowed { .. } => "method_not_allowed",
            DispatchError::Handler(_) => "handler_error",
        }
    }
}

/// Request router: path tree, global middleware and fallthrough handler.
pub struct Router {
    tree: PathTree<Route>,
    middleware: Vec<Arc<dyn Middleware>>,
    fallthrough: Arc<dyn Handler>,
    routes: Vec<(Method, String)>,
}

impl Router {
    /// Create an empty router. `fallthrough` runs when no route matches and
    /// is expected to write a "not found" response.
    pub fn new(fallthrough: impl Handler + 'static) -> Self {
        Self {
            tree: PathTree::new(),
            middleware: Vec::new(),
            fallthrough: Arc::new(fallthrough),
            routes: Vec::new(),
        }
    }

    /// Append a global middleware. Global middleware runs before any
    /// route-scoped middleware, in registration order.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Register `handler` for `method` at `pattern`. Registering the same
    /// pair again replaces the earlier route entirely.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler + 'static,
    ) -> RouteHandle<'_> {
        if !self
            .routes
            .iter()
            .any(|(m, p)| *m == method && p == pattern)
        {
            self.routes.push((method.clone(), pattern.to_string()));
        }

        let route = Route {
            method: method.clone(),
            pattern: pattern.to_string(),
            handler: Arc::new(handler),
            middleware: Vec::new(),
        };
        let route = self.tree.insert(method, pattern, route);
        RouteHandle { route }
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler + 'static) -> RouteHandle<'_> {
        self.route(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler + 'static) -> RouteHandle<'_> {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler + 'static) -> RouteHandle<'_> {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler + 'static) -> RouteHandle<'_> {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler + 'static) -> RouteHandle<'_> {
        self.route(Method::DELETE, pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: impl Handler + 'static) -> RouteHandle<'_> {
        self.route(Method::HEAD, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: impl Handler + 'static) -> RouteHandle<'_> {
        self.route(Method::OPTIONS, pattern, handler)
    }

    /// Registered (method, pattern) pairs in registration order.
    pub fn routes(&self) -> &[(Method, String)] {
        &self.routes
    }

    /// Global middleware in execution order.
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    pub fn tree(&self) -> &PathTree<Route> {
        &self.tree
    }

    /// Dispatch one request.
    ///
    /// `req` and `res` are the request-scoped objects every middleware and
    /// the handler read and write in turn. On success `req.path_parameters`
    /// holds the captured parameters.
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        req: &mut ProxyRequest,
        res: &mut ProxyResponse,
    ) -> Result<Dispatch, DispatchError> {
        let mut params = Params::new();
        let segments = split_path(&req.path);

        let Some(node) = self.tree.traverse(&segments, &mut params) else {
            tracing::debug!(
                request_id = %ctx.request_id(),
                method = %req.http_method,
                path = %req.path,
                "No route matched, using fallthrough handler"
            );
            req.path_parameters.clear();
            self.fallthrough
                .call(ctx, deps, req, res, &Params::new())
                .await?;
            return Ok(Dispatch::Fallthrough);
        };

        let route = Method::from_bytes(req.http_method.to_ascii_uppercase().as_bytes())
            .ok()
            .and_then(|method| node.methods().get(&method));

        let Some(route) = route else {
            return Err(DispatchError::MethodNotAllowed {
                method: req.http_method.clone(),
                path: req.path.clone(),
                allowed: node.allowed_methods(),
            });
        };

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %route.method,
            pattern = %route.pattern,
            params = params.len(),
            "Route matched"
        );

        req.path_parameters = params.to_map();

        let chain: Vec<&Arc<dyn Middleware>> =
            self.middleware.iter().chain(route.middleware.iter()).collect();
        if !run_middleware(&chain, ctx, deps, req, res, &params).await {
            return Ok(Dispatch::Halted);
        }

        route.handler.call(ctx, deps, req, res, &params).await?;
        Ok(Dispatch::Handled)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
