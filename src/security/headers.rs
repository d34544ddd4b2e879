//! Security response headers.
//!
//! # Responsibilities
//! - Add standard hardening headers to every response
//!
//! # Design Decisions
//! - Runs as ordinary router middleware; register it ahead of any middleware
//!   that may halt (e.g. `BodyLimit`) so rejections carry the headers
//! - Fallthrough and method-not-allowed responses bypass middleware and go
//!   out without these headers
//! - Never overwrites a header a previous step already chose

use async_trait::async_trait;

use crate::deps::HandlerDependencies;
use crate::http::{ProxyRequest, ProxyResponse, RequestContext};
use crate::routing::{Middleware, Params};

const DEFAULT_HEADERS: [(&str, &str); 4] = [
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "no-referrer"),
    ("Cache-Control", "no-store"),
];

/// Middleware adding a fixed set of response headers.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(String, String)>,
}

impl SecurityHeaders {
    pub fn new() -> Self {
        Self {
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Add (or replace) one header in the set.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for SecurityHeaders {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        _deps: &HandlerDependencies,
        _req: &mut ProxyRequest,
        res: &mut ProxyResponse,
        _params: &Params,
    ) -> bool {
        for (name, value) in &self.headers {
            if res.header(name).is_none() {
                res.set_header(name.clone(), value.clone());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::InvocationSource;
    use crate::routing::{handler_fn, Dispatch, NotFound, Router};
    use crate::security::BodyLimit;

    #[tokio::test]
    async fn test_adds_headers_and_continues() {
        let ctx = RequestContext::new(InvocationSource::Event);
        let deps = HandlerDependencies::new();
        let mut req = ProxyRequest::new("GET", "/");
        let mut res = ProxyResponse::new();
        res.set_header("X-Frame-Options", "SAMEORIGIN");

        let mw = SecurityHeaders::new().with_header("Strict-Transport-Security", "max-age=63072000");
        assert!(mw.handle(&ctx, &deps, &mut req, &mut res, &Params::new()).await);

        assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(res.header("X-Frame-Options"), Some("SAMEORIGIN"));
        assert_eq!(res.header("strict-transport-security"), Some("max-age=63072000"));
    }

    #[tokio::test]
    async fn test_rejection_by_later_middleware_keeps_headers() {
        let mut router = Router::new(NotFound);
        router.use_middleware(SecurityHeaders::new());
        router.use_middleware(BodyLimit::new(4));
        router.post(
            "/upload",
            handler_fn(|_ctx, _deps, _req, _res, _params| Box::pin(async { Ok(()) })),
        );

        let ctx = RequestContext::new(InvocationSource::Http);
        let deps = HandlerDependencies::new();
        let mut req = ProxyRequest::new("POST", "/upload");
        req.body = b"far too large".to_vec();
        let mut res = ProxyResponse::new();

        let outcome = router.dispatch(&ctx, &deps, &mut req, &mut res).await.unwrap();
        assert_eq!(outcome, Dispatch::Halted);
        assert_eq!(res.status_code, 413);
        assert_eq!(res.header("X-Content-Type-Options"), Some("nosniff"));
    }
}
