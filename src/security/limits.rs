//! Request size limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//!
//! # Design Decisions
//! - Checks both the declared `Content-Length` and the actual body, since
//!   event envelopes arrive without a trustworthy length header
//! - Return 413 Payload Too Large and halt the chain

use async_trait::async_trait;

use crate::deps::HandlerDependencies;
use crate::http::{ProxyRequest, ProxyResponse, RequestContext};
use crate::routing::{Middleware, Params};

/// Middleware rejecting bodies larger than `max_bytes`.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    max_bytes: usize,
}

impl BodyLimit {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    fn exceeded(&self, req: &ProxyRequest) -> Option<usize> {
        let declared = req
            .header("content-length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let size = declared.max(req.body.len());
        (size > self.max_bytes).then_some(size)
    }
}

#[async_trait]
impl Middleware for BodyLimit {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _deps: &HandlerDependencies,
        req: &mut ProxyRequest,
        res: &mut ProxyResponse,
        _params: &Params,
    ) -> bool {
        let Some(size) = self.exceeded(req) else {
            return true;
        };

        tracing::warn!(
            request_id = %ctx.request_id(),
            size,
            limit = self.max_bytes,
            "Request body too large"
        );

        res.set_status(413);
        if res
            .json(&serde_json::json!({
                "error": "payload too large",
                "status": 413,
                "limit": self.max_bytes,
            }))
            .is_err()
        {
            res.text("payload too large");
        }
        false
    }
}
