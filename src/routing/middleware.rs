//! Middleware pipeline.
//!
//! # Responsibilities
//! - Run an ordered chain of middleware against one request
//! - Stop at the first middleware that halts
//!
//! # Design Decisions
//! - Strictly sequential, one request per call
//! - No error type: a halting middleware has already written its response
//! - Request and response are borrowed mutably for the whole chain

use std::sync::Arc;

use crate::deps::HandlerDependencies;
use crate::http::{ProxyRequest, ProxyResponse, RequestContext};
use crate::routing::{Middleware, Params};

/// Run `chain` in order. Returns `false` as soon as one middleware halts,
/// `true` if every middleware asked to continue (or the chain is empty).
pub async fn run_middleware(
    chain: &[&Arc<dyn Middleware>],
    ctx: &RequestContext,
    deps: &HandlerDependencies,
    req: &mut ProxyRequest,
    res: &mut ProxyResponse,
    params: &Params,
) -> bool {
    for (index, middleware) in chain.iter().enumerate() {
        if !middleware.handle(ctx, deps, req, res, params).await {
            tracing::debug!(
                request_id = %ctx.request_id(),
                index,
                status = res.status_code,
                "Middleware halted chain"
            );
            return false;
        }
    }
    true
}
