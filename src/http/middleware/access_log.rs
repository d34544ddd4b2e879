//! Access logging middleware.

use async_trait::async_trait;

use crate::deps::HandlerDependencies;
use crate::http::{ProxyRequest, ProxyResponse, RequestContext};
use crate::routing::{Middleware, Params};

/// Logs every routed request at `info` and continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

#[async_trait]
impl Middleware for AccessLog {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _deps: &HandlerDependencies,
        req: &mut ProxyRequest,
        _res: &mut ProxyResponse,
        params: &Params,
    ) -> bool {
        tracing::info!(
            request_id = %ctx.request_id(),
            source = ctx.source().as_str(),
            method = %req.http_method,
            path = %req.path,
            params = params.len(),
            user_agent = req.header("user-agent").unwrap_or("-"),
            "Request routed"
        );
        true
    }
}
