//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use event_router::deps::HandlerDependencies;
use event_router::http::{InvocationSource, ProxyRequest, ProxyResponse, RequestContext};
use event_router::routing::{handler_fn, middleware_fn, Dispatch, DispatchError, Handler, Middleware, Router};

/// Append-only log shared between middleware and handlers under test.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Middleware that records `name` and then continues (or halts when
/// `proceed` is false, after writing a 403).
pub fn recording_middleware(log: &CallLog, name: &'static str, proceed: bool) -> impl Middleware {
    let log = log.clone();
    middleware_fn(move |_ctx, _deps, _req, res, _params| {
        log.push(name);
        Box::pin(async move {
            if !proceed {
                res.set_status(403).text(format!("halted by {name}"));
            }
            proceed
        })
    })
}

/// Terminal handler that records `name` and writes it as the body.
pub fn recording_handler(log: &CallLog, name: &'static str) -> impl Handler {
    let log = log.clone();
    handler_fn(move |_ctx, _deps, _req, res, _params| {
        log.push(name);
        Box::pin(async move {
            res.text(name);
            Ok(())
        })
    })
}

/// Dispatch `method path` through `router` as an event invocation.
pub async fn dispatch(
    router: &Router,
    method: &str,
    path: &str,
) -> (Result<Dispatch, DispatchError>, ProxyRequest, ProxyResponse) {
    let ctx = RequestContext::new(InvocationSource::Event);
    let deps = HandlerDependencies::new();
    let mut req = ProxyRequest::new(method, path);
    let mut res = ProxyResponse::new();
    let outcome = router.dispatch(&ctx, &deps, &mut req, &mut res).await;
    (outcome, req, res)
}
