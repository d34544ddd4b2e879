//! End-to-end tests driving the local HTTP gateway over a real socket.

use std::sync::Arc;
use std::time::Duration;

use event_router::config::GatewayConfig;
use event_router::http::X_REQUEST_ID;
use event_router::routing::{handler_fn, NotFound, Router};
use event_router::security::{BodyLimit, SecurityHeaders};
use event_router::{GatewayServer, HandlerDependencies, Shutdown};
use tokio::net::TcpListener;

mod common;
use common::{recording_middleware, CallLog};

#[derive(Clone)]
struct Greeting(&'static str);

fn router(log: &CallLog) -> Router {
    let mut router = Router::new(NotFound);
    router.use_middleware(recording_middleware(log, "global", true));
    router.use_middleware(SecurityHeaders::new());
    router.use_middleware(BodyLimit::new(64));

    router.get(
        "/greet/:name",
        handler_fn(|_ctx, deps, req, res, params| {
            Box::pin(async move {
                let greeting = deps.get::<Greeting>().map(|g| g.0).unwrap_or("hi");
                res.json(&serde_json::json!({
                    "message": format!("{greeting} {}", params.get("name").unwrap_or_default()),
                    "agent": req.header("User-Agent"),
                    "lang": req.query("lang"),
                }))?;
                Ok(())
            })
        }),
    );
    router.post(
        "/echo",
        handler_fn(|_ctx, _deps, req, res, _params| {
            Box::pin(async move {
                res.set_status(201).text(req.body_text().into_owned());
                Ok(())
            })
        }),
    );
    router
}

/// Start a gateway on an ephemeral port; returns its base URL.
async fn start(log: &CallLog, shutdown: &Shutdown) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let deps = HandlerDependencies::new().with(Greeting("hello"));
    let server = GatewayServer::new(GatewayConfig::default(), Arc::new(router(log)), Arc::new(deps));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_get_with_params_query_and_headers() {
    let log = CallLog::new();
    let shutdown = Shutdown::new();
    let base = start(&log, &shutdown).await;

    let res = reqwest::Client::new()
        .get(format!("{base}/greet/ada?lang=en"))
        .header("user-agent", "aegis-test")
        .header(X_REQUEST_ID, "e2e-1")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[X_REQUEST_ID], "e2e-1");
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "hello ada");
    assert_eq!(body["agent"], "aegis-test");
    assert_eq!(body["lang"], "en");
    assert_eq!(log.entries(), vec!["global"]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_post_body_limit_and_errors() {
    let log = CallLog::new();
    let shutdown = Shutdown::new();
    let base = start(&log, &shutdown).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/echo"))
        .body("some body to be read")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(res.text().await.unwrap(), "some body to be read");

    let res = client
        .post(format!("{base}/echo"))
        .body(vec![b'x'; 128])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
    assert_eq!(res.headers()["x-frame-options"], "DENY");

    let res = client.put(format!("{base}/echo")).send().await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.headers()["allow"], "POST");

    let res = client.get(format!("{base}/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let log = CallLog::new();
    let shutdown = Shutdown::new();
    let base = start(&log, &shutdown).await;

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    assert!(client.get(format!("{base}/greet/x")).send().await.is_err());
}
