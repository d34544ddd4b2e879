//! Event Router
//!
//! Serves one route table two ways: behind a local HTTP socket, or against a
//! single structured JSON event envelope.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────────────────────────────────┐
//!                  │                   EVENT ROUTER                    │
//!                  │                                                   │
//!  HTTP request    │  ┌─────────┐   ┌─────────┐                        │
//!  ────────────────┼─▶│  http   │──▶│ adapter │──┐                     │
//!                  │  │ server  │   └─────────┘  │   ┌──────────────┐  │
//!                  │  └─────────┘                ├──▶│    event     │  │
//!  JSON envelope   │                             │   │ handle_event │  │
//!  ────────────────┼─────────────────────────────┘   └──────┬───────┘  │
//!                  │                                        ▼          │
//!                  │                         ┌──────────────────────┐  │
//!                  │                         │ routing::Router      │  │
//!                  │                         │  tree → middleware   │  │
//!                  │                         │       → handler      │  │
//!                  │                         └──────────────────────┘  │
//!                  │                                                   │
//!                  │   config · observability · lifecycle · security   │
//!                  └───────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use event_router::config::{load_config_or_default, GatewayConfig};
use event_router::http::middleware::AccessLog;
use event_router::observability::{logging, metrics};
use event_router::routing::{handler_fn, middleware_fn, Handler, HandlerError, NotFound, Params, Router};
use event_router::security::{BodyLimit, SecurityHeaders};
use event_router::{event, GatewayServer, HandlerDependencies, ProxyRequest, ProxyResponse, RequestContext, Shutdown};

#[derive(Parser)]
#[command(name = "event-router")]
#[command(about = "Path-trie request router for HTTP and event invocations", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the route table on a local HTTP socket
    Serve {
        /// Override listener.bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Dispatch one JSON event envelope and print the response envelope
    Invoke {
        /// Envelope file; reads stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

/// Static service metadata handed to handlers through the dependency bag.
#[derive(Debug, Clone)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
}

struct Health;

#[async_trait]
impl Handler for Health {
    async fn call(
        &self,
        ctx: &RequestContext,
        deps: &HandlerDependencies,
        _req: &ProxyRequest,
        res: &mut ProxyResponse,
        _params: &Params,
    ) -> Result<(), HandlerError> {
        let info = deps
            .get::<ServiceInfo>()
            .ok_or_else(|| HandlerError::msg("service info not registered"))?;
        res.json(&serde_json::json!({
            "status": "ok",
            "service": info.name,
            "version": info.version,
            "requestId": ctx.request_id(),
        }))?;
        Ok(())
    }
}

fn build_router(config: &GatewayConfig) -> Router {
    let mut router = Router::new(NotFound);

    router.use_middleware(AccessLog);
    if config.security.enable_headers {
        router.use_middleware(SecurityHeaders::new());
    }
    if config.security.max_body_bytes > 0 {
        router.use_middleware(BodyLimit::new(config.security.max_body_bytes));
    }

    router.get("/health", Health);
    router.get(
        "/echo/:name",
        handler_fn(|_ctx, _deps, req, res, params| {
            Box::pin(async move {
                res.json(&serde_json::json!({
                    "name": params.get("name"),
                    "query": req.query_string_parameters,
                }))?;
                Ok(())
            })
        }),
    );
    router.post(
        "/echo",
        handler_fn(|_ctx, _deps, req, res, _params| {
            Box::pin(async move {
                let content_type = req
                    .header("content-type")
                    .unwrap_or("application/octet-stream")
                    .to_string();
                res.set_header("Content-Type", content_type);
                res.body = req.body.clone();
                Ok(())
            })
        }),
    )
    .with(middleware_fn(|_ctx, _deps, req, res, _params| {
        Box::pin(async move {
            if !req.body.is_empty() {
                return true;
            }
            res.set_status(400).text("empty body");
            false
        })
    }));
    router.get(
        "/static/*path",
        handler_fn(|_ctx, _deps, _req, res, params| {
            Box::pin(async move {
                res.json(&serde_json::json!({ "path": params.get("path") }))?;
                Ok(())
            })
        }),
    );

    router
}

fn build_deps() -> HandlerDependencies {
    HandlerDependencies::new().with(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "event-router starting");

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.listener.bind_address = bind;
            }
            serve(config).await
        }
        Commands::Invoke { event } => invoke(config, event).await,
    }
}

async fn serve(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.listener.max_body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let router = build_router(&config);
    for (method, pattern) in router.routes() {
        tracing::info!(method = %method, pattern = %pattern, "Route registered");
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config, Arc::new(router), Arc::new(build_deps()));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn invoke(
    config: GatewayConfig,
    path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = match path {
        Some(path) => tokio::fs::read(&path).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };

    let router = build_router(&config);
    let deps = build_deps();
    let out = event::handle_event_json(
        &router,
        &deps,
        &payload,
        Some(config.timeouts.request_timeout()),
    )
    .await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&out).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
