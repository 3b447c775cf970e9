//! Dashboard Server Module
//! Serves the pre-rendered page on a single route with axum.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cli::CommandLineArgs;

/// Build the application router around the immutable page.
pub fn router(page: String) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .with_state(Arc::new(page))
        .layer(TraceLayer::new_for_http())
}

async fn dashboard(State(page): State<Arc<String>>) -> Html<String> {
    Html(page.as_ref().clone())
}

/// Bind and serve until ctrl-c or SIGTERM.
pub async fn serve(args: &CommandLineArgs, page: String) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid host IP address or port")?;
    let app = router(page);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("dashboard listening on http://{addr}");

    if args.open {
        let host = if args.host == "0.0.0.0" {
            "127.0.0.1"
        } else {
            args.host.as_str()
        };
        let url = format!("http://{}:{}/", host, args.port);
        if let Err(e) = open::that(&url) {
            warn!("could not open {url} in a browser: {e}");
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("dashboard server failed")?;
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM so the server can drain and exit cleanly.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
