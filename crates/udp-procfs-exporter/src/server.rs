//! HTTP surface: the Prometheus scrape endpoint and a small landing page.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::sync::Notify;
use tracing::{error, info};

use udp_procfs_core::metrics::PrometheusSink;

pub(crate) type AppState = Arc<PrometheusSink>;

pub(crate) fn router(sink: AppState, metrics_path: &str) -> Router {
    let mut app = Router::new().route(metrics_path, get(handle_metrics));

    if metrics_path != "/" {
        let path: Arc<str> = Arc::from(metrics_path);
        app = app.route("/", get(move || handle_index(path.clone())));
    }

    app.with_state(sink)
}

async fn handle_metrics(State(sink): State<AppState>) -> Response {
    match sink.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, sink.content_type())], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn handle_index(metrics_path: Arc<str>) -> Html<String> {
    Html(format!(
        "<html><head><title>UDP Procfs Exporter</title></head>\
         <body><h1>UDP Procfs Exporter</h1><p><a href=\"{0}\">{0}</a></p></body></html>",
        metrics_path
    ))
}

/// Serves until `shutdown` is notified.
pub(crate) async fn serve(
    addr: SocketAddr,
    metrics_path: &str,
    sink: AppState,
    shutdown: Arc<Notify>,
) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, path = metrics_path, "listening");

    axum::serve(listener, router(sink, metrics_path))
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
}
