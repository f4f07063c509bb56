// src/server/metrics_server.rs

//! A tiny Axum HTTP server exposing the Prometheus text-format metrics
//! endpoint on its own port, separate from the RPC listener.

use crate::core::metrics;
use axum::{routing::get, Router};

pub async fn run(host: String, port: u16) -> anyhow::Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "metrics endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
