use std::env;

use anyhow::Result;
use switchyard_api::build_app;
use switchyard_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("switchyard_api");

    let bind = env::var("SWITCHYARD_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app().await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "switchyard api started");

    axum::serve(listener, app).await?;
    Ok(())
}
