#![deny(warnings)]

//! HTTP/JSON API server for Freight Tycoon.

use std::net::SocketAddr;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;
mod state;
mod views;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| persistence::default_sqlite_url().to_string());
    let pool = persistence::init_db(&url).await?;

    let state = state::AppState::new(pool);
    let app = routes::router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
