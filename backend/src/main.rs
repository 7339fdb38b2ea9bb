use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod db;
mod domain;
mod error;
mod rest;

// Listen port for the API server; overridden by TRIVIA_PORT
const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Setting up database");
    let db = db::DbConnection::init().await?;

    // Set up our application state and routes
    let state = rest::AppState::new(domain::TriviaService::new(db));
    let app = rest::router(state);

    // Start the server
    let port = std::env::var("TRIVIA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting trivia API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
