mod config;
mod error;
mod game;
mod protocol;
mod server;

use std::sync::Arc;
use axum::{routing::get, Router};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, WorldConfig};
use crate::game::clock::SystemClock;
use crate::game::engine;
use crate::server::http;
use crate::server::ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = ServerConfig::from_env();
    let world_config = WorldConfig::default();
    let world_size = world_config.world_size;

    // Create game world
    let world = engine::create_world(world_config, Arc::new(SystemClock::default()));
    info!(world_size, "game world created");

    // Start game loop
    let (events, _) = broadcast::channel(64);
    tokio::spawn(engine::game_loop(world.clone(), events.clone()));
    info!(tps = config::TICK_RATE, "game loop running");

    let ws_state = ws::WsState {
        world: world.clone(),
        events,
    };

    // Build router
    let app = Router::new()
        .route("/ws", get(ws::ws_handler).with_state(ws_state))
        .merge(http::api_routes(world))
        .fallback_service(ServeDir::new(&server.static_dir));

    let addr = format!("0.0.0.0:{}", server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("microbe arena listening on http://localhost:{}", server.port);
    axum::serve(listener, app).await?;
    Ok(())
}
