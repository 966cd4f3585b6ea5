use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;

use crate::game::engine::SharedWorld;

#[derive(Serialize)]
pub struct StatusResponse {
    pub player_active: bool,
    pub npcs: usize,
    pub foods: usize,
    pub world_size: f64,
}

pub fn api_routes(world: SharedWorld) -> Router {
    Router::new()
        .route("/api/highscores", get(highscores))
        .route("/api/status", get(status))
        .with_state(world)
}

async fn highscores(State(world): State<SharedWorld>) -> impl IntoResponse {
    let w = world.read().await;
    Json(w.highscores.top().to_vec())
}

async fn status(State(world): State<SharedWorld>) -> impl IntoResponse {
    let w = world.read().await;
    Json(StatusResponse {
        player_active: w.player.is_some(),
        npcs: w.npcs.len(),
        foods: w.foods.len(),
        world_size: w.config.world_size,
    })
}
