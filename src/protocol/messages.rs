use serde::{Deserialize, Serialize};

use crate::game::entity::NpcSpecies;
use crate::game::food::FoodKind;
use crate::game::highscores::HighscoreEntry;

// ── Client → Server ──

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartGame {
        #[serde(default)]
        name: String,
    },
    Move {
        x: f64,
        y: f64,
    },
    Split,
    SetName {
        name: String,
    },
}

// ── Server → Client ──

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Init {
        player: EntityState,
        world_size: f64,
    },
    WorldSnapshot {
        players: Vec<EntityState>,
        npcs: Vec<EntityState>,
        foods: Vec<FoodState>,
    },
    PlayerEliminated {
        score: u64,
    },
    Highscores {
        entries: Vec<HighscoreEntry>,
    },
    WorldFull {
        message: String,
    },
}

#[derive(Debug, Serialize, Clone)]
pub struct CellState {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub score: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_at: Option<u64>,
}

#[derive(Debug, Serialize, Clone)]
pub struct EntityState {
    pub id: u64,
    pub name: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub score: u64,
    pub cells: Vec<CellState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<NpcSpecies>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<&'static str>,
}

#[derive(Debug, Serialize, Clone)]
pub struct FoodState {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
    pub name: &'static str,
    pub kind: FoodKind,
}
