// World constants
pub const WORLD_SIZE: f64 = 3000.0;
pub const TICK_RATE: u64 = 30; // ~33ms per tick
pub const TICK_DURATION_MS: u64 = 1000 / TICK_RATE;
pub const MAX_FOOD: usize = 500;
pub const MAX_NPCS: usize = 20;

// Player constants
pub const PLAYER_START_RADIUS: f64 = 15.0;
pub const PLAYER_BASE_SPEED: f64 = 5.0; // units per tick at radius 15
pub const PLAYER_MAX_CELLS: usize = 8;
pub const MAX_NAME_LEN: usize = 15;

// Split / merge constants
pub const SPLIT_MIN_CELL_RADIUS: f64 = 30.0;
pub const NPC_SPLIT_MIN_RADIUS: f64 = 40.0;
pub const NPC_MAX_CELLS: usize = 16;
pub const SPLIT_SPACING: f64 = 2.0; // sibling offset, in multiples of the new radius
pub const SPLIT_LAUNCH_SPEED: f64 = 25.0; // units per tick
pub const SPLIT_DECEL: f64 = 0.9; // impulse kept per tick
pub const MERGE_DELAY_MS: u64 = 30_000;
pub const MERGE_PULL_MAX_SPEED: f64 = 2.0; // units per tick at merge time
pub const SELF_PUSH_FACTOR: f64 = 0.5;

// Eating constants
pub const FOOD_GROWTH: f64 = 0.5; // of the food radius
pub const FOOD_SCORE: u64 = 1;
pub const EAT_GROWTH: f64 = 0.3; // of the eaten cell radius
pub const PLAYER_DOMINANCE: f64 = 1.03;
pub const NPC_DOMINANCE: f64 = 1.02;
pub const NPC_BOUNCE_BAND: f64 = 0.01;
pub const NPC_BOUNCE_PUSH: f64 = 1.0; // of the overlap, applied to each side

// Food constants
pub const FOOD_MIN_RADIUS: f64 = 4.0;
pub const FOOD_MAX_RADIUS: f64 = 7.0;
pub const FOOD_LOW_WATER: f64 = 0.8;
pub const FOOD_BATCH: usize = 50;
pub const FOOD_SWEEP_INTERVAL_MS: u64 = 2000;
pub const FOOD_SWEEP_LOW_WATER: f64 = 0.7;
pub const FOOD_SWEEP_BATCH: usize = 100;

// NPC constants
pub const NPC_MIN_START_RADIUS: f64 = 20.0;
pub const NPC_MAX_START_RADIUS: f64 = 45.0;
pub const NPC_BASE_SPEED: f64 = 4.0;
pub const THREAT_RATIO: f64 = 1.03;
pub const THREAT_AWARENESS: f64 = 600.0;
pub const FLEE_RANGE: f64 = 300.0;
pub const FLEE_DISTANCE: f64 = 300.0;
pub const FLEE_SPLIT_RANGE: f64 = 200.0;
pub const FLEE_SPLIT_MIN_RADIUS: f64 = 35.0;
pub const FLEE_SPLIT_CHANCE: f64 = 0.18;
pub const PLAYER_PREY_RANGE: f64 = 400.0;
pub const NPC_PREY_RANGE: f64 = 350.0;
pub const HUNT_SPLIT_MIN_RANGE: f64 = 150.0;
pub const HUNT_SPLIT_MIN_RADIUS: f64 = 40.0;
pub const HUNT_SPLIT_CHANCE: f64 = 0.12;
pub const FOOD_SHADOW_RATIO: f64 = 0.7;
pub const SAFE_FORAGE_RANGE: f64 = 400.0;
pub const RETREAT_RANGE: f64 = 500.0;
pub const RETREAT_DISTANCE: f64 = 150.0;
pub const EXPLORE_DISTANCE: f64 = 200.0;

// Highscores
pub const HIGHSCORE_SLOTS: usize = 10;

// Server
pub const SERVER_PORT: u16 = 3000;
pub const STATIC_DIR: &str = "static";
pub const ELIMINATION_CLOSE_DELAY_MS: u64 = 100;

/// Sizing and seeding for one world instance.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub world_size: f64,
    pub max_food: usize,
    pub max_npcs: usize,
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            world_size: WORLD_SIZE,
            max_food: MAX_FOOD,
            max_npcs: MAX_NPCS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(SERVER_PORT);
        let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| STATIC_DIR.to_string());
        ServerConfig { port, static_dir }
    }
}

// Helper: per-tick speed for a circle of the given radius
pub fn speed_for_radius(base: f64, radius: f64) -> f64 {
    base / (radius / PLAYER_START_RADIUS).max(0.1)
}
