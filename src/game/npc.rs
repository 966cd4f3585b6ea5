use rand::Rng;
use std::f64::consts::TAU;

use crate::config::*;
use crate::game::entity::Entity;
use crate::game::food::Food;
use crate::game::physics::{self, distance};

/// What an NPC can see of another entity: its aggregate circle.
#[derive(Debug, Clone, Copy)]
pub struct Blip {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub is_player: bool,
}

impl Blip {
    pub fn of(entity: &Entity) -> Self {
        Blip {
            x: entity.x,
            y: entity.y,
            radius: entity.radius,
            is_player: entity.is_player(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fleeing,
    Hunting,
    Foraging,
    Exploring,
}

/// Outcome of one re-planning step.
#[derive(Debug, Clone, Copy)]
pub struct Plan {
    pub mode: Mode,
    pub target_x: f64,
    pub target_y: f64,
    pub split: bool,
}

#[derive(Debug, Clone, Copy)]
struct Threat {
    x: f64,
    y: f64,
    dist: f64,
    level: f64,
}

#[derive(Debug, Clone, Copy)]
struct Prey {
    x: f64,
    y: f64,
    dist: f64,
}

/// Re-plan an NPC against everything it can see. `others` must not contain the NPC itself.
pub fn plan(npc: &Entity, others: &[Blip], foods: &[Food], rng: &mut impl Rng) -> Plan {
    let intelligence = npc.brain().map_or(0.0, |b| b.intelligence);
    let (x, y, radius) = (npc.x, npc.y, npc.radius);

    // Threat scan
    let mut threats = Vec::new();
    let (mut safe_x, mut safe_y) = (0.0, 0.0);
    for other in others {
        let ratio = other.radius / radius;
        if ratio <= THREAT_RATIO {
            continue;
        }
        let dist = distance(x, y, other.x, other.y);
        if dist > THREAT_AWARENESS * ratio {
            continue;
        }
        let level = ratio * ratio * (THREAT_AWARENESS / dist.max(30.0));
        if dist > 0.0 {
            safe_x += (x - other.x) / dist * level;
            safe_y += (y - other.y) / dist * level;
        }
        threats.push(Threat {
            x: other.x,
            y: other.y,
            dist,
            level,
        });
    }
    let top_threat = threats
        .iter()
        .copied()
        .max_by(|a, b| a.level.total_cmp(&b.level));

    // Prey scan: a catchable player always wins over NPC prey
    let player_prey = others
        .iter()
        .filter(|o| o.is_player && radius / o.radius > THREAT_RATIO)
        .map(|o| Prey {
            x: o.x,
            y: o.y,
            dist: distance(x, y, o.x, o.y),
        })
        .find(|p| p.dist < PLAYER_PREY_RANGE);
    let prey = player_prey.or_else(|| {
        others
            .iter()
            .filter(|o| !o.is_player && radius / o.radius > THREAT_RATIO)
            .map(|o| {
                let dist = distance(x, y, o.x, o.y);
                (o.radius * 10.0 - dist * 0.1, Prey { x: o.x, y: o.y, dist })
            })
            .filter(|(_, p)| p.dist < NPC_PREY_RANGE)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, p)| p)
    });

    // Food scan, skipping food shadowed by a threat
    let food = foods
        .iter()
        .filter(|f| {
            threats
                .iter()
                .all(|t| distance(f.x, f.y, t.x, t.y) >= t.dist * FOOD_SHADOW_RATIO)
        })
        .map(|f| (f.radius * 2.0 - distance(x, y, f.x, f.y) * 0.1, f))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, f)| f);

    if let Some(threat) = top_threat.filter(|t| t.dist < FLEE_RANGE) {
        let (nx, ny) = away_from(x, y, threat.x, threat.y, rng);
        let reach = FLEE_DISTANCE + intelligence * 150.0;
        let split = radius > FLEE_SPLIT_MIN_RADIUS
            && threat.dist < FLEE_SPLIT_RANGE
            && rng.gen_bool(FLEE_SPLIT_CHANCE);
        return Plan {
            mode: Mode::Fleeing,
            target_x: x + nx * reach,
            target_y: y + ny * reach,
            split,
        };
    }

    if let Some(prey) = prey {
        let split = radius > HUNT_SPLIT_MIN_RADIUS
            && prey.dist > HUNT_SPLIT_MIN_RANGE
            && prey.dist < NPC_PREY_RANGE
            && rng.gen_bool(HUNT_SPLIT_CHANCE);
        return Plan {
            mode: Mode::Hunting,
            target_x: prey.x,
            target_y: prey.y,
            split,
        };
    }

    if let Some(food) = food {
        let (mut tx, mut ty) = (food.x, food.y);
        if top_threat.is_some_and(|t| t.dist <= SAFE_FORAGE_RANGE) {
            // Edge toward the food while drifting along the escape vector
            let (fx, fy) = physics::normalize(food.x - x, food.y - y);
            let (sx, sy) = physics::normalize(safe_x, safe_y);
            if (fx != 0.0 || fy != 0.0) && (sx != 0.0 || sy != 0.0) {
                tx = x + fx * 0.6 * 150.0 + sx * 0.4 * 100.0;
                ty = y + fy * 0.6 * 150.0 + sy * 0.4 * 100.0;
            }
        }
        return Plan {
            mode: Mode::Foraging,
            target_x: tx,
            target_y: ty,
            split: false,
        };
    }

    let (nx, ny, reach) = match top_threat.filter(|t| t.dist < RETREAT_RANGE) {
        Some(threat) => {
            let (nx, ny) = away_from(x, y, threat.x, threat.y, rng);
            (nx, ny, RETREAT_DISTANCE)
        }
        None => {
            let angle = rng.gen_range(0.0..TAU);
            (angle.cos(), angle.sin(), EXPLORE_DISTANCE)
        }
    };
    Plan {
        mode: Mode::Exploring,
        target_x: x + nx * reach,
        target_y: y + ny * reach,
        split: false,
    }
}

fn away_from(x: f64, y: f64, from_x: f64, from_y: f64, rng: &mut impl Rng) -> (f64, f64) {
    let (nx, ny) = physics::normalize(x - from_x, y - from_y);
    if nx == 0.0 && ny == 0.0 {
        let angle = rng.gen_range(0.0..TAU);
        (angle.cos(), angle.sin())
    } else {
        (nx, ny)
    }
}

/// Move the NPC's cells one step toward its current target, each at its own size's speed.
pub fn advance(npc: &mut Entity, world_size: f64) {
    let Some(base) = npc.brain().map(|b| b.base_speed()) else {
        return;
    };
    npc.steer_cells(base, world_size);
}
