use rand::Rng;
use serde::Serialize;

use crate::config::*;
use crate::game::physics;

/// One physical circle owned by an entity.
#[derive(Debug, Clone)]
pub struct Cell {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub score: u64,
    pub vx: f64, // split impulse, decays per tick
    pub vy: f64,
    pub merge_at: Option<u64>, // ms timestamp after which the cell rejoins its siblings
}

impl Cell {
    pub fn new(id: u64, x: f64, y: f64, radius: f64, score: u64) -> Self {
        Cell {
            id,
            x,
            y,
            radius,
            score,
            vx: 0.0,
            vy: 0.0,
            merge_at: None,
        }
    }

    pub fn ready_to_merge(&self, now: u64) -> bool {
        matches!(self.merge_at, Some(at) if now >= at)
    }

    pub fn has_impulse(&self) -> bool {
        self.vx.abs() > 1.0 || self.vy.abs() > 1.0
    }

    pub fn clamp(&mut self, world_size: f64) {
        let (x, y) = physics::clamp_to_world(self.x, self.y, self.radius, world_size);
        self.x = x;
        self.y = y;
    }
}

/// Owner-tagged copy of a cell, the uniform shape used by collision and AI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView {
    pub id: u64,
    pub owner: u64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcSpecies {
    Virus,
    Bacillus,
}

/// Per-NPC behavioral state.
#[derive(Debug, Clone)]
pub struct NpcBrain {
    pub aggression: f64,
    pub intelligence: f64,
    pub last_decision_ms: u64,
    pub species: NpcSpecies,
}

impl NpcBrain {
    /// Smarter NPCs re-plan more often.
    pub fn decision_interval_ms(&self) -> u64 {
        (200.0 - self.intelligence * 100.0).max(0.0) as u64
    }

    pub fn is_due(&self, now: u64) -> bool {
        now.saturating_sub(self.last_decision_ms) >= self.decision_interval_ms()
    }

    /// Speed at the starting radius; smarter NPCs move faster.
    pub fn base_speed(&self) -> f64 {
        NPC_BASE_SPEED + self.intelligence * 2.0
    }

    pub fn personality(&self) -> &'static str {
        if self.aggression > 0.8 {
            "hunter"
        } else if self.aggression > 0.7 {
            "balanced"
        } else {
            "cautious"
        }
    }
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Player,
    Npc(NpcBrain),
}

/// A player or NPC organism: one or more cells plus derived aggregate stats.
///
/// Aggregate fields (`x`, `y`, `radius`, `score`) are only refreshed by
/// [`Entity::update_stats`]; call it after every change to `cells`.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: u64,
    pub name: String,
    pub color: String,
    pub kind: EntityKind,
    pub cells: Vec<Cell>,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub score: u64,
    pub target_x: f64,
    pub target_y: f64,
    next_cell_id: u64,
}

impl Entity {
    fn with_cell(id: u64, name: String, color: String, kind: EntityKind, cell: Cell) -> Self {
        let mut entity = Entity {
            id,
            name,
            color,
            kind,
            x: cell.x,
            y: cell.y,
            radius: cell.radius,
            score: cell.score,
            target_x: cell.x,
            target_y: cell.y,
            cells: vec![cell],
            next_cell_id: 1,
        };
        entity.update_stats();
        entity
    }

    pub fn new_player(id: u64, name: String, x: f64, y: f64, rng: &mut impl Rng) -> Self {
        let color = format!("hsl({:.0}, 70%, 50%)", rng.gen_range(0.0..360.0));
        let cell = Cell::new(0, x, y, PLAYER_START_RADIUS, 0);
        Entity::with_cell(id, name, color, EntityKind::Player, cell)
    }

    pub fn new_npc(id: u64, now: u64, world_size: f64, rng: &mut impl Rng) -> Self {
        let radius = rng.gen_range(NPC_MIN_START_RADIUS..NPC_MAX_START_RADIUS);
        let x = rng.gen_range(radius..world_size - radius);
        let y = rng.gen_range(radius..world_size - radius);
        let brain = NpcBrain {
            aggression: rng.gen_range(0.6..1.0),
            intelligence: rng.gen_range(0.7..1.0),
            last_decision_ms: now,
            species: if rng.gen_bool(0.5) {
                NpcSpecies::Virus
            } else {
                NpcSpecies::Bacillus
            },
        };
        let color = format!("hsl({:.0}, 60%, 45%)", rng.gen_range(0.0..360.0));
        let cell = Cell::new(0, x, y, radius, (radius * 2.0).floor() as u64);
        Entity::with_cell(id, random_npc_name(rng), color, EntityKind::Npc(brain), cell)
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player)
    }

    pub fn brain(&self) -> Option<&NpcBrain> {
        match &self.kind {
            EntityKind::Npc(brain) => Some(brain),
            EntityKind::Player => None,
        }
    }

    pub fn brain_mut(&mut self) -> Option<&mut NpcBrain> {
        match &mut self.kind {
            EntityKind::Npc(brain) => Some(brain),
            EntityKind::Player => None,
        }
    }

    pub fn next_cell_id(&mut self) -> u64 {
        let id = self.next_cell_id;
        self.next_cell_id += 1;
        id
    }

    pub fn cell_views(&self) -> Vec<CellView> {
        self.cells
            .iter()
            .map(|c| CellView {
                id: c.id,
                owner: self.id,
                x: c.x,
                y: c.y,
                radius: c.radius,
                score: c.score,
            })
            .collect()
    }

    pub fn cell(&self, cell_id: u64) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == cell_id)
    }

    pub fn cell_mut(&mut self, cell_id: u64) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == cell_id)
    }

    pub fn remove_cell(&mut self, cell_id: u64) -> Option<Cell> {
        let idx = self.cells.iter().position(|c| c.id == cell_id)?;
        Some(self.cells.remove(idx))
    }

    pub fn largest_index(&self) -> Option<usize> {
        self.cells
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.radius.total_cmp(&b.radius))
            .map(|(i, _)| i)
    }

    pub fn largest_cell(&self) -> Option<&Cell> {
        self.largest_index().map(|i| &self.cells[i])
    }

    /// Recompute aggregate radius (area-preserving), score and the position of the largest cell.
    pub fn update_stats(&mut self) {
        let Some(largest) = self.largest_cell() else {
            return;
        };
        let (x, y) = (largest.x, largest.y);
        let area: f64 = self.cells.iter().map(|c| c.radius * c.radius).sum();
        self.x = x;
        self.y = y;
        self.radius = area.sqrt();
        self.score = self.cells.iter().map(|c| c.score).sum();
    }

    pub fn clamp_cells(&mut self, world_size: f64) {
        for cell in &mut self.cells {
            cell.clamp(world_size);
        }
    }

    /// One movement step. Launched cells coast on their decaying impulse,
    /// the rest head for the target at a speed set by their own radius.
    pub fn steer_cells(&mut self, base_speed: f64, world_size: f64) {
        let (tx, ty) = (self.target_x, self.target_y);
        for cell in &mut self.cells {
            if cell.has_impulse() {
                cell.x += cell.vx;
                cell.y += cell.vy;
                cell.vx *= SPLIT_DECEL;
                cell.vy *= SPLIT_DECEL;
            } else {
                cell.vx = 0.0;
                cell.vy = 0.0;
                let speed = speed_for_radius(base_speed, cell.radius);
                let (x, y) = physics::step_toward(cell.x, cell.y, tx, ty, speed);
                cell.x = x;
                cell.y = y;
            }
            cell.clamp(world_size);
        }
        self.update_stats();
    }
}

const NPC_NAMES: &[&str] = &[
    "E.coli", "Salmonella", "Streptococcus", "Staphylococcus", "Lactobacillus",
    "Bacillus", "Pseudomonas", "Clostridium", "Vibrio", "Listeria",
    "Mycobacterium", "Helicobacter", "Neisseria", "Shigella", "Yersinia",
    "Campylobacter", "Legionella", "Bordetella", "Treponema", "Borrelia",
    "Coronavirus", "Influenza", "Adenovirus", "Rhinovirus", "Rotavirus",
    "Norovirus", "Poliovirus", "Measles", "Mumps", "Rubella",
    "Herpes", "Varicella", "Hepatitis", "Dengue", "Zika",
    "Ebola", "Rabies", "HIV", "HPV", "Parvovirus",
    "T4-Phage", "Lambda-Phage", "M13-Phage", "P1-Phage", "Mu-Phage",
    "Amoeba", "Paramecium", "Euglena", "Plasmodium", "Giardia",
];

fn random_npc_name(rng: &mut impl Rng) -> String {
    let base = NPC_NAMES[rng.gen_range(0..NPC_NAMES.len())];
    if rng.gen_bool(0.5) {
        format!("{}{}", base, rng.gen_range(0..100))
    } else {
        base.to_string()
    }
}
