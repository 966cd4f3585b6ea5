use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::*;
use crate::error::GameError;
use crate::game::clock::Clock;
use crate::game::collision::{self, Effect};
use crate::game::entity::Entity;
use crate::game::food::FoodSupply;
use crate::game::highscores::{HighscoreEntry, Highscores};
use crate::game::npc::{self, Blip};
use crate::game::split::{self, SplitAim};

/// The player just lost their last cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Elimination {
    pub player_id: u64,
    pub score: u64,
}

/// What a tick produced for the transport to publish.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// False while the world is paused (no player).
    pub ran: bool,
    pub eliminated: Option<Elimination>,
    pub highscores: Option<Vec<HighscoreEntry>>,
}

/// Aggregate root: owns every entity, all food, the highscore board, the RNG and the clock.
pub struct World {
    pub config: WorldConfig,
    pub player: Option<Entity>,
    pub npcs: BTreeMap<u64, Entity>,
    pub foods: FoodSupply,
    pub highscores: Highscores,
    rng: StdRng,
    clock: Arc<dyn Clock>,
    next_entity_id: u64,
}

impl World {
    pub fn new(config: WorldConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut world = World {
            foods: FoodSupply::new(config.max_food),
            config,
            player: None,
            npcs: BTreeMap::new(),
            highscores: Highscores::new(HIGHSCORE_SLOTS),
            rng,
            clock,
            next_entity_id: 1,
        };
        world.reset();
        world
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    // ── Registry ──

    pub fn contains(&self, id: u64) -> bool {
        self.entity(id).is_some()
    }

    pub fn entity(&self, id: u64) -> Option<&Entity> {
        match &self.player {
            Some(p) if p.id == id => Some(p),
            _ => self.npcs.get(&id),
        }
    }

    pub fn entity_mut(&mut self, id: u64) -> Option<&mut Entity> {
        match &mut self.player {
            Some(p) if p.id == id => Some(p),
            _ => self.npcs.get_mut(&id),
        }
    }

    /// An entity together with the food supply and RNG, for passes that eat and respawn food.
    pub fn entity_with_food(&mut self, id: u64) -> Option<(&mut Entity, &mut FoodSupply, &mut StdRng)> {
        let entity = match &mut self.player {
            Some(p) if p.id == id => Some(p),
            _ => self.npcs.get_mut(&id),
        }?;
        Some((entity, &mut self.foods, &mut self.rng))
    }

    pub fn remove_entity(&mut self, id: u64) -> Option<Entity> {
        if self.player.as_ref().is_some_and(|p| p.id == id) {
            return self.player.take();
        }
        self.npcs.remove(&id)
    }

    pub fn spawn_npc(&mut self) -> u64 {
        let id = self.next_id();
        let now = self.now();
        let npc = Entity::new_npc(id, now, self.config.world_size, &mut self.rng);
        self.npcs.insert(id, npc);
        id
    }

    /// Fresh NPC population and a full food field. The player, if any, is kept.
    pub fn reset(&mut self) {
        let now = self.now();
        self.npcs.clear();
        for _ in 0..self.config.max_npcs {
            self.spawn_npc();
        }
        self.foods
            .regenerate(self.config.world_size, now, &mut self.rng);
        info!(
            npcs = self.npcs.len(),
            foods = self.foods.len(),
            "world reset"
        );
    }

    // ── Intents ──

    /// Admit the single player. Rejected while one is already active.
    pub fn start_game(&mut self, name: &str) -> Result<u64, GameError> {
        if self.player.is_some() {
            return Err(GameError::WorldFull);
        }
        self.reset();

        let id = self.next_id();
        let name = if name.trim().is_empty() {
            format!("Cell {}", id)
        } else {
            name.chars().take(MAX_NAME_LEN).collect()
        };
        let size = self.config.world_size;
        let x = self.rng.gen_range(PLAYER_START_RADIUS..size - PLAYER_START_RADIUS);
        let y = self.rng.gen_range(PLAYER_START_RADIUS..size - PLAYER_START_RADIUS);
        let player = Entity::new_player(id, name, x, y, &mut self.rng);
        info!(player = id, name = %player.name, "player joined");
        self.player = Some(player);
        Ok(id)
    }

    fn player_mut(&mut self, player_id: u64) -> Result<&mut Entity, GameError> {
        match &mut self.player {
            Some(p) if p.id == player_id => Ok(p),
            _ => Err(GameError::NoActivePlayer),
        }
    }

    pub fn set_target(&mut self, player_id: u64, x: f64, y: f64) -> Result<(), GameError> {
        let player = self.player_mut(player_id)?;
        player.target_x = x;
        player.target_y = y;
        Ok(())
    }

    pub fn split_player(&mut self, player_id: u64) -> Result<(), GameError> {
        let now = self.now();
        let size = self.config.world_size;
        let player = match &mut self.player {
            Some(p) if p.id == player_id => p,
            _ => return Err(GameError::NoActivePlayer),
        };
        let aim = SplitAim::Toward(player.target_x, player.target_y);
        split::split(player, now, aim, size, &mut self.rng)
    }

    pub fn rename_player(&mut self, player_id: u64, name: &str) -> Result<(), GameError> {
        let player = self.player_mut(player_id)?;
        player.name = name.chars().take(MAX_NAME_LEN).collect();
        Ok(())
    }

    /// Drop the player. Returns the new board when their score made it in.
    pub fn disconnect(&mut self, player_id: u64) -> Option<Vec<HighscoreEntry>> {
        if !self.player.as_ref().is_some_and(|p| p.id == player_id) {
            return None;
        }
        let player = self.player.take()?;
        info!(player = player.id, score = player.score, "player left");
        self.record_highscore(&player.name, player.score)
    }

    fn record_highscore(&mut self, name: &str, score: u64) -> Option<Vec<HighscoreEntry>> {
        if score == 0 || !self.highscores.record(name, score, Utc::now()) {
            return None;
        }
        Some(self.highscores.top().to_vec())
    }

    // ── Tick ──

    /// One simulation step: player motion, NPC AI, collisions, merge upkeep, food top-up.
    /// Does nothing while no player is present.
    pub fn tick(&mut self) -> TickOutcome {
        if self.player.is_none() {
            return TickOutcome::default();
        }
        let now = self.now();
        self.move_player();
        self.drive_npcs(now);
        let effects = collision::resolve(self);
        let mut outcome = self.apply_effects(effects);
        self.maintain_cells(now);
        self.foods
            .maintain(self.config.world_size, &mut self.rng);
        self.foods
            .sweep(now, self.config.world_size, &mut self.rng);
        outcome.ran = true;
        outcome
    }

    /// Apply the resolver's depletion effects: NPCs are replaced 1:1, a lost player resets the world.
    pub fn apply_effects(&mut self, effects: Vec<Effect>) -> TickOutcome {
        let mut outcome = TickOutcome {
            ran: true,
            ..TickOutcome::default()
        };
        let mut respawns = 0;
        for effect in effects {
            match effect {
                Effect::NpcDepleted { .. } => respawns += 1,
                Effect::PlayerDepleted {
                    id,
                    name,
                    final_score,
                } => {
                    info!(player = id, score = final_score, "player eliminated");
                    outcome.highscores = self.record_highscore(&name, final_score);
                    outcome.eliminated = Some(Elimination {
                        player_id: id,
                        score: final_score,
                    });
                }
            }
        }
        if outcome.eliminated.is_some() {
            self.reset();
        } else {
            for _ in 0..respawns {
                self.spawn_npc();
            }
        }
        outcome
    }

    fn move_player(&mut self) {
        let size = self.config.world_size;
        if let Some(player) = self.player.as_mut() {
            player.steer_cells(PLAYER_BASE_SPEED, size);
        }
    }

    fn blips_except(&self, id: u64) -> Vec<Blip> {
        self.player
            .iter()
            .chain(self.npcs.values())
            .filter(|e| e.id != id)
            .map(Blip::of)
            .collect()
    }

    /// Re-plan NPCs whose decision interval elapsed, then step every NPC toward its target.
    fn drive_npcs(&mut self, now: u64) {
        let size = self.config.world_size;
        let ids: Vec<u64> = self.npcs.keys().copied().collect();
        for id in ids {
            let others = self.blips_except(id);
            let Some(bot) = self.npcs.get_mut(&id) else {
                continue;
            };
            if bot.brain().is_some_and(|b| b.is_due(now)) {
                let plan = npc::plan(bot, &others, &self.foods.items, &mut self.rng);
                bot.target_x = plan.target_x;
                bot.target_y = plan.target_y;
                if let Some(brain) = bot.brain_mut() {
                    brain.last_decision_ms = now;
                }
                if plan.split && split::split(bot, now, SplitAim::Random, size, &mut self.rng).is_ok() {
                    debug!(npc = %bot.name, mode = ?plan.mode, "strategic split");
                }
            }
            npc::advance(bot, size);
        }
    }

    fn maintain_cells(&mut self, now: u64) {
        let size = self.config.world_size;
        for entity in self.player.iter_mut().chain(self.npcs.values_mut()) {
            split::tick_merge_maintenance(entity, now, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::clock::ManualClock;

    fn world(clock: Arc<ManualClock>) -> World {
        let config = WorldConfig {
            world_size: 2000.0,
            max_food: 150,
            max_npcs: 12,
            seed: Some(7),
        };
        World::new(config, clock)
    }

    fn assert_invariants(w: &World) {
        assert_eq!(w.npcs.len(), w.config.max_npcs);
        for e in w.player.iter().chain(w.npcs.values()) {
            assert!(!e.cells.is_empty());
            for c in &e.cells {
                assert!(c.radius > 0.0);
                assert!(c.x >= c.radius - 1e-9 && c.x <= w.config.world_size - c.radius + 1e-9);
                assert!(c.y >= c.radius - 1e-9 && c.y <= w.config.world_size - c.radius + 1e-9);
            }
        }
    }

    #[test]
    fn second_start_is_rejected() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock);
        let id = w.start_game("first").unwrap();
        assert_eq!(w.start_game("second"), Err(GameError::WorldFull));
        assert_eq!(w.player.as_ref().unwrap().id, id);
    }

    #[test]
    fn names_are_truncated_and_defaulted() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock);
        let id = w.start_game("   ").unwrap();
        assert!(w.player.as_ref().unwrap().name.starts_with("Cell "));
        w.rename_player(id, "a-very-long-name-indeed").unwrap();
        assert_eq!(w.player.as_ref().unwrap().name, "a-very-long-nam");
    }

    #[test]
    fn intents_without_player_are_rejected_quietly() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock);
        assert_eq!(w.set_target(99, 1.0, 1.0), Err(GameError::NoActivePlayer));
        assert_eq!(w.split_player(99), Err(GameError::NoActivePlayer));
        assert_eq!(w.disconnect(99), None);
    }

    #[test]
    fn idle_world_does_not_tick() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock.clone());
        let before: Vec<(f64, f64)> = w.npcs.values().map(|n| (n.x, n.y)).collect();
        clock.advance(1000);
        assert!(!w.tick().ran);
        let after: Vec<(f64, f64)> = w.npcs.values().map(|n| (n.x, n.y)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn population_and_bounds_hold_over_many_ticks() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock.clone());
        let mut pid = w.start_game("runner").unwrap();
        for i in 0..900u64 {
            clock.advance(TICK_DURATION_MS);
            if w.player.is_none() {
                pid = w.start_game("runner").unwrap();
            }
            w.set_target(pid, (i * 37 % 2000) as f64, (i * 53 % 2000) as f64).unwrap();
            if i % 120 == 0 {
                let _ = w.split_player(pid);
            }
            let outcome = w.tick();
            assert!(outcome.ran);
            assert_invariants(&w);
            assert!(w.foods.len() <= w.config.max_food);
        }
    }

    #[test]
    fn player_split_then_merge_through_ticks() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock.clone());
        w.config.max_npcs = 0;
        w.npcs.clear();
        w.foods.items.clear();
        let pid = w.start_game("splitter").unwrap();
        w.foods.items.clear();
        {
            let p = w.player.as_mut().unwrap();
            p.cells[0].x = 1000.0;
            p.cells[0].y = 1000.0;
            p.cells[0].radius = 60.0;
            p.cells[0].score = 30;
            p.update_stats();
        }
        w.set_target(pid, 1000.0, 1000.0).unwrap();
        w.split_player(pid).unwrap();
        assert_eq!(w.player.as_ref().unwrap().cells.len(), 2);

        let mut ticks = 0;
        while w.player.as_ref().unwrap().cells.len() > 1 {
            clock.advance(TICK_DURATION_MS);
            w.foods.items.clear();
            w.tick();
            ticks += 1;
            assert!(ticks < 2000, "cells never merged");
        }
        assert!(clock.now_ms() >= MERGE_DELAY_MS);
        let p = w.player.as_ref().unwrap();
        assert!((p.radius - 60.0).abs() < 1e-6);
        assert_eq!(p.score, 30);
    }

    #[test]
    fn disconnect_records_positive_scores_only() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock);
        let id = w.start_game("zero").unwrap();
        assert_eq!(w.disconnect(id), None);
        assert!(w.player.is_none());

        let id = w.start_game("scorer").unwrap();
        w.player.as_mut().unwrap().cells[0].score = 25;
        w.player.as_mut().unwrap().update_stats();
        let board = w.disconnect(id).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "scorer");
        assert_eq!(board[0].score, 25);
    }

    #[test]
    fn npcs_replan_on_their_interval() {
        let clock = Arc::new(ManualClock::new(0));
        let mut w = world(clock.clone());
        w.start_game("watcher").unwrap();
        clock.advance(250);
        w.tick();
        for npc in w.npcs.values() {
            assert_eq!(npc.brain().unwrap().last_decision_ms, 250);
        }
        let planned: Vec<u64> = w.npcs.keys().copied().collect();
        clock.advance(50);
        w.tick();
        // Survivors keep their last plan; anything respawned this tick starts fresh
        for id in planned {
            if let Some(npc) = w.npcs.get(&id) {
                assert_eq!(npc.brain().unwrap().last_decision_ms, 250);
            }
        }
    }
}
