use tracing::debug;

use crate::config::*;
use crate::game::entity::CellView;
use crate::game::physics::{self, circles_overlap};
use crate::game::world::World;

/// Consequence of an entity losing its last cell, applied by the tick after the pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    NpcDepleted { id: u64, eaten_by: u64 },
    PlayerDepleted { id: u64, name: String, final_score: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Any pair with the player in it: plain 3% dominance.
    PlayerInvolved,
    /// NPC pairs: bounce inside the 1% band, otherwise 2% dominance.
    NpcOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Nothing,
    Bounce,
    FirstEats,
    SecondEats,
}

fn outcome(rule: Rule, a: f64, b: f64) -> Outcome {
    let ratio = match rule {
        Rule::PlayerInvolved => PLAYER_DOMINANCE,
        Rule::NpcOnly => {
            if (a - b).abs() < a.max(b) * NPC_BOUNCE_BAND {
                return Outcome::Bounce;
            }
            NPC_DOMINANCE
        }
    };
    if physics::dominates(a, b, ratio) {
        Outcome::FirstEats
    } else if physics::dominates(b, a, ratio) {
        Outcome::SecondEats
    } else {
        Outcome::Nothing
    }
}

/// One full collision pass: food first, then cross-entity contacts, player before NPCs.
///
/// Depleted entities leave the world immediately so later checks cannot see them;
/// their replacements are left to the caller via the returned effects.
pub fn resolve(world: &mut World) -> Vec<Effect> {
    let mut effects = Vec::new();
    let player_id = world.player.as_ref().map(|p| p.id);
    let mut order: Vec<u64> = player_id.into_iter().collect();
    order.extend(world.npcs.keys().copied());

    for id in order {
        if !world.contains(id) {
            continue;
        }
        eat_food(world, id);

        let opponents: Vec<u64> = player_id
            .into_iter()
            .chain(world.npcs.keys().copied())
            .filter(|&other| other != id)
            .collect();
        for other in opponents {
            if !world.contains(id) {
                break;
            }
            if !world.contains(other) {
                continue;
            }
            resolve_pair(world, id, other, &mut effects);
        }
    }
    effects
}

/// Every cell eats each food it overlaps; each eaten food is replaced at once.
fn eat_food(world: &mut World, id: u64) -> usize {
    let world_size = world.config.world_size;
    let Some((entity, foods, rng)) = world.entity_with_food(id) else {
        return 0;
    };
    let mut eaten = 0;
    for cell in entity.cells.iter_mut() {
        let mut hits: Vec<usize> = foods
            .items
            .iter()
            .enumerate()
            .filter(|(_, f)| circles_overlap(cell.x, cell.y, cell.radius, f.x, f.y, f.radius))
            .map(|(i, _)| i)
            .collect();
        if hits.is_empty() {
            continue;
        }
        for food in foods.take(&mut hits) {
            cell.radius += food.radius * FOOD_GROWTH;
            cell.score += FOOD_SCORE;
            foods.spawn(world_size, rng);
            eaten += 1;
        }
        cell.clamp(world_size);
    }
    if eaten > 0 {
        entity.update_stats();
    }
    eaten
}

fn live_cell(world: &World, owner: u64, cell_id: u64) -> Option<CellView> {
    let entity = world.entity(owner)?;
    let c = entity.cell(cell_id)?;
    Some(CellView {
        id: c.id,
        owner,
        x: c.x,
        y: c.y,
        radius: c.radius,
        score: c.score,
    })
}

fn resolve_pair(world: &mut World, a: u64, b: u64, effects: &mut Vec<Effect>) {
    let (Some(first), Some(second)) = (world.entity(a), world.entity(b)) else {
        return;
    };
    let rule = if first.is_player() || second.is_player() {
        Rule::PlayerInvolved
    } else {
        Rule::NpcOnly
    };
    let a_cells = first.cell_views();
    let b_cells = second.cell_views();

    for ac in &a_cells {
        for bc in &b_cells {
            // Earlier contacts in this pass may have moved or removed either cell
            let Some(ca) = live_cell(world, a, ac.id) else {
                break;
            };
            let Some(cb) = live_cell(world, b, bc.id) else {
                continue;
            };
            if !circles_overlap(ca.x, ca.y, ca.radius, cb.x, cb.y, cb.radius) {
                continue;
            }
            match outcome(rule, ca.radius, cb.radius) {
                Outcome::Nothing => {}
                Outcome::Bounce => bounce(world, &ca, &cb),
                Outcome::FirstEats => {
                    consume(world, &ca, &cb, effects);
                    if !world.contains(b) {
                        return;
                    }
                }
                Outcome::SecondEats => {
                    consume(world, &cb, &ca, effects);
                    if !world.contains(a) {
                        return;
                    }
                }
            }
        }
    }
}

/// Move `eater` over `victim`: the victim cell is removed, the eater grows.
fn consume(world: &mut World, eater: &CellView, victim: &CellView, effects: &mut Vec<Effect>) {
    let world_size = world.config.world_size;
    let Some(victim_entity) = world.entity_mut(victim.owner) else {
        return;
    };
    let score_before = victim_entity.score;
    if victim_entity.remove_cell(victim.id).is_none() {
        return;
    }
    let depleted = victim_entity.cells.is_empty();
    if !depleted {
        victim_entity.update_stats();
    }

    if let Some(entity) = world.entity_mut(eater.owner) {
        if let Some(cell) = entity.cell_mut(eater.id) {
            cell.radius += victim.radius * EAT_GROWTH;
            cell.score += victim.score / 2;
            cell.clamp(world_size);
        }
        entity.update_stats();
    }

    if !depleted {
        return;
    }
    if let Some(gone) = world.remove_entity(victim.owner) {
        if gone.is_player() {
            effects.push(Effect::PlayerDepleted {
                id: gone.id,
                name: gone.name,
                final_score: score_before,
            });
        } else {
            debug!(npc = %gone.name, eaten_by = eater.owner, "npc depleted");
            effects.push(Effect::NpcDepleted {
                id: gone.id,
                eaten_by: eater.owner,
            });
        }
    }
}

/// Near-equal NPC cells shove each other apart by the overlap, each side.
fn bounce(world: &mut World, a: &CellView, b: &CellView) {
    let world_size = world.config.world_size;
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if dist > 0.0 { (dx / dist, dy / dist) } else { (1.0, 0.0) };
    let push = (a.radius + b.radius - dist) * NPC_BOUNCE_PUSH;

    for (view, sign) in [(a, 1.0), (b, -1.0)] {
        if let Some(entity) = world.entity_mut(view.owner) {
            if let Some(cell) = entity.cell_mut(view.id) {
                cell.x += nx * push * sign;
                cell.y += ny * push * sign;
                cell.clamp(world_size);
            }
            entity.update_stats();
        }
    }
}
