use rand::Rng;
use std::f64::consts::{SQRT_2, TAU};
use tracing::debug;

use crate::config::*;
use crate::error::GameError;
use crate::game::entity::{Cell, Entity};
use crate::game::physics;

/// Direction the new sibling cell is thrown in.
#[derive(Debug, Clone, Copy)]
pub enum SplitAim {
    /// Toward a world point, with an outward launch impulse (players).
    Toward(f64, f64),
    /// Random angle, no impulse (NPCs).
    Random,
}

fn check_split(entity: &Entity) -> Result<usize, GameError> {
    let idx = entity
        .largest_index()
        .ok_or(GameError::SplitRejected("entity has no cells"))?;
    if entity.cells[idx].radius < SPLIT_MIN_CELL_RADIUS {
        return Err(GameError::SplitRejected("largest cell too small"));
    }
    let cap = if entity.is_player() {
        PLAYER_MAX_CELLS
    } else {
        if entity.radius < NPC_SPLIT_MIN_RADIUS {
            return Err(GameError::SplitRejected("npc too small"));
        }
        NPC_MAX_CELLS
    };
    if entity.cells.len() >= cap {
        return Err(GameError::SplitRejected("cell cap reached"));
    }
    Ok(idx)
}

/// Split the entity's largest cell into two equal-area halves that rejoin after `MERGE_DELAY_MS`.
pub fn split(
    entity: &mut Entity,
    now: u64,
    aim: SplitAim,
    world_size: f64,
    rng: &mut impl Rng,
) -> Result<(), GameError> {
    let idx = check_split(entity)?;
    let sibling_id = entity.next_cell_id();
    let merge_at = now + MERGE_DELAY_MS;

    let cell = &mut entity.cells[idx];
    let radius = cell.radius / SQRT_2;
    let sibling_score = cell.score / 2;
    cell.radius = radius;
    cell.score -= sibling_score;
    cell.merge_at = Some(merge_at);

    let (mut nx, mut ny) = match aim {
        SplitAim::Toward(tx, ty) => physics::normalize(tx - cell.x, ty - cell.y),
        SplitAim::Random => (0.0, 0.0),
    };
    if nx == 0.0 && ny == 0.0 {
        let angle = rng.gen_range(0.0..TAU);
        nx = angle.cos();
        ny = angle.sin();
    }

    let offset = radius * SPLIT_SPACING;
    let mut sibling = Cell::new(
        sibling_id,
        cell.x + nx * offset,
        cell.y + ny * offset,
        radius,
        sibling_score,
    );
    sibling.merge_at = Some(merge_at);
    if let SplitAim::Toward(..) = aim {
        sibling.vx = nx * SPLIT_LAUNCH_SPEED;
        sibling.vy = ny * SPLIT_LAUNCH_SPEED;
    }
    sibling.clamp(world_size);

    entity.cells.push(sibling);
    entity.update_stats();
    debug!(entity = entity.id, cells = entity.cells.len(), "split");
    Ok(())
}

/// Per-tick upkeep for an entity's cells: separation, centripetal pull, then auto-merge.
/// Returns how many cells were absorbed by merging.
pub fn tick_merge_maintenance(entity: &mut Entity, now: u64, world_size: f64) -> usize {
    if entity.cells.len() > 1 {
        separate_own_cells(&mut entity.cells);
        pull_toward_main(&mut entity.cells, now);
    }
    let absorbed = auto_merge(&mut entity.cells, now);
    if absorbed > 0 {
        debug!(entity = entity.id, absorbed, cells = entity.cells.len(), "auto-merge");
    }
    entity.clamp_cells(world_size);
    entity.update_stats();
    absorbed
}

/// Push overlapping sibling cells apart, each by half the overlap.
fn separate_own_cells(cells: &mut [Cell]) {
    let len = cells.len();
    for i in 0..len {
        for j in (i + 1)..len {
            let dx = cells[i].x - cells[j].x;
            let dy = cells[i].y - cells[j].y;
            let dist = (dx * dx + dy * dy).sqrt();
            let min_dist = cells[i].radius + cells[j].radius;
            if dist < min_dist && dist > 0.0 {
                let push = (min_dist - dist) * SELF_PUSH_FACTOR;
                let px = dx / dist * push;
                let py = dy / dist * push;
                cells[i].x += px;
                cells[i].y += py;
                cells[j].x -= px;
                cells[j].y -= py;
            }
        }
    }
}

/// Largest cell without a countdown, or the largest overall when every cell is counting down.
fn main_cell_index(cells: &[Cell]) -> Option<usize> {
    let largest = |pending: bool| {
        cells
            .iter()
            .enumerate()
            .filter(|(_, c)| pending || c.merge_at.is_none())
            .max_by(|(_, a), (_, b)| a.radius.total_cmp(&b.radius))
            .map(|(i, _)| i)
    };
    largest(false).or_else(|| largest(true))
}

/// Drag pending cells toward the main cell; speed grows with the square of countdown progress.
fn pull_toward_main(cells: &mut [Cell], now: u64) {
    let Some(main) = main_cell_index(cells) else {
        return;
    };
    let (mx, my) = (cells[main].x, cells[main].y);
    for (i, cell) in cells.iter_mut().enumerate() {
        if i == main {
            continue;
        }
        let Some(at) = cell.merge_at else {
            continue;
        };
        if at <= now {
            continue;
        }
        let remaining = (at - now).min(MERGE_DELAY_MS) as f64;
        let progress = 1.0 - remaining / MERGE_DELAY_MS as f64;
        let speed = progress * progress * MERGE_PULL_MAX_SPEED;
        let (x, y) = physics::step_toward(cell.x, cell.y, mx, my, speed);
        cell.x = x;
        cell.y = y;
    }
}

/// Fold every cell whose countdown expired into one permanent cell.
fn auto_merge(cells: &mut Vec<Cell>, now: u64) -> usize {
    let (ready, mut keep): (Vec<Cell>, Vec<Cell>) =
        cells.drain(..).partition(|c| c.ready_to_merge(now));
    let absorbed = ready.len().saturating_sub(1);
    let mut ready = ready.into_iter();
    if let Some(mut merged) = ready.next() {
        for cell in ready {
            merged.radius = physics::combine_radii(merged.radius, cell.radius);
            merged.score += cell.score;
        }
        merged.merge_at = None;
        keep.push(merged);
    }
    *cells = keep;
    absorbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn player(radius: f64, score: u64) -> (Entity, StdRng) {
        let mut rng = StdRng::seed_from_u64(11);
        let mut e = Entity::new_player(1, "p".into(), 1500.0, 1500.0, &mut rng);
        e.cells[0].radius = radius;
        e.cells[0].score = score;
        e.update_stats();
        (e, rng)
    }

    #[test]
    fn split_halves_area_and_conserves_score() {
        let (mut e, mut rng) = player(60.0, 41);
        split(&mut e, 1000, SplitAim::Toward(2000.0, 1500.0), 3000.0, &mut rng).unwrap();

        assert_eq!(e.cells.len(), 2);
        let expected = 60.0 / SQRT_2;
        for c in &e.cells {
            assert!((c.radius - expected).abs() < 1e-9);
            assert_eq!(c.merge_at, Some(1000 + MERGE_DELAY_MS));
        }
        assert_eq!(e.cells[0].score + e.cells[1].score, 41);
        assert!((e.radius - 60.0).abs() < 1e-9);
        assert!(e.cells[1].x > e.cells[0].x);
        assert!(e.cells[1].vx > 0.0);
    }

    #[test]
    fn split_below_threshold_is_rejected() {
        let (mut e, mut rng) = player(29.0, 10);
        let res = split(&mut e, 0, SplitAim::Random, 3000.0, &mut rng);
        assert!(matches!(res, Err(GameError::SplitRejected(_))));
        assert_eq!(e.cells.len(), 1);
    }

    #[test]
    fn split_cap_holds_at_eight_cells() {
        let (mut e, mut rng) = player(40.0, 10);
        for i in 1..PLAYER_MAX_CELLS as u64 {
            let id = e.next_cell_id();
            e.cells.push(Cell::new(id, 100.0 * i as f64, 300.0, 40.0, 1));
        }
        e.update_stats();
        assert_eq!(e.cells.len(), 8);
        assert!(split(&mut e, 0, SplitAim::Random, 3000.0, &mut rng).is_err());
        assert_eq!(e.cells.len(), 8);
    }

    #[test]
    fn npc_needs_forty_aggregate_radius() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut npc = Entity::new_npc(2, 0, 3000.0, &mut rng);
        npc.cells[0].radius = 35.0;
        npc.update_stats();
        assert!(split(&mut npc, 0, SplitAim::Random, 3000.0, &mut rng).is_err());
        npc.cells[0].radius = 45.0;
        npc.update_stats();
        assert!(split(&mut npc, 0, SplitAim::Random, 3000.0, &mut rng).is_ok());
        assert_eq!(npc.cells[1].vx, 0.0);
    }

    #[test]
    fn merge_after_delay_restores_original_cell() {
        let (mut e, mut rng) = player(80.0, 100);
        split(&mut e, 0, SplitAim::Random, 3000.0, &mut rng).unwrap();

        assert_eq!(tick_merge_maintenance(&mut e, MERGE_DELAY_MS - 1, 3000.0), 0);
        assert_eq!(e.cells.len(), 2);

        assert_eq!(tick_merge_maintenance(&mut e, MERGE_DELAY_MS, 3000.0), 1);
        assert_eq!(e.cells.len(), 1);
        assert!((e.cells[0].radius - 80.0).abs() < 1e-9);
        assert_eq!(e.cells[0].score, 100);
        assert_eq!(e.cells[0].merge_at, None);
        assert_eq!(e.score, 100);
    }

    #[test]
    fn merge_is_area_preserving_for_unequal_cells() {
        let mut cells = vec![
            Cell { merge_at: Some(10), ..Cell::new(0, 0.0, 0.0, 30.0, 7) },
            Cell { merge_at: Some(10), ..Cell::new(1, 50.0, 0.0, 40.0, 3) },
            Cell { merge_at: Some(99), ..Cell::new(2, 90.0, 0.0, 20.0, 1) },
        ];
        assert_eq!(auto_merge(&mut cells, 10), 1);
        assert_eq!(cells.len(), 2);
        let merged = cells.iter().find(|c| c.merge_at.is_none()).unwrap();
        assert!((merged.radius - 50.0).abs() < 1e-9);
        assert_eq!(merged.score, 10);
    }

    #[test]
    fn own_cells_are_pushed_apart() {
        let mut cells = vec![Cell::new(0, 100.0, 100.0, 20.0, 0), Cell::new(1, 110.0, 100.0, 20.0, 0)];
        separate_own_cells(&mut cells);
        let gap = cells[1].x - cells[0].x;
        assert!(cells[0].x < 100.0 && cells[1].x > 110.0);
        assert!((gap.abs() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn pull_grows_with_countdown_progress() {
        let mut early = vec![
            Cell::new(0, 0.0, 0.0, 50.0, 0),
            Cell { merge_at: Some(MERGE_DELAY_MS), ..Cell::new(1, 500.0, 0.0, 20.0, 0) },
        ];
        pull_toward_main(&mut early, 0);
        assert_eq!(early[1].x, 500.0);

        let mut late = early.clone();
        pull_toward_main(&mut late, MERGE_DELAY_MS * 3 / 4);
        let mut later = early.clone();
        pull_toward_main(&mut later, MERGE_DELAY_MS - 1);
        assert!(late[1].x < 500.0);
        assert!(later[1].x < late[1].x);
        assert_eq!(late[0].x, 0.0);
    }
}
