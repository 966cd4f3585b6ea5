use rand::Rng;
use serde::Serialize;

use crate::config::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Water,
    Enzyme,
    Leaf,
}

#[derive(Debug, Clone)]
pub struct Food {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
    pub name: &'static str,
    pub kind: FoodKind,
}

const STRAINS: &[&str] = &[
    "Bacillus", "E. coli", "Staphylococcus", "Streptococcus", "Lactobacillus",
    "Bifidobacterium", "Salmonella", "Vibrio", "Pseudomonas", "Mycobacterium",
    "RNA Virus", "DNA Virus", "Gram+ Bacteria", "Gram- Bacteria", "Archaebacteria",
];

const KINDS: [FoodKind; 3] = [FoodKind::Water, FoodKind::Enzyme, FoodKind::Leaf];

/// Food items plus the policy that keeps their count near `target`.
pub struct FoodSupply {
    pub items: Vec<Food>,
    target: usize,
    next_id: u64,
    last_sweep_ms: u64,
}

impl FoodSupply {
    pub fn new(target: usize) -> Self {
        FoodSupply {
            items: Vec::with_capacity(target),
            target,
            next_id: 0,
            last_sweep_ms: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Discard everything and scatter a full set.
    pub fn regenerate(&mut self, world_size: f64, now: u64, rng: &mut impl Rng) {
        self.items.clear();
        self.last_sweep_ms = now;
        self.spawn_many(self.target, world_size, rng);
    }

    pub fn spawn(&mut self, world_size: f64, rng: &mut impl Rng) {
        let radius = rng.gen_range(FOOD_MIN_RADIUS..FOOD_MAX_RADIUS);
        let food = Food {
            id: self.next_id,
            x: rng.gen_range(radius..world_size - radius),
            y: rng.gen_range(radius..world_size - radius),
            radius,
            color: format!(
                "hsl({:.0}, 70%, {:.0}%)",
                rng.gen_range(0.0..360.0),
                rng.gen_range(50.0..70.0)
            ),
            name: STRAINS[rng.gen_range(0..STRAINS.len())],
            kind: KINDS[rng.gen_range(0..KINDS.len())],
        };
        self.next_id += 1;
        self.items.push(food);
    }

    pub fn spawn_many(&mut self, count: usize, world_size: f64, rng: &mut impl Rng) {
        for _ in 0..count {
            self.spawn(world_size, rng);
        }
    }

    /// Remove the foods at `indices` (any order, duplicates allowed) and return them.
    pub fn take(&mut self, indices: &mut Vec<usize>) -> Vec<Food> {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        let mut taken = Vec::with_capacity(indices.len());
        for &i in indices.iter() {
            if i < self.items.len() {
                taken.push(self.items.swap_remove(i));
            }
        }
        taken
    }

    /// Per-tick top-up: below 80% of target, add up to one batch; never exceed target.
    pub fn maintain(&mut self, world_size: f64, rng: &mut impl Rng) -> usize {
        let mut spawned = 0;
        if (self.items.len() as f64) < self.target as f64 * FOOD_LOW_WATER {
            spawned = (self.target - self.items.len()).min(FOOD_BATCH);
            self.spawn_many(spawned, world_size, rng);
        }
        self.items.truncate(self.target);
        spawned
    }

    /// Slower safety net, runs at most once per sweep interval.
    pub fn sweep(&mut self, now: u64, world_size: f64, rng: &mut impl Rng) -> usize {
        if now.saturating_sub(self.last_sweep_ms) < FOOD_SWEEP_INTERVAL_MS {
            return 0;
        }
        self.last_sweep_ms = now;
        let mut spawned = self.maintain(world_size, rng);
        if (self.items.len() as f64) < self.target as f64 * FOOD_SWEEP_LOW_WATER {
            let extra = (self.target - self.items.len()).min(FOOD_SWEEP_BATCH);
            self.spawn_many(extra, world_size, rng);
            spawned += extra;
        }
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn regenerate_fills_to_target_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut supply = FoodSupply::new(200);
        supply.regenerate(500.0, 0, &mut rng);
        assert_eq!(supply.len(), 200);
        for f in &supply.items {
            assert!(f.radius >= FOOD_MIN_RADIUS && f.radius < FOOD_MAX_RADIUS);
            assert!(f.x >= f.radius && f.x <= 500.0 - f.radius);
        }
    }

    #[test]
    fn maintain_only_tops_up_below_low_water() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut supply = FoodSupply::new(200);
        supply.regenerate(500.0, 0, &mut rng);

        let mut idx: Vec<usize> = (0..30).collect();
        supply.take(&mut idx);
        assert_eq!(supply.maintain(500.0, &mut rng), 0);
        assert_eq!(supply.len(), 170);

        let mut idx: Vec<usize> = (0..100).collect();
        supply.take(&mut idx);
        assert_eq!(supply.maintain(500.0, &mut rng), FOOD_BATCH);
        assert_eq!(supply.len(), 70 + FOOD_BATCH);
    }

    #[test]
    fn take_handles_duplicates() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut supply = FoodSupply::new(10);
        supply.regenerate(500.0, 0, &mut rng);
        let mut idx = vec![3, 1, 3];
        assert_eq!(supply.take(&mut idx).len(), 2);
        assert_eq!(supply.len(), 8);
    }

    #[test]
    fn take_returns_requested_foods_and_skips_stale_indices() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut supply = FoodSupply::new(5);
        supply.regenerate(500.0, 0, &mut rng);
        let wanted = [supply.items[0].id, supply.items[4].id];
        let mut idx = vec![0, 4, 9];
        let mut ids: Vec<u64> = supply.take(&mut idx).iter().map(|f| f.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, wanted);
        assert_eq!(supply.len(), 3);
        assert!(supply.items.iter().all(|f| !wanted.contains(&f.id)));
    }

    #[test]
    fn sweep_is_rate_limited() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut supply = FoodSupply::new(100);
        supply.regenerate(500.0, 0, &mut rng);
        supply.items.clear();
        assert_eq!(supply.sweep(1000, 500.0, &mut rng), 0);
        let spawned = supply.sweep(2000, 500.0, &mut rng);
        assert_eq!(spawned, 100);
        assert_eq!(supply.len(), 100);
    }
}
