pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

pub fn circles_overlap(x1: f64, y1: f64, r1: f64, x2: f64, y2: f64, r2: f64) -> bool {
    distance(x1, y1, x2, y2) < r1 + r2
}

/// Check if a circle of `radius` dominates one of `other` under `ratio`.
pub fn dominates(radius: f64, other: f64, ratio: f64) -> bool {
    radius >= other * ratio
}

/// Radius of a single circle with the combined area of both.
pub fn combine_radii(r1: f64, r2: f64) -> f64 {
    (r1 * r1 + r2 * r2).sqrt()
}

/// Clamp position to `[radius, world_size - radius]` on both axes
pub fn clamp_to_world(x: f64, y: f64, radius: f64, world_size: f64) -> (f64, f64) {
    let hi = (world_size - radius).max(radius);
    (x.max(radius).min(hi), y.max(radius).min(hi))
}

/// Normalize a direction vector
pub fn normalize(x: f64, y: f64) -> (f64, f64) {
    let len = (x * x + y * y).sqrt();
    if len < 0.0001 {
        (0.0, 0.0)
    } else {
        (x / len, y / len)
    }
}

/// Step from `(x, y)` toward `(tx, ty)` by at most `step`, landing on the target when closer.
pub fn step_toward(x: f64, y: f64, tx: f64, ty: f64, step: f64) -> (f64, f64) {
    let dx = tx - x;
    let dy = ty - y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > step {
        (x + dx / dist * step, y + dy / dist * step)
    } else {
        (tx, ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_circles_do_not_overlap() {
        assert!(!circles_overlap(0.0, 0.0, 5.0, 10.0, 0.0, 5.0));
        assert!(circles_overlap(0.0, 0.0, 5.0, 9.9, 0.0, 5.0));
    }

    #[test]
    fn combined_radius_preserves_area() {
        let r = combine_radii(3.0, 4.0);
        assert!((r - 5.0).abs() < 1e-12);
    }

    #[test]
    fn clamp_keeps_circle_inside() {
        assert_eq!(clamp_to_world(-10.0, 5000.0, 20.0, 3000.0), (20.0, 2980.0));
        assert_eq!(clamp_to_world(100.0, 100.0, 20.0, 3000.0), (100.0, 100.0));
    }

    #[test]
    fn step_toward_does_not_overshoot() {
        assert_eq!(step_toward(0.0, 0.0, 3.0, 4.0, 10.0), (3.0, 4.0));
        let (x, y) = step_toward(0.0, 0.0, 30.0, 40.0, 5.0);
        assert!((x - 3.0).abs() < 1e-12 && (y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_zero_vector_is_zero() {
        assert_eq!(normalize(0.0, 0.0), (0.0, 0.0));
    }
}
