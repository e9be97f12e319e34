//! Two-wide staggered starting grid behind the start line (t = 0).

use rapier3d::na::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use crate::track::curve::Curve;

/// Distance between consecutive rows, m.
pub const ROW_SPACING: f32 = 8.0;
/// Offset of each column from the centerline, m.
pub const COLUMN_OFFSET: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSlot {
    pub position: Point3<f32>, // ground level
    pub heading: Vector3<f32>, // unit, horizontal
    pub t: f32,
}

impl GridSlot {
    /// Ground-level pose with local +Z along the heading.
    pub fn pose(&self) -> Isometry3<f32> {
        let rotation = UnitQuaternion::face_towards(&self.heading, &Vector3::y());
        Isometry3::from_parts(Translation3::from(self.position.coords), rotation)
    }
}

/// `count` slots: pole on the left, the next car half a row further back on
/// the right, and so on.
pub fn starting_grid(curve: &Curve, count: usize) -> Vec<GridSlot> {
    let length = curve.total_length().max(1.0);

    (0..count)
        .map(|i| {
            let back = ROW_SPACING * (0.5 + i as f32 * 0.5);
            let t = curve.normalize_t(-back / length);

            let tangent = curve.tangent(t);
            let heading = Vector3::new(tangent.x, 0.0, tangent.z)
                .try_normalize(1e-6)
                .unwrap_or_else(Vector3::z);
            // left = up × forward
            let left = Vector3::y().cross(&heading);
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };

            GridSlot {
                position: curve.interpolate(t) + left * (COLUMN_OFFSET * side),
                heading,
                t,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_loop() -> Curve {
        Curve::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 150.0),
                Point3::new(-60.0, 0.0, 150.0),
                Point3::new(-60.0, 0.0, 0.0),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_slots_are_behind_the_line_and_staggered() {
        let curve = straight_loop();
        let grid = starting_grid(&curve, 4);
        assert_eq!(grid.len(), 4);

        for slot in &grid {
            assert!(slot.t > 0.9, "t={}", slot.t);
        }
        for w in grid.windows(2) {
            assert!(w[1].t < w[0].t);
        }
        // alternating sides of the centerline, pole on the left
        for (i, slot) in grid.iter().enumerate() {
            let offset = slot.position - curve.interpolate(slot.t);
            let left = Vector3::y().cross(&slot.heading);
            let expected = if i % 2 == 0 { COLUMN_OFFSET } else { -COLUMN_OFFSET };
            assert!((offset.dot(&left) - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_pose_faces_along_track() {
        let curve = straight_loop();
        let grid = starting_grid(&curve, 2);
        for slot in &grid {
            let forward = slot.pose().rotation * Vector3::z();
            assert!((forward - slot.heading).norm() < 1e-4);
            assert!(slot.heading.y.abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_grid() {
        assert!(starting_grid(&straight_loop(), 0).is_empty());
    }
}
