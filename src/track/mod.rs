//! track - centerline geometry, racing line, lap progress and starting grid

pub mod curve;
pub mod grid;
pub mod progress;
pub mod racing_line;

pub use curve::Curve;
pub use grid::{GridSlot, starting_grid};
pub use progress::LapTracker;
pub use racing_line::{RacingLine, RacingLinePoint};

use rapier3d::na::Point3;

use crate::error::TrackResult;

/// Checkpoint speeds (km/h) for `demo_circuit`, one per control point.
pub const DEMO_SPEED_TABLE_KMH: [f32; 12] = [
    150.0, 160.0, 110.0, 75.0, 90.0, 130.0, 140.0, 100.0, 70.0, 85.0, 120.0, 140.0,
];

/// Flat closed circuit of about 1 km: two straights joined by a hairpin and a
/// sweeper. The start line sits mid-straight.
pub fn demo_circuit() -> TrackResult<Curve> {
    let points = [
        (0.0, 0.0),
        (0.0, 120.0),
        (10.0, 200.0),
        (60.0, 240.0),
        (120.0, 230.0),
        (150.0, 180.0),
        (160.0, 100.0),
        (170.0, 20.0),
        (150.0, -60.0),
        (90.0, -100.0),
        (30.0, -110.0),
        (0.0, -80.0),
    ];
    Curve::new(points.iter().map(|&(x, z)| Point3::new(x, 0.0, z)).collect(), true)
}
