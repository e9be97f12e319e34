// ==============================================================================
// racing_line.rs — PRECOMPUTED AIM POINTS + TARGET SPEEDS
// ------------------------------------------------------------------------------
// Built once per race from a Curve and a sparse speed table (km/h):
//
//   sample k:  t_k = k / N,  position = curve(t_k)
//   speed:     table entries are spread evenly over t and linearly
//              interpolated; a closed line wraps the last entry back to the
//              first, an open line stretches the table over [0, 1]
//
// Lookups are index-based and never interpolate.
// ==============================================================================

use rapier3d::na::Point3;

use crate::error::{TrackError, TrackResult};
use crate::track::curve::Curve;

pub const DEFAULT_SAMPLES: usize = 200;
const MIN_SAMPLES: usize = 2;
const KMH_TO_MS: f32 = 1.0 / 3.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RacingLinePoint {
    pub position: Point3<f32>,
    pub target_speed: f32, // m/s
    pub t: f32,            // [0, 1)
}

#[derive(Debug, Clone)]
pub struct RacingLine {
    points: Vec<RacingLinePoint>,
    track_length: f32,
}

impl RacingLine {
    pub fn new(curve: &Curve, speed_table_kmh: &[f32], samples: usize) -> TrackResult<Self> {
        if speed_table_kmh.is_empty() {
            return Err(TrackError::EmptySpeedTable);
        }
        if samples < MIN_SAMPLES {
            return Err(TrackError::InvalidSampleCount {
                got: samples,
                min: MIN_SAMPLES,
            });
        }

        let points = (0..samples)
            .map(|k| {
                let t = k as f32 / samples as f32;
                RacingLinePoint {
                    position: curve.interpolate(t),
                    target_speed: speed_at(speed_table_kmh, t, curve.is_closed()) * KMH_TO_MS,
                    t,
                }
            })
            .collect();

        Ok(Self {
            points,
            track_length: curve.total_length(),
        })
    }

    pub fn points(&self) -> &[RacingLinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the underlying curve, m.
    pub fn track_length(&self) -> f32 {
        self.track_length
    }

    /// Aim point `lookahead` (in t units) ahead of `current_t`.
    pub fn get_target_point(&self, current_t: f32, lookahead: f32) -> &RacingLinePoint {
        let n = self.points.len();
        let t = wrap01(current_t + lookahead);
        let idx = ((t * n as f32).floor() as usize).min(n - 1);
        &self.points[idx]
    }

    /// Target speed (m/s) of the nearest sample.
    pub fn get_target_speed(&self, t: f32) -> f32 {
        let n = self.points.len();
        let idx = (wrap01(t) * n as f32).round() as usize % n;
        self.points[idx].target_speed
    }
}

fn wrap01(t: f32) -> f32 {
    if t.is_finite() { t.rem_euclid(1.0) } else { 0.0 }
}

/// Linear interpolation of an evenly spread table at t.
fn speed_at(table: &[f32], t: f32, closed: bool) -> f32 {
    let m = table.len();
    if m == 1 {
        return table[0];
    }

    let (pos, wraps) = if closed { (t * m as f32, true) } else { (t * (m - 1) as f32, false) };
    let i = (pos.floor() as usize).min(if wraps { m - 1 } else { m - 2 });
    let u = pos - i as f32;
    let next = if wraps { (i + 1) % m } else { i + 1 };

    table[i] + (table[next] - table[i]) * u
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oval() -> Curve {
        Curve::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 200.0),
                Point3::new(80.0, 0.0, 200.0),
                Point3::new(80.0, 0.0, 0.0),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(RacingLine::new(&oval(), &[], 200), Err(TrackError::EmptySpeedTable)));
        assert!(matches!(
            RacingLine::new(&oval(), &[100.0], 1),
            Err(TrackError::InvalidSampleCount { got: 1, min: 2 })
        ));
    }

    #[test]
    fn test_samples_cover_the_loop() {
        let line = RacingLine::new(&oval(), &[120.0], DEFAULT_SAMPLES).unwrap();
        assert_eq!(line.len(), 200);
        assert_eq!(line.points()[0].t, 0.0);
        assert!((line.points()[199].t - 0.995).abs() < 1e-6);
        assert!((line.points()[0].position - Point3::origin()).norm() < 1e-3);
    }

    #[test]
    fn test_speed_table_is_converted_and_interpolated() {
        // four checkpoints over a closed loop: 0, .25, .5, .75
        let line = RacingLine::new(&oval(), &[72.0, 144.0, 72.0, 36.0], 200).unwrap();
        assert!((line.get_target_speed(0.0) - 20.0).abs() < 1e-4);
        assert!((line.get_target_speed(0.25) - 40.0).abs() < 1e-4);
        assert!((line.get_target_speed(0.125) - 30.0).abs() < 1e-3);
        // wraps from the last checkpoint back to the first
        assert!((line.get_target_speed(0.875) - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_target_point_wraps() {
        let line = RacingLine::new(&oval(), &[100.0], 200).unwrap();
        let p = line.get_target_point(0.98, 0.05);
        assert!(p.t > 0.02 && p.t < 0.035, "t={}", p.t);
        let q = line.get_target_point(0.5, 0.0);
        assert_eq!(q.t, 0.5);
    }

    #[test]
    fn test_target_speed_is_nearest_sample() {
        let line = RacingLine::new(&oval(), &[0.0, 360.0], 4).unwrap();
        // closed, two entries: 0 at t=0, 100 m/s at t=0.5
        assert_eq!(line.get_target_speed(0.24), line.points()[1].target_speed);
        assert_eq!(line.get_target_speed(0.99), line.points()[0].target_speed);
    }

    #[test]
    fn test_open_table_spans_whole_line() {
        assert!((speed_at(&[0.0, 100.0], 1.0, false) - 100.0).abs() < 1e-6);
        assert!((speed_at(&[0.0, 100.0], 0.5, false) - 50.0).abs() < 1e-6);
        assert!((speed_at(&[0.0, 100.0], 0.5, true) - 100.0).abs() < 1e-6);
    }
}
