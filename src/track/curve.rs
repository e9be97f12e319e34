// ==============================================================================
// curve.rs — CATMULL-ROM CENTERLINE (OPEN OR CLOSED)
// ------------------------------------------------------------------------------
// Parameterisation: t in [0, 1] spans every segment uniformly. A closed curve
// with n control points has n segments (the last one wraps back to point 0);
// an open curve has n - 1. Closed curves take t modulo 1, open ones clamp.
//
// Segment i between P[i] and P[i+1] blends P[i-1], P[i], P[i+1], P[i+2];
// neighbour indices wrap (closed) or clamp to the ends (open).
//
// Arc lengths are chord sums (20 samples per segment at construction). They are
// accurate enough for progress and lookahead distances, not for surveying.
// ==============================================================================

use rapier3d::na::{Point3, Vector3};

use crate::error::{TrackError, TrackResult};

pub const MIN_CONTROL_POINTS: usize = 4;
const SAMPLES_PER_SEGMENT: usize = 20;
const TANGENT_STEP: f32 = 1e-3;
const REFINE_ITERATIONS: usize = 10;

#[derive(Debug, Clone)]
pub struct Curve {
    points: Vec<Point3<f32>>,
    closed: bool,
    segment_lengths: Vec<f32>,
    total_length: f32,
}

impl Curve {
    pub fn new(points: Vec<Point3<f32>>, closed: bool) -> TrackResult<Self> {
        if points.len() < MIN_CONTROL_POINTS {
            return Err(TrackError::TooFewControlPoints {
                got: points.len(),
                min: MIN_CONTROL_POINTS,
            });
        }

        let mut curve = Self {
            points,
            closed,
            segment_lengths: Vec::new(),
            total_length: 0.0,
        };

        let segments = curve.segment_count();
        curve.segment_lengths = (0..segments)
            .map(|i| {
                let t0 = i as f32 / segments as f32;
                let t1 = (i + 1) as f32 / segments as f32;
                curve.arc_length(t0, t1, SAMPLES_PER_SEGMENT)
            })
            .collect();
        curve.total_length = curve.segment_lengths.iter().sum();

        Ok(curve)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn control_points(&self) -> &[Point3<f32>] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        if self.closed { self.points.len() } else { self.points.len() - 1 }
    }

    pub fn segment_lengths(&self) -> &[f32] {
        &self.segment_lengths
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Wrap (closed) or clamp (open) a parameter into [0, 1].
    pub fn normalize_t(&self, t: f32) -> f32 {
        if !t.is_finite() {
            return 0.0;
        }
        if self.closed { t.rem_euclid(1.0) } else { t.clamp(0.0, 1.0) }
    }

    fn control(&self, index: isize) -> Point3<f32> {
        let n = self.points.len() as isize;
        let i = if self.closed { index.rem_euclid(n) } else { index.clamp(0, n - 1) };
        self.points[i as usize]
    }

    /// Position on the curve at parameter t.
    pub fn interpolate(&self, t: f32) -> Point3<f32> {
        let segments = self.segment_count();
        let scaled = self.normalize_t(t) * segments as f32;
        let seg = (scaled.floor() as usize).min(segments - 1);
        let u = scaled - seg as f32;

        let i = seg as isize;
        let p0 = self.control(i - 1).coords;
        let p1 = self.control(i).coords;
        let p2 = self.control(i + 1).coords;
        let p3 = self.control(i + 2).coords;

        let u2 = u * u;
        let u3 = u2 * u;
        let blended = p1 * 2.0
            + (p2 - p0) * u
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * u2
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * u3;
        Point3::from(blended * 0.5)
    }

    /// Unit tangent by central difference.
    pub fn tangent(&self, t: f32) -> Vector3<f32> {
        let (a, b) = if self.closed {
            (t - TANGENT_STEP, t + TANGENT_STEP)
        } else {
            ((t - TANGENT_STEP).max(0.0), (t + TANGENT_STEP).min(1.0))
        };
        let d = self.interpolate(b) - self.interpolate(a);
        d.try_normalize(1e-9).unwrap_or_else(Vector3::z)
    }

    /// Parameter of the closest curve point: coarse scan, then ternary search
    /// on the bracket around the best sample.
    pub fn nearest_t(&self, point: &Point3<f32>, samples: usize) -> f32 {
        let samples = samples.max(2);
        let dist2 = |t: f32| (self.interpolate(t) - point).norm_squared();

        let step = if self.closed { 1.0 / samples as f32 } else { 1.0 / (samples - 1) as f32 };
        let mut best_t = 0.0;
        let mut best_d = f32::MAX;
        for i in 0..samples {
            let t = i as f32 * step;
            let d = dist2(t);
            if d < best_d {
                best_d = d;
                best_t = t;
            }
        }

        let (mut lo, mut hi) = (best_t - step, best_t + step);
        if !self.closed {
            lo = lo.max(0.0);
            hi = hi.min(1.0);
        }

        for _ in 0..REFINE_ITERATIONS {
            let m1 = lo + (hi - lo) / 3.0;
            let m2 = hi - (hi - lo) / 3.0;
            if dist2(m1) < dist2(m2) {
                hi = m2;
            } else {
                lo = m1;
            }
        }

        self.normalize_t((lo + hi) * 0.5)
    }

    /// Chord-sum length between two parameters (t1 may exceed 1 on a closed curve).
    pub fn arc_length(&self, t0: f32, t1: f32, samples: usize) -> f32 {
        let samples = samples.max(1);
        let mut length = 0.0;
        let mut prev = self.interpolate(t0);
        for i in 1..=samples {
            let t = t0 + (t1 - t0) * (i as f32 / samples as f32);
            let p = self.interpolate(t);
            length += (p - prev).norm();
            prev = p;
        }
        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(closed: bool) -> Curve {
        Curve::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(100.0, 0.0, 0.0),
                Point3::new(100.0, 0.0, 100.0),
                Point3::new(0.0, 0.0, 100.0),
            ],
            closed,
        )
        .unwrap()
    }

    fn circle(radius: f32, n: usize) -> Curve {
        let points = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                Point3::new(radius * a.cos(), 0.0, radius * a.sin())
            })
            .collect();
        Curve::new(points, true).unwrap()
    }

    #[test]
    fn test_too_few_points_is_an_error() {
        let err = Curve::new(vec![Point3::origin(); 3], true).unwrap_err();
        assert!(matches!(err, TrackError::TooFewControlPoints { got: 3, min: 4 }));
    }

    #[test]
    fn test_passes_through_control_points() {
        let c = square(true);
        for (i, p) in c.control_points().iter().enumerate() {
            let t = i as f32 / 4.0;
            assert!((c.interpolate(t) - p).norm() < 1e-3, "point {i}");
        }
    }

    #[test]
    fn test_closed_curve_wraps() {
        let c = square(true);
        assert!((c.interpolate(0.0) - c.interpolate(1.0)).norm() < 1e-5);
        assert!((c.interpolate(0.3) - c.interpolate(1.3)).norm() < 1e-3);
        assert!((c.interpolate(-0.25) - c.interpolate(0.75)).norm() < 1e-3);
    }

    #[test]
    fn test_open_curve_clamps_to_ends() {
        let c = square(false);
        assert_eq!(c.segment_count(), 3);
        assert!((c.interpolate(1.0) - Point3::new(0.0, 0.0, 100.0)).norm() < 1e-3);
        assert!((c.interpolate(2.0) - c.interpolate(1.0)).norm() < 1e-6);
        assert!((c.interpolate(-1.0) - Point3::origin()).norm() < 1e-6);
    }

    #[test]
    fn test_total_length_of_circle() {
        let c = circle(50.0, 16);
        let expected = std::f32::consts::TAU * 50.0;
        assert!((c.total_length() - expected).abs() / expected < 0.01, "len={}", c.total_length());
        let summed: f32 = c.segment_lengths().iter().sum();
        assert!((summed - c.total_length()).abs() < 1e-3);
    }

    #[test]
    fn test_tangent_is_unit_and_follows_direction() {
        let c = circle(50.0, 16);
        let t = c.tangent(0.0);
        assert!((t.norm() - 1.0).abs() < 1e-5);
        // counter-clockwise in x/z: at angle 0 the curve heads towards +z
        assert!(t.z > 0.99);
    }

    #[test]
    fn test_nearest_t_recovers_sampled_parameter() {
        let c = circle(80.0, 12);
        for &t in &[0.0_f32, 0.13, 0.5, 0.77, 0.991] {
            let p = c.interpolate(t);
            let found = c.nearest_t(&p, 100);
            let err = (found - t).abs().min(1.0 - (found - t).abs());
            assert!(err < 1e-3, "t={t} found={found}");
        }
    }

    #[test]
    fn test_nearest_t_projects_offset_points() {
        let c = circle(80.0, 12);
        // 5 m outside the line at a quarter lap
        let on = c.interpolate(0.25);
        let outward = Vector3::new(on.x, 0.0, on.z).normalize();
        let found = c.nearest_t(&(on + outward * 5.0), 100);
        assert!((found - 0.25).abs() < 5e-3);
    }
}
