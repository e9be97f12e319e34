// ==============================================================================
// tire.rs — COMBINED-SLIP TIRE FORCE (MAGIC-FORMULA SHAPE + FRICTION CIRCLE)
// ==============================================================================
// Both channels share the same saturating shape:
//
//     F = D * sin(C * atan(B * slip)),   D = peak_grip * Fz
//
// - lateral:      slip = slip angle (rad)
// - longitudinal: slip = slip ratio (-1..1)
//
// Combined: each channel is solved independently, then the pair is scaled
// down uniformly if |(Fx, Fy)| > peak_grip * Fz. Direction is preserved, so
// braking eats cornering grip and cornering eats braking grip.
// ==============================================================================

use crate::config::TireConfig;

#[derive(Debug, Clone, Copy)]
pub struct TireModel {
    pub peak_grip: f32, // μ
    pub stiffness: f32, // B
    pub shape: f32,     // C
    pub radius: f32,    // m
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CombinedForces {
    pub lateral: f32,      // N, along wheel right
    pub longitudinal: f32, // N, along wheel forward
}

impl CombinedForces {
    pub fn magnitude(&self) -> f32 {
        self.lateral.hypot(self.longitudinal)
    }
}

impl TireModel {
    pub fn new(config: &TireConfig) -> Self {
        Self {
            peak_grip: config.peak_grip,
            stiffness: config.stiffness,
            shape: config.shape,
            radius: config.radius,
        }
    }

    #[inline]
    fn shaped(&self, slip: f32, normal_force: f32) -> f32 {
        let d = self.peak_grip * normal_force.max(0.0);
        d * (self.shape * (self.stiffness * slip).atan()).sin()
    }

    pub fn compute_lateral_force(&self, slip_angle: f32, normal_force: f32) -> f32 {
        self.shaped(slip_angle, normal_force)
    }

    pub fn compute_longitudinal_force(&self, slip_ratio: f32, normal_force: f32) -> f32 {
        self.shaped(slip_ratio, normal_force)
    }

    /// Friction-circle limited lateral + longitudinal pair.
    pub fn compute_combined_forces(&self, slip_angle: f32, slip_ratio: f32, normal_force: f32) -> CombinedForces {
        let lateral = self.compute_lateral_force(slip_angle, normal_force);
        let longitudinal = self.compute_longitudinal_force(slip_ratio, normal_force);

        let limit = self.max_force(normal_force);
        let magnitude = lateral.hypot(longitudinal);

        if magnitude > limit && magnitude > 1e-6 {
            let scale = limit / magnitude;
            CombinedForces {
                lateral: lateral * scale,
                longitudinal: longitudinal * scale,
            }
        } else {
            CombinedForces { lateral, longitudinal }
        }
    }

    /// Radius of the friction circle for a given load.
    pub fn max_force(&self, normal_force: f32) -> f32 {
        self.peak_grip * normal_force.max(0.0)
    }
}
