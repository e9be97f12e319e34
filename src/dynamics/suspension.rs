// ==============================================================================
// suspension.rs — PER-WHEEL SPRING / DAMPER FORCE LAW
// ------------------------------------------------------------------------------
// compression is measured from full droop (the tip of the suspension ray), so
// 0 means the wheel hangs fully extended and anything <= 0 carries no load.
//
//     F = k * min(x, max_travel) + c * clamp(v, ±max_damper_velocity)
//     F = max(F, 0)            (the suspension never pulls the chassis down)
// ==============================================================================

use crate::config::SuspensionConfig;

#[derive(Debug, Clone, Copy)]
pub struct SuspensionModel {
    pub spring_rate: f32,         // N/m
    pub damping_rate: f32,        // N·s/m
    pub rest_length: f32,         // m
    pub max_travel: f32,          // m
    pub max_damper_velocity: f32, // m/s
}

impl SuspensionModel {
    pub fn new(config: &SuspensionConfig) -> Self {
        Self {
            spring_rate: config.spring_rate,
            damping_rate: config.damping_rate,
            rest_length: config.rest_length,
            max_travel: config.max_travel,
            max_damper_velocity: config.max_damper_velocity,
        }
    }

    /// Spring + damper force along chassis-up, in newtons.
    pub fn compute_force(&self, compression: f32, compression_velocity: f32) -> f32 {
        if compression <= 0.0 {
            return 0.0;
        }

        let x = compression.min(self.max_travel);
        let v = compression_velocity.clamp(-self.max_damper_velocity, self.max_damper_velocity);

        let spring = self.spring_rate * x; // F_s = k * x
        let damper = self.damping_rate * v; // F_d = c * v

        (spring + damper).max(0.0)
    }

    /// Length of the suspension ray before the tire radius is added.
    pub fn ray_length(&self) -> f32 {
        self.rest_length + self.max_travel
    }
}
