//! Whole-vehicle drag and downforce, quadratic in speed.

use crate::config::AeroConfig;

/// Sea-level air density, kg/m³.
pub const AIR_DENSITY: f32 = 1.225;

#[derive(Debug, Clone, Copy)]
pub struct AerodynamicsModel {
    pub drag_coefficient: f32,
    pub frontal_area: f32,
    pub downforce_coefficient: f32,
}

impl AerodynamicsModel {
    pub fn new(config: &AeroConfig) -> Self {
        Self {
            drag_coefficient: config.drag_coefficient,
            frontal_area: config.frontal_area,
            downforce_coefficient: config.downforce_coefficient,
        }
    }

    /// Drag magnitude (N), applied against the velocity direction.
    pub fn drag(&self, speed: f32) -> f32 {
        0.5 * AIR_DENSITY * self.drag_coefficient * self.frontal_area * speed * speed
    }

    /// Downforce magnitude (N), always pushing the chassis down.
    pub fn downforce(&self, speed: f32) -> f32 {
        (0.5 * AIR_DENSITY * self.downforce_coefficient * self.frontal_area * speed * speed).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_in_speed() {
        let aero = AerodynamicsModel { drag_coefficient: 0.3, frontal_area: 2.0, downforce_coefficient: 0.5 };
        let d10 = aero.drag(10.0);
        let d20 = aero.drag(20.0);
        assert!((d20 / d10 - 4.0).abs() < 1e-4);
        assert!((d10 - 0.5 * AIR_DENSITY * 0.3 * 2.0 * 100.0).abs() < 1e-3);
        assert_eq!(aero.drag(0.0), 0.0);
        // direction of travel does not matter
        assert!((aero.downforce(-15.0) - aero.downforce(15.0)).abs() < 1e-4);
        assert!(aero.downforce(15.0) > 0.0);
    }
}
