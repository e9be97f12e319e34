// ==============================================================================
// config.rs — VEHICLE CONFIGURATION (IMMUTABLE, LOADED ONCE PER RACE)
// ------------------------------------------------------------------------------
// A VehicleConfig is the JSON-shaped description of one car:
// - engine: torque curve samples + idle / redline / max RPM
// - transmission: gear ratios, reverse, final drive, drivetrain loss, layout
// - suspension / tires: per-axle parameters (front, rear)
// - brakes, aero, chassis dimensions, assist toggles
//
// Loading:
// - VehicleConfig::from_json_str / from_path parse and then validate().
// - validate() is the fail-fast gate; the simulation never re-checks these
//   values per tick and instead clamps at table extremes.
// ==============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub mass: f32, // kg
    pub engine: EngineConfig,
    pub transmission: TransmissionConfig,
    pub suspension: AxlePair<SuspensionConfig>,
    pub tires: TireSet,
    #[serde(default)]
    pub brakes: BrakeConfig,
    pub aero: AeroConfig,
    pub dimensions: ChassisDimensions,
    #[serde(default)]
    pub assists: AssistConfig,
}

/// Front/rear pair for per-axle parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AxlePair<T> {
    pub front: T,
    pub rear: T,
}

impl<T> AxlePair<T> {
    pub fn get(&self, front: bool) -> &T {
        if front { &self.front } else { &self.rear }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Ordered `(rpm, torque N·m)` samples.
    pub torque_curve: Vec<(f32, f32)>,
    pub idle_rpm: f32,
    pub redline_rpm: f32,
    pub max_rpm: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriveLayout {
    #[default]
    Rwd,
    Fwd,
    Awd,
}

impl DriveLayout {
    pub fn drives_front(self) -> bool {
        matches!(self, DriveLayout::Fwd | DriveLayout::Awd)
    }

    pub fn drives_rear(self) -> bool {
        matches!(self, DriveLayout::Rwd | DriveLayout::Awd)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransmissionConfig {
    pub gear_ratios: Vec<f32>,
    pub reverse_ratio: f32,
    pub final_drive: f32,
    pub drivetrain_loss: f32, // 0..1
    #[serde(default)]
    pub layout: DriveLayout,
    #[serde(default = "default_shift_cooldown")]
    pub shift_cooldown: f32, // s
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SuspensionConfig {
    pub spring_rate: f32,  // N/m
    pub damping_rate: f32, // N·s/m
    pub rest_length: f32,  // m
    pub max_travel: f32,   // m
    #[serde(default = "default_max_damper_velocity")]
    pub max_damper_velocity: f32, // m/s
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TireConfig {
    pub peak_grip: f32, // μ at the force peak
    pub stiffness: f32, // B
    pub shape: f32,     // C
    pub radius: f32,    // m
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TireSet {
    pub front: TireConfig,
    pub rear: TireConfig,
    #[serde(default = "default_rolling_resistance")]
    pub rolling_resistance: f32,
}

impl TireSet {
    pub fn get(&self, front: bool) -> &TireConfig {
        if front { &self.front } else { &self.rear }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BrakeConfig {
    pub max_torque: f32,       // N·m per wheel at full pedal
    pub front_bias: f32,       // 0..1
    pub handbrake_torque: f32, // N·m per rear wheel
}

impl Default for BrakeConfig {
    fn default() -> Self {
        Self {
            max_torque: 2400.0,
            front_bias: 0.62,
            handbrake_torque: 3500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AeroConfig {
    pub drag_coefficient: f32,
    pub frontal_area: f32, // m²
    pub downforce_coefficient: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChassisDimensions {
    pub wheelbase: f32,   // m (front axle to rear axle)
    pub track_width: f32, // m (left to right)
    pub cg_height: f32,   // m
    #[serde(default = "default_mount_height")]
    pub mount_height: f32, // m, wheel mounts relative to body origin
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AssistConfig {
    pub traction_control: bool,
    pub abs: bool,
    pub steering_assist: bool,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            traction_control: true,
            abs: true,
            steering_assist: true,
        }
    }
}

fn default_name() -> String {
    "Unnamed".to_string()
}

fn default_shift_cooldown() -> f32 {
    0.3
}

fn default_max_damper_velocity() -> f32 {
    5.0
}

fn default_rolling_resistance() -> f32 {
    0.015
}

fn default_mount_height() -> f32 {
    -0.2
}

impl VehicleConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: VehicleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!(name = %config.name, path = %path.display(), "loaded vehicle config");
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.mass > 0.0) {
            return Err(ConfigError::invalid("mass must be positive"));
        }

        // --- engine ---
        let curve = &self.engine.torque_curve;
        if curve.len() < 2 {
            return Err(ConfigError::invalid("torque curve needs at least two samples"));
        }
        if curve.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(ConfigError::invalid("torque curve rpm must be strictly increasing"));
        }
        if curve.iter().any(|&(rpm, torque)| !rpm.is_finite() || !torque.is_finite()) {
            return Err(ConfigError::invalid("torque curve contains non-finite values"));
        }
        let e = &self.engine;
        if !(e.idle_rpm > 0.0 && e.idle_rpm < e.redline_rpm && e.redline_rpm <= e.max_rpm) {
            return Err(ConfigError::invalid(
                "expected 0 < idle_rpm < redline_rpm <= max_rpm",
            ));
        }

        // --- transmission ---
        let t = &self.transmission;
        if t.gear_ratios.is_empty() {
            return Err(ConfigError::invalid("at least one forward gear is required"));
        }
        if t.gear_ratios.iter().any(|&r| !(r > 0.0)) || !(t.reverse_ratio > 0.0) || !(t.final_drive > 0.0) {
            return Err(ConfigError::invalid("gear ratios and final drive must be positive"));
        }
        if !(0.0..1.0).contains(&t.drivetrain_loss) {
            return Err(ConfigError::invalid("drivetrain_loss must be in [0, 1)"));
        }
        if t.shift_cooldown < 0.0 {
            return Err(ConfigError::invalid("shift_cooldown must not be negative"));
        }

        // --- per-axle ---
        for (axle, s) in [("front", &self.suspension.front), ("rear", &self.suspension.rear)] {
            if !(s.spring_rate > 0.0 && s.damping_rate >= 0.0 && s.rest_length > 0.0 && s.max_travel > 0.0) {
                return Err(ConfigError::invalid(format!("{axle} suspension parameters must be positive")));
            }
            if !(s.max_damper_velocity > 0.0) {
                return Err(ConfigError::invalid(format!("{axle} max_damper_velocity must be positive")));
            }
        }
        for (axle, tire) in [("front", &self.tires.front), ("rear", &self.tires.rear)] {
            if !(tire.peak_grip > 0.0 && tire.stiffness > 0.0 && tire.shape > 0.0 && tire.radius > 0.0) {
                return Err(ConfigError::invalid(format!("{axle} tire parameters must be positive")));
            }
        }
        if self.tires.rolling_resistance < 0.0 {
            return Err(ConfigError::invalid("rolling_resistance must not be negative"));
        }

        // --- brakes / aero / dimensions ---
        let b = &self.brakes;
        if b.max_torque < 0.0 || b.handbrake_torque < 0.0 || !(0.0..=1.0).contains(&b.front_bias) {
            return Err(ConfigError::invalid("brake torques must be >= 0 and front_bias in [0, 1]"));
        }
        let a = &self.aero;
        if a.drag_coefficient < 0.0 || a.frontal_area < 0.0 || a.downforce_coefficient < 0.0 {
            return Err(ConfigError::invalid("aero coefficients must not be negative"));
        }
        let d = &self.dimensions;
        if !(d.wheelbase > 0.0 && d.track_width > 0.0 && d.cg_height > 0.0) {
            return Err(ConfigError::invalid("chassis dimensions must be positive"));
        }

        Ok(())
    }

    /// GT86-ish rear-drive coupe.
    pub fn gt86() -> Self {
        let suspension = |spring_rate: f32, damping_rate: f32| SuspensionConfig {
            spring_rate,
            damping_rate,
            rest_length: 0.30,
            max_travel: 0.18,
            max_damper_velocity: default_max_damper_velocity(),
        };
        let tire = |peak_grip: f32| TireConfig {
            peak_grip,
            stiffness: 10.0,
            shape: 1.9,
            radius: 0.33,
        };

        Self {
            name: "GT86".to_string(),
            mass: 1300.0,
            engine: EngineConfig {
                torque_curve: vec![
                    (1000.0, 120.0),
                    (2500.0, 170.0),
                    (4000.0, 195.0),
                    (5500.0, 205.0),
                    (6500.0, 200.0),
                    (7500.0, 170.0),
                ],
                idle_rpm: 900.0,
                redline_rpm: 7200.0,
                max_rpm: 7500.0,
            },
            transmission: TransmissionConfig {
                gear_ratios: vec![3.63, 2.19, 1.54, 1.21, 1.0, 0.77],
                reverse_ratio: 3.44,
                final_drive: 4.1,
                drivetrain_loss: 0.15,
                layout: DriveLayout::Rwd,
                shift_cooldown: default_shift_cooldown(),
            },
            suspension: AxlePair {
                front: suspension(36_000.0, 4_200.0),
                rear: suspension(32_000.0, 3_900.0),
            },
            tires: TireSet {
                front: tire(1.05),
                rear: tire(1.0),
                rolling_resistance: default_rolling_resistance(),
            },
            brakes: BrakeConfig::default(),
            aero: AeroConfig {
                drag_coefficient: 0.29,
                frontal_area: 2.0,
                downforce_coefficient: 0.12,
            },
            dimensions: ChassisDimensions {
                wheelbase: 2.57,
                track_width: 1.52,
                cg_height: 0.46,
                mount_height: default_mount_height(),
            },
            assists: AssistConfig::default(),
        }
    }
}
