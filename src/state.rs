use rapier3d::na::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub const MS_TO_KMH: f32 = 3.6;

/// Normalised driver controls for one tick. Never retained across steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub throttle: f32,  // 0..1
    pub brake: f32,     // 0..1
    pub steering: f32,  // -1 (left) .. 1 (right)
    pub handbrake: bool,
}

impl InputState {
    /// Clamp every axis into its documented range; NaN becomes 0.
    pub fn sanitized(self) -> Self {
        let clean = |v: f32, lo: f32, hi: f32| if v.is_finite() { v.clamp(lo, hi) } else { 0.0 };
        Self {
            throttle: clean(self.throttle, 0.0, 1.0),
            brake: clean(self.brake, 0.0, 1.0),
            steering: clean(self.steering, -1.0, 1.0),
            handbrake: self.handbrake,
        }
    }
}

/// Wheel slot in the controller's fixed arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WheelId {
    FL,
    FR,
    RL,
    RR,
}

impl WheelId {
    pub const ALL: [WheelId; 4] = [WheelId::FL, WheelId::FR, WheelId::RL, WheelId::RR];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_front(self) -> bool {
        matches!(self, WheelId::FL | WheelId::FR)
    }

    pub fn is_left(self) -> bool {
        matches!(self, WheelId::FL | WheelId::RL)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WheelId::FL => "FL",
            WheelId::FR => "FR",
            WheelId::RL => "RL",
            WheelId::RR => "RR",
        }
    }
}

/// Per-wheel solve output, recomputed every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub id: WheelId,
    pub grounded: bool,

    // suspension
    pub compression: f32,          // m, from full droop
    pub compression_velocity: f32, // m/s, positive = compressing

    // tire
    pub angular_velocity: f32, // rad/s
    pub slip_ratio: f32,
    pub slip_angle: f32, // rad

    // forces (N): suspension along chassis-up, tire forces signed along the
    // wheel's right / forward axes
    pub suspension_force: f32,
    pub lateral_force: f32,
    pub longitudinal_force: f32,

    pub contact_point: Option<Point3<f32>>,
    /// Wheel centre for rendering: spring offset applied to the mount.
    pub visual_position: Point3<f32>,
}

impl WheelState {
    /// Airborne baseline: no forces, suspension fully extended.
    pub fn airborne(id: WheelId, visual_position: Point3<f32>) -> Self {
        Self {
            id,
            grounded: false,
            compression: 0.0,
            compression_velocity: 0.0,
            angular_velocity: 0.0,
            slip_ratio: 0.0,
            slip_angle: 0.0,
            suspension_force: 0.0,
            lateral_force: 0.0,
            longitudinal_force: 0.0,
            contact_point: None,
            visual_position,
        }
    }
}

/// Read-only snapshot of a vehicle, built fresh on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub speed_ms: f32,
    pub speed_kmh: f32,
    pub rpm: f32,
    pub gear: i32,
    pub input: InputState,
    pub wheels: [WheelState; 4],
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub velocity: Vector3<f32>,
}

impl VehicleState {
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    pub fn grounded_wheels(&self) -> usize {
        self.wheels.iter().filter(|w| w.grounded).count()
    }

    pub fn is_finite(&self) -> bool {
        self.speed_ms.is_finite()
            && self.rpm.is_finite()
            && self.position.coords.iter().all(|c| c.is_finite())
            && self.velocity.iter().all(|c| c.is_finite())
            && self.wheels.iter().all(|w| {
                w.suspension_force.is_finite() && w.lateral_force.is_finite() && w.longitudinal_force.is_finite()
            })
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            speed_kmh: self.speed_kmh,
            rpm: self.rpm,
            gear: self.gear,
            input: self.input,
            position: p3(self.position),
            rotation: [self.rotation.i, self.rotation.j, self.rotation.k, self.rotation.w],
            velocity: v3(self.velocity),
            wheels: self.wheels.map(|w| WheelTelemetry {
                id: w.id,
                grounded: w.grounded,
                compression: w.compression,
                slip_ratio: w.slip_ratio,
                slip_angle: w.slip_angle,
                suspension_force: w.suspension_force,
                lateral_force: w.lateral_force,
                longitudinal_force: w.longitudinal_force,
                center: p3(w.visual_position),
            }),
        }
    }
}

#[inline]
fn v3(v: Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

#[inline]
fn p3(p: Point3<f32>) -> [f32; 3] {
    [p.x, p.y, p.z]
}

/// Serialisable snapshot for HUD / audio / debug consumers.
#[derive(Debug, Clone, Serialize)]
pub struct Telemetry {
    pub speed_kmh: f32,
    pub rpm: f32,
    pub gear: i32,
    pub input: InputState,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (i, j, k, w)
    pub velocity: [f32; 3],
    pub wheels: [WheelTelemetry; 4],
}

#[derive(Debug, Clone, Serialize)]
pub struct WheelTelemetry {
    pub id: WheelId,
    pub grounded: bool,
    pub compression: f32,
    pub slip_ratio: f32,
    pub slip_angle: f32,
    pub suspension_force: f32,
    pub lateral_force: f32,
    pub longitudinal_force: f32,
    pub center: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_sanitized() {
        let input = InputState { throttle: 1.5, brake: -0.2, steering: f32::NAN, handbrake: true }.sanitized();
        assert_eq!(input.throttle, 1.0);
        assert_eq!(input.brake, 0.0);
        assert_eq!(input.steering, 0.0);
        assert!(input.handbrake);
    }

    #[test]
    fn test_airborne_baseline_is_zeroed() {
        let w = WheelState::airborne(WheelId::RL, Point3::new(1.0, 2.0, 3.0));
        assert!(!w.grounded);
        assert_eq!(w.suspension_force, 0.0);
        assert_eq!(w.lateral_force, 0.0);
        assert_eq!(w.longitudinal_force, 0.0);
        assert_eq!(w.compression, 0.0);
        assert!(w.contact_point.is_none());
    }

    #[test]
    fn test_wheel_ids_index_the_arena() {
        for (i, id) in WheelId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert!(WheelId::FL.is_front() && WheelId::FL.is_left());
        assert!(!WheelId::RR.is_front() && !WheelId::RR.is_left());
    }

    #[test]
    fn test_telemetry_serializes() {
        let wheels = WheelId::ALL.map(|id| WheelState::airborne(id, Point3::origin()));
        let state = VehicleState {
            speed_ms: 10.0,
            speed_kmh: 36.0,
            rpm: 3000.0,
            gear: 2,
            input: InputState::default(),
            wheels,
            position: Point3::new(0.0, 1.0, 0.0),
            rotation: UnitQuaternion::identity(),
            velocity: Vector3::new(0.0, 0.0, 10.0),
        };
        assert!(state.is_finite());
        let json = serde_json::to_string(&state.telemetry()).unwrap();
        assert!(json.contains("\"gear\":2"));
        assert!(json.contains("\"RR\""));
    }
}
