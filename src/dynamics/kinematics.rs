// ==============================================================================
// kinematics.rs — WHEEL BASIS + SLIP DECOMPOSITION (WORLD SPACE)
// ------------------------------------------------------------------------------
// Chassis convention: local +Z forward, +Y up, right = forward × up.
//
// wheel_basis(...):
// - Starts from chassis forward/up
// - Steered wheels rotate forward about chassis-up by the steering angle
//   (positive steering turns right)
// - right = forward × up
//
// slip_components(point_vel, forward, right):
//     v_long = dot(v, forward)
//     v_lat  = dot(v, right)
//
// slip_ratio / slip_angle guard the near-zero-speed divisions with minimum
// speed thresholds and hold slip at 0 below them.
// ==============================================================================

use rapier3d::na::{Point3, Unit, UnitQuaternion, Vector3};

/// Below this on both the ground and tire speed, slip ratio is held at 0.
pub const SLIP_RATIO_MIN_SPEED: f32 = 0.5; // m/s
/// Below this forward speed, slip angle is held at 0.
pub const SLIP_ANGLE_MIN_SPEED: f32 = 1.0; // m/s

/// World-space velocity of a point rigidly attached to the body:
/// v(p) = v_com + ω × (p - com)
#[inline]
pub fn point_velocity(linvel: Vector3<f32>, angvel: Vector3<f32>, com: Point3<f32>, p: Point3<f32>) -> Vector3<f32> {
    let r = p.coords - com.coords;
    linvel + angvel.cross(&r)
}

/// Returns (wheel_forward, wheel_right) in world space.
#[inline]
pub fn wheel_basis(chassis_forward: Vector3<f32>, chassis_up: Vector3<f32>, steer_angle: f32) -> (Vector3<f32>, Vector3<f32>) {
    let forward = if steer_angle.abs() > 1e-6 {
        // right turn = negative rotation about up
        let axis = Unit::new_normalize(chassis_up);
        UnitQuaternion::from_axis_angle(&axis, -steer_angle) * chassis_forward
    } else {
        chassis_forward
    };

    let right = forward.cross(&chassis_up);
    let right = right.try_normalize(1e-6).unwrap_or(right);

    (forward, right)
}

/// Compute (v_long, v_lat) given point velocity and wheel basis.
#[inline]
pub fn slip_components(point_vel: Vector3<f32>, wheel_forward: Vector3<f32>, wheel_right: Vector3<f32>) -> (f32, f32) {
    (point_vel.dot(&wheel_forward), point_vel.dot(&wheel_right))
}

/// (ω·r − v_long) / max(|v_long|, |ω·r|), clamped to [-1, 1].
pub fn slip_ratio(wheel_angular_velocity: f32, radius: f32, v_long: f32) -> f32 {
    let tire_speed = wheel_angular_velocity * radius;
    let denom = v_long.abs().max(tire_speed.abs());
    if denom < SLIP_RATIO_MIN_SPEED {
        return 0.0;
    }
    ((tire_speed - v_long) / denom).clamp(-1.0, 1.0)
}

/// atan2(v_lat, |v_long|); zero at crawling speed.
pub fn slip_angle(v_lat: f32, v_long: f32) -> f32 {
    if v_long.abs() < SLIP_ANGLE_MIN_SPEED {
        return 0.0;
    }
    v_lat.atan2(v_long.abs())
}
