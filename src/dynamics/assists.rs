// ==============================================================================
// assists.rs — DRIVER AIDS (STEERING ASSIST, TRACTION CONTROL, ABS)
// ------------------------------------------------------------------------------
// All three are pure scale factors; vehicle.rs decides when they are enabled.
//
// - steering assist: up to 60% less steering input, reached at 108 km/h
// - traction control: throttle x0.3 when any driven wheel slips > 0.15
// - ABS: brake torque x0.5 on a braking wheel slipping > 0.12
// ==============================================================================

pub const STEER_ASSIST_MAX_REDUCTION: f32 = 0.6;
pub const STEER_ASSIST_FULL_SPEED_KMH: f32 = 108.0;

pub const TCS_SLIP_LIMIT: f32 = 0.15;
pub const TCS_THROTTLE_SCALE: f32 = 0.3;

pub const ABS_SLIP_LIMIT: f32 = 0.12;
pub const ABS_BRAKE_SCALE: f32 = 0.5;

/// Speed-sensitive steering reduction.
pub fn assisted_steering(steering: f32, speed_kmh: f32) -> f32 {
    let t = (speed_kmh.abs() / STEER_ASSIST_FULL_SPEED_KMH).clamp(0.0, 1.0);
    steering * (1.0 - STEER_ASSIST_MAX_REDUCTION * t)
}

/// Throttle scale given the slip ratios of the driven wheels.
pub fn traction_control_scale<I>(driven_slip_ratios: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    if driven_slip_ratios.into_iter().any(|s| s.abs() > TCS_SLIP_LIMIT) {
        TCS_THROTTLE_SCALE
    } else {
        1.0
    }
}

/// Brake scale for one wheel.
pub fn abs_scale(slip_ratio: f32) -> f32 {
    if slip_ratio.abs() > ABS_SLIP_LIMIT { ABS_BRAKE_SCALE } else { 1.0 }
}
