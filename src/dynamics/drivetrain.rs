// ==============================================================================
// drivetrain.rs — ENGINE TORQUE CURVE + GEARBOX + AUTOMATIC SHIFTING
// ------------------------------------------------------------------------------
// State:
// - gear: -1 = reverse, 0 = neutral, 1..=N forward
// - rpm:  continuous, always inside [idle_rpm, max_rpm]
// - shift timer: cooldown that blocks back-to-back shifts
//
// Per tick (driven by vehicle.rs, after the wheel solve):
//   update_rpm(driven wheel ω, throttle, dt)
//   update_auto_shift(dt)
//   get_wheel_torque(throttle)
//
// Upshifts trigger near the RPM of peak power (torque * rpm), not at redline.
// Out-of-table inputs (rpm outside the curve, gear past the box) clamp to the
// nearest table entry; nothing in here can fail at runtime.
// ==============================================================================

use std::f32::consts::PI;

use tracing::debug;

use crate::config::{EngineConfig, TransmissionConfig};

const UPSHIFT_FRACTION: f32 = 0.95; // of peak-power rpm
const DOWNSHIFT_FRACTION: f32 = 0.40; // of peak-power rpm
const PEAK_SCAN_STEP_RPM: f32 = 100.0;
const LAUNCH_RPM_BOOST: f32 = 2500.0; // clutch slip window above idle
const RAD_PER_SEC_TO_RPM: f32 = 60.0 / (2.0 * PI);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct Drivetrain {
    torque_curve: Vec<(f32, f32)>, // (rpm, N·m), ascending rpm
    idle_rpm: f32,
    redline_rpm: f32,
    max_rpm: f32,

    gear_ratios: Vec<f32>,
    reverse_ratio: f32,
    final_drive: f32,
    drivetrain_loss: f32,
    shift_cooldown: f32,

    peak_power_rpm: f32,

    gear: i32,
    rpm: f32,
    shift_timer: f32,
}

impl Drivetrain {
    /// Expects a validated config (see `VehicleConfig::validate`).
    pub fn new(engine: &EngineConfig, transmission: &TransmissionConfig) -> Self {
        let mut drivetrain = Self {
            torque_curve: engine.torque_curve.clone(),
            idle_rpm: engine.idle_rpm,
            redline_rpm: engine.redline_rpm,
            max_rpm: engine.max_rpm,
            gear_ratios: transmission.gear_ratios.clone(),
            reverse_ratio: transmission.reverse_ratio,
            final_drive: transmission.final_drive,
            drivetrain_loss: transmission.drivetrain_loss,
            shift_cooldown: transmission.shift_cooldown,
            peak_power_rpm: engine.idle_rpm,
            gear: 1,
            rpm: engine.idle_rpm,
            shift_timer: 0.0,
        };
        drivetrain.peak_power_rpm = drivetrain.find_peak_power_rpm();
        drivetrain
    }

    // --------------------------------------------------
    // Engine
    // --------------------------------------------------

    /// Linear interpolation over the torque curve, clamped at both ends.
    pub fn get_engine_torque(&self, rpm: f32) -> f32 {
        let curve = &self.torque_curve;
        let Some(&(first_rpm, first_torque)) = curve.first() else { return 0.0 };
        let Some(&(last_rpm, last_torque)) = curve.last() else { return 0.0 };

        if rpm <= first_rpm {
            return first_torque;
        }
        if rpm >= last_rpm {
            return last_torque;
        }

        for w in curve.windows(2) {
            let (r0, t0) = w[0];
            let (r1, t1) = w[1];
            if rpm <= r1 {
                let span = (r1 - r0).max(f32::EPSILON);
                let u = (rpm - r0) / span;
                return t0 + (t1 - t0) * u;
            }
        }

        last_torque
    }

    /// Linear scan in 100 rpm steps for the rpm maximising torque * rpm.
    fn find_peak_power_rpm(&self) -> f32 {
        let mut best_rpm = self.idle_rpm;
        let mut best_power = f32::MIN;

        let mut rpm = self.idle_rpm;
        while rpm <= self.max_rpm {
            let power = self.get_engine_torque(rpm) * rpm;
            if power > best_power {
                best_power = power;
                best_rpm = rpm;
            }
            rpm += PEAK_SCAN_STEP_RPM;
        }

        best_rpm
    }

    // --------------------------------------------------
    // Gearbox
    // --------------------------------------------------

    /// Gear ratio times final drive for the current gear (0 in neutral).
    pub fn total_gear_ratio(&self) -> f32 {
        self.ratio_for(self.gear)
    }

    fn ratio_for(&self, gear: i32) -> f32 {
        match gear {
            0 => 0.0,
            g if g < 0 => self.reverse_ratio * self.final_drive,
            g => {
                let top = self.gear_ratios.len();
                let idx = (g as usize).clamp(1, top.max(1)) - 1;
                self.gear_ratios.get(idx).copied().unwrap_or(0.0) * self.final_drive
            }
        }
    }

    /// Torque at the driven axle for this throttle, after drivetrain loss.
    pub fn get_wheel_torque(&self, throttle: f32) -> f32 {
        self.get_engine_torque(self.rpm) * throttle * self.total_gear_ratio() * (1.0 - self.drivetrain_loss)
    }

    /// Rpm implied by wheel speed; near idle the throttle revs the engine as
    /// if slipping the clutch. No lag: the shift logic sees this step's rpm.
    pub fn update_rpm(&mut self, wheel_angular_velocity: f32, throttle: f32, _dt: f32) {
        let throttle = throttle.clamp(0.0, 1.0);
        let wheel_rpm = wheel_angular_velocity.abs() * self.total_gear_ratio() * RAD_PER_SEC_TO_RPM;

        let mut target = wheel_rpm.max(self.idle_rpm);
        if wheel_rpm < self.idle_rpm + LAUNCH_RPM_BOOST {
            target = target.max(self.idle_rpm + throttle * LAUNCH_RPM_BOOST);
        }
        self.rpm = target.clamp(self.idle_rpm, self.max_rpm);
    }

    /// Automatic forward-gear selection with a cooldown between shifts.
    pub fn update_auto_shift(&mut self, dt: f32) -> Option<Shift> {
        self.shift_timer = (self.shift_timer - dt).max(0.0);
        if self.shift_timer > 0.0 || self.gear < 1 {
            return None;
        }

        if self.rpm > UPSHIFT_FRACTION * self.peak_power_rpm && (self.gear as usize) < self.gear_ratios.len() {
            self.apply_shift(self.gear + 1);
            return Some(Shift::Up);
        }

        if self.rpm < DOWNSHIFT_FRACTION * self.peak_power_rpm && self.gear > 1 {
            self.apply_shift(self.gear - 1);
            return Some(Shift::Down);
        }

        None
    }

    /// Manual upshift; refused during the cooldown or in top gear.
    pub fn shift_up(&mut self) -> bool {
        if self.shift_timer > 0.0 || self.gear >= self.gear_ratios.len() as i32 {
            return false;
        }
        self.apply_shift(self.gear + 1);
        true
    }

    /// Manual downshift; refused during the cooldown or in reverse.
    pub fn shift_down(&mut self) -> bool {
        if self.shift_timer > 0.0 || self.gear <= -1 {
            return false;
        }
        self.apply_shift(self.gear - 1);
        true
    }

    /// Direct gear selection (reverse engagement, resets). Clamped to the box.
    pub fn select_gear(&mut self, gear: i32) {
        let gear = gear.clamp(-1, self.gear_ratios.len() as i32);
        if gear != self.gear {
            self.apply_shift(gear);
        }
    }

    fn apply_shift(&mut self, gear: i32) {
        debug!(from = self.gear, to = gear, rpm = self.rpm, "gear change");
        self.gear = gear;
        self.shift_timer = self.shift_cooldown;
    }

    pub fn gear(&self) -> i32 {
        self.gear
    }

    pub fn rpm(&self) -> f32 {
        self.rpm
    }

    pub fn peak_power_rpm(&self) -> f32 {
        self.peak_power_rpm
    }

    pub fn is_at_redline(&self) -> bool {
        self.rpm >= self.redline_rpm
    }

    pub fn gear_count(&self) -> usize {
        self.gear_ratios.len()
    }
}
