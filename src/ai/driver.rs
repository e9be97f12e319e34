// ==============================================================================
// driver.rs — AI DRIVER (PURE PURSUIT STEERING + THREE-BAND SPEED CONTROL)
// ------------------------------------------------------------------------------
// Each update:
//   1) aim point = racing line sample (8 m + 0.6 s of travel) ahead of track_t
//   2) heading error = atan2(cross, dot) between chassis forward and the
//      flattened vector to the aim point (positive = aim point to the right)
//   3) steering = clamp((error + skill noise) * 3.0, -1, 1)
//   4) adjusted target = line speed * rubber band * (1 + wobble)
//   5) speed bands:
//        v < 95%  -> throttle clamp(deficit / 5, 0.3, 1), no brake
//        v > 105% -> brake clamp(excess / 5, 0.2, 1), no throttle
//        else     -> cruise throttle 0.4
//
// Noise sources:
// - skill: zero-mean uniform steering error from a per-driver seeded RNG
// - consistency: smooth sinusoidal target-speed wobble driven by race time
// The handbrake is never used.
// ==============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rapier3d::na::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::state::InputState;
use crate::track::RacingLine;

pub const STEER_GAIN: f32 = 3.0;
const LOOKAHEAD_BASE: f32 = 8.0; // m
const LOOKAHEAD_TIME: f32 = 0.6; // s
const STEER_NOISE: f32 = 0.1; // rad at skill 0
const SPEED_WOBBLE: f32 = 0.08; // fraction at consistency 0
const WOBBLE_FREQUENCY: f32 = 0.7; // rad/s

const BAND_LOW: f32 = 0.95;
const BAND_HIGH: f32 = 1.05;
const SPEED_ERROR_SCALE: f32 = 5.0; // m/s of error for a full pedal
const MIN_THROTTLE: f32 = 0.3;
const MIN_BRAKE: f32 = 0.2;
const CRUISE_THROTTLE: f32 = 0.4;

/// Per-driver character, fixed for the race. All fields in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiPersonality {
    /// Carried for race presentation; the controller does not read it.
    pub aggression: f32,
    /// Higher = less steering error.
    pub skill: f32,
    /// Higher = steadier target speed.
    pub consistency: f32,
}

impl AiPersonality {
    pub fn new(aggression: f32, skill: f32, consistency: f32) -> Self {
        Self {
            aggression: aggression.clamp(0.0, 1.0),
            skill: skill.clamp(0.0, 1.0),
            consistency: consistency.clamp(0.0, 1.0),
        }
    }

    /// A plausible field driver.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::new(
            rng.gen_range(0.3..0.9),
            rng.gen_range(0.6..0.95),
            rng.gen_range(0.6..0.95),
        )
    }
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self::new(0.5, 0.8, 0.8)
    }
}

/// Last known motion of an AI-controlled body, pushed in by its owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorKinematics {
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub track_t: f32,
}

impl Default for ActorKinematics {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            velocity: Vector3::zeros(),
            forward: Vector3::z(),
            track_t: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiDriver {
    personality: AiPersonality,
    rng: StdRng,
    wobble_phase: f32,
    time: f32,
    rubber_band: f32,
    input: InputState,
}

impl AiDriver {
    pub fn new(personality: AiPersonality, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let wobble_phase = rng.gen_range(0.0..std::f32::consts::TAU);
        Self {
            personality,
            rng,
            wobble_phase,
            time: 0.0,
            rubber_band: 1.0,
            input: InputState::default(),
        }
    }

    pub fn personality(&self) -> &AiPersonality {
        &self.personality
    }

    /// Latest computed controls.
    pub fn input(&self) -> InputState {
        self.input
    }

    pub fn rubber_band_modifier(&self) -> f32 {
        self.rubber_band
    }

    pub fn set_rubber_band_modifier(&mut self, modifier: f32) {
        self.rubber_band = if modifier.is_finite() { modifier.max(0.0) } else { 1.0 };
    }

    pub fn update(&mut self, line: &RacingLine, kin: &ActorKinematics, dt: f32) -> InputState {
        self.time += dt.max(0.0);
        let speed = kin.velocity.norm();

        // --------------------------------------------------
        // Steering
        // --------------------------------------------------
        let lookahead = (LOOKAHEAD_BASE + speed * LOOKAHEAD_TIME) / line.track_length().max(1.0);
        let aim = line.get_target_point(kin.track_t, lookahead);
        let error = heading_error(kin.forward, aim.position - kin.position);

        let noise = (1.0 - self.personality.skill) * STEER_NOISE * self.rng.gen_range(-1.0..=1.0);
        let steering = ((error + noise) * STEER_GAIN).clamp(-1.0, 1.0);

        // --------------------------------------------------
        // Speed
        // --------------------------------------------------
        let wobble = (1.0 - self.personality.consistency)
            * SPEED_WOBBLE
            * (self.time * WOBBLE_FREQUENCY + self.wobble_phase).sin();
        let target = line.get_target_speed(kin.track_t)
            * self.rubber_band
            * (1.0 + wobble);

        let (throttle, brake) = speed_control(speed, target);

        self.input = InputState {
            throttle,
            brake,
            steering,
            handbrake: false,
        };
        self.input
    }
}

/// Signed horizontal angle from `forward` to `to_target`; positive to the right.
pub fn heading_error(forward: Vector3<f32>, to_target: Vector3<f32>) -> f32 {
    let f = Vector3::new(forward.x, 0.0, forward.z);
    let d = Vector3::new(to_target.x, 0.0, to_target.z);
    if f.norm_squared() < 1e-8 || d.norm_squared() < 1e-8 {
        return 0.0;
    }
    // right = forward × up, so a target on the right gives a negative y here
    let cross = f.cross(&d).y;
    (-cross).atan2(f.dot(&d))
}

/// Three-band pedal controller around `target` (m/s).
pub fn speed_control(speed: f32, target: f32) -> (f32, f32) {
    if speed < target * BAND_LOW {
        let throttle = ((target - speed) / SPEED_ERROR_SCALE).clamp(MIN_THROTTLE, 1.0);
        (throttle, 0.0)
    } else if speed > target * BAND_HIGH {
        let brake = ((speed - target) / SPEED_ERROR_SCALE).clamp(MIN_BRAKE, 1.0);
        (0.0, brake)
    } else {
        (CRUISE_THROTTLE, 0.0)
    }
}
