// ==============================================================================
// vehicle.rs — VEHICLE CONTROLLER (RAYCAST WHEELS + DRIVETRAIN + AERO)
// ------------------------------------------------------------------------------
// One VehicleController per car. Each step():
//
//   (0) read chassis frame, sanitize input, pick travel direction
//   (1) per wheel: ray cast, suspension force, slip, combined tire force
//   (2) assists: steering assist (before 1), TCS + ABS (after 1)
//   (3) drivetrain rpm + auto shift from the driven-wheel average ω
//   (4) drive force on grounded driven wheels
//   (5) brakes / handbrake, then rolling resistance
//   (6) drag + downforce on the whole body
//
// Everything is issued as forces on the body for the coming world step; the
// controller never writes poses or velocities.
//
// Wheel ω is not integrated. It is back-derived from ground speed, pulled
// down by brake demand and pushed up by the previous step's unmet drive
// demand, which is enough for TCS/ABS to see slip.
//
// Tire channels are explicit forces, so each one is capped at the force that
// removes GRIP_RELAXATION of its slip speed from the corner mass in one step.
// Below SLIP_ANGLE_MIN_SPEED the lateral channel is that cap alone (stiction).
// Lock slip only spends lateral grip; braking force comes from phase (5).
// ==============================================================================

use rapier3d::na::{Point3, Vector3};
use tracing::{debug, trace};

use crate::backend::PhysicsBackend;
use crate::config::VehicleConfig;
use crate::dynamics::assists::{abs_scale, assisted_steering, traction_control_scale};
use crate::dynamics::kinematics::{SLIP_ANGLE_MIN_SPEED, slip_angle, slip_ratio};
use crate::dynamics::{AerodynamicsModel, Drivetrain, SuspensionModel, TireModel};
use crate::physics::{GRAVITY, MAX_DT};
use crate::state::{InputState, MS_TO_KMH, VehicleState, WheelId, WheelState};
use crate::suspension_contact::{ChassisFrame, ContactQuery, measure_contact};

pub const MAX_STEER_ANGLE: f32 = 0.5; // rad

const PEDAL_DEADZONE: f32 = 0.05;
const DIRECTION_CHANGE_SPEED: f32 = 0.5; // m/s
const BRAKE_LOCK_GAIN: f32 = 0.3; // fraction of ω lost at full brake demand
const SPIN_SLIP_SPEED: f32 = 2.0; // m/s of extra tire speed at full unmet drive demand
/// Fraction of a corner's slip speed one step of tire force may remove.
const GRIP_RELAXATION: f32 = 0.5;

/// Body-origin height above flat ground with the car settled on its springs.
pub fn nominal_ride_height(config: &VehicleConfig) -> f32 {
    let corner_load = config.mass * GRAVITY * 0.25;
    let mut total = 0.0;
    for front in [true, false] {
        let s = config.suspension.get(front);
        let ray = s.rest_length + s.max_travel + config.tires.get(front).radius;
        let sag = (corner_load / s.spring_rate).min(s.max_travel);
        total += ray - sag;
    }
    -config.dimensions.mount_height + total * 0.5
}

/// Static per-wheel setup, fixed for the controller's lifetime.
#[derive(Debug, Clone, Copy)]
struct WheelSetup {
    id: WheelId,
    mount: Point3<f32>, // chassis-local
    suspension: SuspensionModel,
    tire: TireModel,
    steered: bool,
    driven: bool,
    brake_share: f32, // of brakes.max_torque at full pedal
}

impl WheelSetup {
    fn ray_length(&self) -> f32 {
        self.suspension.ray_length() + self.tire.radius
    }
}

/// Per-wheel values carried from the solve into the force phases of one step.
#[derive(Debug, Clone, Copy)]
struct Contact {
    point: Point3<f32>,
    forward: Vector3<f32>,
    v_long: f32,
    normal_force: f32,
    budget: f32, // friction left after the tire force, N
}

pub struct VehicleController<B: Copy> {
    config: VehicleConfig,
    body: Option<B>,

    setup: [WheelSetup; 4],
    aero: AerodynamicsModel,
    drivetrain: Drivetrain,

    wheels: [WheelState; 4],
    input: InputState,
    drive_excess: [f32; 4], // signed unmet drive fraction from the last step
}

impl<B: Copy> VehicleController<B> {
    /// Expects a validated config.
    pub fn new(config: VehicleConfig) -> Self {
        let dims = &config.dimensions;
        let half_track = dims.track_width * 0.5;
        let half_base = dims.wheelbase * 0.5;
        let layout = config.transmission.layout;
        let bias = config.brakes.front_bias;

        let setup = WheelId::ALL.map(|id| {
            let front = id.is_front();
            // local +X is the car's left
            let x = if id.is_left() { half_track } else { -half_track };
            let z = if front { half_base } else { -half_base };
            WheelSetup {
                id,
                mount: Point3::new(x, dims.mount_height, z),
                suspension: SuspensionModel::new(config.suspension.get(front)),
                tire: TireModel::new(config.tires.get(front)),
                steered: front,
                driven: if front { layout.drives_front() } else { layout.drives_rear() },
                brake_share: if front { 2.0 * bias } else { 2.0 * (1.0 - bias) },
            }
        });

        let wheels = setup.map(|s| WheelState::airborne(s.id, Self::droop_position(&s, None)));

        Self {
            aero: AerodynamicsModel::new(&config.aero),
            drivetrain: Drivetrain::new(&config.engine, &config.transmission),
            config,
            body: None,
            setup,
            wheels,
            input: InputState::default(),
            drive_excess: [0.0; 4],
        }
    }

    pub fn attach(&mut self, body: B) {
        self.body = Some(body);
        self.reset();
    }

    pub fn detach(&mut self) -> Option<B> {
        self.body.take()
    }

    pub fn body(&self) -> Option<B> {
        self.body
    }

    pub fn is_ready(&self) -> bool {
        self.body.is_some()
    }

    /// Back to first gear with an empty wheel history. The body is untouched.
    pub fn reset(&mut self) {
        self.drivetrain = Drivetrain::new(&self.config.engine, &self.config.transmission);
        self.wheels = self.setup.map(|s| WheelState::airborne(s.id, Self::droop_position(&s, None)));
        self.input = InputState::default();
        self.drive_excess = [0.0; 4];
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn drivetrain(&self) -> &Drivetrain {
        &self.drivetrain
    }

    pub fn wheels(&self) -> &[WheelState; 4] {
        &self.wheels
    }

    pub fn shift_up(&mut self) -> bool {
        self.drivetrain.shift_up()
    }

    pub fn shift_down(&mut self) -> bool {
        self.drivetrain.shift_down()
    }

    fn droop_position(setup: &WheelSetup, frame: Option<&ChassisFrame>) -> Point3<f32> {
        let droop = setup.suspension.rest_length + setup.suspension.max_travel;
        match frame {
            Some(f) => f.to_world(&setup.mount) + f.down() * droop,
            None => setup.mount - Vector3::y() * droop,
        }
    }

    /// Snapshot for HUD / camera / audio. None until a body is attached and
    /// known to the world.
    pub fn state<P>(&self, world: &P) -> Option<VehicleState>
    where
        P: PhysicsBackend<Body = B>,
    {
        let body = self.body?;
        let iso = world.transform(body)?;
        let velocity = world.linear_velocity(body)?;
        let speed_ms = velocity.norm();

        Some(VehicleState {
            speed_ms,
            speed_kmh: speed_ms * MS_TO_KMH,
            rpm: self.drivetrain.rpm(),
            gear: self.drivetrain.gear(),
            input: self.input,
            wheels: self.wheels,
            position: Point3::from(iso.translation.vector),
            rotation: iso.rotation,
            velocity,
        })
    }

    /// Automatic reverse: only near standstill, only on a clean pedal.
    fn select_direction(&mut self, input: &InputState, forward_speed: f32) {
        if forward_speed.abs() >= DIRECTION_CHANGE_SPEED {
            return;
        }
        let gear = self.drivetrain.gear();
        let throttle = input.throttle > PEDAL_DEADZONE;
        let brake = input.brake > PEDAL_DEADZONE;

        if gear >= 0 && brake && !throttle {
            self.drivetrain.select_gear(-1);
        } else if gear <= 0 && throttle && !brake {
            self.drivetrain.select_gear(1);
        }
    }

    /// Advance one tick: measure wheels and issue this step's forces.
    ///
    /// Does nothing while not ready. `dt` is clamped to `MAX_DT`.
    pub fn step<P>(&mut self, world: &mut P, input: InputState, dt: f32)
    where
        P: PhysicsBackend<Body = B>,
    {
        let dt = dt.clamp(0.0, MAX_DT);
        let Some(body) = self.body else { return };
        let Some(frame) = ChassisFrame::read(world, body) else { return };
        if dt <= 0.0 {
            return;
        }

        let input = input.sanitized();
        self.input = input;

        let speed = frame.linvel.norm();
        let speed_kmh = speed * MS_TO_KMH;
        let assists = self.config.assists;

        // --------------------------------------------------
        // Pedals and steering
        // --------------------------------------------------
        self.select_direction(&input, frame.forward_speed());
        let reversing = self.drivetrain.gear() < 0;
        let direction = if reversing { -1.0 } else { 1.0 };
        let (mut drive_pedal, brake_pedal) = if reversing {
            (input.brake, input.throttle)
        } else {
            (input.throttle, input.brake)
        };

        let steering = if assists.steering_assist {
            assisted_steering(input.steering, speed_kmh)
        } else {
            input.steering
        };
        let steer_angle = steering * MAX_STEER_ANGLE;

        // --------------------------------------------------
        // (1) Wheel solve
        // --------------------------------------------------
        let brakes = self.config.brakes;
        let mut contacts: [Option<Contact>; 4] = [None; 4];
        let mut brake_torque = [0.0_f32; 4];
        let mut driven_omega = 0.0;
        let mut driven_grounded = 0_u32;
        let corner_mass = self.config.mass * 0.25;
        // N per m/s of slip speed
        let relaxation = GRIP_RELAXATION * corner_mass / dt;

        for i in 0..4 {
            let setup = self.setup[i];
            let query = ContactQuery {
                mount_local: setup.mount,
                ray_length: setup.ray_length(),
                steer_angle: if setup.steered { steer_angle } else { 0.0 },
                // a wheel coming back from the air has no sample to difference against
                previous_compression: self.wheels[i].grounded.then_some(self.wheels[i].compression),
            };

            let Some(c) = measure_contact(world, body, &frame, &query, dt) else {
                self.wheels[i] = WheelState::airborne(setup.id, Self::droop_position(&setup, Some(&frame)));
                self.drive_excess[i] = 0.0;
                continue;
            };

            let normal_force = setup.suspension.compute_force(c.compression, c.compression_velocity);
            let grip = setup.tire.max_force(normal_force);
            let radius = setup.tire.radius;

            // requested brake torque, before ABS
            let mut torque = brakes.max_torque * brake_pedal * setup.brake_share;
            let handbrake = input.handbrake && !setup.steered;
            if handbrake {
                torque = torque.max(brakes.handbrake_torque);
            }
            brake_torque[i] = torque;

            // ω estimate
            let lock = if handbrake {
                1.0
            } else if grip > 0.0 {
                (torque / radius / grip).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let spin_speed = c.v_long + self.drive_excess[i] * SPIN_SLIP_SPEED;
            let tire_speed = if handbrake {
                0.0
            } else {
                spin_speed - c.v_long * BRAKE_LOCK_GAIN * lock
            };
            let omega = tire_speed / radius;

            let ratio = slip_ratio(omega, radius, c.v_long);
            let angle = slip_angle(c.v_lat, c.v_long);
            let tire = setup.tire.compute_combined_forces(angle, ratio, normal_force);

            // braking force comes from phase (5); lock slip only shrinks lateral grip
            let longitudinal = if lock > 0.0 {
                let drive_ratio = slip_ratio(spin_speed / radius, radius, c.v_long);
                setup.tire.compute_combined_forces(angle, drive_ratio, normal_force).longitudinal
            } else {
                tire.longitudinal
            };
            let lateral = if c.v_long.abs() < SLIP_ANGLE_MIN_SPEED {
                c.v_lat * relaxation
            } else {
                tire.lateral
            };
            let (lateral, longitudinal) = relax_tire_forces(
                lateral,
                longitudinal,
                c.v_lat.abs() * relaxation,
                (spin_speed - c.v_long).abs() * relaxation,
                grip,
            );

            world.apply_force_at_point(body, frame.up * normal_force, c.mount_point);
            // lateral force resists sliding along +right
            let tire_force = c.forward * longitudinal - c.right * lateral;
            world.apply_force_at_point(body, tire_force, c.hit_point);

            if setup.driven {
                driven_omega += omega;
                driven_grounded += 1;
            }

            self.wheels[i] = WheelState {
                id: setup.id,
                grounded: true,
                compression: c.compression,
                compression_velocity: c.compression_velocity,
                angular_velocity: omega,
                slip_ratio: ratio,
                slip_angle: angle,
                suspension_force: normal_force,
                lateral_force: lateral,
                longitudinal_force: longitudinal,
                contact_point: Some(c.hit_point),
                visual_position: c.mount_point + frame.down() * (c.hit_distance - radius),
            };
            contacts[i] = Some(Contact {
                point: c.hit_point,
                forward: c.forward,
                v_long: c.v_long,
                normal_force,
                budget: (grip - lateral.hypot(longitudinal)).max(0.0),
            });
        }

        // --------------------------------------------------
        // (2) Traction control
        // --------------------------------------------------
        if assists.traction_control {
            let slips = self
                .setup
                .iter()
                .zip(self.wheels.iter())
                .filter(|(s, w)| s.driven && w.grounded)
                .map(|(_, w)| w.slip_ratio);
            let scale = traction_control_scale(slips);
            if scale < 1.0 && drive_pedal > 0.0 {
                debug!(scale, "traction control cut");
                drive_pedal *= scale;
            }
        }

        // --------------------------------------------------
        // (3) Drivetrain
        // --------------------------------------------------
        let avg_omega = if driven_grounded > 0 { driven_omega / driven_grounded as f32 } else { 0.0 };
        self.drivetrain.update_rpm(avg_omega, drive_pedal, dt);
        if let Some(shift) = self.drivetrain.update_auto_shift(dt) {
            debug!(?shift, gear = self.drivetrain.gear(), rpm = self.drivetrain.rpm(), "auto shift");
        }
        if self.drivetrain.is_at_redline() {
            drive_pedal = 0.0; // rev limiter
        }
        let wheel_torque = self.drivetrain.get_wheel_torque(drive_pedal);

        // --------------------------------------------------
        // (4) Drive force
        // --------------------------------------------------
        for i in 0..4 {
            self.drive_excess[i] = 0.0;
            if !self.setup[i].driven || driven_grounded == 0 {
                continue;
            }
            let Some(contact) = contacts[i].as_mut() else { continue };

            let demand = wheel_torque / self.setup[i].tire.radius / driven_grounded as f32;
            if demand <= 0.0 {
                continue;
            }
            let applied = demand.min(contact.budget);
            contact.budget -= applied;
            self.drive_excess[i] = direction * (demand - applied) / demand;

            world.apply_force_at_point(body, contact.forward * (direction * applied), contact.point);
            self.wheels[i].longitudinal_force += direction * applied;
        }

        // --------------------------------------------------
        // (5) Brakes + rolling resistance
        // --------------------------------------------------
        let rolling_resistance = self.config.tires.rolling_resistance;

        for i in 0..4 {
            let Some(contact) = contacts[i].as_mut() else { continue };
            let v = contact.v_long;
            if v.abs() < 1e-4 {
                continue;
            }
            let against = -v.signum();
            // never push past stopping this corner within the step
            let stop_cap = relaxation * v.abs();

            let mut torque = brake_torque[i];
            let handbrake = input.handbrake && !self.setup[i].steered;
            if assists.abs && !handbrake && torque > 0.0 {
                let scale = abs_scale(self.wheels[i].slip_ratio);
                if scale < 1.0 {
                    debug!(wheel = self.setup[i].id.as_str(), slip = self.wheels[i].slip_ratio, "abs release");
                }
                torque *= scale;
            }

            let grip = self.setup[i].tire.max_force(contact.normal_force);
            let brake = (torque / self.setup[i].tire.radius).min(grip).min(contact.budget).min(stop_cap);
            contact.budget -= brake;

            // the stop cap below turns this into a hold near standstill
            let rolling = (rolling_resistance * contact.normal_force).min(contact.budget);
            contact.budget -= rolling;

            let total = (brake + rolling).min(stop_cap);
            if total > 0.0 {
                world.apply_force_at_point(body, contact.forward * (against * total), contact.point);
                self.wheels[i].longitudinal_force += against * total;
            }
        }

        // --------------------------------------------------
        // (6) Aero
        // --------------------------------------------------
        if speed > 1e-3 {
            let drag = self.aero.drag(speed);
            world.apply_force(body, -frame.linvel / speed * drag);
        }
        let downforce = self.aero.downforce(speed);
        if downforce > 0.0 {
            world.apply_force(body, Vector3::new(0.0, -downforce, 0.0));
        }

        trace!(
            speed_kmh,
            rpm = self.drivetrain.rpm(),
            gear = self.drivetrain.gear(),
            steer_angle,
            wheel_torque,
            "vehicle step"
        );
    }
}

/// Clamp each channel to its slip-speed cap, then fit both inside the
/// friction circle with lateral taking priority. Returns (lateral, longitudinal).
fn relax_tire_forces(lateral: f32, longitudinal: f32, lateral_cap: f32, longitudinal_cap: f32, grip: f32) -> (f32, f32) {
    let lateral = lateral.max(-lateral_cap).min(lateral_cap).max(-grip).min(grip);
    let room = (grip * grip - lateral * lateral).max(0.0).sqrt();
    let longitudinal = longitudinal.max(-longitudinal_cap).min(longitudinal_cap).max(-room).min(room);
    (lateral, longitudinal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::na::Isometry3;

    /// Flat ground at y = 0 that records every force instead of integrating.
    struct Recorder {
        iso: Isometry3<f32>,
        linvel: Vector3<f32>,
        forces: Vec<Vector3<f32>>,
    }

    impl Recorder {
        fn at_rest(config: &VehicleConfig) -> Self {
            Self::moving(config, Vector3::zeros())
        }

        fn moving(config: &VehicleConfig, linvel: Vector3<f32>) -> Self {
            Self {
                iso: Isometry3::translation(0.0, nominal_ride_height(config), 0.0),
                linvel,
                forces: Vec::new(),
            }
        }

        fn total(&self) -> Vector3<f32> {
            self.forces.iter().sum()
        }
    }

    impl PhysicsBackend for Recorder {
        type Body = u32;

        fn cast_ray(&self, origin: Point3<f32>, dir: Vector3<f32>, max_len: f32, _exclude: u32) -> Option<f32> {
            if dir.y >= -1e-6 {
                return None;
            }
            let t = origin.y / -dir.y;
            (t >= 0.0 && t <= max_len).then_some(t)
        }

        fn apply_force_at_point(&mut self, _body: u32, force: Vector3<f32>, _point: Point3<f32>) {
            self.forces.push(force);
        }

        fn apply_force(&mut self, _body: u32, force: Vector3<f32>) {
            self.forces.push(force);
        }

        fn transform(&self, body: u32) -> Option<Isometry3<f32>> {
            (body == 7).then_some(self.iso)
        }

        fn linear_velocity(&self, body: u32) -> Option<Vector3<f32>> {
            (body == 7).then_some(self.linvel)
        }
    }

    fn controller() -> (VehicleController<u32>, VehicleConfig) {
        let config = VehicleConfig::gt86();
        let mut vc = VehicleController::new(config.clone());
        vc.attach(7);
        (vc, config)
    }

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_not_ready_until_attached() {
        let config = VehicleConfig::gt86();
        let mut world = Recorder::at_rest(&config);
        let mut vc: VehicleController<u32> = VehicleController::new(config);
        assert!(vc.state(&world).is_none());

        vc.step(&mut world, InputState { throttle: 1.0, ..Default::default() }, DT);
        assert!(world.forces.is_empty());

        vc.attach(7);
        assert!(vc.state(&world).is_some());

        // a handle the world does not know is also not ready
        vc.attach(3);
        assert!(vc.state(&world).is_none());
    }

    #[test]
    fn test_settled_car_carries_its_weight() {
        let (mut vc, config) = controller();
        let mut world = Recorder::at_rest(&config);
        vc.step(&mut world, InputState::default(), DT);

        let state = vc.state(&world).unwrap();
        assert_eq!(state.grounded_wheels(), 4);
        let support: f32 = state.wheels.iter().map(|w| w.suspension_force).sum();
        let weight = config.mass * GRAVITY;
        assert!((support - weight).abs() < 0.05 * weight, "support={support} weight={weight}");

        // no tire or aero force on a car at rest
        let total = world.total();
        assert!(total.x.abs() < 1e-3 && total.z.abs() < 1e-3);
    }

    #[test]
    fn test_airborne_wheels_reset_to_baseline() {
        let (mut vc, config) = controller();
        let mut world = Recorder::at_rest(&config);
        world.iso = Isometry3::translation(0.0, 10.0, 0.0);
        vc.step(&mut world, InputState { throttle: 1.0, ..Default::default() }, DT);

        let state = vc.state(&world).unwrap();
        assert_eq!(state.grounded_wheels(), 0);
        for w in &state.wheels {
            assert_eq!(w.suspension_force, 0.0);
            assert_eq!(w.longitudinal_force, 0.0);
            assert!(w.contact_point.is_none());
        }
        // only downforce (zero at rest) and drag could act
        assert!(world.forces.is_empty());
    }

    #[test]
    fn test_throttle_pushes_forward_through_rear_wheels() {
        let (mut vc, config) = controller();
        let mut world = Recorder::at_rest(&config);
        vc.step(&mut world, InputState { throttle: 1.0, ..Default::default() }, DT);

        assert_eq!(vc.drivetrain().gear(), 1);
        assert!(world.total().z > 1_000.0, "total={:?}", world.total());

        let state = vc.state(&world).unwrap();
        assert_eq!(state.wheels[WheelId::FL.index()].longitudinal_force, 0.0);
        assert!(state.wheels[WheelId::RL.index()].longitudinal_force > 0.0);
        assert!(state.wheels[WheelId::RR.index()].longitudinal_force > 0.0);
    }

    #[test]
    fn test_brake_from_standstill_engages_reverse() {
        let (mut vc, config) = controller();
        let mut world = Recorder::at_rest(&config);
        vc.step(&mut world, InputState { brake: 1.0, ..Default::default() }, DT);
        assert_eq!(vc.drivetrain().gear(), -1);
        assert!(world.total().z < -500.0);

        // throttle from standstill goes back to first
        world.forces.clear();
        vc.step(&mut world, InputState { throttle: 1.0, ..Default::default() }, DT);
        assert_eq!(vc.drivetrain().gear(), 1);
    }

    #[test]
    fn test_brake_while_moving_slows_without_reversing() {
        let (mut vc, config) = controller();
        let mut world = Recorder::moving(&config, Vector3::new(0.0, 0.0, 20.0));
        vc.step(&mut world, InputState { brake: 1.0, ..Default::default() }, DT);
        assert_eq!(vc.drivetrain().gear(), 1);
        assert!(world.total().z < -5_000.0);
    }

    #[test]
    fn test_handbrake_locks_rear_wheels() {
        let (mut vc, config) = controller();
        let mut world = Recorder::moving(&config, Vector3::new(0.0, 0.0, 20.0));
        vc.step(&mut world, InputState { handbrake: true, ..Default::default() }, DT);

        let state = vc.state(&world).unwrap();
        assert_eq!(state.wheels[WheelId::RL.index()].slip_ratio, -1.0);
        assert_eq!(state.wheels[WheelId::RR.index()].angular_velocity, 0.0);
        assert!(state.wheels[WheelId::FL.index()].slip_ratio.abs() < 1e-4);
    }

    #[test]
    fn test_contact_forces_stay_inside_friction_circle() {
        let (mut vc, config) = controller();
        let mut world = Recorder::moving(&config, Vector3::new(4.0, 0.0, 25.0));
        let inputs = [
            InputState { throttle: 1.0, steering: 1.0, ..Default::default() },
            InputState { brake: 1.0, steering: -0.5, ..Default::default() },
            InputState { brake: 1.0, handbrake: true, ..Default::default() },
        ];
        for input in inputs {
            vc.step(&mut world, input, DT);
            for w in vc.wheels() {
                let limit = config.tires.get(w.id.is_front()).peak_grip * w.suspension_force;
                let total = w.lateral_force.hypot(w.longitudinal_force);
                assert!(total <= limit * 1.001 + 1e-3, "{:?}: {total} > {limit}", w.id);
            }
        }
    }

    #[test]
    fn test_brake_force_is_not_counted_twice() {
        let (mut vc, config) = controller();
        let mut world = Recorder::moving(&config, Vector3::new(0.0, 0.0, 20.0));
        vc.step(&mut world, InputState { brake: 1.0, ..Default::default() }, DT);

        let bias = config.brakes.front_bias;
        for w in vc.wheels() {
            let front = w.id.is_front();
            let tires = config.tires.get(front);
            let share = if front { 2.0 * bias } else { 2.0 * (1.0 - bias) };
            let brake = (config.brakes.max_torque * share / tires.radius).min(tires.peak_grip * w.suspension_force);
            let limit = brake + config.tires.rolling_resistance * w.suspension_force;
            assert!(w.longitudinal_force < 0.0, "{:?} not braking", w.id);
            assert!(-w.longitudinal_force <= limit + 1e-2, "{:?}: {} > {limit}", w.id, -w.longitudinal_force);
        }
    }

    #[test]
    fn test_lateral_force_bounded_by_slip_speed() {
        let (mut vc, config) = controller();
        // slow enough that the tire curve alone would overshoot the slide
        let mut world = Recorder::moving(&config, Vector3::new(0.2, 0.0, 3.0));
        vc.step(&mut world, InputState::default(), DT);

        let cap = GRIP_RELAXATION * config.mass * 0.25 * 0.2 / DT;
        for w in vc.wheels() {
            assert!(w.slip_angle.abs() > 0.0);
            assert!(w.lateral_force.abs() <= cap * 1.001, "{:?}: {} > {cap}", w.id, w.lateral_force);
        }
        // sliding left (+X) is pushed back right
        assert!(world.total().x < 0.0);
    }

    #[test]
    fn test_crawling_car_holds_its_line() {
        let (mut vc, config) = controller();
        let mut world = Recorder::moving(&config, Vector3::new(0.05, 0.0, 0.0));
        vc.step(&mut world, InputState::default(), DT);

        // no slip angle below the guard speed, but the patch still grips
        for w in vc.wheels() {
            assert_eq!(w.slip_angle, 0.0);
        }
        let expected = -GRIP_RELAXATION * config.mass * 0.05 / DT;
        let total = world.total();
        assert!((total.x - expected).abs() < 1.0, "x={} expected={expected}", total.x);
    }

    #[test]
    fn test_landing_has_no_damper_kick() {
        let (mut vc, config) = controller();
        let mut world = Recorder::at_rest(&config);
        world.iso = Isometry3::translation(0.0, 10.0, 0.0);
        vc.step(&mut world, InputState::default(), DT);
        assert_eq!(vc.wheels().iter().filter(|w| w.grounded).count(), 0);

        world.iso = Isometry3::translation(0.0, nominal_ride_height(&config), 0.0);
        world.forces.clear();
        vc.step(&mut world, InputState::default(), DT);

        let weight = config.mass * GRAVITY;
        let support: f32 = vc.wheels().iter().map(|w| w.suspension_force).sum();
        for w in vc.wheels() {
            assert!(w.grounded);
            assert_eq!(w.compression_velocity, 0.0);
        }
        assert!((support - weight).abs() < 0.05 * weight, "support={support} weight={weight}");
    }

    #[test]
    fn test_relaxed_forces_fit_the_friction_circle() {
        let (lat, long) = relax_tire_forces(5_000.0, -5_000.0, 10_000.0, 10_000.0, 3_000.0);
        assert_eq!(lat, 3_000.0);
        assert_eq!(long, 0.0);

        let (lat, long) = relax_tire_forces(-2_000.0, 2_000.0, 500.0, 800.0, 3_000.0);
        assert_eq!((lat, long), (-500.0, 800.0));

        let (lat, long) = relax_tire_forces(1_000.0, 1_000.0, 0.0, 0.0, 3_000.0);
        assert_eq!((lat, long), (0.0, 0.0));
    }

    #[test]
    fn test_steering_sign_and_assist() {
        let (mut vc, config) = controller();
        let mut world = Recorder::moving(&config, Vector3::new(0.0, 0.0, 15.0));
        vc.step(&mut world, InputState { steering: 1.0, ..Default::default() }, DT);

        // steered right: velocity looks like a leftward slide to the front tires,
        // so they push the car right (-X)
        let state = vc.state(&world).unwrap();
        assert!(state.wheels[WheelId::FL.index()].slip_angle < 0.0);
        assert!(world.total().x < 0.0);
    }

    #[test]
    fn test_drag_opposes_motion() {
        let (mut vc, config) = controller();
        let mut world = Recorder::moving(&config, Vector3::new(0.0, 0.0, 30.0));
        world.iso = Isometry3::translation(0.0, 10.0, 0.0); // airborne: only aero
        vc.step(&mut world, InputState::default(), DT);

        let total = world.total();
        let expected_drag = AerodynamicsModel::new(&config.aero).drag(30.0);
        assert!((total.z + expected_drag).abs() < 1e-2);
        assert!(total.y < 0.0);
    }

    #[test]
    fn test_ride_height_puts_rays_in_contact() {
        let config = VehicleConfig::gt86();
        let h = nominal_ride_height(&config);
        let ray = config.suspension.front.rest_length + config.suspension.front.max_travel + config.tires.front.radius;
        let mount_y = h + config.dimensions.mount_height;
        assert!(mount_y > 0.0 && mount_y < ray);
    }
}
