// Straight-line runs on a flat, translation-only world: the controller's
// forces are integrated with semi-implicit Euler and torques are ignored.

use apex_chassis::physics::GRAVITY;
use apex_chassis::vehicle::nominal_ride_height;
use apex_chassis::{InputState, PhysicsBackend, VehicleConfig, VehicleController};
use rapier3d::na::{Isometry3, Point3, Vector3};

const DT: f32 = 1.0 / 60.0;

struct FlatWorld {
    position: Vector3<f32>,
    velocity: Vector3<f32>,
    mass: f32,
    force: Vector3<f32>,
}

impl FlatWorld {
    fn new(config: &VehicleConfig, velocity: Vector3<f32>) -> Self {
        Self {
            position: Vector3::new(0.0, nominal_ride_height(config), 0.0),
            velocity,
            mass: config.mass,
            force: Vector3::zeros(),
        }
    }

    fn step(&mut self, dt: f32) {
        let accel = self.force / self.mass - Vector3::y() * GRAVITY;
        self.velocity += accel * dt;
        self.position += self.velocity * dt;
        self.force = Vector3::zeros();
    }
}

impl PhysicsBackend for FlatWorld {
    type Body = ();

    fn cast_ray(&self, origin: Point3<f32>, dir: Vector3<f32>, max_len: f32, _exclude: ()) -> Option<f32> {
        if dir.y >= -1e-6 {
            return None;
        }
        let t = origin.y / -dir.y;
        (t >= 0.0 && t <= max_len).then_some(t)
    }

    fn apply_force_at_point(&mut self, _body: (), force: Vector3<f32>, _point: Point3<f32>) {
        self.force += force;
    }

    fn apply_force(&mut self, _body: (), force: Vector3<f32>) {
        self.force += force;
    }

    fn transform(&self, _body: ()) -> Option<Isometry3<f32>> {
        Some(Isometry3::translation(self.position.x, self.position.y, self.position.z))
    }

    fn linear_velocity(&self, _body: ()) -> Option<Vector3<f32>> {
        Some(self.velocity)
    }
}

fn run(vc: &mut VehicleController<()>, world: &mut FlatWorld, input: InputState, seconds: f32) {
    let steps = (seconds / DT).round() as usize;
    for _ in 0..steps {
        vc.step(world, input, DT);
        world.step(DT);
    }
}

fn car() -> (VehicleController<()>, VehicleConfig) {
    let config = VehicleConfig::gt86();
    let mut vc = VehicleController::new(config.clone());
    vc.attach(());
    (vc, config)
}

#[test]
fn test_coasting_car_rolls_to_a_stop() {
    let (mut vc, config) = car();
    let mut world = FlatWorld::new(&config, Vector3::new(0.0, 0.0, 8.0));

    let mut last_speed = f32::MAX;
    for second in 0..60 {
        run(&mut vc, &mut world, InputState::default(), 1.0);

        let state = vc.state(&world).unwrap();
        assert!(state.is_finite(), "non-finite state after {second} s");
        assert_eq!(state.grounded_wheels(), 4);
        // resistance only ever takes speed away
        assert!(world.velocity.z <= last_speed + 1e-3);
        last_speed = world.velocity.z;
    }

    assert!(world.velocity.z.abs() < 0.5, "still rolling at {}", world.velocity.z);
    assert!(world.velocity.x.abs() < 1e-3);
    assert!(world.position.z > 50.0);
    // settled on the springs, not sinking or bouncing away
    let ride = nominal_ride_height(&config);
    assert!((world.position.y - ride).abs() < 0.05, "y={} ride={ride}", world.position.y);
}

#[test]
fn test_launch_brake_then_reverse() {
    let (mut vc, config) = car();
    let mut world = FlatWorld::new(&config, Vector3::zeros());

    run(&mut vc, &mut world, InputState { throttle: 1.0, ..Default::default() }, 4.0);
    assert!(world.velocity.z > 6.0, "launch too slow: {}", world.velocity.z);
    assert!(vc.drivetrain().gear() >= 1);

    // hold the brake: the car stops first...
    let brake = InputState { brake: 1.0, ..Default::default() };
    let mut stopped = false;
    for _ in 0..(6.0 / DT) as usize {
        vc.step(&mut world, brake, DT);
        world.step(DT);
        assert!(vc.state(&world).unwrap().is_finite());
        if world.velocity.z < 0.5 {
            stopped = true;
            break;
        }
    }
    assert!(stopped, "brakes never stopped the car: {}", world.velocity.z);

    // ...then the same pedal backs it up
    run(&mut vc, &mut world, brake, 3.0);
    assert_eq!(vc.drivetrain().gear(), -1);
    assert!(world.velocity.z < -0.5, "not reversing: {}", world.velocity.z);
}
