// ==============================================================================
// suspension_contact.rs — RAYCAST SUSPENSION + CONTACT PATCH KINEMATICS
// ------------------------------------------------------------------------------
// Per-wheel measurement against the physics world. Produces a SuspensionContact
// that includes:
// - geometry: mount point, hit point (tire contact patch)
// - suspension state: compression (from full droop), compression velocity
// - kinematics: point velocity at the contact (linvel + ω×r)
// - wheel basis (forward/right) including steering
// - slip components (v_long, v_lat) used by the tire solver
//
// Main entry:
// - measure_contact(...)
//     Casts a ray of length rest + travel + radius from the wheel mount along
//     chassis-down. A miss means the wheel is airborne (None).
//
// Notes:
// - This file does NOT apply forces. It only measures contact data.
// - Compression velocity is the raw first-order difference of consecutive
//   compressions; no filtering.
// ==============================================================================

use rapier3d::na::{Isometry3, Point3, Vector3};

use crate::backend::PhysicsBackend;
use crate::dynamics::kinematics::{point_velocity, slip_components, wheel_basis};

/// Chassis pose and motion read once per step and shared by all four wheels.
#[derive(Debug, Clone, Copy)]
pub struct ChassisFrame {
    pub iso: Isometry3<f32>,
    pub forward: Vector3<f32>,
    pub up: Vector3<f32>,
    pub linvel: Vector3<f32>,
    pub angvel: Vector3<f32>,
    pub com: Point3<f32>,
}

impl ChassisFrame {
    /// None when the body is unknown to the world.
    pub fn read<P: PhysicsBackend>(world: &P, body: P::Body) -> Option<Self> {
        let iso = world.transform(body)?;
        let linvel = world.linear_velocity(body)?;
        let angvel = world.angular_velocity(body).unwrap_or_else(Vector3::zeros);
        let com = world
            .center_of_mass(body)
            .unwrap_or_else(|| Point3::from(iso.translation.vector));

        Some(Self {
            iso,
            forward: iso.rotation * Vector3::z(),
            up: iso.rotation * Vector3::y(),
            linvel,
            angvel,
            com,
        })
    }

    pub fn down(&self) -> Vector3<f32> {
        -self.up
    }

    /// Chassis-local point to world space.
    pub fn to_world(&self, local: &Point3<f32>) -> Point3<f32> {
        self.iso * local
    }

    /// Signed speed along chassis forward.
    pub fn forward_speed(&self) -> f32 {
        self.linvel.dot(&self.forward)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SuspensionContact {
    // geometry
    pub mount_point: Point3<f32>,
    pub hit_point: Point3<f32>,
    pub hit_distance: f32,

    // suspension state
    pub compression: f32,
    pub compression_velocity: f32,

    // kinematics
    pub point_vel: Vector3<f32>,

    // wheel basis (world)
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,

    // slip
    pub v_long: f32,
    pub v_lat: f32,
}

/// Per-wheel ray query parameters.
#[derive(Debug, Clone, Copy)]
pub struct ContactQuery {
    pub mount_local: Point3<f32>,
    pub ray_length: f32, // rest + travel + tire radius
    pub steer_angle: f32,
    /// Compression from the previous step, or None when there is no sample yet.
    pub previous_compression: Option<f32>,
}

pub fn measure_contact<P: PhysicsBackend>(
    world: &P,
    body: P::Body,
    frame: &ChassisFrame,
    query: &ContactQuery,
    dt: f32,
) -> Option<SuspensionContact> {
    let mount_point = frame.to_world(&query.mount_local);
    let down = frame.down();

    let hit_distance = world.cast_ray(mount_point, down, query.ray_length, body)?;
    if !hit_distance.is_finite() || hit_distance > query.ray_length {
        return None;
    }

    let hit_point = mount_point + down * hit_distance;
    let compression = (query.ray_length - hit_distance).max(0.0);

    let compression_velocity = match query.previous_compression {
        Some(prev) if dt > 0.0 => (compression - prev) / dt,
        _ => 0.0,
    };

    let point_vel = point_velocity(frame.linvel, frame.angvel, frame.com, hit_point);
    let (forward, right) = wheel_basis(frame.forward, frame.up, query.steer_angle);
    let (v_long, v_lat) = slip_components(point_vel, forward, right);

    Some(SuspensionContact {
        mount_point,
        hit_point,
        hit_distance,
        compression,
        compression_velocity,
        point_vel,
        forward,
        right,
        v_long,
        v_lat,
    })
}
