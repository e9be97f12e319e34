// ==============================================================================
// physics.rs — RAPIER3D WORLD (THE EXTERNAL RIGID-BODY / COLLISION ENGINE)
// ------------------------------------------------------------------------------
// PhysicsWorld owns every rapier set and is the only writer of body poses and
// velocities. The vehicle layer talks to it through PhysicsBackend:
// - cast_ray            -> QueryPipeline::cast_ray against the ground group,
//                          excluding the chassis
// - apply_force[_at_pt] -> RigidBody::add_force[_at_point]
// - transform / linvel  -> read-only body state
//
// Forces are user forces in rapier: they persist until reset, so step()
// clears them after integrating. Anything applied between two step() calls
// acts for exactly one step.
//
// A body that goes non-finite or leaves the world is parked above the origin
// and counted; runaway_resets() stays 0 in a healthy simulation.
// ==============================================================================

use rapier3d::prelude::*;
use rapier3d::na::{Isometry3, Point3, Vector3};
use tracing::{info, warn};

use crate::backend::PhysicsBackend;
use crate::config::VehicleConfig;
use crate::vehicle::nominal_ride_height;

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

pub const GRAVITY: f32 = 9.81; // m/s²
pub const MAX_DT: f32 = 0.05; // s, frame-hitch guard
const WORLD_LIMIT: f32 = 2_000.0; // m, runaway-body guard
const CHASSIS_ANGULAR_DAMPING: f32 = 0.6;

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,              // gravity vector
    pub pipeline: PhysicsPipeline,          // physics pipeline
    pub island_manager: IslandManager,      // manages islands of bodies
    pub broad_phase: DefaultBroadPhase,     // broad-phase collision detection
    pub narrow_phase: NarrowPhase,          // collision detection
    pub bodies: RigidBodySet,               // for rigid bodies
    pub colliders: ColliderSet,             // for collision shapes
    pub joints: ImpulseJointSet,            // for constraints
    pub multibody_joints: MultibodyJointSet,// for articulated bodies
    pub ccd: CCDSolver,                     // continuous collision detection
    pub query_pipeline: QueryPipeline,      // for raycasting
    runaway_resets: u32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Empty world with a large flat ground whose top surface is y = 0.
    pub fn new() -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(1_000.0, 1.0, 1_000.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.0)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        let mut world = Self {
            gravity: vector![0.0, -GRAVITY, 0.0],
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            runaway_resets: 0,
        };
        world.refresh_queries();
        world
    }

    /// Dynamic box chassis sized from the config, resting near ride height.
    ///
    /// `pose` gives the ground-level position and heading; the body is lifted
    /// to the nominal ride height so the suspension rays start in contact.
    pub fn spawn_chassis(&mut self, config: &VehicleConfig, pose: Isometry3<f32>) -> RigidBodyHandle {
        let dims = &config.dimensions;
        let ride_height = nominal_ride_height(config);

        let hx = dims.track_width * 0.5 + 0.12;
        let hy = 0.3;
        let hz = dims.wheelbase * 0.5 + 0.75;
        let volume = 8.0 * hx * hy * hz;
        let density = config.mass / volume; // ρ = m / V

        // centre of mass sits at cg_height above the ground at rest
        let com_offset = dims.cg_height - ride_height;

        let mut position = pose;
        position.translation.vector.y += ride_height;

        let rb = RigidBodyBuilder::dynamic()
            .position(position)
            .angular_damping(CHASSIS_ANGULAR_DAMPING)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![0.0, com_offset, 0.0])
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .density(density)
            .friction(0.2)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.refresh_queries();

        info!(
            vehicle = %config.name,
            x = position.translation.x,
            y = position.translation.y,
            z = position.translation.z,
            "spawned chassis"
        );
        handle
    }

    /// Remove a chassis and its collider (race reset).
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
        self.refresh_queries();
    }

    /// Bodies teleported back into the world since construction.
    pub fn runaway_resets(&self) -> u32 {
        self.runaway_resets
    }

    /// Rebuild the ray-cast acceleration structure from current collider poses.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    /// Integrate one step. `dt` is clamped to `MAX_DT`.
    pub fn step(&mut self, dt: Real) {
        let dt = dt.clamp(0.0, MAX_DT);
        if dt <= 0.0 {
            return;
        }

        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        for (handle, body) in self.bodies.iter_mut() {
            // forces were issued for this step only
            body.reset_forces(false);

            // Safety: keep exploding bodies from poisoning the world
            let pos = *body.translation();
            let bad = !pos.iter().all(|c| c.is_finite()) || pos.iter().any(|c| c.abs() > WORLD_LIMIT);
            if bad {
                self.runaway_resets += 1;
                warn!(?handle, resets = self.runaway_resets, "resetting runaway body");
                body.set_translation(vector![0.0, 2.0, 0.0], true);
                body.set_linvel(vector![0.0, 0.0, 0.0], true);
                body.set_angvel(vector![0.0, 0.0, 0.0], true);
            }
        }
    }
}

impl PhysicsBackend for PhysicsWorld {
    type Body = RigidBodyHandle;

    fn cast_ray(&self, origin: Point3<f32>, dir: Vector3<f32>, max_len: f32, exclude: RigidBodyHandle) -> Option<f32> {
        let ray = Ray::new(origin, dir);
        // ground only: other chassis never hold a wheel up
        let filter = QueryFilter::default()
            .groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .exclude_rigid_body(exclude);
        self.query_pipeline
            .cast_ray(&self.bodies, &self.colliders, &ray, max_len, true, filter)
            .map(|(_collider, toi)| toi)
    }

    fn apply_force_at_point(&mut self, body: RigidBodyHandle, force: Vector3<f32>, point: Point3<f32>) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.add_force_at_point(force, point, true);
        }
    }

    fn apply_force(&mut self, body: RigidBodyHandle, force: Vector3<f32>) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.add_force(force, true);
        }
    }

    fn transform(&self, body: RigidBodyHandle) -> Option<Isometry3<f32>> {
        self.bodies.get(body).map(|rb| *rb.position())
    }

    fn linear_velocity(&self, body: RigidBodyHandle) -> Option<Vector3<f32>> {
        self.bodies.get(body).map(|rb| *rb.linvel())
    }

    fn center_of_mass(&self, body: RigidBodyHandle) -> Option<Point3<f32>> {
        self.bodies.get(body).map(|rb| *rb.center_of_mass())
    }

    fn angular_velocity(&self, body: RigidBodyHandle) -> Option<Vector3<f32>> {
        self.bodies.get(body).map(|rb| *rb.angvel())
    }
}
