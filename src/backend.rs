//! The capability set the vehicle layer needs from a rigid-body world.
//!
//! The vehicle never writes positions or velocities; it reads the chassis
//! transform and velocity and issues forces. The world integrates.

use rapier3d::na::{Isometry3, Point3, Vector3};

pub trait PhysicsBackend {
    /// Handle to a chassis body inside this world.
    type Body: Copy;

    /// Distance along `dir` to the first hit within `max_len`, ignoring `exclude`.
    fn cast_ray(&self, origin: Point3<f32>, dir: Vector3<f32>, max_len: f32, exclude: Self::Body) -> Option<f32>;

    /// World-space force at a world-space point for the coming step.
    fn apply_force_at_point(&mut self, body: Self::Body, force: Vector3<f32>, point: Point3<f32>);

    /// World-space force through the centre of mass for the coming step.
    fn apply_force(&mut self, body: Self::Body, force: Vector3<f32>);

    fn transform(&self, body: Self::Body) -> Option<Isometry3<f32>>;

    fn linear_velocity(&self, body: Self::Body) -> Option<Vector3<f32>>;

    /// World-space centre of mass. Defaults to the body origin.
    fn center_of_mass(&self, body: Self::Body) -> Option<Point3<f32>> {
        self.transform(body).map(|iso| Point3::from(iso.translation.vector))
    }

    /// Angular velocity, used for contact-point velocities. Defaults to none.
    fn angular_velocity(&self, _body: Self::Body) -> Option<Vector3<f32>> {
        Some(Vector3::zeros())
    }
}
