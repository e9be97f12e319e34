//! dynamics - engine-agnostic vehicle force laws (pure types + solvers)
//!
//! Nothing in here touches the physics world. `vehicle.rs` measures contacts,
//! calls into these models, and turns the results into forces.

pub mod aero;
pub mod assists;
pub mod drivetrain;
pub mod kinematics;
pub mod suspension;
pub mod tire;

pub use aero::AerodynamicsModel;
pub use drivetrain::Drivetrain;
pub use suspension::SuspensionModel;
pub use tire::{CombinedForces, TireModel};
