//! apex_chassis - raycast vehicle dynamics and racing-line AI on top of rapier3d.
//!
//! Layering, leaf to root:
//! - [`dynamics`]: force laws (suspension, tire, aero, drivetrain, assists)
//! - [`track`]: centerline curve, racing line, laps, grid
//! - [`vehicle`]: per-car controller issuing forces through [`backend::PhysicsBackend`]
//! - [`ai`]: pursuit drivers and the director that ranks them
//! - [`race`]: a complete session on the rapier-backed [`physics::PhysicsWorld`]

pub mod ai;
pub mod backend;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod physics;
pub mod race;
pub mod state;
pub mod suspension_contact;
pub mod track;
pub mod vehicle;

pub use backend::PhysicsBackend;
pub use config::VehicleConfig;
pub use error::{ConfigError, TrackError};
pub use physics::PhysicsWorld;
pub use race::RaceSession;
pub use state::{InputState, Telemetry, VehicleState, WheelId, WheelState};
pub use vehicle::VehicleController;
