//! ai - autonomous drivers: pursuit controller, rubber banding, and the
//! director that feeds them race context.

pub mod director;
pub mod driver;
pub mod rubber_band;

pub use director::{ActorId, AiDirector, RaceContext, RankingMode};
pub use driver::{ActorKinematics, AiDriver, AiPersonality};
pub use rubber_band::compute_rubber_band_modifier;
