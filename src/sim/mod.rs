//! Deterministic gameplay simulation
//!
//! All gameplay rules live here. Like the world underneath it, this module
//! must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (autopilot)
//! - Stable iteration order (by entity ID)
//! - No drawing or platform dependencies; frames go out through `render::Canvas`

pub mod autopilot;
pub mod collision;
pub mod entities;
pub mod launch;
pub mod level;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use autopilot::{Autopilot, Shot};
pub use collision::{ContactRule, apply_rule, classify, resolve_contact};
pub use entities::{Aabb, EntityKind, EntityRef, Lifecycle, Material, Obstacle, Projectile, Target};
pub use launch::{Launch, Pullback, SlingState, Slingshot};
pub use level::{BUILTIN_LEVEL_COUNT, LevelDef, ObstaclePlacement, TargetPlacement};
pub use state::{EntitySet, Round, RoundPhase};
pub use tick::{TickInput, tick};
pub use trajectory::{Trajectory, TrajectoryPoints, predict};
