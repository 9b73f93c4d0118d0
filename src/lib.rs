//! Sling Siege - a slingshot siege puzzle
//!
//! Core modules:
//! - `sim`: Gameplay simulation (entities, collision rules, launch, round loop)
//! - `physics`: Rigid-body world boundary, its rapier backend and a scripted test world
//! - `render`: Draw-list boundary for whatever presents the round
//! - `progress`: Campaign progression across levels
//! - `tuning`: Data-driven round-loop knobs

pub mod error;
pub mod physics;
pub mod progress;
pub mod render;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use progress::{Progress, Screen};
pub use tuning::Tuning;

use glam::Vec2;

/// Game rule constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Solver iterations per step
    pub const VELOCITY_ITERATIONS: u32 = 8;
    pub const POSITION_ITERATIONS: u32 = 3;

    /// World extents (meters)
    pub const WORLD_WIDTH: f32 = 12.0;
    pub const WORLD_HEIGHT: f32 = 8.0;
    /// Ground slab height
    pub const GROUND_HEIGHT: f32 = 0.7;
    /// World gravity magnitude (acceleration downward, m/s²)
    pub const GRAVITY: f32 = 9.8;

    /// Direct-hit damage when a projectile strikes a target or obstacle
    pub const PROJECTILE_HIT_DAMAGE: i32 = 10;
    /// Obstacle speed below which a crushing contact does nothing
    pub const IMPACT_FORCE_THRESHOLD: f32 = 2.0;
    /// Damage per unit of obstacle speed on a crushing contact
    pub const IMPACT_DAMAGE_SCALE: f32 = 5.0;
    /// Jump in vertical speed between ticks that counts as a fall
    pub const FALL_DAMAGE_THRESHOLD: f32 = 2.0;
    pub const FALL_DAMAGE_SCALE: f32 = 10.0;

    /// Linear and angular speed under which a launched projectile is "stopped"
    pub const LOW_MOTION_THRESHOLD: f32 = 0.1;
    /// Seconds a stopped/collided projectile lingers before removal
    pub const PROJECTILE_REMOVAL_DELAY: f32 = 2.0;
    /// Seconds a destroyed obstacle lingers before removal
    pub const OBSTACLE_REMOVAL_DELAY: f32 = 1.0;
    /// Seconds a dead target lingers before removal
    pub const TARGET_REMOVAL_DELAY: f32 = 1.0;

    /// Physics box half extent of a projectile
    pub const PROJECTILE_HALF_EXTENT: f32 = 0.15;
    /// Drawn (and pickable) size of a projectile
    pub const PROJECTILE_SPRITE_SIZE: f32 = 0.5;
    pub const TARGET_RADIUS: f32 = 0.2;
    pub const TARGET_SPRITE_SIZE: f32 = 0.4;

    /// Slingshot sprite placement (bottom-left corner and size)
    pub const SLINGSHOT_ORIGIN: (f32, f32) = (1.0, 0.5);
    pub const SLINGSHOT_SIZE: (f32, f32) = (0.8, 1.6);
    /// Launch anchor sits this far above the slingshot's top edge
    pub const ANCHOR_LIFT: f32 = 0.4;
}

/// Slingshot launch anchor derived from the slingshot sprite placement
#[inline]
pub fn slingshot_anchor() -> Vec2 {
    use consts::*;
    Vec2::new(
        SLINGSHOT_ORIGIN.0 + SLINGSHOT_SIZE.0 / 2.0,
        SLINGSHOT_ORIGIN.1 + SLINGSHOT_SIZE.1 + ANCHOR_LIFT,
    )
}

/// Unit direction for an angle given in degrees
#[inline]
pub fn direction_from_degrees(degrees: f32) -> Vec2 {
    let radians = degrees.to_radians();
    Vec2::new(radians.cos(), radians.sin())
}

/// Angle of a vector in degrees, measured counter-clockwise from +x
#[inline]
pub fn degrees_of(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_above_slingshot() {
        let anchor = slingshot_anchor();
        assert!((anchor.x - 1.4).abs() < 1e-6);
        assert!((anchor.y - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_direction_round_trip() {
        let dir = direction_from_degrees(135.0);
        assert!((degrees_of(dir) - 135.0).abs() < 1e-3);
        assert!((dir.length() - 1.0).abs() < 1e-6);
    }
}
