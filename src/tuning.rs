//! Round-loop tuning
//!
//! Knobs that shape how a round plays but not its rules. Rule constants
//! (damage, thresholds, delays) live in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Physics ===
    /// Fixed step length in seconds
    pub timestep: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// Downward acceleration used by the world and the aim preview
    pub gravity: f32,

    // === Launch ===
    /// Furthest the pouch can be pulled from the anchor
    pub max_pullback: f32,
    /// Launch speed per unit of pullback
    pub power_scale: f32,

    // === Aim preview ===
    pub trajectory_samples: usize,
    /// Seconds between preview samples
    pub trajectory_step: f32,

    // === Lifecycle ===
    /// How far above a removed obstacle's top a target still counts as supported by it
    pub support_reach: f32,
    /// Obstacles whose center drops below this height are removed
    pub kill_plane: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            timestep: SIM_DT,
            velocity_iterations: VELOCITY_ITERATIONS,
            position_iterations: POSITION_ITERATIONS,
            gravity: GRAVITY,

            max_pullback: 1.0,
            power_scale: 10.0,

            trajectory_samples: 30,
            trajectory_step: 0.1,

            support_reach: 0.5,
            kill_plane: 0.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json).map_err(SimError::TuningParse)?;
        log::info!("Loaded tuning (timestep {:.4}s)", tuning.timestep);
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self).map_err(SimError::TuningParse)
    }

    /// Ticks needed to cover `seconds` at this timestep
    pub fn ticks_for(&self, seconds: f32) -> u32 {
        (seconds / self.timestep).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let tuning = Tuning::default();
        assert_eq!(tuning.velocity_iterations, 8);
        assert_eq!(tuning.position_iterations, 3);
        assert_eq!(tuning.max_pullback, 1.0);
        assert_eq!(tuning.power_scale, 10.0);
        assert_eq!(tuning.trajectory_samples, 30);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "power_scale": 12.5, "kill_plane": -1.0 }"#).unwrap();
        assert_eq!(tuning.power_scale, 12.5);
        assert_eq!(tuning.kill_plane, -1.0);
        assert_eq!(tuning.max_pullback, 1.0);
    }

    #[test]
    fn test_bad_json_is_error() {
        let err = Tuning::from_json("{ power_scale: }").unwrap_err();
        assert!(matches!(err, SimError::TuningParse(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = Tuning {
            support_reach: 0.75,
            ..Default::default()
        };
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_ticks_for_one_second() {
        assert_eq!(Tuning::default().ticks_for(1.0), 60);
    }
}
