//! Level definitions and round setup
//!
//! A level is static data: projectile rest positions, obstacle placements and
//! target placements. Targets are either placed at a fixed point or spread
//! across the top of an earlier obstacle.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entities::Material;
use super::state::Round;
use crate::consts::*;
use crate::error::SimError;
use crate::physics::{BodyDef, BodyKind, PhysicsWorld, Shape};
use crate::tuning::Tuning;

/// Number of levels shipped with the game
pub const BUILTIN_LEVEL_COUNT: u32 = 2;

/// Starting health of a target unless the level says otherwise
pub const DEFAULT_TARGET_HEALTH: i32 = 10;

fn default_world_size() -> Vec2 {
    Vec2::new(WORLD_WIDTH, WORLD_HEIGHT)
}

fn default_ground_height() -> f32 {
    GROUND_HEIGHT
}

fn default_target_health() -> i32 {
    DEFAULT_TARGET_HEALTH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePlacement {
    /// Center of the block
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default)]
    pub material: Material,
    /// Overrides the material's default health
    #[serde(default)]
    pub health: Option<i32>,
}

impl ObstaclePlacement {
    pub fn health(&self) -> i32 {
        self.health.unwrap_or_else(|| self.material.default_health())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TargetPlacement {
    /// One target at a fixed point
    At {
        position: Vec2,
        #[serde(default = "default_target_health")]
        health: i32,
        #[serde(default)]
        linear_damping: f32,
    },
    /// Targets resting on top of obstacle `obstacle` (index into the level's
    /// obstacle list), one per entry of `spread`, each offset from the
    /// obstacle's center by that fraction of its width
    Atop {
        obstacle: usize,
        spread: Vec<f32>,
        #[serde(default = "default_target_health")]
        health: i32,
        #[serde(default)]
        linear_damping: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub name: String,
    #[serde(default = "default_world_size")]
    pub world_size: Vec2,
    #[serde(default = "default_ground_height")]
    pub ground_height: f32,
    /// Where each projectile waits before launch
    pub projectiles: Vec<Vec2>,
    pub obstacles: Vec<ObstaclePlacement>,
    pub targets: Vec<TargetPlacement>,
}

/// Projectiles lined up on the ground behind the slingshot
fn waiting_projectiles(count: usize) -> Vec<Vec2> {
    let y = GROUND_HEIGHT + PROJECTILE_HALF_EXTENT;
    (0..count)
        .map(|i| Vec2::new(0.35 + 0.4 * i as f32, y))
        .collect()
}

/// Block of `size` standing on `base` (y of its bottom edge) at `x`
fn standing(x: f32, base: f32, size: Vec2, material: Material, health: Option<i32>) -> ObstaclePlacement {
    ObstaclePlacement {
        position: Vec2::new(x, base + size.y / 2.0),
        size,
        material,
        health,
    }
}

impl LevelDef {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let level: LevelDef = serde_json::from_str(json).map_err(SimError::LevelParse)?;
        level.validate()?;
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self).map_err(SimError::LevelParse)
    }

    /// Built-in level by number (1-based)
    pub fn builtin(number: u32) -> Result<Self, SimError> {
        match number {
            1 => Ok(Self::colonnade()),
            2 => Ok(Self::twin_towers()),
            _ => Err(SimError::UnknownLevel(number)),
        }
    }

    /// Three wooden posts under a long plank, targets spread along the plank
    fn colonnade() -> Self {
        let post = Vec2::new(0.2, 1.7);
        let plank = Vec2::new(2.4, 0.2);
        let ground = GROUND_HEIGHT;

        Self {
            name: "Colonnade".to_string(),
            world_size: default_world_size(),
            ground_height: ground,
            projectiles: waiting_projectiles(3),
            obstacles: vec![
                standing(7.5, ground, post, Material::Wood, None),
                standing(9.0, ground, post, Material::Wood, None),
                standing(8.25, ground, post, Material::Wood, None),
                standing(8.25, ground + post.y, plank, Material::Wood, None),
            ],
            targets: vec![TargetPlacement::Atop {
                obstacle: 3,
                spread: vec![-1.0 / 3.0, 0.0, 1.0 / 3.0],
                health: DEFAULT_TARGET_HEALTH,
                linear_damping: 0.0,
            }],
        }
    }

    /// A glass tower and a wooden tower, one target on each
    fn twin_towers() -> Self {
        let post = Vec2::new(0.2, 1.5);
        let plank = Vec2::new(1.5, 0.2);
        let ground = GROUND_HEIGHT;
        let top = ground + post.y + plank.y;

        let mut obstacles = Vec::new();
        for (x, material) in [(7.0, Material::Glass), (10.0, Material::Wood)] {
            obstacles.push(standing(x, ground, post, material, None));
            obstacles.push(standing(x, ground + post.y, plank, material, None));
        }

        let targets = [7.0, 10.0]
            .into_iter()
            .map(|x| TargetPlacement::At {
                position: Vec2::new(x, top + TARGET_SPRITE_SIZE / 2.0),
                health: DEFAULT_TARGET_HEALTH,
                linear_damping: 5.0,
            })
            .collect();

        Self {
            name: "Twin Towers".to_string(),
            world_size: default_world_size(),
            ground_height: ground,
            projectiles: waiting_projectiles(3),
            obstacles,
            targets,
        }
    }

    /// Reject data that cannot produce a playable round
    pub fn validate(&self) -> Result<(), SimError> {
        if self.projectiles.is_empty() {
            return Err(SimError::InvalidLevel(format!("{}: no projectiles", self.name)));
        }
        if self.targets.is_empty() {
            return Err(SimError::InvalidLevel(format!("{}: no targets", self.name)));
        }
        if self.world_size.x <= 0.0 || self.world_size.y <= 0.0 {
            return Err(SimError::InvalidLevel(format!(
                "{}: world size {:?}",
                self.name, self.world_size
            )));
        }
        if let Some(i) = self
            .obstacles
            .iter()
            .position(|o| o.size.x <= 0.0 || o.size.y <= 0.0)
        {
            return Err(SimError::InvalidLevel(format!(
                "{}: obstacle {} has empty size",
                self.name, i
            )));
        }
        Ok(())
    }

    /// Static ground slab plus walls just outside the left, right and top edges
    pub fn boundary_defs(&self) -> Vec<BodyDef> {
        let (w, h, g) = (self.world_size.x, self.world_size.y, self.ground_height);
        let slab = |center: Vec2, half_extents: Vec2| {
            BodyDef::new(BodyKind::Static, center, Shape::Box { half_extents })
        };
        vec![
            slab(Vec2::new(w / 2.0, g / 2.0), Vec2::new(w / 2.0, g / 2.0)),
            slab(Vec2::new(-0.5, h / 2.0), Vec2::new(0.5, h / 2.0)),
            slab(Vec2::new(w + 0.5, h / 2.0), Vec2::new(0.5, h / 2.0)),
            slab(Vec2::new(w / 2.0, h + 0.5), Vec2::new(w / 2.0, 0.5)),
        ]
    }
}

impl<W: PhysicsWorld> Round<W> {
    /// Build a round for `level` in `world`
    ///
    /// Target placements that refer to a missing obstacle are skipped with a
    /// warning. A level left with no targets at all is rejected, since the
    /// round would be won before the first launch.
    pub fn from_level(world: W, level: &LevelDef, tuning: Tuning) -> Result<Self, SimError> {
        level.validate()?;
        let mut round = Round::new(world, tuning, level.name.clone());

        for def in level.boundary_defs() {
            round.add_boundary(&def);
        }

        for placement in &level.obstacles {
            round.spawn_obstacle(
                placement.material,
                placement.position,
                placement.size,
                placement.health(),
            );
        }

        for placement in &level.targets {
            match placement {
                TargetPlacement::At {
                    position,
                    health,
                    linear_damping,
                } => {
                    round.spawn_target(*position, *health, *linear_damping);
                }
                TargetPlacement::Atop {
                    obstacle,
                    spread,
                    health,
                    linear_damping,
                } => {
                    let Some(base) = level.obstacles.get(*obstacle) else {
                        log::warn!(
                            "{}: targets placed atop obstacle {} but only {} obstacles exist; skipping",
                            level.name,
                            obstacle,
                            level.obstacles.len()
                        );
                        continue;
                    };
                    let y = base.position.y + base.size.y / 2.0 + TARGET_SPRITE_SIZE / 2.0;
                    for fraction in spread {
                        let x = base.position.x + fraction * base.size.x;
                        round.spawn_target(Vec2::new(x, y), *health, *linear_damping);
                    }
                }
            }
        }

        if round.entities.targets.is_empty() {
            return Err(SimError::InvalidLevel(format!(
                "{}: no target could be placed",
                level.name
            )));
        }

        for &position in &level.projectiles {
            round.spawn_projectile(position);
        }

        log::info!(
            "Round '{}' ready: {} projectiles, {} obstacles, {} targets",
            level.name,
            round.entities.projectiles.len(),
            round.entities.obstacles.len(),
            round.entities.targets.len()
        );
        Ok(round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{RapierWorld, ScriptedWorld};

    #[test]
    fn test_builtin_levels_build() {
        for number in 1..=BUILTIN_LEVEL_COUNT {
            let level = LevelDef::builtin(number).unwrap();
            let round = Round::from_level(RapierWorld::default(), &level, Tuning::default()).unwrap();
            assert_eq!(round.projectiles_left(), 3);
            assert!(round.targets_left() > 0);
            assert_eq!(round.boundaries.len(), 4);
        }
        assert!(matches!(LevelDef::builtin(3), Err(SimError::UnknownLevel(3))));
    }

    #[test]
    fn test_colonnade_targets_spread_on_plank() {
        let level = LevelDef::builtin(1).unwrap();
        let round = Round::from_level(ScriptedWorld::new(), &level, Tuning::default()).unwrap();

        let xs: Vec<f32> = round.entities.targets.iter().map(|p| p.state.position.x).collect();
        assert_eq!(xs.len(), 3);
        assert!((xs[0] - 7.45).abs() < 1e-4);
        assert!((xs[1] - 8.25).abs() < 1e-4);
        assert!((xs[2] - 9.05).abs() < 1e-4);
        for pig in &round.entities.targets {
            assert!((pig.state.position.y - 2.8).abs() < 1e-4);
        }
    }

    #[test]
    fn test_twin_towers_materials() {
        let level = LevelDef::builtin(2).unwrap();
        let round = Round::from_level(ScriptedWorld::new(), &level, Tuning::default()).unwrap();
        let glass: Vec<i32> = round
            .entities
            .obstacles
            .iter()
            .filter(|o| o.material == Material::Glass)
            .map(|o| o.health)
            .collect();
        assert_eq!(glass, vec![5, 5]);
        assert_eq!(round.targets_left(), 2);
    }

    #[test]
    fn test_missing_support_obstacle_is_skipped() {
        let mut level = LevelDef::builtin(1).unwrap();
        level.obstacles.truncate(3);
        level.targets.push(TargetPlacement::At {
            position: Vec2::new(5.0, 1.0),
            health: 10,
            linear_damping: 0.0,
        });

        let round = Round::from_level(ScriptedWorld::new(), &level, Tuning::default()).unwrap();
        assert_eq!(round.targets_left(), 1);
        assert_eq!(round.entities.obstacles.len(), 3);
    }

    #[test]
    fn test_level_with_every_target_skipped_rejected() {
        let mut level = LevelDef::builtin(1).unwrap();
        level.obstacles.truncate(3);
        assert!(level.validate().is_ok());

        let result = Round::from_level(ScriptedWorld::new(), &level, Tuning::default());
        assert!(matches!(result, Err(SimError::InvalidLevel(_))));
    }

    #[test]
    fn test_from_json_defaults() {
        let json = r#"{
            "name": "Custom",
            "projectiles": [[0.5, 0.85]],
            "obstacles": [
                { "position": [6.0, 1.45], "size": [0.2, 1.5], "material": "Glass" }
            ],
            "targets": [
                { "rule": "at", "position": [6.0, 2.5] },
                { "rule": "atop", "obstacle": 0, "spread": [0.0], "health": 4 }
            ]
        }"#;
        let level = LevelDef::from_json(json).unwrap();
        assert_eq!(level.world_size, Vec2::new(WORLD_WIDTH, WORLD_HEIGHT));
        assert_eq!(level.obstacles[0].health(), 5);
        assert_eq!(
            level.targets[0],
            TargetPlacement::At {
                position: Vec2::new(6.0, 2.5),
                health: DEFAULT_TARGET_HEALTH,
                linear_damping: 0.0
            }
        );
    }

    #[test]
    fn test_json_round_trip_of_builtin() {
        let level = LevelDef::builtin(2).unwrap();
        let json = level.to_json().unwrap();
        assert_eq!(LevelDef::from_json(&json).unwrap(), level);
    }

    #[test]
    fn test_invalid_levels_rejected() {
        assert!(matches!(
            LevelDef::from_json("not json"),
            Err(SimError::LevelParse(_))
        ));

        let mut level = LevelDef::builtin(1).unwrap();
        level.projectiles.clear();
        assert!(matches!(level.validate(), Err(SimError::InvalidLevel(_))));

        let mut level = LevelDef::builtin(1).unwrap();
        level.obstacles[0].size = Vec2::new(0.0, 1.0);
        assert!(matches!(
            Round::from_level(ScriptedWorld::new(), &level, Tuning::default()),
            Err(SimError::InvalidLevel(_))
        ));
    }
}
