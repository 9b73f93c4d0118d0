//! Round state
//!
//! The round owns the physics world, the three entity collections and the
//! body → entity mapping. Entity ids come from one counter and are pushed in
//! increasing order, so every collection stays sorted by id.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entities::{EntityKind, EntityRef, Lifecycle, Material, Obstacle, Projectile, Target};
use super::launch::Slingshot;
use super::trajectory::Trajectory;
use crate::consts::*;
use crate::physics::{BodyDef, BodyHandle, PhysicsWorld};
use crate::render::{Canvas, SpriteInstance, SpriteKind};
use crate::slingshot_anchor;
use crate::tuning::Tuning;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Accepting input and stepping the world
    Playing,
    /// Frozen until unpaused
    Paused,
    /// Every target is gone
    Won,
    /// Out of projectiles with targets left
    Lost,
}

impl RoundPhase {
    pub fn is_over(&self) -> bool {
        matches!(self, RoundPhase::Won | RoundPhase::Lost)
    }
}

/// Live entities of a round, each collection sorted by id
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub targets: Vec<Target>,
}

fn find<E: Lifecycle>(list: &[E], id: u32) -> Option<usize> {
    list.binary_search_by_key(&id, |e| e.id()).ok()
}

impl EntitySet {
    pub fn projectile(&self, id: u32) -> Option<&Projectile> {
        find(&self.projectiles, id).map(|i| &self.projectiles[i])
    }

    pub fn projectile_mut(&mut self, id: u32) -> Option<&mut Projectile> {
        find(&self.projectiles, id).map(|i| &mut self.projectiles[i])
    }

    pub fn obstacle(&self, id: u32) -> Option<&Obstacle> {
        find(&self.obstacles, id).map(|i| &self.obstacles[i])
    }

    pub fn obstacle_mut(&mut self, id: u32) -> Option<&mut Obstacle> {
        find(&self.obstacles, id).map(|i| &mut self.obstacles[i])
    }

    pub fn target(&self, id: u32) -> Option<&Target> {
        find(&self.targets, id).map(|i| &self.targets[i])
    }

    pub fn target_mut(&mut self, id: u32) -> Option<&mut Target> {
        find(&self.targets, id).map(|i| &mut self.targets[i])
    }

    /// Whether the entity behind `entity` is still live
    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity.kind {
            EntityKind::Projectile => self.projectile(entity.id).is_some(),
            EntityKind::Obstacle => self.obstacle(entity.id).is_some(),
            EntityKind::Target => self.target(entity.id).is_some(),
        }
    }

    pub fn len(&self) -> usize {
        self.projectiles.len() + self.obstacles.len() + self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One level being played
#[derive(Debug)]
pub struct Round<W: PhysicsWorld> {
    pub world: W,
    pub entities: EntitySet,
    /// Body → owning entity. Boundary bodies are absent (untagged).
    pub owners: BTreeMap<BodyHandle, EntityRef>,
    /// Untagged static bodies (ground, walls)
    pub boundaries: Vec<BodyHandle>,
    pub sling: Slingshot,
    pub phase: RoundPhase,
    pub tuning: Tuning,
    /// Aim preview, present only while a projectile is selected
    pub trajectory: Option<Trajectory>,
    pub level_name: String,
    /// Ticks simulated while playing
    pub time_ticks: u64,
    /// Projectiles launched so far
    pub launches: u32,
    next_id: u32,
}

impl<W: PhysicsWorld> Round<W> {
    /// Empty round around `world`
    pub fn new(world: W, tuning: Tuning, level_name: impl Into<String>) -> Self {
        let sling = Slingshot::new(slingshot_anchor(), tuning.max_pullback, tuning.power_scale);
        Self {
            world,
            entities: EntitySet::default(),
            owners: BTreeMap::new(),
            boundaries: Vec::new(),
            sling,
            phase: RoundPhase::Playing,
            tuning,
            trajectory: None,
            level_name: level_name.into(),
            time_ticks: 0,
            launches: 0,
            next_id: 1,
        }
    }

    /// Get the next entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an untagged static body; contacts with it never match a rule
    pub fn add_boundary(&mut self, def: &BodyDef) -> BodyHandle {
        let handle = self.world.create_body(def);
        self.boundaries.push(handle);
        handle
    }

    pub fn spawn_projectile(&mut self, position: Vec2) -> u32 {
        let id = self.next_entity_id();
        let handle = self.world.create_body(&Projectile::body_def(position));
        let bird = Projectile::new(id, handle, position);
        self.owners.insert(handle, bird.entity_ref());
        self.entities.projectiles.push(bird);
        id
    }

    pub fn spawn_obstacle(&mut self, material: Material, position: Vec2, size: Vec2, health: i32) -> u32 {
        let id = self.next_entity_id();
        let handle = self.world.create_body(&Obstacle::body_def(position, size));
        let block = Obstacle::new(id, handle, material, position, size, health);
        self.owners.insert(handle, block.entity_ref());
        self.entities.obstacles.push(block);
        id
    }

    pub fn spawn_target(&mut self, position: Vec2, health: i32, linear_damping: f32) -> u32 {
        let id = self.next_entity_id();
        let handle = self.world.create_body(&Target::body_def(position, linear_damping));
        let pig = Target::new(id, handle, position, health);
        self.owners.insert(handle, pig.entity_ref());
        self.entities.targets.push(pig);
        id
    }

    /// Which entity owns `handle`, if any
    pub fn owner_of(&self, handle: BodyHandle) -> Option<EntityRef> {
        self.owners.get(&handle).copied()
    }

    /// Projectile currently in the slingshot
    pub fn selected(&self) -> Option<u32> {
        self.sling.selected()
    }

    pub fn projectiles_left(&self) -> usize {
        self.entities.projectiles.len()
    }

    pub fn targets_left(&self) -> usize {
        self.entities.targets.len()
    }

    /// Projectiles never launched
    pub fn spare_projectiles(&self) -> u32 {
        self.entities.projectiles.iter().filter(|p| !p.launched).count() as u32
    }

    /// Seconds of play so far
    pub fn elapsed(&self) -> f32 {
        self.time_ticks as f32 * self.tuning.timestep
    }

    /// Describe the current frame to `canvas`
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.draw_sprite(&SpriteInstance {
            kind: SpriteKind::Slingshot,
            center: Vec2::new(
                SLINGSHOT_ORIGIN.0 + SLINGSHOT_SIZE.0 / 2.0,
                SLINGSHOT_ORIGIN.1 + SLINGSHOT_SIZE.1 / 2.0,
            ),
            rotation_degrees: 0.0,
            size: Vec2::new(SLINGSHOT_SIZE.0, SLINGSHOT_SIZE.1),
        });

        for block in &self.entities.obstacles {
            canvas.draw_sprite(&block.sprite());
        }
        for pig in &self.entities.targets {
            canvas.draw_sprite(&pig.sprite());
        }
        for bird in &self.entities.projectiles {
            canvas.draw_sprite(&bird.sprite());
        }

        if let Some(path) = &self.trajectory {
            let points: Vec<Vec2> = path.points().collect();
            canvas.draw_path(&points);
        }
    }
}
