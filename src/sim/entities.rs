//! Entity models: projectiles, obstacles and targets
//!
//! Each model holds gameplay state plus the handle of the body that moves it.
//! Motion is read back from the world once per tick (`sync_from_body`); the
//! models never integrate anything themselves.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::physics::{BodyDef, BodyHandle, BodyKind, BodyState, PhysicsError, PhysicsWorld, Shape};
use crate::render::{SpriteInstance, SpriteKind};

/// Entity category, used to classify contacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Projectile,
    Obstacle,
    Target,
}

/// What a body belongs to: kind plus entity id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u32,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: u32) -> Self {
        Self { kind, id }
    }
}

/// Obstacle material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Material {
    #[default]
    Wood,
    Glass,
}

impl Material {
    /// Health an obstacle of this material starts with unless the level overrides it
    pub fn default_health(&self) -> i32 {
        match self {
            Material::Wood => 10,
            Material::Glass => 5,
        }
    }
}

/// Axis-aligned bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size / 2.0,
            max: center + size / 2.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Shared lifecycle contract of every entity model
pub trait Lifecycle {
    const KIND: EntityKind;

    fn id(&self) -> u32;

    fn body(&self) -> Option<BodyHandle>;

    /// Gives up the body handle, leaving the entity bodiless
    fn take_body(&mut self) -> Option<BodyHandle>;

    /// Store the latest motion snapshot read from the world
    fn record_state(&mut self, state: BodyState);

    /// Apply damage. A no-op once the entity reached its terminal state.
    fn apply_damage(&mut self, amount: i32);

    /// Advance removal timers by `elapsed` seconds and report whether the
    /// entity should leave the round.
    fn ready_to_remove(&mut self, elapsed: f32) -> bool;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(Self::KIND, self.id())
    }

    fn sync_from_body<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        if let Some(state) = self.body().and_then(|h| world.body_state(h)) {
            self.record_state(state);
        }
    }

    /// Destroy the body in the world. Safe to call again once detached.
    fn detach<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<(), PhysicsError> {
        match self.take_body() {
            Some(handle) => world.destroy_body(handle),
            None => Ok(()),
        }
    }
}

/// A launchable projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    body: Option<BodyHandle>,
    pub launched: bool,
    pub collided: bool,
    /// Seconds spent collided or stopped since launch
    pub stop_timer: f32,
    /// Last motion read from the world
    pub state: BodyState,
}

impl Projectile {
    pub fn new(id: u32, body: BodyHandle, position: Vec2) -> Self {
        Self {
            id,
            body: Some(body),
            launched: false,
            collided: false,
            stop_timer: 0.0,
            state: BodyState {
                position,
                ..Default::default()
            },
        }
    }

    /// Physics body for a projectile resting at `position`
    pub fn body_def(position: Vec2) -> BodyDef {
        BodyDef::new(
            BodyKind::Dynamic,
            position,
            Shape::Box {
                half_extents: Vec2::splat(PROJECTILE_HALF_EXTENT),
            },
        )
        .with_material(1.0, 0.5, 0.3)
    }

    /// Launched and barely moving
    pub fn is_stopped(&self) -> bool {
        self.launched
            && self.state.linear_velocity.length() < LOW_MOTION_THRESHOLD
            && self.state.angular_velocity.abs() < LOW_MOTION_THRESHOLD
    }

    pub fn mark_collided(&mut self) {
        self.collided = true;
    }

    /// Pickable region (the drawn sprite)
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.state.position, Vec2::splat(PROJECTILE_SPRITE_SIZE))
    }

    pub fn sprite(&self) -> SpriteInstance {
        SpriteInstance {
            kind: SpriteKind::Projectile,
            center: self.state.position,
            rotation_degrees: self.state.angle.to_degrees(),
            size: Vec2::splat(PROJECTILE_SPRITE_SIZE),
        }
    }
}

impl Lifecycle for Projectile {
    const KIND: EntityKind = EntityKind::Projectile;

    fn id(&self) -> u32 {
        self.id
    }

    fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    fn take_body(&mut self) -> Option<BodyHandle> {
        self.body.take()
    }

    fn record_state(&mut self, state: BodyState) {
        self.state = state;
    }

    /// Projectiles have no health; any hit counts as a collision
    fn apply_damage(&mut self, amount: i32) {
        if amount > 0 {
            self.mark_collided();
        }
    }

    fn ready_to_remove(&mut self, elapsed: f32) -> bool {
        if self.launched && (self.collided || self.is_stopped()) {
            self.stop_timer += elapsed;
        }
        self.stop_timer >= PROJECTILE_REMOVAL_DELAY
    }
}

/// A destructible block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    body: Option<BodyHandle>,
    pub material: Material,
    pub size: Vec2,
    pub health: i32,
    pub destroyed: bool,
    /// Seconds since destruction
    pub destruction_timer: f32,
    pub state: BodyState,
}

impl Obstacle {
    pub fn new(
        id: u32,
        body: BodyHandle,
        material: Material,
        position: Vec2,
        size: Vec2,
        health: i32,
    ) -> Self {
        Self {
            id,
            body: Some(body),
            material,
            size,
            health,
            destroyed: health <= 0,
            destruction_timer: 0.0,
            state: BodyState {
                position,
                ..Default::default()
            },
        }
    }

    pub fn body_def(position: Vec2, size: Vec2) -> BodyDef {
        BodyDef::new(
            BodyKind::Dynamic,
            position,
            Shape::Box {
                half_extents: size / 2.0,
            },
        )
        .with_material(1.0, 0.8, 0.0)
    }

    /// Last known footprint
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.state.position, self.size)
    }

    pub fn sprite(&self) -> SpriteInstance {
        SpriteInstance {
            kind: SpriteKind::Obstacle(self.material),
            center: self.state.position,
            rotation_degrees: self.state.angle.to_degrees(),
            size: self.size,
        }
    }
}

impl Lifecycle for Obstacle {
    const KIND: EntityKind = EntityKind::Obstacle;

    fn id(&self) -> u32 {
        self.id
    }

    fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    fn take_body(&mut self) -> Option<BodyHandle> {
        self.body.take()
    }

    fn record_state(&mut self, state: BodyState) {
        self.state = state;
    }

    fn apply_damage(&mut self, amount: i32) {
        if self.destroyed || amount <= 0 {
            return;
        }
        self.health -= amount;
        if self.health <= 0 {
            self.destroyed = true;
        }
    }

    fn ready_to_remove(&mut self, elapsed: f32) -> bool {
        if self.destroyed {
            self.destruction_timer += elapsed;
            return self.destruction_timer >= OBSTACLE_REMOVAL_DELAY;
        }
        false
    }
}

/// An enemy target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    body: Option<BodyHandle>,
    pub health: i32,
    /// Health reached zero; further damage is ignored
    pub hit: bool,
    /// Body and sprite are gone for good
    pub removed: bool,
    /// Seconds since death
    pub removal_timer: f32,
    /// Vertical speed at the previous tick, for fall damage
    last_vertical_speed: f32,
    pub state: BodyState,
}

impl Target {
    pub fn new(id: u32, body: BodyHandle, position: Vec2, health: i32) -> Self {
        Self {
            id,
            body: Some(body),
            health,
            hit: health <= 0,
            removed: false,
            removal_timer: 0.0,
            last_vertical_speed: 0.0,
            state: BodyState {
                position,
                ..Default::default()
            },
        }
    }

    pub fn body_def(position: Vec2, linear_damping: f32) -> BodyDef {
        BodyDef::new(
            BodyKind::Dynamic,
            position,
            Shape::Circle {
                radius: TARGET_RADIUS,
            },
        )
        .with_material(0.5, 0.5, 0.0)
        .with_linear_damping(linear_damping)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Damage from an obstacle striking this target at `impact_force` speed
    pub fn apply_impact(&mut self, impact_force: f32) {
        if impact_force > IMPACT_FORCE_THRESHOLD {
            self.apply_damage((impact_force * IMPACT_DAMAGE_SCALE) as i32);
        }
    }

    /// Damage from a sudden jump in vertical speed since the previous tick.
    ///
    /// Compares absolute speeds, so a sharp reversal can register as a fall.
    pub fn apply_fall_damage(&mut self) {
        let vertical_speed = self.state.linear_velocity.y.abs();
        let jump = vertical_speed - self.last_vertical_speed;
        if jump > FALL_DAMAGE_THRESHOLD {
            self.apply_damage((jump * FALL_DAMAGE_SCALE) as i32);
        }
        self.last_vertical_speed = vertical_speed;
    }

    /// Remove body and sprite immediately, regardless of health
    pub fn despawn<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<(), PhysicsError> {
        self.detach(world)
    }

    pub fn sprite(&self) -> SpriteInstance {
        SpriteInstance {
            kind: SpriteKind::Target,
            center: self.state.position,
            rotation_degrees: self.state.angle.to_degrees(),
            size: Vec2::splat(TARGET_SPRITE_SIZE),
        }
    }
}

impl Lifecycle for Target {
    const KIND: EntityKind = EntityKind::Target;

    fn id(&self) -> u32 {
        self.id
    }

    fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    fn take_body(&mut self) -> Option<BodyHandle> {
        self.removed = true;
        self.body.take()
    }

    fn record_state(&mut self, state: BodyState) {
        if !self.removed {
            self.state = state;
        }
    }

    fn apply_damage(&mut self, amount: i32) {
        if self.hit || amount <= 0 {
            return;
        }
        self.health -= amount;
        if self.health <= 0 {
            self.hit = true;
        }
    }

    fn ready_to_remove(&mut self, elapsed: f32) -> bool {
        if self.is_dead() {
            self.removal_timer += elapsed;
            return self.removal_timer >= TARGET_REMOVAL_DELAY;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{RapierWorld, ScriptedWorld};
    use proptest::prelude::*;

    fn obstacle(health: i32) -> Obstacle {
        Obstacle::new(
            1,
            BodyHandle(1),
            Material::Wood,
            Vec2::new(5.0, 1.0),
            Vec2::new(0.2, 1.7),
            health,
        )
    }

    fn target(health: i32) -> Target {
        Target::new(2, BodyHandle(2), Vec2::new(5.0, 3.0), health)
    }

    #[test]
    fn test_obstacle_destroyed_at_zero() {
        let mut block = obstacle(10);
        block.apply_damage(4);
        assert_eq!(block.health, 6);
        assert!(!block.destroyed);

        block.apply_damage(6);
        assert_eq!(block.health, 0);
        assert!(block.destroyed);

        // Terminal: no further change
        block.apply_damage(10);
        assert_eq!(block.health, 0);
    }

    #[test]
    fn test_obstacle_removal_after_one_second() {
        let mut block = obstacle(5);
        assert!(!block.ready_to_remove(5.0), "intact blocks never expire");

        block.apply_damage(10);
        assert!(!block.ready_to_remove(0.5));
        assert!(block.ready_to_remove(0.5));
    }

    #[test]
    fn test_target_impact_threshold() {
        let mut pig = target(10);
        pig.apply_impact(2.0);
        assert_eq!(pig.health, 10, "at threshold is not enough");

        pig.apply_impact(2.5);
        assert_eq!(pig.health, -2); // 2.5 * 5 = 12
        assert!(pig.hit);
    }

    #[test]
    fn test_target_impact_truncates() {
        let mut pig = target(100);
        pig.apply_impact(3.99);
        assert_eq!(pig.health, 100 - 19);
    }

    #[test]
    fn test_fall_damage_on_speed_jump() {
        let mut pig = target(50);
        pig.state.linear_velocity = Vec2::new(0.0, -1.0);
        pig.apply_fall_damage();
        assert_eq!(pig.health, 50);

        pig.state.linear_velocity = Vec2::new(0.0, -4.5);
        pig.apply_fall_damage();
        assert_eq!(pig.health, 15); // (4.5 - 1.0) * 10

        // Decelerating does nothing
        pig.state.linear_velocity = Vec2::ZERO;
        pig.apply_fall_damage();
        assert_eq!(pig.health, 15);
    }

    #[test]
    fn test_fall_damage_uses_absolute_speed() {
        let mut pig = target(50);
        pig.state.linear_velocity = Vec2::new(0.0, -1.0);
        pig.apply_fall_damage();
        // Bounce upward faster than it was falling
        pig.state.linear_velocity = Vec2::new(0.0, 3.5);
        pig.apply_fall_damage();
        assert_eq!(pig.health, 25);
    }

    #[test]
    fn test_projectile_stop_timer_requires_launch() {
        let mut bird = Projectile::new(3, BodyHandle(3), Vec2::new(1.2, 0.6));
        bird.mark_collided();
        assert!(!bird.ready_to_remove(3.0), "waiting projectiles stay");

        bird.launched = true;
        bird.state.linear_velocity = Vec2::new(5.0, 0.0);
        assert!(!bird.is_stopped());
        assert!(!bird.ready_to_remove(1.0));
        assert!(bird.ready_to_remove(1.0));
    }

    #[test]
    fn test_projectile_stopped_without_collision() {
        let mut bird = Projectile::new(3, BodyHandle(3), Vec2::ZERO);
        bird.launched = true;
        bird.state.linear_velocity = Vec2::new(0.05, 0.0);
        assert!(bird.is_stopped());
        assert!(!bird.ready_to_remove(1.5));
        assert!(bird.ready_to_remove(0.5));
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut world = ScriptedWorld::new();
        let handle = world.create_body(&Target::body_def(Vec2::new(2.0, 2.0), 0.0));
        let mut pig = Target::new(7, handle, Vec2::new(2.0, 2.0), 10);

        pig.detach(&mut world).unwrap();
        let once = (pig.body(), pig.removed, world.body_count());

        pig.detach(&mut world).unwrap();
        let twice = (pig.body(), pig.removed, world.body_count());

        assert_eq!(once, twice);
        assert_eq!(once, (None, true, 0));
    }

    #[test]
    fn test_removed_target_keeps_last_pose() {
        let mut world = RapierWorld::default();
        let handle = world.create_body(&Target::body_def(Vec2::new(2.0, 2.0), 0.0));
        let mut pig = Target::new(7, handle, Vec2::new(2.0, 2.0), 10);
        pig.despawn(&mut world).unwrap();
        pig.sync_from_body(&world);
        assert_eq!(pig.state.position, Vec2::new(2.0, 2.0));
    }

    proptest! {
        #[test]
        fn prop_obstacle_damage_monotonic(
            initial in 1i32..200,
            hits in proptest::collection::vec(1i32..50, 0..20),
        ) {
            let mut block = obstacle(initial);
            let mut expected = initial;
            for amount in &hits {
                let before = block.health;
                block.apply_damage(*amount);
                prop_assert!(block.health <= before);
                if expected > 0 {
                    expected -= amount;
                }
            }
            prop_assert_eq!(block.health, expected);
            prop_assert_eq!(block.destroyed, expected <= 0);
        }

        #[test]
        fn prop_target_never_resurrects(
            hits in proptest::collection::vec(-20i32..50, 1..30),
        ) {
            let mut pig = target(10);
            let mut was_hit = false;
            for amount in hits {
                pig.apply_damage(amount);
                if was_hit {
                    prop_assert!(pig.hit);
                }
                was_hit = pig.hit;
            }
            prop_assert_eq!(pig.hit, pig.health <= 0);
        }

        #[test]
        fn prop_target_damage_monotonic(
            initial in 1i32..200,
            hits in proptest::collection::vec(1i32..50, 0..20),
        ) {
            let mut pig = target(initial);
            let mut expected = initial;
            for amount in &hits {
                let before = pig.health;
                pig.apply_damage(*amount);
                prop_assert!(pig.health <= before);
                if expected > 0 {
                    expected -= amount;
                }
            }
            // Health freezes at the first value at or below zero
            prop_assert_eq!(pig.health, expected);
            prop_assert_eq!(pig.hit, expected <= 0);
        }
    }
}
