//! Rigid-body world boundary
//!
//! The gameplay layer never integrates motion itself. It talks to a world
//! through [`PhysicsWorld`]: bodies are created from a [`BodyDef`], addressed by
//! opaque [`BodyHandle`]s, and contacts are reported through a callback handed
//! to each [`PhysicsWorld::step`] call.

pub mod rapier;
pub mod scripted;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use crate::error::PhysicsError;
pub use rapier::RapierWorld;
pub use scripted::ScriptedWorld;

/// Opaque handle to a body owned by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// How a body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves (ground, boundaries)
    Static,
    /// Moves only by its set velocity/transform, ignores gravity and contacts
    Kinematic,
    /// Fully simulated
    Dynamic,
}

/// Collision shape, centered on the body position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { half_extents: Vec2 },
    Circle { radius: f32 },
}

impl Shape {
    /// Axis-aligned half extents of the shape
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Box { half_extents } => half_extents,
            Shape::Circle { radius } => Vec2::splat(radius),
        }
    }

    pub fn area(&self) -> f32 {
        match *self {
            Shape::Box { half_extents } => 4.0 * half_extents.x * half_extents.y,
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
        }
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Velocity decay per second (0 = none)
    pub linear_damping: f32,
}

impl BodyDef {
    pub fn new(kind: BodyKind, position: Vec2, shape: Shape) -> Self {
        Self {
            kind,
            position,
            shape,
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            linear_damping: 0.0,
        }
    }

    /// Material parameters in one call (density, friction, restitution)
    pub fn with_material(mut self, density: f32, friction: f32, restitution: f32) -> Self {
        self.density = density;
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }
}

/// Snapshot of a body's motion
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec2,
    /// Rotation in radians
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    End,
}

/// A contact reported during a step
///
/// Velocities are sampled when the contact is detected, before the solver
/// resolves it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub velocity_a: Vec2,
    pub velocity_b: Vec2,
}

/// The rigid-body world as seen by the gameplay layer
pub trait PhysicsWorld {
    fn create_body(&mut self, def: &BodyDef) -> BodyHandle;

    /// Remove a body. Destroying an unknown or already-destroyed handle is an error.
    fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError>;

    /// Advance by `dt` seconds. Contact events are delivered synchronously
    /// through `on_contact` while the step runs; the callback must not expect
    /// to touch the world.
    fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        on_contact: &mut dyn FnMut(ContactEvent),
    ) -> Result<(), PhysicsError>;

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState>;

    fn set_body_kind(&mut self, handle: BodyHandle, kind: BodyKind) -> Result<(), PhysicsError>;

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2)
    -> Result<(), PhysicsError>;

    /// Teleport a body (position and rotation in radians)
    fn set_transform(
        &mut self,
        handle: BodyHandle,
        position: Vec2,
        angle: f32,
    ) -> Result<(), PhysicsError>;

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body_state(handle).map(|s| s.position)
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.body_state(handle).map(|s| s.angle)
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body_state(handle).map(|s| s.linear_velocity)
    }

    fn angular_velocity(&self, handle: BodyHandle) -> Option<f32> {
        self.body_state(handle).map(|s| s.angular_velocity)
    }
}
