//! Slingshot launch controller
//!
//! Pointer input drives a small state machine:
//! - `Idle`: nothing selected. Pointer-down on a waiting projectile selects it,
//!   snaps it to the anchor and makes its body kinematic.
//! - `Aiming`: pointer held. The projectile follows the pointer, clamped to
//!   `max_pullback` from the anchor; power and angle are recomputed each tick.
//! - `Released`: pointer lifted. The body is dynamic again and carries the
//!   launch velocity. Becomes `Idle` on the next update.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entities::{Lifecycle, Projectile};
use crate::physics::{BodyKind, PhysicsError, PhysicsWorld};
use crate::{degrees_of, direction_from_degrees};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlingState {
    Idle,
    Aiming {
        projectile: u32,
        power: f32,
        angle_degrees: f32,
    },
    Released {
        projectile: u32,
    },
}

/// Result of pulling the pouch toward a pointer position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pullback {
    /// Where the projectile sits (pointer, clamped to the pullback radius)
    pub position: Vec2,
    pub power: f32,
    pub angle_degrees: f32,
}

/// A completed launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub projectile: u32,
    pub velocity: Vec2,
    pub power: f32,
    pub angle_degrees: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slingshot {
    pub anchor: Vec2,
    pub max_pullback: f32,
    pub power_scale: f32,
    state: SlingState,
}

impl Slingshot {
    pub fn new(anchor: Vec2, max_pullback: f32, power_scale: f32) -> Self {
        Self {
            anchor,
            max_pullback,
            power_scale,
            state: SlingState::Idle,
        }
    }

    pub fn state(&self) -> SlingState {
        self.state
    }

    /// Projectile currently being aimed, if any
    pub fn selected(&self) -> Option<u32> {
        match self.state {
            SlingState::Aiming { projectile, .. } => Some(projectile),
            _ => None,
        }
    }

    /// Current (power, angle in degrees) while aiming
    pub fn aim(&self) -> Option<(f32, f32)> {
        match self.state {
            SlingState::Aiming {
                power,
                angle_degrees,
                ..
            } => Some((power, angle_degrees)),
            _ => None,
        }
    }

    /// Pullback geometry for a pointer position
    pub fn pullback(&self, pointer: Vec2) -> Pullback {
        let offset = pointer - self.anchor;
        let distance = offset.length();
        let position = if distance <= self.max_pullback {
            pointer
        } else {
            self.anchor + offset / distance * self.max_pullback
        };

        Pullback {
            position,
            power: distance.min(self.max_pullback) * self.power_scale,
            angle_degrees: degrees_of(self.anchor - position),
        }
    }

    /// Advance the state machine with this tick's pointer (`None` = not pressed)
    pub fn update<W: PhysicsWorld + ?Sized>(
        &mut self,
        pointer: Option<Vec2>,
        projectiles: &mut [Projectile],
        world: &mut W,
    ) -> Result<Option<Launch>, PhysicsError> {
        if let SlingState::Released { .. } = self.state {
            self.state = SlingState::Idle;
        }

        match (self.state, pointer) {
            (SlingState::Idle, Some(point)) => {
                self.select(point, projectiles, world)?;
                Ok(None)
            }
            (SlingState::Aiming { projectile, .. }, Some(point)) => {
                self.drag(projectile, point, projectiles, world)?;
                Ok(None)
            }
            (
                SlingState::Aiming {
                    projectile,
                    power,
                    angle_degrees,
                },
                None,
            ) => self.release(projectile, power, angle_degrees, projectiles, world),
            _ => Ok(None),
        }
    }

    fn select<W: PhysicsWorld + ?Sized>(
        &mut self,
        point: Vec2,
        projectiles: &mut [Projectile],
        world: &mut W,
    ) -> Result<(), PhysicsError> {
        let Some(bird) = projectiles
            .iter_mut()
            .find(|p| !p.launched && p.body().is_some() && p.bounds().contains(point))
        else {
            return Ok(());
        };
        let Some(handle) = bird.body() else {
            return Ok(());
        };

        world.set_transform(handle, self.anchor, 0.0)?;
        world.set_body_kind(handle, BodyKind::Kinematic)?;
        world.set_linear_velocity(handle, Vec2::ZERO)?;
        bird.state.position = self.anchor;
        bird.state.angle = 0.0;

        log::debug!("projectile {} selected", bird.id);
        self.state = SlingState::Aiming {
            projectile: bird.id,
            power: 0.0,
            angle_degrees: 0.0,
        };
        Ok(())
    }

    fn drag<W: PhysicsWorld + ?Sized>(
        &mut self,
        projectile: u32,
        point: Vec2,
        projectiles: &mut [Projectile],
        world: &mut W,
    ) -> Result<(), PhysicsError> {
        let Some((bird, handle)) = find_with_body(projectiles, projectile) else {
            self.state = SlingState::Idle;
            return Ok(());
        };

        let pull = self.pullback(point);
        world.set_transform(handle, pull.position, 0.0)?;
        bird.state.position = pull.position;

        self.state = SlingState::Aiming {
            projectile,
            power: pull.power,
            angle_degrees: pull.angle_degrees,
        };
        Ok(())
    }

    fn release<W: PhysicsWorld + ?Sized>(
        &mut self,
        projectile: u32,
        power: f32,
        angle_degrees: f32,
        projectiles: &mut [Projectile],
        world: &mut W,
    ) -> Result<Option<Launch>, PhysicsError> {
        let Some((bird, handle)) = find_with_body(projectiles, projectile) else {
            self.state = SlingState::Idle;
            return Ok(None);
        };

        let velocity = direction_from_degrees(angle_degrees) * power;
        world.set_body_kind(handle, BodyKind::Dynamic)?;
        world.set_linear_velocity(handle, velocity)?;
        bird.launched = true;
        bird.state.linear_velocity = velocity;

        log::debug!(
            "projectile {} launched: power {:.2}, angle {:.1}°",
            projectile,
            power,
            angle_degrees
        );
        self.state = SlingState::Released { projectile };
        Ok(Some(Launch {
            projectile,
            velocity,
            power,
            angle_degrees,
        }))
    }
}

fn find_with_body(
    projectiles: &mut [Projectile],
    id: u32,
) -> Option<(&mut Projectile, crate::physics::BodyHandle)> {
    let bird = projectiles.iter_mut().find(|p| p.id == id)?;
    let handle = bird.body()?;
    Some((bird, handle))
}
