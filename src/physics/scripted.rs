//! Scripted world for driving the round loop in tests
//!
//! Bodies move at whatever velocity they were given and never collide.
//! Contacts happen only when queued with [`ScriptedWorld::queue_contact`], so a
//! test decides exactly which hits occur and on which tick.

use glam::Vec2;

use super::{BodyDef, BodyHandle, BodyKind, BodyState, ContactEvent, ContactPhase, PhysicsError, PhysicsWorld};

#[derive(Debug, Clone)]
struct ScriptedBody {
    handle: BodyHandle,
    kind: BodyKind,
    state: BodyState,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedWorld {
    /// Sorted by handle (handles are allocated increasing)
    bodies: Vec<ScriptedBody>,
    queued: Vec<(BodyHandle, BodyHandle)>,
    next_handle: u32,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.index_of(handle).is_some()
    }

    /// Report a contact-begin between `a` and `b` during the next step
    pub fn queue_contact(&mut self, a: BodyHandle, b: BodyHandle) {
        self.queued.push((a, b));
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |b| b.handle).ok()
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut ScriptedBody, PhysicsError> {
        match self.index_of(handle) {
            Some(idx) => Ok(&mut self.bodies[idx]),
            None => Err(PhysicsError::UnknownBody(handle)),
        }
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        self.next_handle += 1;
        let handle = BodyHandle(self.next_handle);
        self.bodies.push(ScriptedBody {
            handle,
            kind: def.kind,
            state: BodyState {
                position: def.position,
                ..Default::default()
            },
        });
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let idx = self
            .index_of(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        self.bodies.remove(idx);
        self.queued.retain(|&(a, b)| a != handle && b != handle);
        Ok(())
    }

    fn step(
        &mut self,
        dt: f32,
        _velocity_iterations: u32,
        _position_iterations: u32,
        on_contact: &mut dyn FnMut(ContactEvent),
    ) -> Result<(), PhysicsError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PhysicsError::InvalidTimestep(dt));
        }

        for (a, b) in std::mem::take(&mut self.queued) {
            if let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) {
                on_contact(ContactEvent {
                    phase: ContactPhase::Begin,
                    a,
                    b,
                    velocity_a: self.bodies[ia].state.linear_velocity,
                    velocity_b: self.bodies[ib].state.linear_velocity,
                });
            }
        }

        for body in self.bodies.iter_mut().filter(|b| b.kind != BodyKind::Static) {
            body.state.position += body.state.linear_velocity * dt;
            body.state.angle += body.state.angular_velocity * dt;
        }
        Ok(())
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.index_of(handle).map(|idx| self.bodies[idx].state)
    }

    fn set_body_kind(&mut self, handle: BodyHandle, kind: BodyKind) -> Result<(), PhysicsError> {
        self.body_mut(handle)?.kind = kind;
        Ok(())
    }

    fn set_linear_velocity(
        &mut self,
        handle: BodyHandle,
        velocity: Vec2,
    ) -> Result<(), PhysicsError> {
        self.body_mut(handle)?.state.linear_velocity = velocity;
        Ok(())
    }

    fn set_transform(
        &mut self,
        handle: BodyHandle,
        position: Vec2,
        angle: f32,
    ) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        body.state.position = position;
        body.state.angle = angle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Shape;

    fn crate_at(world: &mut ScriptedWorld, pos: Vec2) -> BodyHandle {
        world.create_body(&BodyDef::new(
            BodyKind::Dynamic,
            pos,
            Shape::Box {
                half_extents: Vec2::splat(0.15),
            },
        ))
    }

    #[test]
    fn test_queued_contact_delivered_once() {
        let mut world = ScriptedWorld::new();
        let a = crate_at(&mut world, Vec2::new(0.0, 0.0));
        let b = crate_at(&mut world, Vec2::new(5.0, 0.0));
        world.set_linear_velocity(b, Vec2::new(3.0, 4.0)).unwrap();
        world.queue_contact(a, b);

        let mut events = Vec::new();
        for _ in 0..2 {
            world.step(1.0 / 60.0, 8, 3, &mut |e| events.push(e)).unwrap();
        }
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].a, events[0].b), (a, b));
        assert_eq!(events[0].velocity_b, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_overlap_alone_reports_nothing() {
        let mut world = ScriptedWorld::new();
        crate_at(&mut world, Vec2::ZERO);
        crate_at(&mut world, Vec2::new(0.1, 0.0));

        let mut count = 0;
        world.step(0.5, 8, 3, &mut |_| count += 1).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_bodies_move_at_set_velocity() {
        let mut world = ScriptedWorld::new();
        let body = crate_at(&mut world, Vec2::new(1.0, 1.0));
        world.set_linear_velocity(body, Vec2::new(2.0, 0.0)).unwrap();
        world.step(0.5, 8, 3, &mut |_| {}).unwrap();
        assert_eq!(world.position(body), Some(Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn test_destroyed_body_drops_queued_contacts() {
        let mut world = ScriptedWorld::new();
        let a = crate_at(&mut world, Vec2::ZERO);
        let b = crate_at(&mut world, Vec2::X);
        world.queue_contact(a, b);
        world.destroy_body(b).unwrap();
        assert_eq!(world.destroy_body(b), Err(PhysicsError::UnknownBody(b)));

        let mut count = 0;
        world.step(0.1, 8, 3, &mut |_| count += 1).unwrap();
        assert_eq!(count, 0);
        assert!(world.step(0.0, 8, 3, &mut |_| {}).is_err());
    }
}
