//! Rapier-backed world
//!
//! Wraps a `rapier2d` pipeline behind [`PhysicsWorld`]. Each rigid body
//! carries its [`BodyHandle`] in `user_data`, so collision events coming out of
//! the pipeline can be mapped back without a reverse lookup table.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use glam::Vec2;
use rapier2d::prelude::*;

use super::{
    BodyDef, BodyHandle, BodyKind, BodyState, ContactEvent, ContactPhase, PhysicsError,
    PhysicsWorld, Shape,
};

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn body_type(kind: BodyKind) -> RigidBodyType {
    match kind {
        BodyKind::Static => RigidBodyType::Fixed,
        BodyKind::Kinematic => RigidBodyType::KinematicVelocityBased,
        BodyKind::Dynamic => RigidBodyType::Dynamic,
    }
}

/// Collects collision events during a pipeline step
///
/// Velocities are read from the body set handed to the handler, which the
/// narrow phase calls before the solver runs.
#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<ContactEvent>>,
}

impl ContactCollector {
    fn endpoint(
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        collider: ColliderHandle,
    ) -> Option<(BodyHandle, Vec2)> {
        let parent = colliders.get(collider)?.parent()?;
        let body = bodies.get(parent)?;
        Some((BodyHandle(body.user_data as u32), to_vec2(body.linvel())))
    }

    fn drain(&mut self) -> Vec<ContactEvent> {
        std::mem::take(self.events.get_mut().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // Bodies removed this step can no longer be resolved; drop their events
        let (Some((a, velocity_a)), Some((b, velocity_b))) = (
            Self::endpoint(bodies, colliders, event.collider1()),
            Self::endpoint(bodies, colliders, event.collider2()),
        ) else {
            return;
        };
        let phase = if event.started() {
            ContactPhase::Begin
        } else {
            ContactPhase::End
        };

        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.push(ContactEvent {
            phase,
            a,
            b,
            velocity_a,
            velocity_b,
        });
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Rigid-body world driven by rapier
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: ContactCollector,
    handles: BTreeMap<BodyHandle, RigidBodyHandle>,
    next_handle: u32,
}

impl RapierWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: ContactCollector::default(),
            handles: BTreeMap::new(),
            next_handle: 1,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        to_vec2(&self.gravity)
    }

    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.handles.contains_key(&handle)
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.handles.get(&handle).and_then(|&h| self.bodies.get(h))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, PhysicsError> {
        self.handles
            .get(&handle)
            .and_then(|&h| self.bodies.get_mut(h))
            .ok_or(PhysicsError::UnknownBody(handle))
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -crate::consts::GRAVITY))
    }
}

impl fmt::Debug for RapierWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierWorld")
            .field("gravity", &self.gravity())
            .field("bodies", &self.handles.len())
            .finish()
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        let body = RigidBodyBuilder::new(body_type(def.kind))
            .translation(to_vector(def.position))
            .linear_damping(def.linear_damping)
            .ccd_enabled(def.kind == BodyKind::Dynamic)
            .user_data(handle.0 as u128)
            .build();
        let body_handle = self.bodies.insert(body);

        let collider = match def.shape {
            Shape::Box { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
            Shape::Circle { radius } => ColliderBuilder::ball(radius),
        }
        .density(def.density)
        .friction(def.friction)
        .restitution(def.restitution)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
        self.colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);

        self.handles.insert(handle, body_handle);
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let body_handle = self
            .handles
            .remove(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        self.bodies.remove(
            body_handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        Ok(())
    }

    fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        _position_iterations: u32,
        on_contact: &mut dyn FnMut(ContactEvent),
    ) -> Result<(), PhysicsError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PhysicsError::InvalidTimestep(dt));
        }

        self.integration_parameters.dt = dt;
        // Rapier's solver has no separate position pass; stabilization is internal
        if let Some(iterations) = NonZeroUsize::new(velocity_iterations as usize) {
            self.integration_parameters.num_solver_iterations = iterations;
        }

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &self.collector,
        );

        for event in self.collector.drain() {
            on_contact(event);
        }
        Ok(())
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.body(handle).map(|body| BodyState {
            position: to_vec2(body.translation()),
            angle: body.rotation().angle(),
            linear_velocity: to_vec2(body.linvel()),
            angular_velocity: body.angvel(),
        })
    }

    fn set_body_kind(&mut self, handle: BodyHandle, kind: BodyKind) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        body.set_body_type(body_type(kind), true);
        // A body taken over by the caller keeps no leftover spin
        if kind == BodyKind::Kinematic {
            body.set_angvel(0.0, true);
        }
        Ok(())
    }

    fn set_linear_velocity(
        &mut self,
        handle: BodyHandle,
        velocity: Vec2,
    ) -> Result<(), PhysicsError> {
        self.body_mut(handle)?.set_linvel(to_vector(velocity), true);
        Ok(())
    }

    fn set_transform(
        &mut self,
        handle: BodyHandle,
        position: Vec2,
        angle: f32,
    ) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        body.set_position(Isometry::new(to_vector(position), angle), true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn ground(world: &mut RapierWorld) -> BodyHandle {
        world.create_body(&BodyDef::new(
            BodyKind::Static,
            Vec2::new(6.0, 0.35),
            Shape::Box {
                half_extents: Vec2::new(6.0, 0.35),
            },
        ))
    }

    fn crate_at(world: &mut RapierWorld, pos: Vec2) -> BodyHandle {
        world.create_body(&BodyDef::new(
            BodyKind::Dynamic,
            pos,
            Shape::Box {
                half_extents: Vec2::splat(0.15),
            },
        ))
    }

    fn run(world: &mut RapierWorld, ticks: u32) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            world.step(DT, 8, 3, &mut |e| events.push(e)).unwrap();
        }
        events
    }

    #[test]
    fn test_body_falls_and_rests_on_ground() {
        let mut world = RapierWorld::default();
        let floor = ground(&mut world);
        let body = crate_at(&mut world, Vec2::new(3.0, 2.0));

        let events = run(&mut world, 180);

        let state = world.body_state(body).unwrap();
        assert!((state.position.y - 0.85).abs() < 0.02, "rests on ground: {}", state.position.y);
        assert!(state.linear_velocity.length() < 0.1);

        let first = events
            .iter()
            .find(|e| e.phase == ContactPhase::Begin)
            .unwrap();
        let pair = [first.a, first.b];
        assert!(pair.contains(&floor) && pair.contains(&body));
        // Impact velocity sampled before the solver ran
        let falling = if first.a == body { first.velocity_a } else { first.velocity_b };
        assert!(falling.y < -4.0, "impact velocity {:?}", falling);
    }

    #[test]
    fn test_struck_post_topples() {
        let mut world = RapierWorld::default();
        ground(&mut world);
        let post = world.create_body(
            &BodyDef::new(
                BodyKind::Dynamic,
                Vec2::new(5.0, 1.45),
                Shape::Box {
                    half_extents: Vec2::new(0.1, 0.75),
                },
            )
            .with_material(1.0, 0.8, 0.0),
        );
        let ball = crate_at(&mut world, Vec2::new(4.0, 2.0));

        // Let the post settle, then hit it near the top
        run(&mut world, 10);
        world.set_transform(ball, Vec2::new(4.5, 2.0), 0.0).unwrap();
        world.set_linear_velocity(ball, Vec2::new(10.0, 0.0)).unwrap();

        let mut max_spin: f32 = 0.0;
        for _ in 0..60 {
            run(&mut world, 1);
            max_spin = max_spin.max(world.angular_velocity(post).unwrap().abs());
        }
        assert!(max_spin > 0.1, "post never rotated: {}", max_spin);
        assert!(world.angle(post).unwrap().abs() > 0.05);
    }

    #[test]
    fn test_circle_rolls_on_ground() {
        let mut world = RapierWorld::default();
        ground(&mut world);
        let ball = world.create_body(&BodyDef::new(
            BodyKind::Dynamic,
            Vec2::new(3.0, 0.9),
            Shape::Circle { radius: 0.2 },
        ));
        world.set_linear_velocity(ball, Vec2::new(2.0, 0.0)).unwrap();

        run(&mut world, 30);
        // A rolling circle picks up spin from friction; a box would only slide
        assert!(world.angular_velocity(ball).unwrap().abs() > 0.5);
    }

    #[test]
    fn test_kinematic_body_ignores_gravity() {
        let mut world = RapierWorld::default();
        let body = crate_at(&mut world, Vec2::new(1.0, 3.0));
        world.set_body_kind(body, BodyKind::Kinematic).unwrap();

        run(&mut world, 30);
        let pos = world.position(body).unwrap();
        assert!((pos - Vec2::new(1.0, 3.0)).length() < 1e-4);

        world.set_body_kind(body, BodyKind::Dynamic).unwrap();
        run(&mut world, 30);
        assert!(world.position(body).unwrap().y < 3.0);
    }

    #[test]
    fn test_destroy_twice_is_error() {
        let mut world = RapierWorld::default();
        let body = crate_at(&mut world, Vec2::ZERO);
        assert!(world.destroy_body(body).is_ok());
        assert_eq!(world.destroy_body(body), Err(PhysicsError::UnknownBody(body)));
        assert!(world.body_state(body).is_none());
        assert_eq!(world.body_count(), 0);
        assert!(world.set_linear_velocity(body, Vec2::X).is_err());
    }

    #[test]
    fn test_step_rejects_bad_timestep() {
        let mut world = RapierWorld::default();
        assert_eq!(
            world.step(0.0, 8, 3, &mut |_| {}),
            Err(PhysicsError::InvalidTimestep(0.0))
        );
        assert!(world.step(f32::NAN, 8, 3, &mut |_| {}).is_err());
    }
}
