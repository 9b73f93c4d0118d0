//! Fixed timestep round tick
//!
//! Per-tick order:
//! 1. Pause toggle
//! 2. Launch controller (pointer input)
//! 3. Physics step; contact-begin events are resolved while it runs
//! 4. Sync entity transforms from their bodies, then target fall damage
//! 5. Lifecycle sweep: decide removals, then detach and remove
//! 6. Aim preview for the selected projectile
//! 7. Win/loss check

use std::collections::BTreeMap;

use glam::Vec2;

use super::collision::resolve_contact;
use super::entities::{Aabb, EntityRef, Lifecycle};
use super::launch::SlingState;
use super::state::{Round, RoundPhase};
use super::trajectory::predict;
use crate::error::SimError;
use crate::physics::{BodyHandle, PhysicsError, PhysicsWorld};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Pointer position in world units while pressed, `None` when released
    pub pointer: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the round by one fixed timestep and report its phase
///
/// A physics error leaves the round unusable; start a new one.
pub fn tick<W: PhysicsWorld>(
    round: &mut Round<W>,
    input: &TickInput,
    dt: f32,
) -> Result<RoundPhase, SimError> {
    // Handle pause toggle
    if input.pause {
        match round.phase {
            RoundPhase::Playing => {
                log::info!("Round paused");
                round.phase = RoundPhase::Paused;
                return Ok(round.phase);
            }
            RoundPhase::Paused => {
                log::info!("Round resumed");
                round.phase = RoundPhase::Playing;
            }
            _ => {}
        }
    }

    if round.phase != RoundPhase::Playing {
        return Ok(round.phase);
    }

    // Input
    let launched = round.sling.update(
        input.pointer,
        &mut round.entities.projectiles,
        &mut round.world,
    )?;
    if launched.is_some() {
        round.launches += 1;
    }

    // Physics; contacts only mutate entity state
    {
        let Round {
            world,
            entities,
            owners,
            tuning,
            ..
        } = &mut *round;
        world.step(
            dt,
            tuning.velocity_iterations,
            tuning.position_iterations,
            &mut |event| {
                resolve_contact(&event, owners, entities);
            },
        )?;
    }

    // Sync visuals
    let world = &round.world;
    for bird in &mut round.entities.projectiles {
        bird.sync_from_body(world);
    }
    for block in &mut round.entities.obstacles {
        block.sync_from_body(world);
    }
    for pig in &mut round.entities.targets {
        pig.sync_from_body(world);
        pig.apply_fall_damage();
    }

    sweep(round, dt)?;

    // Aim preview
    round.trajectory = match round.sling.state() {
        SlingState::Aiming {
            projectile,
            power,
            angle_degrees,
        } => round.entities.projectile(projectile).map(|bird| {
            predict(
                bird.state.position,
                power,
                angle_degrees,
                round.tuning.gravity,
                round.tuning.trajectory_samples,
                round.tuning.trajectory_step,
            )
        }),
        _ => None,
    };

    round.time_ticks += 1;

    let phase = evaluate(round);
    if phase != round.phase {
        log::info!(
            "Round '{}' {:?} after {:.2}s: {} projectiles launched, {} targets left",
            round.level_name,
            phase,
            round.elapsed(),
            round.launches,
            round.targets_left()
        );
        round.phase = phase;
    }
    Ok(round.phase)
}

/// Terminal condition for the current entity sets
fn evaluate<W: PhysicsWorld>(round: &Round<W>) -> RoundPhase {
    if round.entities.targets.is_empty() {
        RoundPhase::Won
    } else if round.entities.projectiles.is_empty() && round.selected().is_none() {
        RoundPhase::Lost
    } else {
        RoundPhase::Playing
    }
}

/// Whether `position` sits on top of `footprint`, within `reach` of its top edge
fn rests_on(position: Vec2, footprint: &Aabb, reach: f32) -> bool {
    let above = position.y - footprint.max.y;
    (position.x - footprint.center().x).abs() < footprint.width() / 2.0 && above > 0.0 && above <= reach
}

/// Lifecycle sweep: one pass decides, a second pass removes
fn sweep<W: PhysicsWorld>(round: &mut Round<W>, dt: f32) -> Result<(), PhysicsError> {
    let kill_plane = round.tuning.kill_plane;
    let reach = round.tuning.support_reach;
    let selected = round.sling.selected();
    let entities = &mut round.entities;

    let mut footprints = Vec::new();
    let doomed_obstacles: Vec<u32> = entities
        .obstacles
        .iter_mut()
        .filter_map(|block| {
            let expired = block.ready_to_remove(dt);
            let fell = block.state.position.y < kill_plane;
            if expired || fell {
                footprints.push(block.bounds());
                Some(block.id)
            } else {
                None
            }
        })
        .collect();

    let doomed_targets: Vec<u32> = entities
        .targets
        .iter_mut()
        .filter_map(|pig| {
            let expired = pig.ready_to_remove(dt);
            let unsupported = footprints.iter().any(|f| rests_on(pig.state.position, f, reach));
            if unsupported && !expired {
                log::debug!("target {} lost its support", pig.id);
            }
            (expired || unsupported).then_some(pig.id)
        })
        .collect();

    // The projectile in the slingshot stays no matter what
    let doomed_projectiles: Vec<u32> = entities
        .projectiles
        .iter_mut()
        .filter(|bird| Some(bird.id) != selected)
        .filter_map(|bird| bird.ready_to_remove(dt).then_some(bird.id))
        .collect();

    let Round {
        world,
        entities,
        owners,
        ..
    } = round;
    remove_marked(&mut entities.obstacles, &doomed_obstacles, world, owners)?;
    remove_marked(&mut entities.targets, &doomed_targets, world, owners)?;
    remove_marked(&mut entities.projectiles, &doomed_projectiles, world, owners)?;
    Ok(())
}

/// Detach and drop every entity whose id is in `marked`, keeping the rest in order
fn remove_marked<E: Lifecycle, W: PhysicsWorld + ?Sized>(
    list: &mut Vec<E>,
    marked: &[u32],
    world: &mut W,
    owners: &mut BTreeMap<BodyHandle, EntityRef>,
) -> Result<(), PhysicsError> {
    if marked.is_empty() {
        return Ok(());
    }

    let (gone, kept): (Vec<E>, Vec<E>) = std::mem::take(list)
        .into_iter()
        .partition(|e| marked.contains(&e.id()));
    *list = kept;

    for mut entity in gone {
        if let Some(handle) = entity.body() {
            owners.remove(&handle);
        }
        entity.detach(world)?;
        log::debug!("{:?} {} removed", E::KIND, entity.id());
    }
    Ok(())
}
