//! Contact rules
//!
//! Turns physics contact-begin events into damage. Classification is by the
//! kind pair of the two bodies' owners and does not depend on which body the
//! world reported first. Rules only mutate entity state; bodies are never
//! destroyed here because the world is still mid-step.

use std::collections::BTreeMap;

use super::entities::{EntityKind, EntityRef, Lifecycle};
use super::state::EntitySet;
use crate::consts::PROJECTILE_HIT_DAMAGE;
use crate::physics::{BodyHandle, ContactEvent, ContactPhase};

/// A matched contact rule, carrying the entity ids it applies to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactRule {
    /// Projectile hit a target: fixed damage to the target
    StrikeTarget { projectile: u32, target: u32 },
    /// Projectile hit an obstacle: fixed damage to the obstacle
    StrikeObstacle { projectile: u32, obstacle: u32 },
    /// Obstacle ran into a target: damage scaled by the obstacle's speed
    Crush {
        obstacle: u32,
        target: u32,
        impact_force: f32,
    },
}

/// Match a contact between two (possibly untagged) bodies to a rule
///
/// `speed_a`/`speed_b` are the linear speeds of `a` and `b` when the contact
/// began. Untagged bodies (ground, walls) never match.
pub fn classify(
    a: Option<EntityRef>,
    b: Option<EntityRef>,
    speed_a: f32,
    speed_b: f32,
) -> Option<ContactRule> {
    use EntityKind::*;

    let (a, b) = (a?, b?);
    match (a.kind, b.kind) {
        (Projectile, Target) => Some(ContactRule::StrikeTarget {
            projectile: a.id,
            target: b.id,
        }),
        (Target, Projectile) => Some(ContactRule::StrikeTarget {
            projectile: b.id,
            target: a.id,
        }),
        (Projectile, Obstacle) => Some(ContactRule::StrikeObstacle {
            projectile: a.id,
            obstacle: b.id,
        }),
        (Obstacle, Projectile) => Some(ContactRule::StrikeObstacle {
            projectile: b.id,
            obstacle: a.id,
        }),
        (Obstacle, Target) => Some(ContactRule::Crush {
            obstacle: a.id,
            target: b.id,
            impact_force: speed_a,
        }),
        (Target, Obstacle) => Some(ContactRule::Crush {
            obstacle: b.id,
            target: a.id,
            impact_force: speed_b,
        }),
        (Projectile, Projectile) | (Obstacle, Obstacle) | (Target, Target) => None,
    }
}

/// Apply a matched rule to the live entities
pub fn apply_rule(rule: &ContactRule, entities: &mut EntitySet) {
    match *rule {
        ContactRule::StrikeTarget { projectile, target } => {
            if let Some(pig) = entities.target_mut(target) {
                pig.apply_damage(PROJECTILE_HIT_DAMAGE);
            }
            if let Some(bird) = entities.projectile_mut(projectile) {
                bird.mark_collided();
            }
        }
        ContactRule::StrikeObstacle {
            projectile,
            obstacle,
        } => {
            if let Some(block) = entities.obstacle_mut(obstacle) {
                block.apply_damage(PROJECTILE_HIT_DAMAGE);
            }
            if let Some(bird) = entities.projectile_mut(projectile) {
                bird.mark_collided();
            }
        }
        ContactRule::Crush {
            target,
            impact_force,
            ..
        } => {
            if let Some(pig) = entities.target_mut(target) {
                pig.apply_impact(impact_force);
            }
        }
    }
}

/// Handle one contact event from the world: look up the owners of both
/// bodies, classify, and apply. Returns the rule that fired, if any.
pub fn resolve_contact(
    event: &ContactEvent,
    owners: &BTreeMap<BodyHandle, EntityRef>,
    entities: &mut EntitySet,
) -> Option<ContactRule> {
    if event.phase != ContactPhase::Begin {
        return None;
    }

    let rule = classify(
        owners.get(&event.a).copied(),
        owners.get(&event.b).copied(),
        event.velocity_a.length(),
        event.velocity_b.length(),
    )?;
    apply_rule(&rule, entities);
    log::debug!("contact {:?} <-> {:?}: {:?}", event.a, event.b, rule);
    Some(rule)
}
