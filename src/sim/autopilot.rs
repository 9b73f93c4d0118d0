//! Idle/demo mode - a scripted player
//!
//! Picks the next waiting projectile, scores a handful of candidate launch
//! angles against the live targets with the aim preview, and plays the best
//! one as grab → pull → release pointer input. Seeded, so a given seed plays
//! a level the same way every time.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Round, RoundPhase};
use super::tick::TickInput;
use super::trajectory::predict;
use crate::direction_from_degrees;
use crate::physics::PhysicsWorld;
use crate::tuning::Tuning;

/// Launch angles considered (degrees above +x)
const MIN_ANGLE: f32 = 5.0;
const MAX_ANGLE: f32 = 75.0;

/// A planned launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub angle_degrees: f32,
    pub power: f32,
    /// Closest the predicted path gets to any target
    pub miss_distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    /// Grab happened this tick; drag to the aim point next
    Pull,
    Release,
}

#[derive(Debug, Clone, Copy)]
struct Plan {
    projectile: u32,
    /// Pointer offset from the anchor while pulling
    pull: Vec2,
    stage: Stage,
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    plan: Option<Plan>,
    /// Candidate shots scored per launch
    pub candidates: usize,
    /// Ticks to wait after a release before grabbing the next projectile
    pub settle_ticks: u32,
    wait: u32,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            plan: None,
            candidates: 32,
            settle_ticks: 150,
            wait: 0,
        }
    }

    /// Best of `self.candidates` shots from `origin` at `targets`
    ///
    /// Angles are stratified across the allowed range with a random jitter
    /// inside each stratum; power is drawn from the top of the range.
    pub fn choose_shot(
        &mut self,
        origin: Vec2,
        targets: &[Vec2],
        max_power: f32,
        tuning: &Tuning,
    ) -> Option<Shot> {
        if targets.is_empty() || self.candidates == 0 {
            return None;
        }

        let span = (MAX_ANGLE - MIN_ANGLE) / self.candidates as f32;
        let mut best: Option<Shot> = None;
        for i in 0..self.candidates {
            let angle_degrees = MIN_ANGLE + span * (i as f32 + self.rng.random::<f32>());
            let power = max_power * self.rng.random_range(0.8..=1.0);
            let path = predict(
                origin,
                power,
                angle_degrees,
                tuning.gravity,
                tuning.trajectory_samples,
                tuning.trajectory_step,
            );
            let miss_distance = targets
                .iter()
                .filter_map(|&t| path.closest_approach(t))
                .fold(f32::INFINITY, f32::min);

            if best.is_none_or(|b| miss_distance < b.miss_distance) {
                best = Some(Shot {
                    angle_degrees,
                    power,
                    miss_distance,
                });
            }
        }
        best
    }

    /// Pointer input for the next tick
    pub fn next_input<W: PhysicsWorld>(&mut self, round: &Round<W>) -> TickInput {
        if round.phase != RoundPhase::Playing {
            return TickInput::default();
        }
        if self.wait > 0 {
            self.wait -= 1;
            return TickInput::default();
        }

        let Some(plan) = self.plan else {
            return self.start_plan(round);
        };

        match plan.stage {
            Stage::Pull if round.selected() != Some(plan.projectile) => {
                // Grab missed; start over next tick
                self.plan = None;
                TickInput::default()
            }
            Stage::Pull => {
                self.plan = Some(Plan {
                    stage: Stage::Release,
                    ..plan
                });
                TickInput {
                    pointer: Some(round.sling.anchor + plan.pull),
                    ..Default::default()
                }
            }
            Stage::Release => {
                self.plan = None;
                self.wait = self.settle_ticks;
                TickInput::default()
            }
        }
    }

    fn start_plan<W: PhysicsWorld>(&mut self, round: &Round<W>) -> TickInput {
        let Some(bird) = round.entities.projectiles.iter().find(|p| !p.launched) else {
            return TickInput::default();
        };

        let sling = &round.sling;
        let targets: Vec<Vec2> = round.entities.targets.iter().map(|p| p.state.position).collect();
        let max_power = sling.max_pullback * sling.power_scale;
        let Some(shot) = self.choose_shot(sling.anchor, &targets, max_power, &round.tuning) else {
            return TickInput::default();
        };

        log::debug!(
            "autopilot: projectile {} at {:.1}° power {:.2} (miss {:.2})",
            bird.id,
            shot.angle_degrees,
            shot.power,
            shot.miss_distance
        );

        // Pull opposite to the launch direction
        let pull = -direction_from_degrees(shot.angle_degrees) * (shot.power / sling.power_scale);
        self.plan = Some(Plan {
            projectile: bird.id,
            pull,
            stage: Stage::Pull,
        });
        TickInput {
            pointer: Some(bird.state.position),
            ..Default::default()
        }
    }
}
