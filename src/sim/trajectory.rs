//! Aim preview
//!
//! Closed-form ballistic path for a launch of given power and angle. No
//! world stepping: `x(t) = x0 + v·cosθ·t`, `y(t) = y0 + v·sinθ·t − ½gt²`,
//! sampled at fixed time intervals and cut off at the first sample below
//! the ground line (y < 0).

use std::iter::FusedIterator;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::direction_from_degrees;

/// A predicted flight path. Cheap to copy; iterate it as often as needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub origin: Vec2,
    /// Initial velocity (power along the launch angle)
    pub velocity: Vec2,
    /// Downward acceleration magnitude
    pub gravity: f32,
    pub sample_count: usize,
    pub time_step: f32,
}

/// Build the trajectory for a launch at `power` along `angle_degrees`
pub fn predict(
    origin: Vec2,
    power: f32,
    angle_degrees: f32,
    gravity: f32,
    sample_count: usize,
    time_step: f32,
) -> Trajectory {
    Trajectory {
        origin,
        velocity: direction_from_degrees(angle_degrees) * power,
        gravity,
        sample_count,
        time_step,
    }
}

impl Trajectory {
    /// Position at time `t` (ignores the ground cut-off)
    pub fn position_at(&self, t: f32) -> Vec2 {
        Vec2::new(
            self.origin.x + self.velocity.x * t,
            self.origin.y + self.velocity.y * t - 0.5 * self.gravity * t * t,
        )
    }

    /// Fresh iterator over the sampled points
    pub fn points(&self) -> TrajectoryPoints {
        TrajectoryPoints {
            path: *self,
            index: 0,
            grounded: false,
        }
    }

    /// Shortest distance from `point` to any sampled point
    pub fn closest_approach(&self, point: Vec2) -> Option<f32> {
        self.points()
            .map(|p| p.distance(point))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl IntoIterator for Trajectory {
    type Item = Vec2;
    type IntoIter = TrajectoryPoints;

    fn into_iter(self) -> Self::IntoIter {
        self.points()
    }
}

impl IntoIterator for &Trajectory {
    type Item = Vec2;
    type IntoIter = TrajectoryPoints;

    fn into_iter(self) -> Self::IntoIter {
        self.points()
    }
}

/// Lazily computed samples of a [`Trajectory`]
#[derive(Debug, Clone)]
pub struct TrajectoryPoints {
    path: Trajectory,
    index: usize,
    grounded: bool,
}

impl Iterator for TrajectoryPoints {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        if self.grounded || self.index >= self.path.sample_count {
            return None;
        }
        let t = self.index as f32 * self.path.time_step;
        let point = self.path.position_at(t);
        if point.y < 0.0 {
            self.grounded = true;
            return None;
        }
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.grounded {
            (0, Some(0))
        } else {
            (0, Some(self.path.sample_count - self.index))
        }
    }
}

impl FusedIterator for TrajectoryPoints {}
