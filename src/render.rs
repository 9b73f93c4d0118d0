//! Draw-list boundary
//!
//! The simulation does not draw. It describes each frame as textured quads
//! plus an optional polyline (the aim preview) and hands them to a [`Canvas`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::entities::Material;

/// Which texture a quad uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    Projectile,
    Obstacle(Material),
    Target,
    Slingshot,
}

/// A textured quad at a transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteInstance {
    pub kind: SpriteKind,
    pub center: Vec2,
    pub rotation_degrees: f32,
    pub size: Vec2,
}

impl SpriteInstance {
    /// Bottom-left corner, the anchor most sprite batches position by
    pub fn corner(&self) -> Vec2 {
        self.center - self.size / 2.0
    }

    /// Axis-aligned containment test (ignores rotation)
    pub fn contains(&self, point: Vec2) -> bool {
        let min = self.corner();
        let max = min + self.size;
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}

/// Something that can present a frame
pub trait Canvas {
    fn draw_sprite(&mut self, sprite: &SpriteInstance);
    fn draw_path(&mut self, points: &[Vec2]);
}

/// Canvas that keeps the last frame in memory
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    pub sprites: Vec<SpriteInstance>,
    pub path: Vec<Vec2>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
        self.path.clear();
    }

    /// Number of recorded sprites of the given kind
    pub fn count(&self, kind: SpriteKind) -> usize {
        self.sprites.iter().filter(|s| s.kind == kind).count()
    }
}

impl Canvas for FrameRecorder {
    fn draw_sprite(&mut self, sprite: &SpriteInstance) {
        self.sprites.push(*sprite);
    }

    fn draw_path(&mut self, points: &[Vec2]) {
        self.path.extend_from_slice(points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_contains_uses_corner() {
        let sprite = SpriteInstance {
            kind: SpriteKind::Projectile,
            center: Vec2::new(1.0, 1.0),
            rotation_degrees: 0.0,
            size: Vec2::splat(0.5),
        };
        assert_eq!(sprite.corner(), Vec2::new(0.75, 0.75));
        assert!(sprite.contains(Vec2::new(1.2, 0.8)));
        assert!(!sprite.contains(Vec2::new(1.3, 1.0)));
    }
}
