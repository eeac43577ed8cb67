// Boundary to the display objects that own physics bodies

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque id of a display object owned by the scene layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameObjectId(pub u64);

/// The parts of a display object's transform a body reads from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    /// Unscaled frame size
    pub width: f32,
    pub height: f32,
    /// Normalized origin, 0.5 is the center
    pub origin_x: f32,
    pub origin_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Radians
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            origin_x: 0.5,
            origin_y: 0.5,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    /// Centered transform of the given size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Same transform with a top-left origin
    pub fn with_origin(mut self, origin_x: f32, origin_y: f32) -> Self {
        self.origin_x = origin_x;
        self.origin_y = origin_y;
        self
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Displayed size (absolute, scale applied)
    pub fn display_size(&self) -> Vec2 {
        Vec2::new(
            (self.width * self.scale_x).abs(),
            (self.height * self.scale_y).abs(),
        )
    }

    /// Top-left of a body attached with `offset` (in unscaled frame space)
    pub fn body_position(&self, offset: Vec2) -> Vec2 {
        Vec2::new(
            self.x + self.scale_x * (offset.x - self.origin_x * self.width),
            self.y + self.scale_y * (offset.y - self.origin_y * self.height),
        )
    }
}

/// Write-back surface the world uses after a step to move owning objects
pub trait GameObjects {
    /// Move an object by the displacement its body made this frame
    fn translate(&mut self, id: GameObjectId, delta: Vec2);

    /// Rotate an object by its body's rotation change
    fn rotate(&mut self, _id: GameObjectId, _delta: f32) {}
}

/// Headless sink that drops every write-back
impl GameObjects for () {
    fn translate(&mut self, _id: GameObjectId, _delta: Vec2) {}
}

/// Simple transform store, handy for tools and tests
impl GameObjects for HashMap<GameObjectId, Transform> {
    fn translate(&mut self, id: GameObjectId, delta: Vec2) {
        if let Some(transform) = self.get_mut(&id) {
            transform.x += delta.x;
            transform.y += delta.y;
        }
    }

    fn rotate(&mut self, id: GameObjectId, delta: f32) {
        if let Some(transform) = self.get_mut(&id) {
            transform.rotation += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_position_centered_origin() {
        let transform = Transform::new(100.0, 50.0, 32.0, 16.0);
        assert_eq!(transform.body_position(Vec2::ZERO), Vec2::new(84.0, 42.0));
    }

    #[test]
    fn test_body_position_with_scale_and_offset() {
        let transform = Transform::new(0.0, 0.0, 10.0, 10.0)
            .with_origin(0.0, 0.0)
            .with_scale(2.0, 2.0);
        assert_eq!(transform.body_position(Vec2::new(1.0, 2.0)), Vec2::new(2.0, 4.0));
        assert_eq!(transform.display_size(), Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_map_write_back() {
        let id = GameObjectId(7);
        let mut objects = HashMap::new();
        objects.insert(id, Transform::new(0.0, 0.0, 8.0, 8.0));

        objects.translate(id, Vec2::new(3.0, -1.0));
        objects.rotate(id, 0.5);
        objects.translate(GameObjectId(99), Vec2::ONE);

        let transform = objects[&id];
        assert_eq!((transform.x, transform.y), (3.0, -1.0));
        assert_eq!(transform.rotation, 0.5);
        assert_eq!(objects.len(), 1);
    }
}
