// Directional collision flags, facing and axis selectors

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Per-direction flag record used for touching, blocked and collision checks.
/// `none()` is derived, so it can never disagree with the four sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionFlags {
    /// All four sides set
    pub const ALL: Self = Self {
        up: true,
        down: true,
        left: true,
        right: true,
    };

    /// No side set
    pub const NONE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    pub fn new(up: bool, down: bool, left: bool, right: bool) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    /// True when no side is set
    pub fn none(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }

    pub fn any(&self) -> bool {
        !self.none()
    }

    pub fn clear(&mut self) {
        *self = Self::NONE;
    }

    pub fn set_all(&mut self, value: bool) {
        *self = Self::new(value, value, value, value);
    }

    /// Set the flag for a single facing; `Facing::None` is ignored
    pub fn set(&mut self, facing: Facing) {
        match facing {
            Facing::Up => self.up = true,
            Facing::Down => self.down = true,
            Facing::Left => self.left = true,
            Facing::Right => self.right = true,
            Facing::None => {}
        }
    }

    pub fn get(&self, facing: Facing) -> bool {
        match facing {
            Facing::Up => self.up,
            Facing::Down => self.down,
            Facing::Left => self.left,
            Facing::Right => self.right,
            Facing::None => self.none(),
        }
    }

    /// Negative side of the axis (left or up)
    pub fn min_side(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.left,
            Axis::Y => self.up,
        }
    }

    /// Positive side of the axis (right or down)
    pub fn max_side(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.right,
            Axis::Y => self.down,
        }
    }

    pub fn set_min_side(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.left = true,
            Axis::Y => self.up = true,
        }
    }

    pub fn set_max_side(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.right = true,
            Axis::Y => self.down = true,
        }
    }
}

/// Which face of a body leads a contact, or which way it last moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    pub fn opposite(self) -> Self {
        match self {
            Facing::Up => Facing::Down,
            Facing::Down => Facing::Up,
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
            Facing::None => Facing::None,
        }
    }

    /// Axis the face lies on, `None` for `Facing::None`
    pub fn axis(self) -> Option<Axis> {
        match self {
            Facing::Left | Facing::Right => Some(Axis::X),
            Facing::Up | Facing::Down => Some(Axis::Y),
            Facing::None => None,
        }
    }
}

/// Separation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Component of `v` along this axis
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// Overwrite the component of `v` along this axis
    pub fn set(self, v: &mut Vec2, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
    }

    /// Unit vector along this axis scaled by `value`
    pub fn vec(self, value: f32) -> Vec2 {
        match self {
            Axis::X => Vec2::new(value, 0.0),
            Axis::Y => Vec2::new(0.0, value),
        }
    }

    /// Facing on the negative side of the axis
    pub fn min_facing(self) -> Facing {
        match self {
            Axis::X => Facing::Left,
            Axis::Y => Facing::Up,
        }
    }

    /// Facing on the positive side of the axis
    pub fn max_facing(self) -> Facing {
        match self {
            Axis::X => Facing::Right,
            Axis::Y => Facing::Down,
        }
    }
}
