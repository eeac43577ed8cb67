// World configuration

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::error::PhysicsError;
use super::flags::DirectionFlags;
use super::tree::MIN_MAX_ENTRIES;
use crate::core::geom::Rect;

/// Colours used by the debug overlay (0xRRGGBB)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugColors {
    pub body: u32,
    pub static_body: u32,
    pub velocity: u32,
    pub blocked: u32,
    pub world_blocked: u32,
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            body: 0xff00ff,
            static_body: 0x0000ff,
            velocity: 0x00ff00,
            blocked: 0xffff00,
            world_blocked: 0xff0000,
        }
    }
}

/// World options. Every field has a default, so a JSON document only needs
/// the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    pub gravity: Vec2,
    pub bounds: Rect,
    /// Which world edges block bodies
    pub check_collision: DirectionFlags,
    pub overlap_bias: f32,
    pub tile_bias: f32,
    /// Always separate on X before Y
    pub force_x: bool,
    pub is_paused: bool,
    pub debug: bool,
    pub debug_show_body: bool,
    pub debug_show_static_body: bool,
    pub debug_show_velocity: bool,
    pub debug_colors: DebugColors,
    /// Branching factor of both spatial indices
    pub max_entries: usize,
    /// Simulation delta is divided by this
    pub time_scale: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
            check_collision: DirectionFlags::ALL,
            overlap_bias: 4.0,
            tile_bias: 16.0,
            force_x: false,
            is_paused: false,
            debug: false,
            debug_show_body: true,
            debug_show_static_body: true,
            debug_show_velocity: true,
            debug_colors: DebugColors::default(),
            max_entries: 16,
            time_scale: 1.0,
        }
    }
}

impl WorldConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, PhysicsError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PhysicsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder-style gravity override
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.bounds = Rect::new(x, y, width, height);
        self
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }

        let b = &self.bounds;
        let finite =
            b.x.is_finite() && b.y.is_finite() && b.width.is_finite() && b.height.is_finite();
        if !finite || b.width < 0.0 || b.height < 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "bounds must be finite with non-negative size, got {:?}",
                b
            )));
        }

        if !self.overlap_bias.is_finite() || self.overlap_bias < 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "overlapBias must be finite and non-negative, got {}",
                self.overlap_bias
            )));
        }

        if !self.tile_bias.is_finite() || self.tile_bias < 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "tileBias must be finite and non-negative, got {}",
                self.tile_bias
            )));
        }

        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "timeScale must be positive, got {}",
                self.time_scale
            )));
        }

        Ok(())
    }

    /// Tree branching factor after applying the lower bound
    pub fn effective_max_entries(&self) -> usize {
        self.max_entries.max(MIN_MAX_ENTRIES)
    }
}
