// Arcade physics library: bodies, colliders and the world that steps them

pub mod core;
pub mod engine;

pub use engine::game_loop::{FrameTime, GameLoop};
pub use engine::physics::*;
