// Engine modules: frame timing and physics

pub mod game_loop;
pub mod physics;
