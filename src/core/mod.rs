// Core utilities: math helpers and plain geometry

pub mod geom;
pub mod math;
