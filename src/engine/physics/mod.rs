// Arcade physics: axis-aligned boxes and circles, separated per axis

pub mod body;
mod circle;
mod collider;
mod collision;
mod config;
mod debug;
mod dispatch;
mod error;
mod flags;
mod group;
pub mod motion;
mod object;
mod process_queue;
mod separate;
mod static_body;
pub mod tilemap;
pub mod tree;
mod world;

pub use body::{presets, Body, BodyBuilder, BodyHandle, BodyKind, FrameMotion};
pub use collider::{
    Callbacks, CollideCallback, Collider, ColliderHandle, CollisionTarget, Contact,
    ProcessCallback,
};
pub use collision::{can_collide, intersects, CollisionInfo, EventQueue, PhysicsEvent};
pub use config::{DebugColors, WorldConfig};
pub use debug::{DebugRenderer, DebugVertex};
pub use error::PhysicsError;
pub use flags::{Axis, DirectionFlags, Facing};
pub use group::{Group, GroupHandle};
pub use motion::StepContext;
pub use object::{GameObjectId, GameObjects, Transform};
pub use process_queue::ProcessQueue;
pub use static_body::StaticBodyMut;
pub use tilemap::{GridLayer, Tile, TileLayer, TileLayerHandle, EMPTY_TILE};
pub use tree::{Aabb, RTree};
pub use world::{World, SINGLE_STEP_MS};
