// Standing collision rules checked every step

use slotmap::new_key_type;
use std::fmt;

use super::body::BodyHandle;
use super::group::GroupHandle;
use super::object::GameObjectId;
use super::tilemap::{Tile, TileLayerHandle};
use super::world::World;

new_key_type! {
    /// Handle to a collider owned by a [`World`]
    pub struct ColliderHandle;
}

/// One operand of a collision check
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionTarget {
    Body(BodyHandle),
    /// Each element is checked in turn; used alone, every pair in the list
    Bodies(Vec<BodyHandle>),
    /// Used alone, every member against every other member
    Group(GroupHandle),
    TileLayer(TileLayerHandle),
}

impl CollisionTarget {
    pub fn is_tile_layer(&self) -> bool {
        matches!(self, CollisionTarget::TileLayer(_))
    }
}

impl From<BodyHandle> for CollisionTarget {
    fn from(body: BodyHandle) -> Self {
        CollisionTarget::Body(body)
    }
}

impl From<Vec<BodyHandle>> for CollisionTarget {
    fn from(bodies: Vec<BodyHandle>) -> Self {
        CollisionTarget::Bodies(bodies)
    }
}

impl From<&[BodyHandle]> for CollisionTarget {
    fn from(bodies: &[BodyHandle]) -> Self {
        CollisionTarget::Bodies(bodies.to_vec())
    }
}

impl From<GroupHandle> for CollisionTarget {
    fn from(group: GroupHandle) -> Self {
        CollisionTarget::Group(group)
    }
}

impl From<TileLayerHandle> for CollisionTarget {
    fn from(layer: TileLayerHandle) -> Self {
        CollisionTarget::TileLayer(layer)
    }
}

/// What callbacks are told about a pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    Bodies {
        body1: BodyHandle,
        body2: BodyHandle,
        object1: Option<GameObjectId>,
        object2: Option<GameObjectId>,
    },
    Tile {
        body: BodyHandle,
        object: Option<GameObjectId>,
        tile: Tile,
    },
}

impl Contact {
    /// The first body of the pair
    pub fn body(&self) -> BodyHandle {
        match self {
            Contact::Bodies { body1, .. } => *body1,
            Contact::Tile { body, .. } => *body,
        }
    }
}

/// Runs after a pair collided or overlapped
pub type CollideCallback = Box<dyn FnMut(&mut World, &Contact)>;

/// Runs before separation; returning false skips the pair
pub type ProcessCallback = Box<dyn FnMut(&mut World, &Contact) -> bool>;

/// Optional collide and process callbacks for a check
#[derive(Default)]
pub struct Callbacks {
    pub(crate) collide: Option<CollideCallback>,
    pub(crate) process: Option<ProcessCallback>,
}

impl Callbacks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on_collide(callback: impl FnMut(&mut World, &Contact) + 'static) -> Self {
        Self::default().with_collide(callback)
    }

    pub fn with_collide(mut self, callback: impl FnMut(&mut World, &Contact) + 'static) -> Self {
        self.collide = Some(Box::new(callback));
        self
    }

    pub fn with_process(
        mut self,
        callback: impl FnMut(&mut World, &Contact) -> bool + 'static,
    ) -> Self {
        self.process = Some(Box::new(callback));
        self
    }

    pub(crate) fn allow(&mut self, world: &mut World, contact: &Contact) -> bool {
        match self.process.as_mut() {
            Some(process) => process(world, contact),
            None => true,
        }
    }

    pub(crate) fn notify(&mut self, world: &mut World, contact: &Contact) {
        if let Some(collide) = self.collide.as_mut() {
            collide(world, contact);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("collide", &self.collide.is_some())
            .field("process", &self.process.is_some())
            .finish()
    }
}

/// A pair of operands the world checks every step until removed
#[derive(Debug)]
pub struct Collider {
    pub name: String,
    /// Inactive colliders stay registered but are skipped
    pub active: bool,
    pub(crate) overlap_only: bool,
    pub(crate) object1: CollisionTarget,
    pub(crate) object2: Option<CollisionTarget>,
    pub(crate) callbacks: Callbacks,
}

impl Collider {
    pub(crate) fn new(
        object1: CollisionTarget,
        object2: Option<CollisionTarget>,
        callbacks: Callbacks,
        overlap_only: bool,
    ) -> Self {
        Self {
            name: String::new(),
            active: true,
            overlap_only,
            object1,
            object2,
            callbacks,
        }
    }

    pub fn object1(&self) -> &CollisionTarget {
        &self.object1
    }

    pub fn object2(&self) -> Option<&CollisionTarget> {
        self.object2.as_ref()
    }

    pub fn overlap_only(&self) -> bool {
        self.overlap_only
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }
}
