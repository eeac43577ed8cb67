use glam::Vec2;
use std::collections::HashMap;

use super::body::{Body, BodyHandle};
use super::flags::{Axis, Facing};
use super::motion::StepContext;
use super::object::GameObjectId;
use super::tilemap::Tile;
use crate::core::geom::Rect;

/// Shape-aware intersection test.
///
/// Rectangles that only share an edge do not intersect; circles count contact
/// at exactly the summed radius. Degenerate or non-finite geometry never
/// intersects, so it cannot leak NaN into separation.
pub fn intersects(body1: &Body, body2: &Body) -> bool {
    if !body1.is_valid() || !body2.is_valid() {
        return false;
    }

    match (body1.is_circle(), body2.is_circle()) {
        (false, false) => body1.rect().intersects(&body2.rect()),
        (true, true) => {
            body1.center().distance(body2.center()) <= body1.radius() + body2.radius()
        }
        (true, false) => circle_rect_intersects(body1, body2),
        (false, true) => circle_rect_intersects(body2, body1),
    }
}

fn circle_rect_intersects(circle: &Body, rect: &Body) -> bool {
    let center = circle.center();
    let nearest = Vec2::new(
        center.x.clamp(rect.left(), rect.right()),
        center.y.clamp(rect.top(), rect.bottom()),
    );
    center.distance_squared(nearest) <= circle.radius() * circle.radius()
}

/// Category/mask filter: both bodies must accept each other
pub fn can_collide(body1: &Body, body2: &Body) -> bool {
    (body1.collision_mask & body2.collision_category) != 0
        && (body2.collision_mask & body1.collision_category) != 0
}

/// Geometric relationship between two bodies at one moment.
///
/// Overlaps are signed like the separation routines use them: positive
/// when body1 leads along the positive axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub intersects: bool,
    pub touching: bool,
    pub overlap_x: f32,
    pub overlap_y: f32,
    /// Face of body1 that leads the contact
    pub face: Facing,
    pub face_x: Facing,
    pub face_y: Facing,
    /// Displacement each body would take to separate along `face`
    pub share1: Vec2,
    pub share2: Vec2,
    pub embedded: bool,
}

impl CollisionInfo {
    fn empty(body1: BodyHandle, body2: BodyHandle) -> Self {
        Self {
            body1,
            body2,
            intersects: false,
            touching: false,
            overlap_x: 0.0,
            overlap_y: 0.0,
            face: Facing::None,
            face_x: Facing::None,
            face_y: Facing::None,
            share1: Vec2::ZERO,
            share2: Vec2::ZERO,
            embedded: false,
        }
    }

    /// Compute the record for a pair without mutating either body
    pub fn check(
        handles: (BodyHandle, BodyHandle),
        body1: &Body,
        body2: &Body,
        ctx: &StepContext,
    ) -> Self {
        let mut info = Self::empty(handles.0, handles.1);

        if body1.check_collision.none() || body2.check_collision.none() {
            return info;
        }
        if !body1.is_valid() || !body2.is_valid() {
            return info;
        }

        let (r1, r2) = (body1.rect(), body2.rect());
        info.intersects = intersects(body1, body2);
        info.touching = info.intersects || r1.touches(&r2);
        if !info.touching {
            return info;
        }

        let (p1, p2) = (body1.prev_rect(), body2.prev_rect());

        info.face_x = if p1.right() <= p2.left() {
            Facing::Right
        } else if p1.left() >= p2.right() {
            Facing::Left
        } else if r1.center().x <= r2.center().x {
            Facing::Right
        } else {
            Facing::Left
        };

        info.face_y = if p1.bottom() <= p2.top() {
            Facing::Down
        } else if p1.top() >= p2.bottom() {
            Facing::Up
        } else if r1.center().y <= r2.center().y {
            Facing::Down
        } else {
            Facing::Up
        };

        info.overlap_x = match info.face_x {
            Facing::Right => r1.right() - r2.left(),
            _ => r1.left() - r2.right(),
        };
        info.overlap_y = match info.face_y {
            Facing::Down => r1.bottom() - r2.top(),
            _ => r1.top() - r2.bottom(),
        };

        if !info.intersects {
            info.face = if r1.right() == r2.left() {
                Facing::Right
            } else if r1.left() == r2.right() {
                Facing::Left
            } else if r1.bottom() == r2.top() {
                Facing::Down
            } else if r1.top() == r2.bottom() {
                Facing::Up
            } else {
                Facing::None
            };
            info.overlap_x = 0.0;
            info.overlap_y = 0.0;
            return info;
        }

        let apart_x = p1.right() <= p2.left() || p1.left() >= p2.right();
        let apart_y = p1.bottom() <= p2.top() || p1.top() >= p2.bottom();

        info.face = match (apart_x, apart_y) {
            (true, false) => info.face_x,
            (false, true) => info.face_y,
            _ if info.overlap_x.abs() <= info.overlap_y.abs() => info.face_x,
            _ => info.face_y,
        };

        if let Some(axis) = info.face.axis() {
            let overlap = match axis {
                Axis::X => info.overlap_x,
                Axis::Y => info.overlap_y,
            };
            info.embedded = overlap.abs() > ctx.overlap_bias * 2.0;

            // body2 takes what it can of half the overlap, body1 the rest
            let half = overlap * 0.5;
            let (bounds, check) = (&ctx.bounds, &ctx.check_collision);
            let share2 = body2.get_share(axis, half, bounds, check);
            let share1 = body1.get_share(axis, -(overlap - share2), bounds, check);
            info.share1 = axis.vec(share1);
            info.share2 = axis.vec(share2);
        }

        info
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedInfo {
    info: CollisionInfo,
    rect1: Rect,
    rect2: Rect,
}

/// Per-step memo of pair records, keyed by the ordered pair.
///
/// Entries are recomputed whenever either body's rectangle changed since
/// they were stored, so the cache is never a second source of truth.
#[derive(Debug, Default)]
pub struct CollisionCache {
    entries: HashMap<(BodyHandle, BodyHandle), CachedInfo>,
}

impl CollisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_or_compute(
        &mut self,
        handles: (BodyHandle, BodyHandle),
        body1: &Body,
        body2: &Body,
        ctx: &StepContext,
    ) -> CollisionInfo {
        let (rect1, rect2) = (body1.rect(), body2.rect());

        if let Some(cached) = self.entries.get(&handles) {
            if cached.rect1 == rect1 && cached.rect2 == rect2 {
                return cached.info;
            }
        }

        let info = CollisionInfo::check(handles, body1, body2, ctx);
        self.entries.insert(handles, CachedInfo { info, rect1, rect2 });
        info
    }
}

/// Events raised by the world during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsEvent {
    /// Two bodies were separated by a collide check
    Collide {
        object1: Option<GameObjectId>,
        object2: Option<GameObjectId>,
        body1: BodyHandle,
        body2: BodyHandle,
    },

    /// Two bodies overlapped during an overlap check
    Overlap {
        object1: Option<GameObjectId>,
        object2: Option<GameObjectId>,
        body1: BodyHandle,
        body2: BodyHandle,
    },

    /// A body was separated from a tile
    TileCollide {
        object: Option<GameObjectId>,
        tile: Tile,
        body: BodyHandle,
    },

    /// A body overlapped a tile
    TileOverlap {
        object: Option<GameObjectId>,
        tile: Tile,
        body: BodyHandle,
    },

    /// A body hit the world bounds
    WorldBounds {
        body: BodyHandle,
        up: bool,
        down: bool,
        left: bool,
        right: bool,
    },

    /// A step finished; `delta` is in seconds
    WorldStep { delta: f32 },

    Pause,
    Resume,
}

/// Queue for storing physics events until the caller drains them
#[derive(Debug)]
pub struct EventQueue {
    events: Vec<PhysicsEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    /// Drop all queued events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events queued so far
    pub fn events(&self) -> &[PhysicsEvent] {
        &self.events
    }

    pub fn push(&mut self, event: PhysicsEvent) {
        self.events.push(event);
    }

    /// Take every queued event
    pub fn drain(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
