use glam::Vec2;
use slotmap::new_key_type;

use super::flags::{Axis, DirectionFlags, Facing};
use super::motion::{self, StepContext};
use super::object::{GameObjectId, Transform};
use super::tree::Aabb;
use crate::core::geom::Rect;

/// Whether a body is simulated or fixed in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyKind {
    /// Integrated every step, reindexed in bulk
    Dynamic,
    /// Never moves by itself, reindexed eagerly when edited
    Static,
}

new_key_type! {
    /// Slot of a body inside one of the world's body maps
    pub(crate) struct BodyKey;
}

/// Handle to a body owned by a [`World`](super::World)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    pub(crate) key: BodyKey,
    pub(crate) kind: BodyKind,
}

impl BodyHandle {
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }
}

/// Default velocity clamp per axis
pub const DEFAULT_MAX_VELOCITY: f32 = 10_000.0;

/// Default angular velocity clamp (degrees per second)
pub const DEFAULT_MAX_ANGULAR: f32 = 1000.0;

/// Mass used in place of non-positive values
pub const MIN_MASS: f32 = 0.1;

/// Motion a body made during the last frame, for syncing its owner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameMotion {
    pub delta: Vec2,
    pub rotation: f32,
}

/// Physics body: an axis-aligned rectangle or a circle
#[derive(Debug, Clone)]
pub struct Body {
    kind: BodyKind,

    /// Owning display object, `None` for a free-floating volume
    pub game_object: Option<GameObjectId>,

    /// Participates in simulation and collision
    pub enable: bool,

    /// Top-left corner
    pub position: Vec2,
    pub(crate) prev: Vec2,
    pub(crate) prev_frame: Vec2,
    pub offset: Vec2,

    width: f32,
    height: f32,
    radius: f32,
    is_circle: bool,

    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub drag: Vec2,
    pub gravity: Vec2,
    pub bounce: Vec2,
    pub world_bounce: Option<Vec2>,
    pub max_velocity: Vec2,
    pub max_speed: Option<f32>,
    pub friction: Vec2,
    pub slide_factor: Vec2,
    pub use_damping: bool,
    pub allow_drag: bool,
    pub allow_gravity: bool,
    pub allow_rotation: bool,

    pub rotation: f32,
    pub(crate) pre_rotation: f32,
    pub angular_velocity: f32,
    pub angular_acceleration: f32,
    pub angular_drag: f32,
    pub max_angular: f32,

    mass: f32,
    pub immovable: bool,
    pub pushable: bool,
    pub moves: bool,

    pub collide_world_bounds: bool,
    /// Replaces the world bounds for this body's boundary checks
    pub custom_bounds: Option<Rect>,
    pub on_collide: bool,
    pub on_overlap: bool,
    pub on_world_bounds: bool,

    pub check_collision: DirectionFlags,
    pub touching: DirectionFlags,
    pub was_touching: DirectionFlags,
    pub blocked: DirectionFlags,
    pub world_blocked: DirectionFlags,
    pub hard_blocked: DirectionFlags,

    pub overlap_x: f32,
    pub overlap_y: f32,
    pub overlap_r: f32,
    pub embedded: bool,
    pub custom_separate_x: bool,
    pub custom_separate_y: bool,

    /// Per-frame displacement cap applied when syncing the owner, 0 = off
    pub delta_max: Vec2,
    pub facing: Facing,
    pub speed: f32,
    pub angle: f32,

    dx: f32,
    dy: f32,
    tx: f32,
    ty: f32,

    pub collision_category: u32,
    pub collision_mask: u32,

    pub debug_show_body: bool,
    pub debug_show_velocity: bool,
    pub debug_body_color: Option<u32>,

    /// Box the body is currently indexed under in the static tree
    pub(crate) indexed: Option<Aabb>,
}

impl Body {
    fn new(kind: BodyKind, position: Vec2, width: f32, height: f32) -> Self {
        let is_static = kind == BodyKind::Static;
        Self {
            kind,
            game_object: None,
            enable: true,
            position,
            prev: position,
            prev_frame: position,
            offset: Vec2::ZERO,
            width,
            height,
            radius: 0.0,
            is_circle: false,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: Vec2::ZERO,
            gravity: Vec2::ZERO,
            bounce: Vec2::ZERO,
            world_bounce: None,
            max_velocity: Vec2::splat(DEFAULT_MAX_VELOCITY),
            max_speed: None,
            friction: Vec2::new(1.0, 0.0),
            slide_factor: Vec2::ONE,
            use_damping: false,
            allow_drag: true,
            allow_gravity: !is_static,
            allow_rotation: true,
            rotation: 0.0,
            pre_rotation: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            angular_drag: 0.0,
            max_angular: DEFAULT_MAX_ANGULAR,
            mass: 1.0,
            immovable: is_static,
            pushable: !is_static,
            moves: !is_static,
            collide_world_bounds: false,
            custom_bounds: None,
            on_collide: false,
            on_overlap: false,
            on_world_bounds: false,
            check_collision: DirectionFlags::ALL,
            touching: DirectionFlags::NONE,
            was_touching: DirectionFlags::NONE,
            blocked: DirectionFlags::NONE,
            world_blocked: DirectionFlags::NONE,
            hard_blocked: DirectionFlags::NONE,
            overlap_x: 0.0,
            overlap_y: 0.0,
            overlap_r: 0.0,
            embedded: false,
            custom_separate_x: false,
            custom_separate_y: false,
            delta_max: Vec2::ZERO,
            facing: Facing::None,
            speed: 0.0,
            angle: 0.0,
            dx: 0.0,
            dy: 0.0,
            tx: 0.0,
            ty: 0.0,
            collision_category: 1,
            collision_mask: 1,
            debug_show_body: true,
            debug_show_velocity: !is_static,
            debug_body_color: None,
            indexed: None,
        }
    }

    /// Size and place a body from its owner's transform
    pub fn from_transform(kind: BodyKind, id: GameObjectId, transform: &Transform) -> Self {
        let size = transform.display_size();
        let mut body = Self::new(kind, transform.body_position(Vec2::ZERO), size.x, size.y);
        body.game_object = Some(id);
        body.rotation = transform.rotation;
        body.pre_rotation = transform.rotation;
        body
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    /// Radius for circular bodies, 0 for rectangles
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_circle(&self) -> bool {
        self.is_circle
    }

    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.half_width(), self.half_height())
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.position.y
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.height
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    /// Rectangle at the start of the current step
    pub fn prev_rect(&self) -> Rect {
        Rect::new(self.prev.x, self.prev.y, self.width, self.height)
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_rect(&self.rect())
    }

    /// Finite position with a positive, finite size
    pub fn is_valid(&self) -> bool {
        self.rect().is_valid()
    }

    pub fn previous_position(&self) -> Vec2 {
        self.prev
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the mass; non-positive values fall back to [`MIN_MASS`]
    pub fn set_mass(&mut self, mass: f32) -> &mut Self {
        self.mass = if mass > 0.0 && mass.is_finite() {
            mass
        } else {
            MIN_MASS
        };
        self
    }

    /// Resize as a rectangle
    pub fn set_size(&mut self, width: f32, height: f32) -> &mut Self {
        self.width = width;
        self.height = height;
        self.radius = 0.0;
        self.is_circle = false;
        self
    }

    /// Turn into a circle of the given radius, keeping the top-left corner
    pub fn set_circle(&mut self, radius: f32) -> &mut Self {
        if radius > 0.0 {
            self.radius = radius;
            self.width = radius * 2.0;
            self.height = radius * 2.0;
            self.is_circle = true;
        } else {
            self.is_circle = false;
            self.radius = 0.0;
        }
        self
    }

    /// Move the body relative to its owner, keeping the owner in place
    pub fn set_offset(&mut self, x: f32, y: f32) -> &mut Self {
        let shift = Vec2::new(x, y) - self.offset;
        self.offset = Vec2::new(x, y);
        self.position += shift;
        self.prev += shift;
        self.prev_frame += shift;
        self
    }

    pub fn set_velocity(&mut self, x: f32, y: f32) -> &mut Self {
        self.velocity = Vec2::new(x, y);
        self.speed = self.velocity.length();
        self
    }

    pub fn set_bounce(&mut self, x: f32, y: f32) -> &mut Self {
        self.bounce = Vec2::new(x, y);
        self
    }

    pub fn set_drag(&mut self, x: f32, y: f32) -> &mut Self {
        self.drag = Vec2::new(x, y);
        self
    }

    /// Per-body gravity, added to the world's
    pub fn set_gravity(&mut self, x: f32, y: f32) -> &mut Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    /// Static bodies stay immovable whatever is passed here
    pub fn set_immovable(&mut self, value: bool) -> &mut Self {
        self.immovable = value || self.is_static();
        self
    }

    /// Collide with the world bounds, optionally with a dedicated bounce
    pub fn set_collide_world_bounds(
        &mut self,
        value: bool,
        world_bounce: Option<Vec2>,
        on_world_bounds: Option<bool>,
    ) -> &mut Self {
        self.collide_world_bounds = value;
        if world_bounce.is_some() {
            self.world_bounce = world_bounce;
        }
        if let Some(emit) = on_world_bounds {
            self.on_world_bounds = emit;
        }
        self
    }

    /// Disable collision on every face
    pub fn set_check_collision_none(&mut self) -> &mut Self {
        self.check_collision = DirectionFlags::NONE;
        self
    }

    pub fn set_check_collision_all(&mut self) -> &mut Self {
        self.check_collision = DirectionFlags::ALL;
        self
    }

    /// Re-read position and size from the owner's transform
    pub fn update_from_transform(&mut self, transform: &Transform) {
        let size = transform.display_size();
        if !self.is_circle {
            self.width = size.x;
            self.height = size.y;
        }
        self.position = transform.body_position(self.offset);
        self.rotation = transform.rotation;
    }

    /// Store the touching state for this step and clear per-step flags
    pub fn reset_flags(&mut self, clear: bool) {
        self.was_touching = if clear {
            DirectionFlags::NONE
        } else {
            self.touching
        };
        self.touching.clear();
        self.blocked.clear();
        self.world_blocked.clear();
        self.hard_blocked.clear();
        self.overlap_r = 0.0;
        self.overlap_x = 0.0;
        self.overlap_y = 0.0;
        self.embedded = false;
    }

    /// Integrate one step. Returns true when the body hit the world bounds
    /// and wants a `WorldBounds` event.
    pub(crate) fn update(&mut self, ctx: &StepContext) -> bool {
        self.prev = self.position;
        self.prev_frame = self.position;
        self.pre_rotation = self.rotation;

        if !self.moves {
            self.dx = 0.0;
            self.dy = 0.0;
            return false;
        }

        motion::update_motion(self, ctx);

        self.position += self.velocity * ctx.delta;
        self.refresh_delta();

        self.angle = self.velocity.y.atan2(self.velocity.x);
        self.speed = self.velocity.length();

        self.collide_world_bounds
            && self.check_world_bounds(&ctx.bounds, &ctx.check_collision)
            && self.on_world_bounds
    }

    /// Clamp into the bounds, reflecting velocity. Returns true if any side hit.
    pub fn check_world_bounds(&mut self, world_bounds: &Rect, check: &DirectionFlags) -> bool {
        let bounds = self.custom_bounds.unwrap_or(*world_bounds);
        let bounce = self.world_bounce.unwrap_or(self.bounce);
        let mut hit = false;

        if self.position.x < bounds.left() && check.left {
            self.position.x = bounds.left();
            self.velocity.x *= -bounce.x;
            self.blocked.left = true;
            self.world_blocked.left = true;
            hit = true;
        } else if self.right() > bounds.right() && check.right {
            self.position.x = bounds.right() - self.width;
            self.velocity.x *= -bounce.x;
            self.blocked.right = true;
            self.world_blocked.right = true;
            hit = true;
        }

        if self.position.y < bounds.top() && check.up {
            self.position.y = bounds.top();
            self.velocity.y *= -bounce.y;
            self.blocked.up = true;
            self.world_blocked.up = true;
            hit = true;
        } else if self.bottom() > bounds.bottom() && check.down {
            self.position.y = bounds.bottom() - self.height;
            self.velocity.y *= -bounce.y;
            self.blocked.down = true;
            self.world_blocked.down = true;
            hit = true;
        }

        if hit {
            self.refresh_delta();
        }
        hit
    }

    /// Finish the frame: clamp the displacement, update facing and report
    /// how far the owner should move
    pub(crate) fn post_update(&mut self) -> FrameMotion {
        let mut delta = self.position - self.prev_frame;

        if self.moves {
            if self.delta_max.x != 0.0 {
                delta.x = delta.x.clamp(-self.delta_max.x, self.delta_max.x);
            }
            if self.delta_max.y != 0.0 {
                delta.y = delta.y.clamp(-self.delta_max.y, self.delta_max.y);
            }
        }

        if delta.x < 0.0 {
            self.facing = Facing::Left;
        } else if delta.x > 0.0 {
            self.facing = Facing::Right;
        }

        if delta.y < 0.0 {
            self.facing = Facing::Up;
        } else if delta.y > 0.0 {
            self.facing = Facing::Down;
        }

        self.tx = delta.x;
        self.ty = delta.y;
        self.prev_frame = self.position;

        FrameMotion {
            delta: if self.moves { delta } else { Vec2::ZERO },
            rotation: if self.allow_rotation {
                self.delta_z()
            } else {
                0.0
            },
        }
    }

    /// Teleport, zeroing motion and clearing contact state
    pub fn reset(&mut self, x: f32, y: f32) {
        self.stop();
        self.position = Vec2::new(x, y);
        self.prev = self.position;
        self.prev_frame = self.position;
        self.pre_rotation = self.rotation;
        self.dx = 0.0;
        self.dy = 0.0;
        self.reset_flags(true);
    }

    /// Zero velocity, acceleration and spin
    pub fn stop(&mut self) -> &mut Self {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.speed = 0.0;
        self.angular_velocity = 0.0;
        self.angular_acceleration = 0.0;
        self
    }

    /// Point test against the body's shape
    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        if self.is_circle {
            self.radius > 0.0 && self.center().distance(Vec2::new(x, y)) <= self.radius
        } else {
            self.rect().contains(x, y)
        }
    }

    pub fn on_floor(&self) -> bool {
        self.blocked.down
    }

    pub fn on_ceiling(&self) -> bool {
        self.blocked.up
    }

    pub fn on_wall(&self) -> bool {
        self.blocked.left || self.blocked.right
    }

    pub fn delta_x(&self) -> f32 {
        self.dx
    }

    pub fn delta_y(&self) -> f32 {
        self.dy
    }

    pub fn delta_abs_x(&self) -> f32 {
        self.dx.abs()
    }

    pub fn delta_abs_y(&self) -> f32 {
        self.dy.abs()
    }

    /// Displacement reported to the owner on the last frame
    pub fn delta_x_final(&self) -> f32 {
        self.tx
    }

    pub fn delta_y_final(&self) -> f32 {
        self.ty
    }

    pub fn delta_z(&self) -> f32 {
        self.rotation - self.pre_rotation
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.any() || self.world_blocked.any() || self.hard_blocked.any()
    }

    pub fn is_blocked_up(&self) -> bool {
        self.immovable || self.blocked.up || self.world_blocked.up || self.hard_blocked.up
    }

    pub fn is_blocked_down(&self) -> bool {
        self.immovable || self.blocked.down || self.world_blocked.down || self.hard_blocked.down
    }

    pub fn is_blocked_left(&self) -> bool {
        self.immovable || self.blocked.left || self.world_blocked.left || self.hard_blocked.left
    }

    pub fn is_blocked_right(&self) -> bool {
        self.immovable || self.blocked.right || self.world_blocked.right || self.hard_blocked.right
    }

    pub fn is_world_blocked_up(&self) -> bool {
        self.immovable || self.world_blocked.up || self.hard_blocked.up
    }

    pub fn is_world_blocked_down(&self) -> bool {
        self.immovable || self.world_blocked.down || self.hard_blocked.down
    }

    pub fn is_world_blocked_left(&self) -> bool {
        self.immovable || self.world_blocked.left || self.hard_blocked.left
    }

    pub fn is_world_blocked_right(&self) -> bool {
        self.immovable || self.world_blocked.right || self.hard_blocked.right
    }

    /// Pinned horizontally: hard/world blocked on one side, blocked on the other
    pub fn is_blocked_x(&self) -> bool {
        ((self.world_blocked.right || self.hard_blocked.right) && self.blocked.left)
            || ((self.world_blocked.left || self.hard_blocked.left) && self.blocked.right)
    }

    /// Pinned vertically
    pub fn is_blocked_y(&self) -> bool {
        ((self.world_blocked.down || self.hard_blocked.down) && self.blocked.up)
            || ((self.world_blocked.up || self.hard_blocked.up) && self.blocked.down)
    }

    /// How much of `amount` this body can actually move along `axis`
    /// without leaving the bounds or pushing into a blocked side
    pub fn get_share(
        &self,
        axis: Axis,
        amount: f32,
        world_bounds: &Rect,
        check: &DirectionFlags,
    ) -> f32 {
        if amount == 0.0 || self.immovable || !self.moves {
            return 0.0;
        }

        if self.collide_world_bounds {
            let bounds = self.custom_bounds.unwrap_or(*world_bounds);
            let (min_bound, max_bound) = match axis {
                Axis::X => (bounds.left(), bounds.right()),
                Axis::Y => (bounds.top(), bounds.bottom()),
            };
            let (min_edge, max_edge) = (self.min_edge(axis), self.max_edge(axis));

            if amount < 0.0 && check.min_side(axis) && min_edge + amount < min_bound {
                return (min_bound - min_edge).min(0.0);
            }
            if amount > 0.0 && check.max_side(axis) && max_edge + amount > max_bound {
                return (max_bound - max_edge).max(0.0);
            }
        }

        let blocked = if amount < 0.0 {
            self.blocked.min_side(axis) || self.world_blocked.min_side(axis)
        } else {
            self.blocked.max_side(axis) || self.world_blocked.max_side(axis)
        };

        if blocked {
            0.0
        } else {
            amount
        }
    }

    pub(crate) fn min_edge(&self, axis: Axis) -> f32 {
        axis.of(self.position)
    }

    pub(crate) fn max_edge(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.right(),
            Axis::Y => self.bottom(),
        }
    }

    pub(crate) fn delta(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.dx,
            Axis::Y => self.dy,
        }
    }

    pub(crate) fn custom_separate(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.custom_separate_x,
            Axis::Y => self.custom_separate_y,
        }
    }

    pub(crate) fn set_overlap(&mut self, axis: Axis, overlap: f32) {
        match axis {
            Axis::X => self.overlap_x = overlap,
            Axis::Y => self.overlap_y = overlap,
        }
    }

    /// Recompute the step deltas after any position change
    pub(crate) fn refresh_delta(&mut self) {
        self.dx = self.position.x - self.prev.x;
        self.dy = self.position.y - self.prev.y;
    }

    /// Apply a separation along one axis: shift the position, optionally
    /// replace the velocity (scaled by the slide factor) and mark blocked sides
    pub(crate) fn process(
        &mut self,
        axis: Axis,
        amount: f32,
        velocity: Option<f32>,
        block_min: bool,
        block_max: bool,
    ) {
        let position = axis.of(self.position) + amount;
        axis.set(&mut self.position, position);
        self.refresh_delta();

        if let Some(v) = velocity {
            axis.set(&mut self.velocity, v * axis.of(self.slide_factor));
        }

        if block_min {
            self.blocked.set_min_side(axis);
        }
        if block_max {
            self.blocked.set_max_side(axis);
        }
    }

    /// Pin the fields a static body must never change
    pub(crate) fn enforce_static(&mut self) {
        if self.is_static() {
            self.velocity = Vec2::ZERO;
            self.acceleration = Vec2::ZERO;
            self.drag = Vec2::ZERO;
            self.gravity = Vec2::ZERO;
            self.allow_gravity = false;
            self.immovable = true;
            self.pushable = false;
            self.moves = false;
            self.prev = self.position;
            self.prev_frame = self.position;
            self.dx = 0.0;
            self.dy = 0.0;
        }
    }
}

/// Builder for creating bodies with common configurations
pub struct BodyBuilder {
    body: Body,
}

impl BodyBuilder {
    /// Create a new dynamic body (integrated and separated every step)
    pub fn new_dynamic() -> Self {
        Self {
            body: Body::new(BodyKind::Dynamic, Vec2::ZERO, 1.0, 1.0),
        }
    }

    /// Create a new static body (never moves)
    pub fn new_static() -> Self {
        Self {
            body: Body::new(BodyKind::Static, Vec2::ZERO, 1.0, 1.0),
        }
    }

    /// Set the top-left corner
    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.body.position = Vec2::new(x, y);
        self.body.prev = self.body.position;
        self.body.prev_frame = self.body.position;
        self
    }

    /// Rectangle size
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.body.set_size(width, height);
        self
    }

    /// Circle radius; the body's box becomes 2r x 2r
    pub fn circle(mut self, radius: f32) -> Self {
        self.body.set_circle(radius);
        self
    }

    pub fn velocity(mut self, x: f32, y: f32) -> Self {
        self.body.set_velocity(x, y);
        self
    }

    pub fn acceleration(mut self, x: f32, y: f32) -> Self {
        self.body.acceleration = Vec2::new(x, y);
        self
    }

    pub fn drag(mut self, x: f32, y: f32) -> Self {
        self.body.drag = Vec2::new(x, y);
        self
    }

    /// Drag as a per-second multiplier instead of a linear decay
    pub fn damping(mut self, damping: bool) -> Self {
        self.body.use_damping = damping;
        self
    }

    /// Per-body gravity added to the world's
    pub fn gravity(mut self, x: f32, y: f32) -> Self {
        self.body.gravity = Vec2::new(x, y);
        self
    }

    pub fn allow_gravity(mut self, allow: bool) -> Self {
        self.body.allow_gravity = allow;
        self
    }

    pub fn bounce(mut self, x: f32, y: f32) -> Self {
        self.body.set_bounce(x, y);
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.body.set_mass(mass);
        self
    }

    pub fn max_velocity(mut self, x: f32, y: f32) -> Self {
        self.body.max_velocity = Vec2::new(x, y);
        self
    }

    pub fn max_speed(mut self, speed: f32) -> Self {
        self.body.max_speed = Some(speed);
        self
    }

    pub fn friction(mut self, x: f32, y: f32) -> Self {
        self.body.friction = Vec2::new(x, y);
        self
    }

    pub fn immovable(mut self, immovable: bool) -> Self {
        self.body.immovable = immovable;
        self
    }

    pub fn pushable(mut self, pushable: bool) -> Self {
        self.body.pushable = pushable;
        self
    }

    /// Clamp to the world bounds
    pub fn collide_world_bounds(mut self, collide: bool) -> Self {
        self.body.collide_world_bounds = collide;
        self
    }

    /// Opt into collide/overlap/world-bounds events
    pub fn events(mut self, on_collide: bool, on_overlap: bool, on_world_bounds: bool) -> Self {
        self.body.on_collide = on_collide;
        self.body.on_overlap = on_overlap;
        self.body.on_world_bounds = on_world_bounds;
        self
    }

    pub fn collision_category(mut self, category: u32, mask: u32) -> Self {
        self.body.collision_category = category;
        self.body.collision_mask = mask;
        self
    }

    pub fn game_object(mut self, id: GameObjectId) -> Self {
        self.body.game_object = Some(id);
        self
    }

    /// Build the body
    pub fn build(self) -> Body {
        let mut body = self.body;
        body.enforce_static();
        body
    }
}

/// Common body configurations
pub mod presets {
    use super::*;

    /// Player-style box: gravity, world bounds, no bounce
    pub fn player(x: f32, y: f32, width: f32, height: f32) -> Body {
        BodyBuilder::new_dynamic()
            .position(x, y)
            .size(width, height)
            .collide_world_bounds(true)
            .drag(600.0, 0.0)
            .max_velocity(400.0, 1200.0)
            .build()
    }

    /// Fixed platform
    pub fn platform(x: f32, y: f32, width: f32, height: f32) -> Body {
        BodyBuilder::new_static()
            .position(x, y)
            .size(width, height)
            .build()
    }

    /// Moving platform that carries riders horizontally
    pub fn moving_platform(x: f32, y: f32, width: f32, height: f32, vx: f32, vy: f32) -> Body {
        BodyBuilder::new_dynamic()
            .position(x, y)
            .size(width, height)
            .velocity(vx, vy)
            .immovable(true)
            .allow_gravity(false)
            .build()
    }

    /// Bouncy ball
    pub fn ball(x: f32, y: f32, radius: f32, vx: f32, vy: f32) -> Body {
        BodyBuilder::new_dynamic()
            .position(x, y)
            .circle(radius)
            .velocity(vx, vy)
            .bounce(1.0, 1.0)
            .collide_world_bounds(true)
            .build()
    }
}
