// Velocity integration for dynamic bodies

use glam::Vec2;

use super::body::Body;
use super::flags::DirectionFlags;
use crate::core::geom::Rect;
use crate::core::math::{clamp, fuzzy_greater_than, fuzzy_less_than, EPSILON};

/// Linear drag snaps to zero inside this band
const LINEAR_DRAG_EPSILON: f32 = 0.01;

/// Damped speed below this counts as stopped
const DAMPING_EPSILON: f32 = 0.001;

/// Angular drag snaps to zero inside this band
const ANGULAR_DRAG_EPSILON: f32 = 0.1;

/// Per-step values shared by integration and separation.
///
/// Built once at the top of `World::update` and threaded through every phase
/// of the step, so nothing depends on state surviving in the world between
/// calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Seconds, already divided by the world time scale
    pub delta: f32,
    pub gravity: Vec2,
    pub bounds: Rect,
    pub check_collision: DirectionFlags,
    pub overlap_bias: f32,
    pub tile_bias: f32,
    pub force_x: bool,
}

impl Default for StepContext {
    fn default() -> Self {
        Self {
            delta: 0.0,
            gravity: Vec2::ZERO,
            bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
            check_collision: DirectionFlags::ALL,
            overlap_bias: 4.0,
            tile_bias: 16.0,
            force_x: false,
        }
    }
}

/// Integrate angular then linear velocity for one step
pub fn update_motion(body: &mut Body, ctx: &StepContext) {
    if body.allow_rotation {
        compute_angular_velocity(body, ctx.delta);
    }
    compute_velocity(body, ctx);
}

pub fn compute_angular_velocity(body: &mut Body, delta: f32) {
    let mut velocity = body.angular_velocity;
    let acceleration = body.angular_acceleration;
    let drag = body.angular_drag;

    if acceleration != 0.0 {
        velocity += acceleration * delta;
    } else if body.allow_drag && drag != 0.0 {
        velocity = apply_linear_drag(velocity, drag * delta, ANGULAR_DRAG_EPSILON);
    }

    body.angular_velocity = clamp(velocity, -body.max_angular, body.max_angular);
    body.rotation += body.angular_velocity * delta;
}

/// Gravity, then acceleration or drag per axis, then the velocity and speed caps
pub fn compute_velocity(body: &mut Body, ctx: &StepContext) {
    let delta = ctx.delta;
    let mut velocity = body.velocity;

    if body.allow_gravity {
        velocity += (ctx.gravity + body.gravity) * delta;
    }

    if body.acceleration.x != 0.0 {
        velocity.x += body.acceleration.x * delta;
    } else if body.allow_drag && body.drag.x != 0.0 {
        if body.use_damping {
            velocity.x *= body.drag.x.powf(delta);
            if velocity.length() < DAMPING_EPSILON {
                velocity.x = 0.0;
            }
        } else {
            velocity.x = apply_linear_drag(velocity.x, body.drag.x * delta, LINEAR_DRAG_EPSILON);
        }
    }

    if body.acceleration.y != 0.0 {
        velocity.y += body.acceleration.y * delta;
    } else if body.allow_drag && body.drag.y != 0.0 {
        if body.use_damping {
            velocity.y *= body.drag.y.powf(delta);
            if velocity.length() < DAMPING_EPSILON {
                velocity.y = 0.0;
            }
        } else {
            velocity.y = apply_linear_drag(velocity.y, body.drag.y * delta, LINEAR_DRAG_EPSILON);
        }
    }

    velocity.x = clamp(velocity.x, -body.max_velocity.x, body.max_velocity.x);
    velocity.y = clamp(velocity.y, -body.max_velocity.y, body.max_velocity.y);

    let mut speed = velocity.length();
    if let Some(max_speed) = body.max_speed {
        if max_speed >= 0.0 && speed > max_speed {
            velocity = velocity.normalize_or_zero() * max_speed;
            speed = max_speed;
        }
    }

    if !velocity.is_finite() {
        log::warn!("non-finite velocity after integration, zeroing");
        velocity = Vec2::ZERO;
        speed = 0.0;
    }

    body.velocity = velocity;
    body.speed = speed;
}

/// Reduce the magnitude of `velocity` by `drag`, stopping at zero instead of
/// flipping sign
fn apply_linear_drag(velocity: f32, drag: f32, epsilon: f32) -> f32 {
    if fuzzy_greater_than(velocity - drag, 0.0, epsilon) {
        velocity - drag
    } else if fuzzy_less_than(velocity + drag, 0.0, epsilon) {
        velocity + drag
    } else {
        0.0
    }
}

/// Velocity small enough to treat as resting
pub fn is_resting(velocity: Vec2) -> bool {
    velocity.length_squared() < EPSILON * EPSILON
}
