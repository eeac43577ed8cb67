// Radial separation for circle vs circle and circle vs box corner contacts

use glam::Vec2;

use super::body::Body;
use super::flags::{Axis, Facing};
use super::separate::get_overlap;
use crate::core::math::EPSILON;

/// Radial overlap and the unit normal pointing from body1 toward body2.
/// `None` when the contact is face-on against a box, which the axis solver
/// handles better.
fn radial_contact(body1: &Body, body2: &Body) -> Option<(f32, Vec2)> {
    match (body1.is_circle(), body2.is_circle()) {
        (true, true) => {
            let offset = body2.center() - body1.center();
            let distance = offset.length();
            let normal = if distance > EPSILON {
                offset / distance
            } else {
                Vec2::X
            };
            Some((body1.radius() + body2.radius() - distance, normal))
        }
        (true, false) => corner_contact(body1, body2),
        (false, true) => corner_contact(body2, body1).map(|(overlap, n)| (overlap, -n)),
        (false, false) => None,
    }
}

/// Circle against the nearest box corner, only when the centre lies outside
/// the box on both axes. The normal points from the circle to the box.
fn corner_contact(circle: &Body, rect: &Body) -> Option<(f32, Vec2)> {
    let center = circle.center();

    let corner_x = if center.x < rect.left() {
        rect.left()
    } else if center.x > rect.right() {
        rect.right()
    } else {
        return None;
    };
    let corner_y = if center.y < rect.top() {
        rect.top()
    } else if center.y > rect.bottom() {
        rect.bottom()
    } else {
        return None;
    };

    let offset = Vec2::new(corner_x, corner_y) - center;
    let distance = offset.length();
    if distance <= EPSILON {
        return Some((circle.radius(), (rect.center() - center).normalize_or_zero()));
    }
    Some(((circle.radius() - distance).max(0.0), offset / distance))
}

/// What the radial solver made of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CircleOutcome {
    /// Handled radially; `true` when the pair counts as colliding
    Resolved(bool),
    /// Face-on against a box and left untouched for the axis solver
    FaceOn,
}

/// Resolve a pair where at least one body is a circle.
///
/// Velocities are exchanged along the contact normal with the 1-D elastic
/// formula (an immovable body acts as infinite mass), only while the bodies
/// are still approaching, then scaled by each body's bounce.
pub(crate) fn separate_circle(
    body1: &mut Body,
    body2: &mut Body,
    overlap_only: bool,
    face_hint: Facing,
    delta: f32,
) -> CircleOutcome {
    let Some((overlap, normal)) = radial_contact(body1, body2) else {
        body1.overlap_r = 0.0;
        body2.overlap_r = 0.0;
        return CircleOutcome::FaceOn;
    };

    // touching and blocked flags for a contact the axis solver never sees
    get_overlap(Axis::X, body1, body2, overlap_only, 0.0, face_hint);
    get_overlap(Axis::Y, body1, body2, overlap_only, 0.0, face_hint);
    body1.overlap_r = overlap;
    body2.overlap_r = overlap;

    if !normal.is_finite() {
        return CircleOutcome::Resolved(false);
    }
    if overlap_only
        || overlap <= 0.0
        || (body1.immovable && body2.immovable)
        || body1.custom_separate_x
        || body2.custom_separate_x
    {
        return CircleOutcome::Resolved(overlap > 0.0);
    }

    exchange_velocity(body1, body2, normal);

    let (share1, share2) = displacement_shares(body1, body2);
    if share1 > 0.0 {
        body1.position += body1.velocity * delta - normal * overlap * share1;
    }
    if share2 > 0.0 {
        body2.position += body2.velocity * delta + normal * overlap * share2;
    }
    body1.refresh_delta();
    body2.refresh_delta();

    log::trace!(
        "circle separation: overlap {:.3} normal ({:.3}, {:.3})",
        overlap,
        normal.x,
        normal.y
    );

    CircleOutcome::Resolved(true)
}

fn exchange_velocity(body1: &mut Body, body2: &mut Body, normal: Vec2) {
    let approach = (body1.velocity - body2.velocity).dot(normal);
    if approach <= 0.0 {
        return;
    }

    let (m1, m2) = (body1.mass(), body2.mass());

    if body1.immovable {
        body2.velocity += normal * approach * 2.0;
        body2.velocity *= body2.bounce;
    } else if body2.immovable {
        body1.velocity -= normal * approach * 2.0;
        body1.velocity *= body1.bounce;
    } else {
        let total = m1 + m2;
        body1.velocity -= normal * approach * (2.0 * m2 / total);
        body2.velocity += normal * approach * (2.0 * m1 / total);
        body1.velocity *= body1.bounce;
        body2.velocity *= body2.bounce;
    }

    body1.speed = body1.velocity.length();
    body2.speed = body2.velocity.length();
}

/// Fraction of the radial overlap each body absorbs
fn displacement_shares(body1: &Body, body2: &Body) -> (f32, f32) {
    match (body1.immovable, body2.immovable) {
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
        _ => match (body1.pushable, body2.pushable) {
            (true, false) => (1.0, 0.0),
            (false, true) => (0.0, 1.0),
            _ => (0.5, 0.5),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::BodyBuilder;
    use crate::engine::physics::flags::DirectionFlags;
    use approx::assert_relative_eq;

    fn circle(cx: f32, cy: f32, radius: f32, vx: f32, vy: f32) -> Body {
        BodyBuilder::new_dynamic()
            .position(cx - radius, cy - radius)
            .circle(radius)
            .velocity(vx, vy)
            .bounce(1.0, 1.0)
            .build()
    }

    #[test]
    fn test_equal_circles_exchange_and_separate() {
        let mut a = circle(0.0, 0.0, 10.0, 5.0, 0.0);
        let mut b = circle(15.0, 0.0, 10.0, -5.0, 0.0);

        assert_eq!(
            separate_circle(&mut a, &mut b, false, Facing::None, 0.0),
            CircleOutcome::Resolved(true)
        );

        assert_relative_eq!(a.overlap_r, 5.0);
        assert_relative_eq!(b.overlap_r, 5.0);
        assert_relative_eq!(a.velocity.x, -5.0, epsilon = 1e-5);
        assert_relative_eq!(b.velocity.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(a.center().distance(b.center()), 20.0, epsilon = 1e-4);
        assert_relative_eq!(a.center().x, -2.5, epsilon = 1e-4);
        assert_relative_eq!(b.center().x, 17.5, epsilon = 1e-4);
    }

    #[test]
    fn test_separating_circles_keep_velocity() {
        let mut a = circle(0.0, 0.0, 10.0, -5.0, 0.0);
        let mut b = circle(15.0, 0.0, 10.0, 5.0, 0.0);

        assert_eq!(
            separate_circle(&mut a, &mut b, false, Facing::None, 0.0),
            CircleOutcome::Resolved(true)
        );
        assert_eq!(a.velocity.x, -5.0);
        assert_eq!(b.velocity.x, 5.0);
    }

    #[test]
    fn test_circle_against_immovable_circle_reflects() {
        let mut a = circle(0.0, 0.0, 10.0, 8.0, 0.0);
        let mut wall = circle(18.0, 0.0, 10.0, 0.0, 0.0);
        wall.immovable = true;

        assert_eq!(
            separate_circle(&mut a, &mut wall, false, Facing::None, 0.0),
            CircleOutcome::Resolved(true)
        );

        assert_relative_eq!(a.velocity.x, -8.0, epsilon = 1e-5);
        assert_eq!(wall.velocity, Vec2::ZERO);
        assert_relative_eq!(wall.center().x, 18.0);
        assert_relative_eq!(a.center().x, -2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_unequal_mass_conserves_momentum() {
        let mut a = circle(0.0, 0.0, 10.0, 6.0, 0.0);
        let mut b = circle(18.0, 0.0, 10.0, 0.0, 0.0);
        a.set_mass(2.0);
        let before = a.velocity.x * 2.0;

        separate_circle(&mut a, &mut b, false, Facing::None, 0.0);

        let after = a.velocity.x * a.mass() + b.velocity.x * b.mass();
        assert_relative_eq!(before, after, epsilon = 1e-4);
        assert_relative_eq!(a.velocity.x, 2.0, epsilon = 1e-4);
        assert_relative_eq!(b.velocity.x, 8.0, epsilon = 1e-4);
    }

    #[test]
    fn test_circle_vs_box_corner() {
        let mut ball = circle(0.0, 0.0, 10.0, 0.0, 0.0);
        let mut block = BodyBuilder::new_dynamic()
            .position(6.0, 6.0)
            .size(20.0, 20.0)
            .immovable(true)
            .build();

        assert_eq!(
            separate_circle(&mut ball, &mut block, false, Facing::None, 0.0),
            CircleOutcome::Resolved(true)
        );

        let corner = Vec2::new(6.0, 6.0);
        assert_relative_eq!(ball.center().distance(corner), 10.0, epsilon = 1e-4);
        assert_eq!(block.position, Vec2::new(6.0, 6.0));
    }

    #[test]
    fn test_circle_vs_box_face_falls_through() {
        let mut ball = circle(0.0, 0.0, 10.0, 0.0, 0.0);
        let mut block = BodyBuilder::new_dynamic()
            .position(8.0, -5.0)
            .size(20.0, 10.0)
            .build();

        assert_eq!(
            separate_circle(&mut ball, &mut block, false, Facing::Right, 0.0),
            CircleOutcome::FaceOn
        );
        assert_eq!(ball.overlap_r, 0.0);
        // the axis solver computes these itself
        assert_eq!(ball.touching, DirectionFlags::NONE);
        assert_eq!(block.touching, DirectionFlags::NONE);
        assert_eq!(ball.overlap_x, 0.0);
        assert!(!ball.embedded && !block.embedded);
    }

    #[test]
    fn test_box_first_normal_is_flipped() {
        let mut block = BodyBuilder::new_dynamic()
            .position(6.0, 6.0)
            .size(20.0, 20.0)
            .immovable(true)
            .build();
        let mut ball = circle(0.0, 0.0, 10.0, 0.0, 0.0);

        assert_eq!(
            separate_circle(&mut block, &mut ball, false, Facing::None, 0.0),
            CircleOutcome::Resolved(true)
        );
        assert!(ball.center().x < 0.0 && ball.center().y < 0.0);
    }

    #[test]
    fn test_overlap_only_reports_without_moving() {
        let mut a = circle(0.0, 0.0, 10.0, 5.0, 0.0);
        let mut b = circle(15.0, 0.0, 10.0, -5.0, 0.0);

        assert_eq!(
            separate_circle(&mut a, &mut b, true, Facing::None, 0.0),
            CircleOutcome::Resolved(true)
        );
        assert_eq!(a.center(), Vec2::ZERO);
        assert_eq!(a.velocity.x, 5.0);
    }

    #[test]
    fn test_both_immovable_report_overlap_without_moving() {
        let mut a = circle(0.0, 0.0, 10.0, 0.0, 0.0);
        let mut b = circle(15.0, 0.0, 10.0, 0.0, 0.0);
        a.immovable = true;
        b.immovable = true;

        assert_eq!(
            separate_circle(&mut a, &mut b, false, Facing::None, 0.0),
            CircleOutcome::Resolved(true)
        );
        assert_eq!(a.overlap_r, 5.0);
        assert_relative_eq!(a.center().x, 0.0);
        assert_relative_eq!(b.center().x, 15.0);
    }
}
