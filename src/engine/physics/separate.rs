// Axis-aligned narrow phase: per-axis overlap and separation

use super::body::Body;
use super::flags::{Axis, Facing};

/// Overlap of two bodies along one axis, from the direction they moved this
/// step. Also records touching, blocked and hard-blocked state on both bodies.
///
/// The result is signed: positive when body1 moved into body2 along the
/// positive axis. When both bodies moved the same amount (typically both
/// stationary) the direction comes from `face_hint`; without a usable hint
/// the pair is flagged as embedded and no overlap is reported.
pub(crate) fn get_overlap(
    axis: Axis,
    body1: &mut Body,
    body2: &mut Body,
    overlap_only: bool,
    bias: f32,
    face_hint: Facing,
) -> f32 {
    let d1 = body1.delta(axis);
    let d2 = body2.delta(axis);
    let max_overlap = d1.abs() + d2.abs() + bias;
    let mut limit_overlap = true;

    let forward = if d1 > d2 {
        true
    } else if d1 < d2 {
        false
    } else {
        match face_hint.axis() {
            Some(hint_axis) if hint_axis == axis => {
                limit_overlap = false;
                face_hint == axis.max_facing()
            }
            Some(_) => {
                body1.set_overlap(axis, 0.0);
                body2.set_overlap(axis, 0.0);
                return 0.0;
            }
            None => {
                body1.embedded = true;
                body2.embedded = true;
                body1.set_overlap(axis, 0.0);
                body2.set_overlap(axis, 0.0);
                return 0.0;
            }
        }
    };

    let (mut overlap, sides_open) = if forward {
        (
            body1.max_edge(axis) - body2.min_edge(axis),
            body1.check_collision.max_side(axis) && body2.check_collision.min_side(axis),
        )
    } else {
        (
            body1.min_edge(axis) - body2.max_edge(axis),
            body1.check_collision.min_side(axis) && body2.check_collision.max_side(axis),
        )
    };

    let too_deep = limit_overlap && !overlap_only && overlap.abs() > max_overlap;
    let wrong_way = if forward { overlap < 0.0 } else { overlap > 0.0 };

    if too_deep || wrong_way || !sides_open || !overlap.is_finite() {
        overlap = 0.0;
    } else if overlap != 0.0 {
        mark_contact(axis, forward, body1, body2, overlap_only);
    }

    body1.set_overlap(axis, overlap);
    body2.set_overlap(axis, overlap);
    overlap
}

/// Symmetric touching/blocked bookkeeping for a contact along `axis`.
/// `forward` means body1's max face meets body2's min face.
fn mark_contact(axis: Axis, forward: bool, body1: &mut Body, body2: &mut Body, overlap_only: bool) {
    let (face1, face2) = if forward {
        (axis.max_facing(), axis.min_facing())
    } else {
        (axis.min_facing(), axis.max_facing())
    };

    body1.touching.set(face1);
    body2.touching.set(face2);

    if overlap_only {
        return;
    }

    if body2.is_static() || body2.immovable {
        body1.blocked.set(face1);
    }
    if body1.is_static() || body1.immovable {
        body2.blocked.set(face2);
    }

    // pinned against something that cannot give way on the far side
    if body2.immovable || body2.world_blocked.get(face1) || body2.hard_blocked.get(face1) {
        body1.hard_blocked.set(face1);
    }
    if body1.immovable || body1.world_blocked.get(face2) || body1.hard_blocked.get(face2) {
        body2.hard_blocked.set(face2);
    }
}

/// Separate two bodies along one axis. Returns true when the bodies overlapped
/// on this axis (or are embedded), whether or not anything moved.
pub(crate) fn separate_axis(
    axis: Axis,
    body1: &mut Body,
    body2: &mut Body,
    overlap_only: bool,
    bias: f32,
    face_hint: Facing,
) -> bool {
    let overlap = get_overlap(axis, body1, body2, overlap_only, bias, face_hint);

    if overlap_only
        || overlap == 0.0
        || (body1.immovable && body2.immovable)
        || body1.custom_separate(axis)
        || body2.custom_separate(axis)
    {
        return overlap != 0.0 || (body1.embedded && body2.embedded);
    }

    let body1_immovable = body1.immovable;
    let body2_immovable = body2.immovable;
    let mut pair = AxisPair::new(axis, body1, body2, overlap.abs());
    let blocked_state = pair.block_check();

    if !body1_immovable && !body2_immovable {
        if blocked_state != BlockedState::Clear {
            return true;
        }
        pair.check();
    } else if body1_immovable {
        pair.run_immovable_body1(blocked_state);
    } else {
        pair.run_immovable_body2(blocked_state);
    }

    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockedState {
    Clear,
    Body1,
    Body2,
}

/// Which body is moving into which, named from body1's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// body1 moving toward min, body2 on the min side
    Body1TowardMin,
    /// body2 moving toward min, body1 on the min side
    Body2TowardMin,
    /// body1 moving toward max, body1 on the min side
    Body1TowardMax,
    /// body2 moving toward max, body2 on the min side
    Body2TowardMax,
}

/// Snapshot of a pair taken right after the overlap query
struct AxisPair<'a> {
    axis: Axis,
    body1: &'a mut Body,
    body2: &'a mut Body,
    overlap: f32,
    body1_on_min: bool,
    body2_on_min: bool,
    body1_full_impact: f32,
    body2_full_impact: f32,
}

impl<'a> AxisPair<'a> {
    fn new(axis: Axis, body1: &'a mut Body, body2: &'a mut Body, overlap: f32) -> Self {
        let v1 = axis.of(body1.velocity);
        let v2 = axis.of(body2.velocity);
        let bounce1 = axis.of(body1.bounce);
        let bounce2 = axis.of(body2.bounce);

        let body1_on_min = (body1.max_edge(axis) - body2.min_edge(axis)).abs()
            <= (body2.max_edge(axis) - body1.min_edge(axis)).abs();
        let body2_on_min = (body2.max_edge(axis) - body1.min_edge(axis)).abs()
            <= (body1.max_edge(axis) - body2.min_edge(axis)).abs();

        Self {
            axis,
            overlap,
            body1_on_min,
            body2_on_min,
            body1_full_impact: v2 - v1 * bounce1,
            body2_full_impact: v1 - v2 * bounce2,
            body1,
            body2,
        }
    }

    fn moving_min(body: &Body, axis: Axis) -> bool {
        body.delta(axis) < 0.0
    }

    fn moving_max(body: &Body, axis: Axis) -> bool {
        body.delta(axis) > 0.0
    }

    /// A body driving into a partner that is already blocked on the far side
    /// takes the whole correction and the partner never moves.
    fn block_check(&mut self) -> BlockedState {
        let axis = self.axis;
        let overlap = self.overlap;

        if Self::moving_max(self.body1, axis)
            && self.body1_on_min
            && self.body2.blocked.max_side(axis)
            && !self.body1.immovable
        {
            self.body1.process(axis, -overlap, Some(self.body1_full_impact), false, true);
            return BlockedState::Body1;
        }

        if Self::moving_min(self.body1, axis)
            && self.body2_on_min
            && self.body2.blocked.min_side(axis)
            && !self.body1.immovable
        {
            self.body1.process(axis, overlap, Some(self.body1_full_impact), true, false);
            return BlockedState::Body1;
        }

        if Self::moving_max(self.body2, axis)
            && self.body2_on_min
            && self.body1.blocked.max_side(axis)
            && !self.body2.immovable
        {
            self.body2.process(axis, -overlap, Some(self.body2_full_impact), false, true);
            return BlockedState::Body2;
        }

        if Self::moving_min(self.body2, axis)
            && self.body1_on_min
            && self.body1.blocked.min_side(axis)
            && !self.body2.immovable
        {
            self.body2.process(axis, overlap, Some(self.body2_full_impact), true, false);
            return BlockedState::Body2;
        }

        BlockedState::Clear
    }

    /// Both bodies movable: mass-weighted rebound, then resolve by side
    fn check(&mut self) {
        let axis = self.axis;
        let v1 = axis.of(self.body1.velocity);
        let v2 = axis.of(self.body2.velocity);
        let m1 = self.body1.mass();
        let m2 = self.body2.mass();

        let mut nv1 = ((v2 * v2 * m2) / m1).sqrt() * if v2 > 0.0 { 1.0 } else { -1.0 };
        let mut nv2 = ((v1 * v1 * m1) / m2).sqrt() * if v1 > 0.0 { 1.0 } else { -1.0 };
        let avg = (nv1 + nv2) * 0.5;
        nv1 -= avg;
        nv2 -= avg;

        let mass_impact1 = avg + nv1 * axis.of(self.body1.bounce);
        let mass_impact2 = avg + nv2 * axis.of(self.body2.bounce);

        let side = if Self::moving_min(self.body1, axis) && self.body2_on_min {
            Side::Body1TowardMin
        } else if Self::moving_min(self.body2, axis) && self.body1_on_min {
            Side::Body2TowardMin
        } else if Self::moving_max(self.body1, axis) && self.body1_on_min {
            Side::Body1TowardMax
        } else if Self::moving_max(self.body2, axis) && self.body2_on_min {
            Side::Body2TowardMax
        } else if self.body1_on_min {
            Side::Body1TowardMax
        } else {
            Side::Body1TowardMin
        };

        self.run(side, mass_impact1, mass_impact2);
    }

    fn run(&mut self, side: Side, mass_impact1: f32, mass_impact2: f32) {
        let axis = self.axis;
        let overlap = self.overlap;
        // body1 sits on the max side for these two
        let body1_on_max = matches!(side, Side::Body1TowardMin | Side::Body2TowardMax);

        match (self.body1.pushable, self.body2.pushable) {
            (true, true) => {
                let half = overlap * 0.5;
                if body1_on_max {
                    self.body1.process(axis, half, Some(mass_impact1), false, false);
                    self.body2.process(axis, -half, Some(mass_impact2), false, false);
                } else {
                    self.body1.process(axis, -half, Some(mass_impact1), false, false);
                    self.body2.process(axis, half, Some(mass_impact2), false, false);
                }
            }
            (true, false) => {
                if body1_on_max {
                    self.body1.process(axis, overlap, Some(self.body1_full_impact), true, false);
                } else {
                    self.body1.process(axis, -overlap, Some(self.body1_full_impact), false, true);
                }
            }
            (false, true) => {
                if body1_on_max {
                    self.body2.process(axis, -overlap, Some(self.body2_full_impact), false, true);
                } else {
                    self.body2.process(axis, overlap, Some(self.body2_full_impact), true, false);
                }
            }
            (false, false) => self.run_deadlock(side),
        }
    }

    /// Neither body pushable: split or hand the correction to the mover,
    /// stopping head-on movers and matching speeds for same-direction movers
    fn run_deadlock(&mut self, side: Side) {
        let axis = self.axis;
        let overlap = self.overlap;
        let half = overlap * 0.5;
        let v1 = axis.of(self.body1.velocity);
        let v2 = axis.of(self.body2.velocity);
        let body1_stationary = self.body1.delta(axis) == 0.0;
        let body2_stationary = self.body2.delta(axis) == 0.0;

        match side {
            Side::Body1TowardMin => {
                if body2_stationary {
                    self.body1.process(axis, overlap, Some(0.0), true, false);
                    self.body2.process(axis, 0.0, None, false, true);
                } else if Self::moving_max(self.body2, axis) {
                    self.body1.process(axis, half, Some(0.0), true, false);
                    self.body2.process(axis, -half, Some(0.0), false, true);
                } else {
                    self.body1.process(axis, half, Some(v2), true, false);
                    self.body2.process(axis, -half, None, false, true);
                }
            }
            Side::Body2TowardMin => {
                if body1_stationary {
                    self.body1.process(axis, 0.0, None, false, true);
                    self.body2.process(axis, overlap, Some(0.0), true, false);
                } else if Self::moving_max(self.body1, axis) {
                    self.body1.process(axis, -half, Some(0.0), false, true);
                    self.body2.process(axis, half, Some(0.0), true, false);
                } else {
                    self.body1.process(axis, -half, None, false, true);
                    self.body2.process(axis, half, Some(v1), true, false);
                }
            }
            Side::Body1TowardMax => {
                if body2_stationary {
                    self.body1.process(axis, -overlap, Some(0.0), false, true);
                    self.body2.process(axis, 0.0, None, true, false);
                } else if Self::moving_min(self.body2, axis) {
                    self.body1.process(axis, -half, Some(0.0), false, true);
                    self.body2.process(axis, half, Some(0.0), true, false);
                } else {
                    self.body1.process(axis, -half, Some(v2), false, true);
                    self.body2.process(axis, half, None, true, false);
                }
            }
            Side::Body2TowardMax => {
                if body1_stationary {
                    self.body1.process(axis, 0.0, None, true, false);
                    self.body2.process(axis, -overlap, Some(0.0), false, true);
                } else if Self::moving_min(self.body1, axis) {
                    self.body1.process(axis, half, Some(0.0), true, false);
                    self.body2.process(axis, -half, Some(0.0), false, true);
                } else {
                    self.body1.process(axis, half, None, true, false);
                    self.body2.process(axis, -half, Some(v1), false, true);
                }
            }
        }
    }

    fn run_immovable_body1(&mut self, blocked_state: BlockedState) {
        let axis = self.axis;
        if blocked_state == BlockedState::Body2 {
            axis.set(&mut self.body2.velocity, 0.0);
        } else if self.body1_on_min {
            self.body2.process(axis, self.overlap, Some(self.body2_full_impact), true, false);
        } else {
            self.body2.process(axis, -self.overlap, Some(self.body2_full_impact), false, true);
        }

        ride(axis, self.body1, self.body2);
    }

    fn run_immovable_body2(&mut self, blocked_state: BlockedState) {
        let axis = self.axis;
        if blocked_state == BlockedState::Body1 {
            axis.set(&mut self.body1.velocity, 0.0);
        } else if self.body2_on_min {
            self.body1.process(axis, self.overlap, Some(self.body1_full_impact), true, false);
        } else {
            self.body1.process(axis, -self.overlap, Some(self.body1_full_impact), false, true);
        }

        ride(axis, self.body2, self.body1);
    }
}

/// Carry `rider` along the other axis by what `platform` moved this step,
/// scaled by the platform's friction on that axis
fn ride(axis: Axis, platform: &Body, rider: &mut Body) {
    if !platform.moves {
        return;
    }

    let other = axis.other();
    let carried = (other.of(platform.position) - other.of(platform.previous_position()))
        * other.of(platform.friction);

    if carried != 0.0 && carried.is_finite() {
        let position = other.of(rider.position) + carried;
        other.set(&mut rider.position, position);
        rider.refresh_delta();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::BodyBuilder;
    use crate::engine::physics::motion::StepContext;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn stepped(mut body: Body, delta: f32) -> Body {
        let ctx = StepContext {
            delta,
            ..StepContext::default()
        };
        body.update(&ctx);
        body
    }

    #[test]
    fn test_moving_into_immovable() {
        let a = BodyBuilder::new_dynamic()
            .size(32.0, 32.0)
            .velocity(100.0, 0.0)
            .build();
        let b = BodyBuilder::new_dynamic()
            .position(40.0, 0.0)
            .size(32.0, 32.0)
            .immovable(true)
            .build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);
        assert_relative_eq!(a.right(), 42.0);

        let separated = separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None);

        assert!(separated);
        assert_relative_eq!(a.x(), 8.0);
        assert_eq!(a.velocity.x, 0.0);
        assert_eq!(b.x(), 40.0);
        assert!(a.touching.right);
        assert!(b.touching.left);
        assert!(a.blocked.right);
        assert!(a.hard_blocked.right);
    }

    #[test]
    fn test_stationary_split_with_face_hint() {
        let mut a = BodyBuilder::new_dynamic().size(10.0, 10.0).build();
        let mut b = BodyBuilder::new_dynamic()
            .position(6.0, 0.0)
            .size(10.0, 10.0)
            .build();

        let separated = separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::Right);

        assert!(separated);
        assert_relative_eq!(a.x(), -2.0);
        assert_relative_eq!(b.x(), 8.0);
        assert_eq!(a.velocity, Vec2::ZERO);
        assert_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_stationary_without_hint_is_embedded() {
        let mut a = BodyBuilder::new_dynamic().size(10.0, 10.0).build();
        let mut b = BodyBuilder::new_dynamic()
            .position(2.0, 2.0)
            .size(10.0, 10.0)
            .build();

        let result = separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None);

        assert!(result);
        assert!(a.embedded && b.embedded);
        assert_eq!(a.x(), 0.0);
        assert_eq!(b.x(), 2.0);
    }

    #[test]
    fn test_hint_on_other_axis_skips() {
        let mut a = BodyBuilder::new_dynamic().size(10.0, 10.0).build();
        let mut b = BodyBuilder::new_dynamic()
            .position(2.0, 8.0)
            .size(10.0, 10.0)
            .build();

        assert!(!separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::Down));
        assert!(!a.embedded);
        assert_eq!(a.x(), 0.0);
    }

    #[test]
    fn test_both_immovable_detects_without_moving() {
        let a = BodyBuilder::new_dynamic()
            .size(10.0, 10.0)
            .velocity(50.0, 0.0)
            .immovable(true)
            .build();
        let b = BodyBuilder::new_dynamic()
            .position(12.0, 0.0)
            .size(10.0, 10.0)
            .immovable(true)
            .build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);
        let (pa, pb) = (a.position, b.position);

        assert!(separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None));
        assert_eq!(a.position, pa);
        assert_eq!(b.position, pb);
    }

    #[test]
    fn test_overlap_only_never_moves() {
        let a = BodyBuilder::new_dynamic().size(10.0, 10.0).velocity(50.0, 0.0).build();
        let b = BodyBuilder::new_dynamic().position(12.0, 0.0).size(10.0, 10.0).build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);

        assert!(separate_axis(Axis::X, &mut a, &mut b, true, 4.0, Facing::None));
        assert_relative_eq!(a.x(), 5.0);
        assert_eq!(a.overlap_x, 3.0);
        assert!(a.touching.right && b.touching.left);
        assert!(a.blocked.none());
    }

    #[test]
    fn test_too_deep_is_ignored() {
        let a = BodyBuilder::new_dynamic().size(10.0, 10.0).velocity(10.0, 0.0).build();
        let b = BodyBuilder::new_dynamic().position(2.0, 0.0).size(10.0, 10.0).build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);

        assert!(!separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None));
        assert_eq!(a.x(), 1.0);
    }

    #[test]
    fn test_bounce_against_immovable_never_gains_energy() {
        let a = BodyBuilder::new_dynamic()
            .size(10.0, 10.0)
            .velocity(100.0, 0.0)
            .bounce(1.0, 1.0)
            .build();
        let b = BodyBuilder::new_dynamic()
            .position(15.0, 0.0)
            .size(10.0, 10.0)
            .immovable(true)
            .build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);

        separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None);

        assert!(a.velocity.x.abs() <= 100.0);
        assert_relative_eq!(a.velocity.x, -100.0);
    }

    #[test]
    fn test_head_on_equal_mass_exchange() {
        let a = BodyBuilder::new_dynamic()
            .size(10.0, 10.0)
            .velocity(50.0, 0.0)
            .bounce(1.0, 1.0)
            .build();
        let b = BodyBuilder::new_dynamic()
            .position(19.0, 0.0)
            .size(10.0, 10.0)
            .velocity(-50.0, 0.0)
            .bounce(1.0, 1.0)
            .build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);
        assert_relative_eq!(a.right() - b.x(), 1.0, epsilon = 1e-5);

        separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None);

        assert_relative_eq!(a.right(), b.x(), epsilon = 1e-5);
        assert_relative_eq!(a.velocity.x, -50.0, epsilon = 1e-4);
        assert_relative_eq!(b.velocity.x, 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_platform_carries_rider() {
        // rider standing on an immovable platform moving right
        let platform = BodyBuilder::new_dynamic()
            .position(0.0, 20.0)
            .size(100.0, 10.0)
            .velocity(40.0, 0.0)
            .immovable(true)
            .build();
        let rider = BodyBuilder::new_dynamic()
            .position(10.0, 10.0)
            .size(10.0, 10.0)
            .velocity(0.0, 20.0)
            .build();
        let mut platform = stepped(platform, 0.1);
        let mut rider = stepped(rider, 0.1);

        assert!(separate_axis(Axis::Y, &mut rider, &mut platform, false, 4.0, Facing::None));

        assert_relative_eq!(rider.bottom(), 20.0);
        assert_relative_eq!(rider.x(), 14.0);
        assert_relative_eq!(rider.delta_x(), 4.0);
        assert!(rider.on_floor());
    }

    #[test]
    fn test_blocked_partner_pushes_back_mover() {
        let a = BodyBuilder::new_dynamic()
            .size(10.0, 10.0)
            .velocity(30.0, 0.0)
            .build();
        let b = BodyBuilder::new_dynamic()
            .position(12.0, 0.0)
            .size(10.0, 10.0)
            .build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);
        b.blocked.right = true;

        assert!(separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None));

        assert_relative_eq!(a.right(), 12.0);
        assert_eq!(b.x(), 12.0);
        assert!(a.blocked.right);
    }

    #[test]
    fn test_check_collision_side_disabled() {
        let a = BodyBuilder::new_dynamic().size(10.0, 10.0).velocity(30.0, 0.0).build();
        let b = BodyBuilder::new_dynamic().position(12.0, 0.0).size(10.0, 10.0).build();
        let mut a = stepped(a, 0.1);
        let mut b = stepped(b, 0.1);
        b.check_collision.left = false;

        assert!(!separate_axis(Axis::X, &mut a, &mut b, false, 4.0, Facing::None));
        assert!(a.touching.none());
    }
}
