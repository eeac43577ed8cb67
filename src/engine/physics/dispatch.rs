// Collision dispatch: operand pairing, tree pruning and the narrow phase

use std::collections::HashSet;

use super::body::{Body, BodyHandle, BodyKind};
use super::circle::{separate_circle, CircleOutcome};
use super::collider::{Callbacks, ColliderHandle, CollisionTarget, Contact};
use super::collision::{can_collide, intersects, PhysicsEvent};
use super::flags::{Axis, Facing};
use super::group::GroupHandle;
use super::motion::StepContext;
use super::separate::separate_axis;
use super::tilemap::{separate_tile, tile_intersects_body, Tile, TileLayerHandle};
use super::world::{body_pair_mut, body_ref, World};
use crate::core::geom::Rect;

/// A single operand after arrays have been flattened
#[derive(Debug, Clone, Copy, PartialEq)]
enum Operand {
    Body(BodyHandle),
    Group(GroupHandle),
    TileLayer(TileLayerHandle),
}

fn operands(target: &CollisionTarget) -> Vec<Operand> {
    match target {
        CollisionTarget::Body(handle) => vec![Operand::Body(*handle)],
        CollisionTarget::Bodies(handles) => handles.iter().map(|h| Operand::Body(*h)).collect(),
        CollisionTarget::Group(group) => vec![Operand::Group(*group)],
        CollisionTarget::TileLayer(layer) => vec![Operand::TileLayer(*layer)],
    }
}

impl World {
    /// Run one collider. Its callbacks are lent out for the duration so they
    /// can take the world mutably.
    pub(super) fn run_collider(&mut self, handle: ColliderHandle) {
        let Some(collider) = self.colliders.get_mut(handle) else {
            return;
        };
        if !collider.active {
            return;
        }

        let object1 = collider.object1.clone();
        let object2 = collider.object2.clone();
        let overlap_only = collider.overlap_only;
        let mut callbacks = std::mem::take(&mut collider.callbacks);

        self.collide_objects(&object1, object2.as_ref(), &mut callbacks, overlap_only);

        if let Some(collider) = self.colliders.get_mut(handle) {
            collider.callbacks = callbacks;
        }
    }

    /// Check two operands, or one operand against itself when `object2` is
    /// `None`. Returns true if any pair collided.
    pub(super) fn collide_objects(
        &mut self,
        object1: &CollisionTarget,
        object2: Option<&CollisionTarget>,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> bool {
        let total = match object2 {
            None => self.collide_self(object1, callbacks, overlap_only),
            Some(object2) => {
                let (left, right) = (operands(object1), operands(object2));
                let mut total = 0;
                for a in &left {
                    for b in &right {
                        total += self.collide_handler(*a, *b, callbacks, overlap_only);
                    }
                }
                total
            }
        };
        total > 0
    }

    fn collide_self(
        &mut self,
        target: &CollisionTarget,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> usize {
        match target {
            CollisionTarget::Bodies(handles) => {
                let mut total = 0;
                for (i, a) in handles.iter().enumerate() {
                    for b in &handles[i + 1..] {
                        total += self.collide_pair(*a, *b, callbacks, overlap_only);
                    }
                }
                total
            }
            CollisionTarget::Group(group) => {
                self.collide_group_vs_self(*group, callbacks, overlap_only)
            }
            CollisionTarget::Body(_) | CollisionTarget::TileLayer(_) => {
                log::warn!("Unsupported self collision for {:?}", target);
                0
            }
        }
    }

    fn collide_handler(
        &mut self,
        a: Operand,
        b: Operand,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> usize {
        match (a, b) {
            (Operand::Body(body1), Operand::Body(body2)) => {
                self.collide_pair(body1, body2, callbacks, overlap_only)
            }
            (Operand::Body(body), Operand::Group(group))
            | (Operand::Group(group), Operand::Body(body)) => {
                self.collide_body_vs_group(body, group, callbacks, overlap_only)
            }
            (Operand::Group(group1), Operand::Group(group2)) => {
                if group1 == group2 {
                    self.collide_group_vs_self(group1, callbacks, overlap_only)
                } else {
                    self.collide_group_vs_group(group1, group2, callbacks, overlap_only)
                }
            }
            (Operand::Body(body), Operand::TileLayer(layer))
            | (Operand::TileLayer(layer), Operand::Body(body)) => {
                self.collide_body_vs_tile_layer(body, layer, callbacks, overlap_only)
            }
            (Operand::Group(group), Operand::TileLayer(layer))
            | (Operand::TileLayer(layer), Operand::Group(group)) => {
                let members = self.group_members(group);
                let mut total = 0;
                for body in members {
                    total += self.collide_body_vs_tile_layer(body, layer, callbacks, overlap_only);
                }
                total
            }
            (Operand::TileLayer(_), Operand::TileLayer(_)) => {
                log::warn!("Tile layer vs tile layer is not supported");
                0
            }
        }
    }

    fn group_members(&self, group: GroupHandle) -> Vec<BodyHandle> {
        self.groups
            .get(group)
            .map(|group| group.members().to_vec())
            .unwrap_or_default()
    }

    /// Group members whose indexed box meets the body's current box
    fn group_candidates(&self, handle: BodyHandle, group: GroupHandle) -> Vec<BodyHandle> {
        let Some(group) = self.groups.get(group) else {
            return Vec::new();
        };
        if group.is_empty() {
            return Vec::new();
        }

        let query = match body_ref(&self.bodies, &self.static_bodies, handle) {
            Some(body) if body.enable && !body.check_collision.none() => body.aabb(),
            _ => return Vec::new(),
        };

        let tree = match group.kind() {
            BodyKind::Dynamic => &self.tree,
            BodyKind::Static => &self.static_tree,
        };

        tree.search(&query)
            .into_iter()
            .filter(|candidate| *candidate != handle && group.contains(candidate))
            .collect()
    }

    fn collide_body_vs_group(
        &mut self,
        handle: BodyHandle,
        group: GroupHandle,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> usize {
        let mut total = 0;
        for candidate in self.group_candidates(handle, group) {
            total += self.collide_pair(handle, candidate, callbacks, overlap_only);
        }
        total
    }

    fn collide_group_vs_group(
        &mut self,
        group1: GroupHandle,
        group2: GroupHandle,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> usize {
        let mut total = 0;
        for body in self.group_members(group1) {
            total += self.collide_body_vs_group(body, group2, callbacks, overlap_only);
        }
        total
    }

    /// Every unordered pair of members once, in member order
    fn collide_group_vs_self(
        &mut self,
        group: GroupHandle,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> usize {
        let mut done = HashSet::new();
        let mut total = 0;

        for body in self.group_members(group) {
            done.insert(body);
            for candidate in self.group_candidates(body, group) {
                if !done.contains(&candidate) {
                    total += self.collide_pair(body, candidate, callbacks, overlap_only);
                }
            }
        }
        total
    }

    fn collide_pair(
        &mut self,
        handle1: BodyHandle,
        handle2: BodyHandle,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> usize {
        let Some(contact) = self.separate(handle1, handle2, callbacks, overlap_only) else {
            return 0;
        };
        callbacks.notify(self, &contact);
        1
    }

    /// Narrow phase for one pair. Returns the contact when the pair collided
    /// (or overlapped, with `overlap_only`).
    pub(super) fn separate(
        &mut self,
        handle1: BodyHandle,
        handle2: BodyHandle,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> Option<Contact> {
        if handle1 == handle2 {
            return None;
        }

        let contact = {
            let body1 = body_ref(&self.bodies, &self.static_bodies, handle1)?;
            let body2 = body_ref(&self.bodies, &self.static_bodies, handle2)?;
            if !ready_to_collide(body1, body2) || !intersects(body1, body2) {
                return None;
            }
            Contact::Bodies {
                body1: handle1,
                body2: handle2,
                object1: body1.game_object,
                object2: body2.game_object,
            }
        };

        if !callbacks.allow(self, &contact) {
            return None;
        }

        let ctx = self.step_context();

        // the process callback may have disabled either body
        let face_hint = {
            let body1 = body_ref(&self.bodies, &self.static_bodies, handle1)?;
            let body2 = body_ref(&self.bodies, &self.static_bodies, handle2)?;
            if !ready_to_collide(body1, body2) {
                return None;
            }
            self.cache
                .get_or_compute((handle1, handle2), body1, body2, &ctx)
                .face
        };

        let (body1, body2) =
            body_pair_mut(&mut self.bodies, &mut self.static_bodies, handle1, handle2)?;

        let result = if body1.is_circle() || body2.is_circle() {
            match separate_circle(body1, body2, overlap_only, face_hint, ctx.delta) {
                CircleOutcome::Resolved(collided) => collided,
                CircleOutcome::FaceOn => {
                    separate_boxes(body1, body2, &ctx, overlap_only, face_hint)
                }
            }
        } else {
            separate_boxes(body1, body2, &ctx, overlap_only, face_hint)
        };

        if !result {
            return None;
        }

        let (object1, object2) = (body1.game_object, body2.game_object);
        if overlap_only {
            if body1.on_overlap || body2.on_overlap {
                self.events.push(PhysicsEvent::Overlap {
                    object1,
                    object2,
                    body1: handle1,
                    body2: handle2,
                });
            }
        } else if body1.on_collide || body2.on_collide {
            self.events.push(PhysicsEvent::Collide {
                object1,
                object2,
                body1: handle1,
                body2: handle2,
            });
        }

        log::trace!(
            "{:?} vs {:?}: overlap ({:.3}, {:.3}, r {:.3})",
            handle1,
            handle2,
            body1.overlap_x,
            body1.overlap_y,
            body1.overlap_r
        );

        Some(contact)
    }

    fn collide_body_vs_tile_layer(
        &mut self,
        handle: BodyHandle,
        layer: TileLayerHandle,
        callbacks: &mut Callbacks,
        overlap_only: bool,
    ) -> usize {
        // static bodies can overlap tiles but are never pushed by them
        if handle.is_static() && !overlap_only {
            return 0;
        }

        let Some(tile_layer) = self.tile_layers.get(layer) else {
            return 0;
        };

        let area = match body_ref(&self.bodies, &self.static_bodies, handle) {
            Some(body) if body.enable && !body.check_collision.none() => {
                let (tile_width, tile_height) = (tile_layer.tile_width(), tile_layer.tile_height());
                Rect::new(
                    body.x() - tile_width,
                    body.y() - tile_height,
                    body.width() + tile_width * 2.0,
                    body.height() + tile_height * 2.0,
                )
            }
            _ => return 0,
        };

        let tiles = tile_layer.tiles_within(&area, true);
        if tiles.is_empty() {
            return 0;
        }
        self.collide_body_vs_tiles(handle, &tiles, callbacks, overlap_only, true)
    }

    pub(super) fn collide_body_vs_tiles(
        &mut self,
        handle: BodyHandle,
        tiles: &[Tile],
        callbacks: &mut Callbacks,
        overlap_only: bool,
        is_layer: bool,
    ) -> usize {
        let tile_bias = self.config.tile_bias;
        let mut total = 0;

        for tile in tiles {
            let object = match body_ref(&self.bodies, &self.static_bodies, handle) {
                Some(body) if body.enable && tile_intersects_body(&tile.rect, body) => {
                    body.game_object
                }
                _ => continue,
            };

            let contact = Contact::Tile {
                body: handle,
                object,
                tile: *tile,
            };
            if !callbacks.allow(self, &contact) {
                continue;
            }

            let Some(body) = self.body_any_mut(handle) else {
                break;
            };
            if !overlap_only && !separate_tile(body, tile, tile_bias, is_layer) {
                continue;
            }
            let (on_collide, on_overlap) = (body.on_collide, body.on_overlap);

            if overlap_only {
                if on_overlap {
                    self.events.push(PhysicsEvent::TileOverlap {
                        object,
                        tile: *tile,
                        body: handle,
                    });
                }
            } else if on_collide {
                self.events.push(PhysicsEvent::TileCollide {
                    object,
                    tile: *tile,
                    body: handle,
                });
            }

            total += 1;
            callbacks.notify(self, &contact);
        }

        total
    }
}

fn ready_to_collide(body1: &Body, body2: &Body) -> bool {
    body1.enable
        && body2.enable
        && !body1.check_collision.none()
        && !body2.check_collision.none()
        && can_collide(body1, body2)
}

/// Box separation on both axes. The axis gravity pulls along is resolved
/// first unless `force_x` is set; the second axis only runs if the bodies
/// still intersect.
fn separate_boxes(
    body1: &mut Body,
    body2: &mut Body,
    ctx: &StepContext,
    overlap_only: bool,
    face_hint: Facing,
) -> bool {
    let gravity_x = (ctx.gravity.x + body1.gravity.x).abs();
    let gravity_y = (ctx.gravity.y + body1.gravity.y).abs();
    let (first, second) = if ctx.force_x || gravity_y < gravity_x {
        (Axis::X, Axis::Y)
    } else {
        (Axis::Y, Axis::X)
    };

    let bias = ctx.overlap_bias;
    let first_result = separate_axis(first, body1, body2, overlap_only, bias, face_hint);
    let second_result = intersects(body1, body2)
        && separate_axis(second, body1, body2, overlap_only, bias, face_hint);

    first_result || second_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::BodyBuilder;
    use crate::engine::physics::config::WorldConfig;
    use crate::engine::physics::error::PhysicsError;
    use crate::engine::physics::tilemap::GridLayer;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn boxed(x: f32, y: f32, width: f32, height: f32) -> Body {
        BodyBuilder::new_dynamic()
            .position(x, y)
            .size(width, height)
            .build()
    }

    fn counter() -> (Rc<Cell<u32>>, Callbacks) {
        let count = Rc::new(Cell::new(0));
        let hits = count.clone();
        let callbacks = Callbacks::on_collide(move |_, _| hits.set(hits.get() + 1));
        (count, callbacks)
    }

    #[test]
    fn test_box_stops_against_immovable_box() {
        let mut world = World::default();
        let a = world.add_body(
            BodyBuilder::new_dynamic()
                .position(0.0, 0.0)
                .size(32.0, 32.0)
                .velocity(100.0, 0.0)
                .events(true, false, false)
                .build(),
        );
        let b = world.add_body(
            BodyBuilder::new_dynamic()
                .position(40.0, 0.0)
                .size(32.0, 32.0)
                .immovable(true)
                .build(),
        );
        world.add_collider(a, Some(b.into()), Callbacks::none()).unwrap();

        world.update(0.0, 100.0);

        let body_a = world.body(a).unwrap();
        assert_relative_eq!(body_a.position.x, 8.0, epsilon = 1e-4);
        assert_relative_eq!(body_a.velocity.x, 0.0);
        assert!(body_a.touching.right);
        assert!(body_a.blocked.right);

        let body_b = world.body(b).unwrap();
        assert_relative_eq!(body_b.position.x, 40.0);
        assert!(body_b.touching.left);

        assert!(world.events().iter().any(|event| matches!(
            event,
            PhysicsEvent::Collide { body1, body2, .. } if *body1 == a && *body2 == b
        )));
    }

    #[test]
    fn test_touching_static_body_symmetric() {
        let mut world = World::default();
        let a = world.add_body(
            BodyBuilder::new_dynamic()
                .position(0.0, 0.0)
                .size(32.0, 32.0)
                .velocity(100.0, 0.0)
                .build(),
        );
        let wall = world.add_body(
            BodyBuilder::new_static()
                .position(40.0, 0.0)
                .size(32.0, 32.0)
                .build(),
        );
        world.add_collider(a, Some(wall.into()), Callbacks::none()).unwrap();

        world.update(0.0, 100.0);

        let body_a = world.body(a).unwrap();
        assert_relative_eq!(body_a.right(), 40.0, epsilon = 1e-4);
        assert!(body_a.touching.right && body_a.blocked.right);
        assert!(!body_a.touching.left);

        let body_wall = world.body(wall).unwrap();
        assert!(body_wall.touching.left);
        assert_relative_eq!(body_wall.position.x, 40.0);
    }

    #[test]
    fn test_touching_symmetric_when_landing_on_body() {
        let mut world = World::default();
        let faller = world.add_body(
            BodyBuilder::new_dynamic()
                .position(100.0, 0.0)
                .size(32.0, 32.0)
                .velocity(0.0, 100.0)
                .build(),
        );
        let below = world.add_body(boxed(100.0, 40.0, 32.0, 32.0));
        world
            .add_collider(faller, Some(below.into()), Callbacks::none())
            .unwrap();

        world.update(0.0, 100.0);

        let top = world.body(faller).unwrap();
        let bottom = world.body(below).unwrap();
        assert!(top.touching.down && !top.touching.up);
        assert!(bottom.touching.up && !bottom.touching.down);
        assert_relative_eq!(top.position.y, 9.0, epsilon = 1e-4);
        assert_relative_eq!(bottom.position.y, 41.0, epsilon = 1e-4);
        assert_relative_eq!(top.bottom(), bottom.top(), epsilon = 1e-4);
    }

    #[test]
    fn test_circle_face_on_box_uses_axis_solver() {
        let mut world = World::default();
        let ball = world.add_body(
            BodyBuilder::new_dynamic()
                .position(-10.0, -10.0)
                .circle(10.0)
                .velocity(100.0, 0.0)
                .build(),
        );
        let block = world.add_body(
            BodyBuilder::new_dynamic()
                .position(15.0, -5.0)
                .size(20.0, 10.0)
                .immovable(true)
                .build(),
        );
        world
            .add_collider(ball, Some(block.into()), Callbacks::none())
            .unwrap();

        world.update(0.0, 100.0);

        let ball = world.body(ball).unwrap();
        assert_eq!(ball.overlap_r, 0.0);
        assert_relative_eq!(ball.right(), 15.0, epsilon = 1e-4);
        assert!(ball.touching.right && !ball.touching.left);
        assert!(world.body(block).unwrap().touching.left);
        assert_relative_eq!(world.body(block).unwrap().position.x, 15.0);
    }

    #[test]
    fn test_repeated_collide_does_not_separate_twice() {
        let mut world = World::default();
        let a = world.add_body(boxed(0.0, 0.0, 32.0, 32.0));
        let b = world.add_body(boxed(24.0, 0.0, 32.0, 32.0));

        assert!(world.collide(a, Some(b.into()), Callbacks::none()));
        let first = (
            world.body(a).unwrap().position,
            world.body(b).unwrap().position,
        );
        assert_relative_eq!(first.0.x, -4.0, epsilon = 1e-4);
        assert_relative_eq!(first.1.x, 28.0, epsilon = 1e-4);

        assert!(!world.collide(a, Some(b.into()), Callbacks::none()));
        assert_eq!(world.body(a).unwrap().position, first.0);
        assert_eq!(world.body(b).unwrap().position, first.1);
    }

    #[test]
    fn test_circles_exchange_velocity_through_world() {
        let mut world = World::default();
        let circle = |cx: f32, vx: f32| {
            BodyBuilder::new_dynamic()
                .position(cx - 10.0, -10.0)
                .circle(10.0)
                .velocity(vx, 0.0)
                .bounce(1.0, 1.0)
                .build()
        };
        let a = world.add_body(circle(0.0, 5.0));
        let b = world.add_body(circle(15.0, -5.0));

        assert!(world.collide(a, Some(b.into()), Callbacks::none()));

        let (body_a, body_b) = (world.body(a).unwrap(), world.body(b).unwrap());
        assert_relative_eq!(body_a.overlap_r, 5.0);
        assert_relative_eq!(body_a.velocity.x, -5.0, epsilon = 1e-5);
        assert_relative_eq!(body_b.velocity.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(body_a.center().distance(body_b.center()), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_group_vs_self_checks_each_pair_once() {
        let mut world = World::default();
        let group = world.create_group(BodyKind::Dynamic);
        for x in [0.0, 4.0, 8.0] {
            let handle = world.add_body(boxed(x, 0.0, 10.0, 10.0));
            world.add_to_group(group, handle).unwrap();
        }

        let (count, callbacks) = counter();
        world.add_overlap(group, None, callbacks).unwrap();
        world.update(0.0, 16.0);

        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_bodies_array_against_itself() {
        let mut world = World::default();
        let a = world.add_body(boxed(0.0, 0.0, 10.0, 10.0));
        let b = world.add_body(boxed(5.0, 0.0, 10.0, 10.0));
        let c = world.add_body(boxed(100.0, 0.0, 10.0, 10.0));

        let (count, callbacks) = counter();
        assert!(world.overlap(vec![a, b, c], None, callbacks));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_group_vs_group() {
        let mut world = World::default();
        let players = world.create_group(BodyKind::Dynamic);
        let walls = world.create_group(BodyKind::Static);

        let player = world.add_body(boxed(0.0, 0.0, 10.0, 10.0));
        world.add_to_group(players, player).unwrap();
        for x in [5.0, 50.0] {
            let wall = world.add_body(
                BodyBuilder::new_static()
                    .position(x, 0.0)
                    .size(10.0, 10.0)
                    .build(),
            );
            world.add_to_group(walls, wall).unwrap();
        }

        let (count, callbacks) = counter();
        assert!(world.overlap(players, Some(walls.into()), callbacks));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_process_callback_vetoes_pair() {
        let mut world = World::default();
        let a = world.add_body(boxed(0.0, 0.0, 10.0, 10.0));
        let b = world.add_body(boxed(5.0, 0.0, 10.0, 10.0));

        let (count, callbacks) = counter();
        let callbacks = callbacks.with_process(|_, _| false);
        assert!(!world.collide(a, Some(b.into()), callbacks));
        assert_eq!(count.get(), 0);
        assert_relative_eq!(world.body(a).unwrap().position.x, 0.0);
    }

    #[test]
    fn test_collider_added_in_callback_runs_next_step() {
        let mut world = World::default();
        let a = world.add_body(boxed(0.0, 0.0, 10.0, 10.0));
        let b = world.add_body(boxed(5.0, 0.0, 10.0, 10.0));
        let c = world.add_body(boxed(0.0, 5.0, 10.0, 10.0));

        let late_hits = Rc::new(Cell::new(0));
        let added = Rc::new(Cell::new(false));
        let (hits, flag) = (late_hits.clone(), added.clone());
        world
            .add_overlap(
                a,
                Some(b.into()),
                Callbacks::on_collide(move |world, _| {
                    if flag.get() {
                        return;
                    }
                    flag.set(true);
                    let hits = hits.clone();
                    world
                        .add_overlap(
                            a,
                            Some(c.into()),
                            Callbacks::on_collide(move |_, _| hits.set(hits.get() + 1)),
                        )
                        .unwrap();
                }),
            )
            .unwrap();

        world.update(0.0, 16.0);
        assert!(added.get());
        assert_eq!(late_hits.get(), 0);
        assert_eq!(world.active_colliders().len(), 1);

        world.update(16.0, 16.0);
        assert_eq!(late_hits.get(), 1);
        assert_eq!(world.active_colliders().len(), 2);
    }

    #[test]
    fn test_collider_removed_from_own_callback() {
        let mut world = World::default();
        let a = world.add_body(boxed(0.0, 0.0, 10.0, 10.0));
        let b = world.add_body(boxed(5.0, 0.0, 10.0, 10.0));

        let count = Rc::new(Cell::new(0));
        let own_handle: Rc<Cell<Option<ColliderHandle>>> = Rc::new(Cell::new(None));
        let (hits, slot) = (count.clone(), own_handle.clone());
        let handle = world
            .add_overlap(
                a,
                Some(b.into()),
                Callbacks::on_collide(move |world, _| {
                    hits.set(hits.get() + 1);
                    if let Some(handle) = slot.get() {
                        world.remove_collider(handle).unwrap();
                    }
                }),
            )
            .unwrap();
        own_handle.set(Some(handle));

        world.update(0.0, 16.0);
        assert_eq!(count.get(), 1);
        assert!(world.collider(handle).is_some());

        world.update(16.0, 16.0);
        assert_eq!(count.get(), 1);
        assert!(world.collider(handle).is_none());
        assert!(world.active_colliders().is_empty());
        assert!(matches!(
            world.remove_collider(handle),
            Err(PhysicsError::UnknownCollider)
        ));
    }

    #[test]
    fn test_destroy_during_group_iteration() {
        let mut world = World::default();
        let player = world.add_body(boxed(0.0, 0.0, 30.0, 30.0));
        let coins = world.create_group(BodyKind::Dynamic);
        for offset in [5.0, 12.0, 20.0] {
            let coin = world.add_body(boxed(offset, offset, 5.0, 5.0));
            world.add_to_group(coins, coin).unwrap();
        }

        let collected = Rc::new(Cell::new(0));
        let tally = collected.clone();
        world
            .add_overlap(
                player,
                Some(coins.into()),
                Callbacks::on_collide(move |world, contact| {
                    if let Contact::Bodies { body2, .. } = contact {
                        world.destroy_body(*body2).unwrap();
                        tally.set(tally.get() + 1);
                    }
                }),
            )
            .unwrap();

        world.update(0.0, 16.0);
        assert_eq!(collected.get(), 3);
        assert_eq!(world.group(coins).unwrap().len(), 3);

        world.post_update(&mut ());
        assert_eq!(collected.get(), 3);
        assert!(world.group(coins).unwrap().is_empty());
        assert_eq!(world.body_count(), 1);

        world.update(16.0, 16.0);
        assert_eq!(collected.get(), 3);
    }

    #[test]
    fn test_category_mask_filter() {
        let mut world = World::default();
        let a = world.add_body(
            BodyBuilder::new_dynamic()
                .position(0.0, 0.0)
                .size(10.0, 10.0)
                .collision_category(0b01, 0b01)
                .build(),
        );
        let b = world.add_body(
            BodyBuilder::new_dynamic()
                .position(5.0, 0.0)
                .size(10.0, 10.0)
                .collision_category(0b10, u32::MAX)
                .build(),
        );

        assert!(!world.overlap(a, Some(b.into()), Callbacks::none()));

        world.body_mut(a).unwrap().collision_mask = 0b11;
        assert!(world.overlap(a, Some(b.into()), Callbacks::none()));
    }

    #[test]
    fn test_disable_and_reattach() {
        let mut world = World::default();
        let player = world.add_body(boxed(0.0, 0.0, 10.0, 10.0));
        let group = world.create_group(BodyKind::Dynamic);
        let other = world.add_body(boxed(5.0, 0.0, 10.0, 10.0));
        world.add_to_group(group, other).unwrap();

        world.disable_body(other).unwrap();
        assert!(!world.overlap(player, Some(group.into()), Callbacks::none()));

        world.add(other).unwrap();
        assert!(world.overlap(player, Some(group.into()), Callbacks::none()));
    }

    #[test]
    fn test_static_edit_visible_before_next_step() {
        let mut world = World::default();
        let platforms = world.create_group(BodyKind::Static);
        let platform = world.add_body(
            BodyBuilder::new_static()
                .position(0.0, 0.0)
                .size(10.0, 10.0)
                .build(),
        );
        world.add_to_group(platforms, platform).unwrap();
        let probe = world.add_body(boxed(100.0, 100.0, 10.0, 10.0));

        assert!(!world.overlap(probe, Some(platforms.into()), Callbacks::none()));

        {
            let mut body = world.static_body_mut(platform).unwrap();
            body.position = glam::Vec2::new(95.0, 95.0);
        }
        assert!(world.overlap(probe, Some(platforms.into()), Callbacks::none()));
    }

    #[test]
    fn test_unsupported_pairs_rejected() {
        let mut world = World::default();
        let body = world.add_body(boxed(0.0, 0.0, 10.0, 10.0));
        let layer = world.add_tile_layer(GridLayer::new(4, 4, 16.0, 16.0));

        assert!(matches!(
            world.add_collider(layer, Some(layer.into()), Callbacks::none()),
            Err(PhysicsError::UnsupportedPair(_))
        ));
        assert!(matches!(
            world.add_collider(body, None, Callbacks::none()),
            Err(PhysicsError::UnsupportedPair(_))
        ));
        assert!(!world.collide(layer, None, Callbacks::none()));
        assert!(world.active_colliders().is_empty());
    }

    #[test]
    fn test_body_lands_on_tile_layer() {
        let config = WorldConfig::default().with_gravity(0.0, 600.0);
        let mut world = World::new(config).unwrap();

        let mut ground =
            GridLayer::from_rows(&[vec![1, 1, 1, 1]], 32.0, 32.0).with_origin(0.0, 500.0);
        ground.set_collision(&[1], true);
        let layer = world.add_tile_layer(ground);

        let body = world.add_body(
            BodyBuilder::new_dynamic()
                .position(20.0, 400.0)
                .size(32.0, 32.0)
                .events(true, false, false)
                .build(),
        );
        world.add_collider(body, Some(layer.into()), Callbacks::none()).unwrap();

        let mut landed = false;
        for frame in 0..90 {
            world.update(frame as f32 * 16.0, 16.0);
            landed |= world
                .drain_events()
                .iter()
                .any(|event| matches!(event, PhysicsEvent::TileCollide { .. }));
        }

        let body = world.body(body).unwrap();
        assert!(landed);
        assert!(body.blocked.down);
        assert_relative_eq!(body.bottom(), 500.0, epsilon = 0.01);
        assert!(body.velocity.y.abs() < 1e-3);
    }

    #[test]
    fn test_loose_tiles_collide_on_every_face() {
        let mut world = World::default();
        let body = world.add_body(
            BodyBuilder::new_dynamic()
                .position(0.0, 0.0)
                .size(16.0, 16.0)
                .velocity(0.0, 100.0)
                .build(),
        );
        world.update(0.0, 100.0);

        let tile = Tile::solid(1, 0, 0, Rect::new(0.0, 20.0, 16.0, 16.0));
        assert!(world.collide_tiles(body, &[tile], Callbacks::none()));
        assert_relative_eq!(world.body(body).unwrap().bottom(), 20.0, epsilon = 1e-4);

        assert!(!world.overlap_tiles(body, &[tile], Callbacks::none()));
    }
}
