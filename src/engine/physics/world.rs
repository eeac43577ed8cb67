// Physics world: owns bodies, colliders and the spatial indices, and runs
// the per-frame step

use glam::Vec2;
use log::{debug, info, warn};
use slotmap::SlotMap;
use std::collections::HashMap;

use super::body::{Body, BodyHandle, BodyKey, BodyKind};
use super::collider::{Callbacks, Collider, ColliderHandle, CollisionTarget};
use super::collision::{CollisionCache, CollisionInfo, EventQueue, PhysicsEvent};
use super::config::WorldConfig;
use super::debug::DebugRenderer;
use super::error::PhysicsError;
use super::flags::DirectionFlags;
use super::group::{Group, GroupHandle};
use super::motion::StepContext;
use super::object::{GameObjectId, GameObjects, Transform};
use super::process_queue::ProcessQueue;
use super::static_body::{sync_static_index, StaticBodyMut};
use super::tilemap::{Tile, TileLayer, TileLayerHandle};
use super::tree::RTree;
use crate::core::geom::Rect;
use crate::core::math::wrap;

/// Frame time used by [`World::single_step`], in milliseconds
pub const SINGLE_STEP_MS: f32 = 1000.0 / 60.0;

/// Arcade physics world.
///
/// A frame is `update` followed by `post_update`. `update` integrates every
/// enabled dynamic body, rebuilds the dynamic tree, applies deferred collider
/// changes and runs the active colliders; `post_update` reports each body's
/// displacement to its owner and reaps destroyed bodies.
pub struct World {
    pub(super) config: WorldConfig,

    pub(super) bodies: SlotMap<BodyKey, Body>,
    pub(super) static_bodies: SlotMap<BodyKey, Body>,

    /// Dynamic index, bulk-loaded once per step
    pub(super) tree: RTree<BodyHandle>,
    /// Static index, patched eagerly on every edit
    pub(super) static_tree: RTree<BodyHandle>,

    pub(super) colliders: SlotMap<ColliderHandle, Collider>,
    pub(super) queue: ProcessQueue<ColliderHandle>,
    pub(super) groups: SlotMap<GroupHandle, Group>,
    pub(super) tile_layers: SlotMap<TileLayerHandle, Box<dyn TileLayer>>,

    /// Owning object to body, for `enable_body`
    objects: HashMap<GameObjectId, BodyHandle>,
    pending_destroy: Vec<BodyHandle>,

    pub(super) cache: CollisionCache,
    pub(super) events: EventQueue,
    debug_renderer: DebugRenderer,

    /// Seconds simulated by the last step
    last_delta: f32,
    time: f32,
    steps_last_frame: u32,
}

impl World {
    /// Create a world from a validated config
    pub fn new(config: WorldConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: WorldConfig) -> Self {
        let max_entries = config.effective_max_entries();
        let mut debug_renderer = DebugRenderer::new();
        debug_renderer.set_enabled(config.debug);

        info!(
            "Physics world created: gravity ({}, {}), bounds {:?}",
            config.gravity.x, config.gravity.y, config.bounds
        );

        Self {
            config,
            bodies: SlotMap::with_key(),
            static_bodies: SlotMap::with_key(),
            tree: RTree::new(max_entries),
            static_tree: RTree::new(max_entries),
            colliders: SlotMap::with_key(),
            queue: ProcessQueue::new(),
            groups: SlotMap::with_key(),
            tile_layers: SlotMap::with_key(),
            objects: HashMap::new(),
            pending_destroy: Vec::new(),
            cache: CollisionCache::new(),
            events: EventQueue::new(),
            debug_renderer,
            last_delta: 0.0,
            time: 0.0,
            steps_last_frame: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.config.gravity = Vec2::new(x, y);
    }

    pub fn bounds(&self) -> Rect {
        self.config.bounds
    }

    /// Replace the world bounds and which of their edges block bodies
    #[allow(clippy::too_many_arguments)]
    pub fn set_bounds(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        check_left: bool,
        check_right: bool,
        check_up: bool,
        check_down: bool,
    ) {
        self.config.bounds = Rect::new(x, y, width, height);
        self.set_bounds_collision(check_left, check_right, check_up, check_down);
    }

    pub fn set_bounds_collision(&mut self, left: bool, right: bool, up: bool, down: bool) {
        self.config.check_collision = DirectionFlags::new(up, down, left, right);
    }

    pub fn set_time_scale(&mut self, time_scale: f32) -> Result<(), PhysicsError> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "timeScale must be positive, got {}",
                time_scale
            )));
        }
        self.config.time_scale = time_scale;
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.config.is_paused
    }

    pub fn pause(&mut self) {
        if !self.config.is_paused {
            self.config.is_paused = true;
            self.events.push(PhysicsEvent::Pause);
            info!("Physics paused");
        }
    }

    pub fn resume(&mut self) {
        if self.config.is_paused {
            self.config.is_paused = false;
            self.events.push(PhysicsEvent::Resume);
            info!("Physics resumed");
        }
    }

    /// Time passed to the last `update`, in milliseconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Steps taken by the last `update` (0 or 1)
    pub fn steps_last_frame(&self) -> u32 {
        self.steps_last_frame
    }

    /// Values every phase of a step reads
    pub(super) fn step_context(&self) -> StepContext {
        StepContext {
            delta: self.last_delta,
            gravity: self.config.gravity,
            bounds: self.config.bounds,
            check_collision: self.config.check_collision,
            overlap_bias: self.config.overlap_bias,
            tile_bias: self.config.tile_bias,
            force_x: self.config.force_x,
        }
    }

    // ---- bodies ----

    /// Insert a body and start simulating it
    pub fn add_body(&mut self, mut body: Body) -> BodyHandle {
        let kind = body.kind();
        let object = body.game_object;
        body.enable = true;

        let handle = match kind {
            BodyKind::Dynamic => {
                let aabb = body.aabb();
                let handle = BodyHandle {
                    key: self.bodies.insert(body),
                    kind,
                };
                // visible to queries before the first step
                if aabb.is_finite() {
                    self.tree.insert(handle, aabb);
                }
                handle
            }
            BodyKind::Static => {
                let key = self.static_bodies.insert(body);
                let handle = BodyHandle { key, kind };
                if let Some(body) = self.static_bodies.get_mut(key) {
                    sync_static_index(handle, body, &mut self.static_tree);
                }
                handle
            }
        };

        if let Some(id) = object {
            if let Some(previous) = self.objects.insert(id, handle) {
                warn!("Game object {:?} already had body {:?}, replaced", id, previous);
            }
        }

        debug!("Added {:?} body {:?}", kind, handle);
        handle
    }

    /// Give a game object a body, or reinstate the one it already has
    pub fn enable_body(
        &mut self,
        id: GameObjectId,
        transform: &Transform,
        kind: BodyKind,
    ) -> BodyHandle {
        if let Some(&handle) = self.objects.get(&id) {
            if !self.pending_destroy.contains(&handle) {
                if let Some(body) = self.body_any_mut(handle) {
                    body.update_from_transform(transform);
                    if self.add(handle).is_ok() {
                        return handle;
                    }
                }
            }
        }

        self.add_body(Body::from_transform(kind, id, transform))
    }

    /// Put a detached body back into the simulation
    pub fn add(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        if self.pending_destroy.contains(&handle) {
            return Err(PhysicsError::StaleHandle);
        }

        match handle.kind {
            BodyKind::Dynamic => {
                let body = self
                    .bodies
                    .get_mut(handle.key)
                    .ok_or(PhysicsError::StaleHandle)?;
                body.enable = true;
                let aabb = body.aabb();
                self.tree.remove(&handle, None);
                if aabb.is_finite() {
                    self.tree.insert(handle, aabb);
                }
            }
            BodyKind::Static => {
                let body = self
                    .static_bodies
                    .get_mut(handle.key)
                    .ok_or(PhysicsError::StaleHandle)?;
                body.enable = true;
                sync_static_index(handle, body, &mut self.static_tree);
            }
        }

        debug!("Enabled body {:?}", handle);
        Ok(())
    }

    /// Detach a body from the simulation and the trees, keeping it alive
    pub fn disable_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        match handle.kind {
            BodyKind::Dynamic => {
                let body = self
                    .bodies
                    .get_mut(handle.key)
                    .ok_or(PhysicsError::StaleHandle)?;
                body.enable = false;
                self.tree.remove(&handle, None);
            }
            BodyKind::Static => {
                let body = self
                    .static_bodies
                    .get_mut(handle.key)
                    .ok_or(PhysicsError::StaleHandle)?;
                body.enable = false;
                sync_static_index(handle, body, &mut self.static_tree);
            }
        }

        debug!("Disabled body {:?}", handle);
        Ok(())
    }

    /// Schedule a body for removal. It stops colliding at once and is
    /// reaped at the next `post_update` or `update`, never mid-iteration.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        if self.pending_destroy.contains(&handle) {
            return Ok(());
        }

        let body = self
            .body_any_mut(handle)
            .ok_or(PhysicsError::StaleHandle)?;
        body.enable = false;
        self.pending_destroy.push(handle);

        debug!("Body {:?} scheduled for destruction", handle);
        Ok(())
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        body_ref(&self.bodies, &self.static_bodies, handle)
    }

    /// Mutable access to a dynamic body. Static bodies go through
    /// [`World::static_body_mut`] so their index stays current.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        match handle.kind {
            BodyKind::Dynamic => self.bodies.get_mut(handle.key),
            BodyKind::Static => None,
        }
    }

    /// Edit a static body; the static tree is updated when the guard drops
    pub fn static_body_mut(
        &mut self,
        handle: BodyHandle,
    ) -> Result<StaticBodyMut<'_>, PhysicsError> {
        if !handle.is_static() {
            return Err(PhysicsError::WrongBodyKind {
                expected: BodyKind::Static,
                actual: handle.kind,
            });
        }
        let body = self
            .static_bodies
            .get_mut(handle.key)
            .ok_or(PhysicsError::StaleHandle)?;
        Ok(StaticBodyMut::new(handle, body, &mut self.static_tree))
    }

    /// Re-read a static body's position and size from its owner's transform
    pub fn refresh_static_body(
        &mut self,
        handle: BodyHandle,
        transform: &Transform,
    ) -> Result<(), PhysicsError> {
        let mut body = self.static_body_mut(handle)?;
        body.update_from_transform(transform);
        Ok(())
    }

    pub fn body_of(&self, id: GameObjectId) -> Option<BodyHandle> {
        self.objects.get(&id).copied()
    }

    /// Dynamic bodies in slot order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter().map(|(key, body)| {
            (
                BodyHandle {
                    key,
                    kind: BodyKind::Dynamic,
                },
                body,
            )
        })
    }

    pub fn static_bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.static_bodies.iter().map(|(key, body)| {
            (
                BodyHandle {
                    key,
                    kind: BodyKind::Static,
                },
                body,
            )
        })
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn static_body_count(&self) -> usize {
        self.static_bodies.len()
    }

    pub(super) fn body_any_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        match handle.kind {
            BodyKind::Dynamic => self.bodies.get_mut(handle.key),
            BodyKind::Static => self.static_bodies.get_mut(handle.key),
        }
    }

    pub(super) fn contains_body(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some() && !self.pending_destroy.contains(&handle)
    }

    /// Wrap bodies around the world bounds, extended by `padding`
    pub fn wrap(
        &mut self,
        target: impl Into<CollisionTarget>,
        padding: f32,
    ) -> Result<(), PhysicsError> {
        let handles = match target.into() {
            CollisionTarget::Body(handle) => vec![handle],
            CollisionTarget::Bodies(handles) => handles,
            CollisionTarget::Group(group) => self
                .groups
                .get(group)
                .ok_or(PhysicsError::UnknownGroup)?
                .members()
                .to_vec(),
            CollisionTarget::TileLayer(_) => {
                return Err(PhysicsError::UnsupportedPair(
                    "a tile layer cannot be wrapped".to_string(),
                ))
            }
        };

        let bounds = self.config.bounds;
        let wrapped = |position: Vec2| {
            Vec2::new(
                wrap(position.x, bounds.left() - padding, bounds.right() + padding),
                wrap(position.y, bounds.top() - padding, bounds.bottom() + padding),
            )
        };

        for handle in handles {
            match handle.kind {
                BodyKind::Dynamic => {
                    let body = self
                        .bodies
                        .get_mut(handle.key)
                        .ok_or(PhysicsError::StaleHandle)?;
                    body.position = wrapped(body.position);
                }
                BodyKind::Static => {
                    let mut body = self.static_body_mut(handle)?;
                    body.position = wrapped(body.position);
                }
            }
        }
        Ok(())
    }

    // ---- groups and tile layers ----

    pub fn create_group(&mut self, kind: BodyKind) -> GroupHandle {
        self.groups.insert(Group::new(kind))
    }

    pub fn add_to_group(
        &mut self,
        group: GroupHandle,
        body: BodyHandle,
    ) -> Result<(), PhysicsError> {
        if !self.contains_body(body) {
            return Err(PhysicsError::StaleHandle);
        }
        self.groups
            .get_mut(group)
            .ok_or(PhysicsError::UnknownGroup)?
            .add(body)?;
        Ok(())
    }

    pub fn remove_from_group(
        &mut self,
        group: GroupHandle,
        body: BodyHandle,
    ) -> Result<bool, PhysicsError> {
        Ok(self
            .groups
            .get_mut(group)
            .ok_or(PhysicsError::UnknownGroup)?
            .remove(&body))
    }

    pub fn group(&self, group: GroupHandle) -> Option<&Group> {
        self.groups.get(group)
    }

    /// Drop a group; colliders that name it stop matching anything
    pub fn destroy_group(&mut self, group: GroupHandle) -> Result<(), PhysicsError> {
        self.groups
            .remove(group)
            .map(|_| ())
            .ok_or(PhysicsError::UnknownGroup)
    }

    pub fn add_tile_layer(&mut self, layer: impl TileLayer + 'static) -> TileLayerHandle {
        self.tile_layers.insert(Box::new(layer))
    }

    pub fn tile_layer(&self, layer: TileLayerHandle) -> Option<&dyn TileLayer> {
        self.tile_layers.get(layer).map(|layer| layer.as_ref())
    }

    pub fn remove_tile_layer(&mut self, layer: TileLayerHandle) -> Result<(), PhysicsError> {
        self.tile_layers
            .remove(layer)
            .map(|_| ())
            .ok_or(PhysicsError::UnknownTileLayer)
    }

    // ---- colliders ----

    /// Register a standing collide check, active from the next step
    pub fn add_collider(
        &mut self,
        object1: impl Into<CollisionTarget>,
        object2: Option<CollisionTarget>,
        callbacks: Callbacks,
    ) -> Result<ColliderHandle, PhysicsError> {
        self.insert_collider(object1.into(), object2, callbacks, false)
    }

    /// Register a standing overlap check, active from the next step
    pub fn add_overlap(
        &mut self,
        object1: impl Into<CollisionTarget>,
        object2: Option<CollisionTarget>,
        callbacks: Callbacks,
    ) -> Result<ColliderHandle, PhysicsError> {
        self.insert_collider(object1.into(), object2, callbacks, true)
    }

    fn insert_collider(
        &mut self,
        object1: CollisionTarget,
        object2: Option<CollisionTarget>,
        callbacks: Callbacks,
        overlap_only: bool,
    ) -> Result<ColliderHandle, PhysicsError> {
        self.validate_pair(&object1, object2.as_ref())?;

        let collider = Collider::new(object1, object2, callbacks, overlap_only);
        let handle = self.colliders.insert(collider);
        self.queue.add(handle);

        debug!(
            "Added {} {:?}",
            if overlap_only { "overlap" } else { "collider" },
            handle
        );
        Ok(handle)
    }

    /// Schedule a collider for removal; safe from inside its own callback
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> Result<(), PhysicsError> {
        if !self.colliders.contains_key(handle) {
            return Err(PhysicsError::UnknownCollider);
        }
        if self.queue.remove(&handle) {
            debug!("Collider {:?} scheduled for removal", handle);
        }
        Ok(())
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    /// Colliders currently run each step
    pub fn active_colliders(&self) -> &[ColliderHandle] {
        self.queue.active()
    }

    /// One-shot collide check between two operands, or within one
    pub fn collide(
        &mut self,
        object1: impl Into<CollisionTarget>,
        object2: Option<CollisionTarget>,
        mut callbacks: Callbacks,
    ) -> bool {
        let object1 = object1.into();
        if let Err(err) = self.validate_pair(&object1, object2.as_ref()) {
            warn!("Collide check skipped: {}", err);
            return false;
        }
        self.collide_objects(&object1, object2.as_ref(), &mut callbacks, false)
    }

    /// One-shot overlap check; nothing is separated
    pub fn overlap(
        &mut self,
        object1: impl Into<CollisionTarget>,
        object2: Option<CollisionTarget>,
        mut callbacks: Callbacks,
    ) -> bool {
        let object1 = object1.into();
        if let Err(err) = self.validate_pair(&object1, object2.as_ref()) {
            warn!("Overlap check skipped: {}", err);
            return false;
        }
        self.collide_objects(&object1, object2.as_ref(), &mut callbacks, true)
    }

    /// Separate a body from loose tiles that did not come from a layer;
    /// every face of such a tile is solid
    pub fn collide_tiles(
        &mut self,
        body: BodyHandle,
        tiles: &[Tile],
        mut callbacks: Callbacks,
    ) -> bool {
        self.collide_body_vs_tiles(body, tiles, &mut callbacks, false, false) > 0
    }

    pub fn overlap_tiles(
        &mut self,
        body: BodyHandle,
        tiles: &[Tile],
        mut callbacks: Callbacks,
    ) -> bool {
        self.collide_body_vs_tiles(body, tiles, &mut callbacks, true, false) > 0
    }

    fn validate_target(&self, target: &CollisionTarget) -> Result<(), PhysicsError> {
        match target {
            CollisionTarget::Body(handle) => {
                if !self.contains_body(*handle) {
                    return Err(PhysicsError::StaleHandle);
                }
            }
            CollisionTarget::Bodies(handles) => {
                if handles.iter().any(|handle| !self.contains_body(*handle)) {
                    return Err(PhysicsError::StaleHandle);
                }
            }
            CollisionTarget::Group(group) => {
                if !self.groups.contains_key(*group) {
                    return Err(PhysicsError::UnknownGroup);
                }
            }
            CollisionTarget::TileLayer(layer) => {
                if !self.tile_layers.contains_key(*layer) {
                    return Err(PhysicsError::UnknownTileLayer);
                }
            }
        }
        Ok(())
    }

    fn validate_pair(
        &self,
        object1: &CollisionTarget,
        object2: Option<&CollisionTarget>,
    ) -> Result<(), PhysicsError> {
        self.validate_target(object1)?;
        if let Some(object2) = object2 {
            self.validate_target(object2)?;
        }

        match (object1, object2) {
            (CollisionTarget::Body(_), None) => Err(PhysicsError::UnsupportedPair(
                "a single body cannot collide with itself".to_string(),
            )),
            (CollisionTarget::TileLayer(_), None) => Err(PhysicsError::UnsupportedPair(
                "tile layer vs itself".to_string(),
            )),
            (a, Some(b)) if a.is_tile_layer() && b.is_tile_layer() => Err(
                PhysicsError::UnsupportedPair("tile layer vs tile layer".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Face, overlap and shares for a pair, without separating it
    pub fn collision_info(
        &mut self,
        body1: BodyHandle,
        body2: BodyHandle,
    ) -> Option<CollisionInfo> {
        let ctx = self.step_context();
        let b1 = body_ref(&self.bodies, &self.static_bodies, body1)?;
        let b2 = body_ref(&self.bodies, &self.static_bodies, body2)?;
        Some(self.cache.get_or_compute((body1, body2), b1, b2, &ctx))
    }

    // ---- stepping ----

    /// Advance the simulation. `time` and `delta` are in milliseconds; the
    /// step covers `delta / time_scale`. Does nothing while paused or when
    /// there are no dynamic bodies.
    pub fn update(&mut self, time: f32, delta: f32) {
        self.time = time;
        self.steps_last_frame = 0;

        if self.config.is_paused || self.bodies.is_empty() {
            return;
        }
        if !delta.is_finite() || delta < 0.0 {
            warn!("Ignoring frame with invalid delta {}", delta);
            return;
        }

        self.reap_pending();
        self.step(delta * 0.001 / self.config.time_scale);
        self.steps_last_frame = 1;
    }

    /// Advance exactly one 60 Hz step, even while paused
    pub fn single_step(&mut self) {
        if self.bodies.is_empty() {
            return;
        }
        self.reap_pending();
        self.step(SINGLE_STEP_MS * 0.001 / self.config.time_scale);
        self.steps_last_frame = 1;
    }

    /// One step of `delta` seconds: integrate, reindex, drain the collider
    /// queue, then run every active collider
    fn step(&mut self, delta: f32) {
        self.last_delta = delta;
        let ctx = self.step_context();
        self.cache.clear();

        for (_, body) in self.static_bodies.iter_mut() {
            body.reset_flags(false);
        }

        for (key, body) in self.bodies.iter_mut() {
            if !body.enable {
                continue;
            }
            body.reset_flags(false);
            if body.update(&ctx) {
                self.events.push(PhysicsEvent::WorldBounds {
                    body: BodyHandle {
                        key,
                        kind: BodyKind::Dynamic,
                    },
                    up: body.world_blocked.up,
                    down: body.world_blocked.down,
                    left: body.world_blocked.left,
                    right: body.world_blocked.right,
                });
            }
        }

        self.rebuild_tree();

        let active = self.queue.update().to_vec();
        for handle in self.queue.take_removed() {
            if let Some(collider) = self.colliders.remove(handle) {
                debug!("Collider {:?} '{}' removed", handle, collider.name);
            }
        }

        for handle in active {
            self.run_collider(handle);
        }

        self.events.push(PhysicsEvent::WorldStep { delta });
    }

    fn rebuild_tree(&mut self) {
        self.tree.clear();
        self.tree.load(
            self.bodies
                .iter()
                .filter(|(_, body)| body.enable)
                .map(|(key, body)| {
                    (
                        BodyHandle {
                            key,
                            kind: BodyKind::Dynamic,
                        },
                        body.aabb(),
                    )
                }),
        );
    }

    /// Finish the frame: move owners by their bodies' displacement, rebuild
    /// debug geometry and reap destroyed bodies
    pub fn post_update(&mut self, objects: &mut dyn GameObjects) {
        for (_, body) in self.bodies.iter_mut() {
            if !body.enable {
                continue;
            }
            let motion = body.post_update();
            if let Some(id) = body.game_object {
                if motion.delta != Vec2::ZERO {
                    objects.translate(id, motion.delta);
                }
                if motion.rotation != 0.0 {
                    objects.rotate(id, motion.rotation);
                }
            }
        }

        if self.debug_renderer.is_enabled() {
            let bodies = self
                .bodies
                .iter()
                .chain(self.static_bodies.iter())
                .map(|(_, body)| body);
            self.debug_renderer.prepare(bodies, &self.config);
        }

        self.reap_pending();
    }

    fn reap_pending(&mut self) {
        if self.pending_destroy.is_empty() {
            return;
        }

        for handle in std::mem::take(&mut self.pending_destroy) {
            let removed = match handle.kind {
                BodyKind::Dynamic => {
                    self.tree.remove(&handle, None);
                    self.bodies.remove(handle.key)
                }
                BodyKind::Static => {
                    let removed = self.static_bodies.remove(handle.key);
                    if let Some(aabb) = removed.as_ref().and_then(|body| body.indexed) {
                        self.static_tree.remove(&handle, Some(&aabb));
                    }
                    removed
                }
            };

            let Some(body) = removed else {
                continue;
            };

            if let Some(id) = body.game_object {
                if self.objects.get(&id) == Some(&handle) {
                    self.objects.remove(&id);
                }
            }
            for (_, group) in self.groups.iter_mut() {
                group.remove(&handle);
            }

            debug!("Reaped body {:?}", handle);
        }
    }

    // ---- events and debug ----

    pub fn events(&self) -> &[PhysicsEvent] {
        self.events.events()
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        self.events.drain()
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.config.debug = enabled;
        self.debug_renderer.set_enabled(enabled);
    }

    pub fn debug_renderer(&self) -> &DebugRenderer {
        &self.debug_renderer
    }

    /// Drop every body, collider, group and tile layer
    pub fn shutdown(&mut self) {
        self.queue.clear();
        self.queue.take_removed();
        self.colliders.clear();
        self.bodies.clear();
        self.static_bodies.clear();
        self.tree.clear();
        self.static_tree.clear();
        self.groups.clear();
        self.tile_layers.clear();
        self.objects.clear();
        self.pending_destroy.clear();
        self.cache.clear();
        self.events.clear();
        self.debug_renderer.clear();

        info!("Physics world shut down");
    }
}

impl Default for World {
    fn default() -> Self {
        Self::from_valid_config(WorldConfig::default())
    }
}

pub(super) fn body_ref<'a>(
    bodies: &'a SlotMap<BodyKey, Body>,
    static_bodies: &'a SlotMap<BodyKey, Body>,
    handle: BodyHandle,
) -> Option<&'a Body> {
    match handle.kind {
        BodyKind::Dynamic => bodies.get(handle.key),
        BodyKind::Static => static_bodies.get(handle.key),
    }
}

/// Both bodies of a pair, mutably. `None` for a stale handle or a body
/// paired with itself.
pub(super) fn body_pair_mut<'a>(
    bodies: &'a mut SlotMap<BodyKey, Body>,
    static_bodies: &'a mut SlotMap<BodyKey, Body>,
    handle1: BodyHandle,
    handle2: BodyHandle,
) -> Option<(&'a mut Body, &'a mut Body)> {
    match (handle1.kind, handle2.kind) {
        (BodyKind::Dynamic, BodyKind::Dynamic) => bodies
            .get_disjoint_mut([handle1.key, handle2.key])
            .map(|[first, second]| (first, second)),
        (BodyKind::Static, BodyKind::Static) => static_bodies
            .get_disjoint_mut([handle1.key, handle2.key])
            .map(|[first, second]| (first, second)),
        (BodyKind::Dynamic, BodyKind::Static) => Some((
            bodies.get_mut(handle1.key)?,
            static_bodies.get_mut(handle2.key)?,
        )),
        (BodyKind::Static, BodyKind::Dynamic) => Some((
            static_bodies.get_mut(handle1.key)?,
            bodies.get_mut(handle2.key)?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::BodyBuilder;
    use approx::assert_relative_eq;

    fn mover(x: f32, y: f32, vx: f32, vy: f32) -> Body {
        BodyBuilder::new_dynamic()
            .position(x, y)
            .size(10.0, 10.0)
            .velocity(vx, vy)
            .build()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = WorldConfig::default();
        config.time_scale = 0.0;
        assert!(World::new(config).is_err());

        let mut world = World::default();
        assert!(world.set_time_scale(-1.0).is_err());
        assert!(world.set_time_scale(2.0).is_ok());
    }

    #[test]
    fn test_update_integrates_and_reports_step() {
        let mut world = World::default();
        let handle = world.add_body(mover(0.0, 0.0, 100.0, 0.0));

        world.update(100.0, 100.0);

        assert_relative_eq!(world.body(handle).unwrap().position.x, 10.0, epsilon = 1e-4);
        assert_eq!(world.steps_last_frame(), 1);
        assert_eq!(world.time(), 100.0);
        assert!(matches!(
            world.events().last(),
            Some(PhysicsEvent::WorldStep { .. })
        ));
    }

    #[test]
    fn test_time_scale_slows_step() {
        let mut world = World::default();
        let handle = world.add_body(mover(0.0, 0.0, 100.0, 0.0));
        world.set_time_scale(2.0).unwrap();

        world.update(0.0, 100.0);
        assert_relative_eq!(world.body(handle).unwrap().position.x, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut world = World::default();
        let handle = world.add_body(mover(0.0, 0.0, 100.0, 0.0));

        world.pause();
        world.pause();
        world.update(0.0, 100.0);
        assert_eq!(world.body(handle).unwrap().position.x, 0.0);
        assert_eq!(world.steps_last_frame(), 0);

        world.single_step();
        assert!(world.body(handle).unwrap().position.x > 0.0);

        world.resume();
        let events = world.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, PhysicsEvent::Pause))
                .count(),
            1
        );
        assert!(matches!(events.last(), Some(PhysicsEvent::Resume)));
    }

    #[test]
    fn test_invalid_delta_skipped() {
        let mut world = World::default();
        let handle = world.add_body(mover(0.0, 0.0, 100.0, 0.0));

        world.update(0.0, f32::NAN);
        world.update(0.0, -16.0);
        assert_eq!(world.body(handle).unwrap().position.x, 0.0);
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_world_bounds_event() {
        let mut world = World::default();
        let handle = world.add_body(
            BodyBuilder::new_dynamic()
                .position(1.0, 100.0)
                .size(10.0, 10.0)
                .velocity(-100.0, 0.0)
                .collide_world_bounds(true)
                .events(false, false, true)
                .build(),
        );

        world.update(0.0, 100.0);

        let body = world.body(handle).unwrap();
        assert_eq!(body.position.x, 0.0);
        assert!(body.world_blocked.left && body.blocked.left);
        assert!(world.events().iter().any(|event| matches!(
            event,
            PhysicsEvent::WorldBounds { body, left: true, .. } if *body == handle
        )));
    }

    #[test]
    fn test_bounds_collision_sides() {
        let mut world = World::default();
        world.set_bounds_collision(false, true, true, true);
        let handle = world.add_body(
            BodyBuilder::new_dynamic()
                .position(1.0, 100.0)
                .size(10.0, 10.0)
                .velocity(-100.0, 0.0)
                .collide_world_bounds(true)
                .build(),
        );

        world.update(0.0, 100.0);
        assert_relative_eq!(world.body(handle).unwrap().position.x, -9.0, epsilon = 1e-4);
    }

    #[test]
    fn test_post_update_moves_owner() {
        let mut world = World::default();
        let id = GameObjectId(7);
        let transform = Transform::new(50.0, 50.0, 20.0, 20.0);
        let mut objects = HashMap::from([(id, transform)]);

        let handle = world.enable_body(id, &transform, BodyKind::Dynamic);
        assert_relative_eq!(world.body(handle).unwrap().position.x, 40.0);
        world.body_mut(handle).unwrap().velocity = Vec2::new(60.0, 0.0);

        world.update(0.0, 100.0);
        world.post_update(&mut objects);

        assert_relative_eq!(objects[&id].x, 56.0, epsilon = 1e-4);
        assert_relative_eq!(objects[&id].y, 50.0);
    }

    #[test]
    fn test_enable_body_reuses_existing_body() {
        let mut world = World::default();
        let id = GameObjectId(1);
        let transform = Transform::new(50.0, 50.0, 20.0, 20.0);

        let first = world.enable_body(id, &transform, BodyKind::Dynamic);
        world.disable_body(first).unwrap();
        assert!(!world.body(first).unwrap().enable);

        let moved = Transform::new(100.0, 50.0, 20.0, 20.0);
        let second = world.enable_body(id, &moved, BodyKind::Dynamic);
        assert_eq!(first, second);
        assert!(world.body(second).unwrap().enable);
        assert_relative_eq!(world.body(second).unwrap().position.x, 90.0);
        assert_eq!(world.body_of(id), Some(first));
    }

    #[test]
    fn test_destroy_is_deferred_and_idempotent() {
        let mut world = World::default();
        let id = GameObjectId(3);
        let handle = world.add_body(
            BodyBuilder::new_dynamic()
                .size(10.0, 10.0)
                .game_object(id)
                .build(),
        );

        world.destroy_body(handle).unwrap();
        world.destroy_body(handle).unwrap();
        assert!(!world.body(handle).unwrap().enable);
        assert!(world.add(handle).is_err());

        world.post_update(&mut ());
        assert!(world.body(handle).is_none());
        assert_eq!(world.body_of(id), None);
        assert!(matches!(
            world.destroy_body(handle),
            Err(PhysicsError::StaleHandle)
        ));
    }

    #[test]
    fn test_reused_slot_rejects_old_handle() {
        let mut world = World::default();
        let old = world.add_body(mover(0.0, 0.0, 0.0, 0.0));
        world.destroy_body(old).unwrap();
        world.post_update(&mut ());

        let new = world.add_body(mover(50.0, 0.0, 0.0, 0.0));
        assert_ne!(old, new);
        assert!(world.body(old).is_none());
        assert!(world.body_mut(old).is_none());
        assert_relative_eq!(world.body(new).unwrap().position.x, 50.0);

        let group = world.create_group(BodyKind::Dynamic);
        world.destroy_group(group).unwrap();
        let other = world.create_group(BodyKind::Dynamic);
        assert!(world.group(group).is_none());
        assert!(world.group(other).is_some());
        assert!(world.add_to_group(group, new).is_err());
    }

    #[test]
    fn test_body_pair_mut_rejects_same_body() {
        let mut world = World::default();
        let a = world.add_body(mover(0.0, 0.0, 0.0, 0.0));
        let b = world.add_body(mover(20.0, 0.0, 0.0, 0.0));

        assert!(body_pair_mut(&mut world.bodies, &mut world.static_bodies, a, a).is_none());
        let (first, second) =
            body_pair_mut(&mut world.bodies, &mut world.static_bodies, b, a).unwrap();
        assert_relative_eq!(first.position.x, 20.0);
        assert_relative_eq!(second.position.x, 0.0);
    }

    #[test]
    fn test_static_body_guard() {
        let mut world = World::default();
        let dynamic = world.add_body(mover(0.0, 0.0, 0.0, 0.0));
        let platform = world.add_body(
            BodyBuilder::new_static()
                .position(0.0, 100.0)
                .size(50.0, 10.0)
                .build(),
        );

        assert!(world.body_mut(platform).is_none());
        assert!(matches!(
            world.static_body_mut(dynamic),
            Err(PhysicsError::WrongBodyKind { .. })
        ));

        world
            .refresh_static_body(platform, &Transform::new(200.0, 200.0, 40.0, 20.0))
            .unwrap();
        let body = world.body(platform).unwrap();
        assert_relative_eq!(body.position.x, 180.0);
        assert_relative_eq!(body.width(), 40.0);
    }

    #[test]
    fn test_wrap_bodies() {
        let mut world = World::default();
        let a = world.add_body(mover(-50.0, 10.0, 0.0, 0.0));
        let b = world.add_body(mover(820.0, 610.0, 0.0, 0.0));

        world.wrap(vec![a, b], 0.0).unwrap();

        assert_relative_eq!(world.body(a).unwrap().position.x, 750.0);
        assert_relative_eq!(world.body(b).unwrap().position.x, 20.0);
        assert_relative_eq!(world.body(b).unwrap().position.y, 10.0);
    }

    #[test]
    fn test_wrap_group_with_padding() {
        let mut world = World::default();
        let group = world.create_group(BodyKind::Dynamic);
        let a = world.add_body(mover(-20.0, 10.0, 0.0, 0.0));
        world.add_to_group(group, a).unwrap();

        world.wrap(group, 10.0).unwrap();
        assert_relative_eq!(world.body(a).unwrap().position.x, 800.0);
    }

    #[test]
    fn test_group_kind_enforced() {
        let mut world = World::default();
        let group = world.create_group(BodyKind::Static);
        let body = world.add_body(mover(0.0, 0.0, 0.0, 0.0));

        assert!(matches!(
            world.add_to_group(group, body),
            Err(PhysicsError::WrongBodyKind { .. })
        ));
    }

    #[test]
    fn test_debug_geometry_after_post_update() {
        let mut world = World::default();
        world.add_body(mover(0.0, 0.0, 10.0, 0.0));
        world.add_body(
            BodyBuilder::new_static()
                .position(0.0, 100.0)
                .size(50.0, 10.0)
                .build(),
        );

        world.post_update(&mut ());
        assert_eq!(world.debug_renderer().line_count(), 0);

        world.set_debug(true);
        world.post_update(&mut ());
        // two box outlines and one velocity line
        assert_eq!(world.debug_renderer().line_count(), 9);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let mut world = World::default();
        let a = world.add_body(mover(0.0, 0.0, 0.0, 0.0));
        let b = world.add_body(mover(5.0, 0.0, 0.0, 0.0));
        world.add_collider(a, Some(b.into()), Callbacks::none()).unwrap();

        world.shutdown();

        assert_eq!(world.body_count(), 0);
        assert!(world.active_colliders().is_empty());
        assert!(world.body(a).is_none());
    }
}
