// Scoped editing of static bodies

use std::ops::{Deref, DerefMut};

use super::body::{Body, BodyHandle};
use super::tree::RTree;

/// Mutable access to a static body.
///
/// Static bodies are indexed eagerly rather than rebuilt every step, so any
/// edit must be reflected in the static tree before the next query. The guard
/// does that when it drops: it re-pins the static fields, then reinserts the
/// body if its bounds or enable state changed.
pub struct StaticBodyMut<'a> {
    handle: BodyHandle,
    body: &'a mut Body,
    tree: &'a mut RTree<BodyHandle>,
}

impl<'a> StaticBodyMut<'a> {
    pub(crate) fn new(
        handle: BodyHandle,
        body: &'a mut Body,
        tree: &'a mut RTree<BodyHandle>,
    ) -> Self {
        Self { handle, body, tree }
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }
}

impl Deref for StaticBodyMut<'_> {
    type Target = Body;

    fn deref(&self) -> &Body {
        self.body
    }
}

impl DerefMut for StaticBodyMut<'_> {
    fn deref_mut(&mut self) -> &mut Body {
        self.body
    }
}

impl Drop for StaticBodyMut<'_> {
    fn drop(&mut self) {
        sync_static_index(self.handle, self.body, self.tree);
    }
}

/// Bring a static body's tree entry in line with its current state.
/// Disabled bodies and bodies with non-finite bounds are left out.
pub(crate) fn sync_static_index(
    handle: BodyHandle,
    body: &mut Body,
    tree: &mut RTree<BodyHandle>,
) {
    body.enforce_static();

    let wanted = if body.enable {
        let aabb = body.aabb();
        if aabb.is_finite() {
            Some(aabb)
        } else {
            log::warn!("Static body {:?} has non-finite bounds, not indexed", handle);
            None
        }
    } else {
        None
    };

    if wanted == body.indexed {
        return;
    }

    if let Some(old) = body.indexed.take() {
        tree.remove(&handle, Some(&old));
    }
    if let Some(aabb) = wanted {
        tree.insert(handle, aabb);
        body.indexed = Some(aabb);
    }
}
