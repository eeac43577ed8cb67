// Collections of bodies used as one collision operand

use slotmap::new_key_type;
use std::collections::HashSet;

use super::body::{BodyHandle, BodyKind};
use super::error::PhysicsError;

new_key_type! {
    /// Handle to a group owned by a [`World`](super::World)
    pub struct GroupHandle;
}

/// Ordered set of bodies that all share one kind, so group dispatch knows
/// which spatial index to prune through.
#[derive(Debug, Clone)]
pub struct Group {
    kind: BodyKind,
    members: Vec<BodyHandle>,
    lookup: HashSet<BodyHandle>,
}

impl Group {
    pub(crate) fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            members: Vec::new(),
            lookup: HashSet::new(),
        }
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Members in insertion order
    pub fn members(&self) -> &[BodyHandle] {
        &self.members
    }

    pub fn contains(&self, body: &BodyHandle) -> bool {
        self.lookup.contains(body)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns false when the body was already a member
    pub(crate) fn add(&mut self, body: BodyHandle) -> Result<bool, PhysicsError> {
        if body.kind != self.kind {
            return Err(PhysicsError::WrongBodyKind {
                expected: self.kind,
                actual: body.kind,
            });
        }
        if !self.lookup.insert(body) {
            return Ok(false);
        }
        self.members.push(body);
        Ok(true)
    }

    pub(crate) fn remove(&mut self, body: &BodyHandle) -> bool {
        if !self.lookup.remove(body) {
            return false;
        }
        self.members.retain(|member| member != body);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::BodyKey;
    use slotmap::SlotMap;

    fn handles(count: usize, kind: BodyKind) -> Vec<BodyHandle> {
        let mut keys = SlotMap::<BodyKey, ()>::with_key();
        (0..count)
            .map(|_| BodyHandle {
                key: keys.insert(()),
                kind,
            })
            .collect()
    }

    #[test]
    fn test_add_keeps_order_and_rejects_duplicates() {
        let mut group = Group::new(BodyKind::Dynamic);
        let bodies = handles(2, BodyKind::Dynamic);
        let (a, b) = (bodies[1], bodies[0]);

        assert!(group.add(a).unwrap());
        assert!(group.add(b).unwrap());
        assert!(!group.add(a).unwrap());

        assert_eq!(group.members(), &[a, b]);
        assert!(group.contains(&b));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut group = Group::new(BodyKind::Static);
        let err = group.add(handles(1, BodyKind::Dynamic)[0]).unwrap_err();
        assert!(matches!(
            err,
            PhysicsError::WrongBodyKind {
                expected: BodyKind::Static,
                actual: BodyKind::Dynamic
            }
        ));
        assert!(group.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut group = Group::new(BodyKind::Dynamic);
        let a = handles(1, BodyKind::Dynamic)[0];
        group.add(a).unwrap();

        assert!(group.remove(&a));
        assert!(!group.remove(&a));
        assert!(!group.contains(&a));
        assert_eq!(group.len(), 0);
    }
}
