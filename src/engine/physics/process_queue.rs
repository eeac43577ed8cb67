// Deferred add/remove scheduler for standing collision rules

/// Holds items in three lists: pending additions, active items and pending
/// removals.
///
/// `add` and `remove` never touch the active list directly, so code running
/// while the active list is being walked (a collide callback, say) can
/// schedule changes safely. They take effect on the next [`update`].
///
/// [`update`]: ProcessQueue::update
#[derive(Debug, Clone)]
pub struct ProcessQueue<T> {
    pending: Vec<T>,
    active: Vec<T>,
    destroy: Vec<T>,
    removed: Vec<T>,
}

impl<T: Clone + PartialEq> ProcessQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            active: Vec::new(),
            destroy: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Schedule an item for activation. Ignored when it is already pending,
    /// or already active and not scheduled for removal.
    pub fn add(&mut self, item: T) -> bool {
        if self.pending.contains(&item) {
            return false;
        }
        if self.active.contains(&item) && !self.destroy.contains(&item) {
            return false;
        }
        self.pending.push(item);
        true
    }

    /// Schedule an item for removal. A pending item is dropped straight away;
    /// an active one leaves the active list on the next update.
    pub fn remove(&mut self, item: &T) -> bool {
        if let Some(index) = self.pending.iter().position(|pending| pending == item) {
            let item = self.pending.remove(index);
            self.removed.push(item);
            return true;
        }

        if self.active.contains(item) && !self.destroy.contains(item) {
            self.destroy.push(item.clone());
            return true;
        }

        false
    }

    /// Apply pending removals then pending additions, returning the new
    /// active list
    pub fn update(&mut self) -> &[T] {
        for item in self.destroy.drain(..) {
            if let Some(index) = self.active.iter().position(|active| *active == item) {
                let item = self.active.remove(index);
                // removed-then-readded in the same frame stays alive
                if !self.pending.contains(&item) {
                    self.removed.push(item);
                }
            }
        }

        for item in self.pending.drain(..) {
            if !self.active.contains(&item) {
                self.active.push(item);
            }
        }

        &self.active
    }

    /// Items that left the queue since the last call
    pub fn take_removed(&mut self) -> Vec<T> {
        std::mem::take(&mut self.removed)
    }

    /// Current active list, without applying pending changes
    pub fn active(&self) -> &[T] {
        &self.active
    }

    pub fn is_active(&self, item: &T) -> bool {
        self.active.contains(item)
    }

    pub fn is_pending(&self, item: &T) -> bool {
        self.pending.contains(item)
    }

    pub fn is_destroying(&self, item: &T) -> bool {
        self.destroy.contains(item)
    }

    /// Number of active items
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop everything, reporting all known items as removed
    pub fn clear(&mut self) {
        let mut removed = std::mem::take(&mut self.active);
        removed.append(&mut self.pending);
        self.destroy.clear();
        self.removed.append(&mut removed);
    }
}

impl<T: Clone + PartialEq> Default for ProcessQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_deferred() {
        let mut queue = ProcessQueue::new();
        assert!(queue.add(1));
        assert!(queue.is_pending(&1));
        assert!(queue.is_empty());

        assert_eq!(queue.update(), &[1]);
        assert!(queue.is_active(&1));
        assert!(!queue.is_pending(&1));
    }

    #[test]
    fn test_duplicate_add_ignored() {
        let mut queue = ProcessQueue::new();
        queue.add(1);
        assert!(!queue.add(1));
        queue.update();
        assert!(!queue.add(1));
        assert_eq!(queue.update(), &[1]);
    }

    #[test]
    fn test_remove_is_deferred() {
        let mut queue = ProcessQueue::new();
        queue.add(1);
        queue.add(2);
        queue.update();

        assert!(queue.remove(&1));
        assert!(queue.is_destroying(&1));
        assert_eq!(queue.active(), &[1, 2]);

        assert_eq!(queue.update(), &[2]);
        assert_eq!(queue.take_removed(), vec![1]);
        assert!(queue.take_removed().is_empty());
    }

    #[test]
    fn test_remove_pending_drops_immediately() {
        let mut queue = ProcessQueue::new();
        queue.add(5);
        assert!(queue.remove(&5));
        assert!(!queue.is_pending(&5));
        assert!(queue.update().is_empty());
        assert_eq!(queue.take_removed(), vec![5]);
    }

    #[test]
    fn test_remove_unknown() {
        let mut queue: ProcessQueue<u32> = ProcessQueue::new();
        assert!(!queue.remove(&9));
    }

    #[test]
    fn test_remove_then_readd_same_frame() {
        let mut queue = ProcessQueue::new();
        queue.add(1);
        queue.update();

        queue.remove(&1);
        assert!(queue.add(1));
        assert_eq!(queue.update(), &[1]);
        assert!(queue.take_removed().is_empty());
    }

    #[test]
    fn test_mutation_while_walking_active() {
        let mut queue = ProcessQueue::new();
        queue.add(1);
        queue.add(2);
        queue.update();

        let snapshot = queue.active().to_vec();
        for item in &snapshot {
            if *item == 1 {
                queue.remove(&1);
                queue.add(3);
            }
        }
        assert_eq!(queue.active(), &[1, 2]);
        assert_eq!(queue.update(), &[2, 3]);
    }

    #[test]
    fn test_clear() {
        let mut queue = ProcessQueue::new();
        queue.add(1);
        queue.update();
        queue.add(2);
        queue.clear();

        assert!(queue.is_empty());
        let mut removed = queue.take_removed();
        removed.sort();
        assert_eq!(removed, vec![1, 2]);
    }
}
