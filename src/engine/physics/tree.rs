// Bulk-loadable R-tree used for broad-phase queries
//
// Port of the rbush layout: OMT bulk loading, least-enlargement insertion,
// margin/overlap driven node splits.

use crate::core::geom::Rect;

/// Default branching factor
pub const DEFAULT_MAX_ENTRIES: usize = 16;

/// Smallest branching factor the split heuristics work with
pub const MIN_MAX_ENTRIES: usize = 4;

/// Axis-aligned box in min/max form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Inverted box that any `extend` will overwrite
    pub const fn empty() -> Self {
        Self::new(f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY)
    }

    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(rect.left(), rect.top(), rect.right(), rect.bottom())
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    pub fn extend(&mut self, other: &Aabb) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn area(&self) -> f32 {
        (self.max_x - self.min_x) * (self.max_y - self.min_y)
    }

    fn margin(&self) -> f32 {
        (self.max_x - self.min_x) + (self.max_y - self.min_y)
    }

    fn enlarged_area(&self, other: &Aabb) -> f32 {
        (self.max_x.max(other.max_x) - self.min_x.min(other.min_x))
            * (self.max_y.max(other.max_y) - self.min_y.min(other.min_y))
    }

    fn intersection_area(&self, other: &Aabb) -> f32 {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        (max_x - min_x).max(0.0) * (max_y - min_y).max(0.0)
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Inclusive overlap test, so boxes sharing an edge are candidates
    pub fn intersects(&self, other: &Aabb) -> bool {
        other.min_x <= self.max_x
            && other.min_y <= self.max_y
            && other.max_x >= self.min_x
            && other.max_y >= self.min_y
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    bbox: Aabb,
    item: T,
}

#[derive(Debug, Clone)]
enum NodeKind<T> {
    Leaf(Vec<Entry<T>>),
    Branch(Vec<Node<T>>),
}

#[derive(Debug, Clone)]
struct Node<T> {
    bbox: Aabb,
    height: usize,
    kind: NodeKind<T>,
}

trait Bounded {
    fn bbox(&self) -> &Aabb;
}

impl<T> Bounded for Entry<T> {
    fn bbox(&self) -> &Aabb {
        &self.bbox
    }
}

impl<T> Bounded for Node<T> {
    fn bbox(&self) -> &Aabb {
        &self.bbox
    }
}

fn dist_bbox<C: Bounded>(children: &[C]) -> Aabb {
    let mut bbox = Aabb::empty();
    for child in children {
        bbox.extend(child.bbox());
    }
    bbox
}

impl<T> Node<T> {
    fn leaf(entries: Vec<Entry<T>>) -> Self {
        let bbox = dist_bbox(&entries);
        Self {
            bbox,
            height: 1,
            kind: NodeKind::Leaf(entries),
        }
    }

    fn branch(children: Vec<Node<T>>, height: usize) -> Self {
        let bbox = dist_bbox(&children);
        Self {
            bbox,
            height,
            kind: NodeKind::Branch(children),
        }
    }

    fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(entries) => entries.len(),
            NodeKind::Branch(children) => children.len(),
        }
    }

    fn recalc_bbox(&mut self) {
        self.bbox = match &self.kind {
            NodeKind::Leaf(entries) => dist_bbox(entries),
            NodeKind::Branch(children) => dist_bbox(children),
        };
    }
}

/// R-tree over items of type `T`, each stored with the box it was indexed at
#[derive(Debug, Clone)]
pub struct RTree<T> {
    root: Node<T>,
    max_entries: usize,
    min_entries: usize,
    len: usize,
}

impl<T: Clone + PartialEq> RTree<T> {
    /// Create an empty tree with the given branching factor (at least 4)
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(MIN_MAX_ENTRIES);
        let min_entries = ((max_entries as f32 * 0.4).ceil() as usize).max(2);
        Self {
            root: Node::leaf(Vec::new()),
            max_entries,
            min_entries,
            len: 0,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every item
    pub fn clear(&mut self) {
        self.root = Node::leaf(Vec::new());
        self.len = 0;
    }

    /// Every indexed item, in tree order
    #[cfg(test)]
    pub(crate) fn all(&self) -> Vec<T> {
        let mut result = Vec::with_capacity(self.len);
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Leaf(entries) => result.extend(entries.iter().map(|e| e.item.clone())),
                NodeKind::Branch(children) => stack.extend(children.iter()),
            }
        }
        result
    }

    /// Items whose indexed box intersects `bbox`
    pub fn search(&self, bbox: &Aabb) -> Vec<T> {
        let mut result = Vec::new();
        if self.len == 0 || !bbox.intersects(&self.root.bbox) {
            return result;
        }

        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    for entry in entries {
                        if bbox.intersects(&entry.bbox) {
                            result.push(entry.item.clone());
                        }
                    }
                }
                NodeKind::Branch(children) => {
                    for child in children {
                        if bbox.intersects(&child.bbox) {
                            stack.push(child);
                        }
                    }
                }
            }
        }
        result
    }

    /// True if any indexed box intersects `bbox`
    pub fn collides(&self, bbox: &Aabb) -> bool {
        if self.len == 0 || !bbox.intersects(&self.root.bbox) {
            return false;
        }

        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    if entries.iter().any(|e| bbox.intersects(&e.bbox)) {
                        return true;
                    }
                }
                NodeKind::Branch(children) => {
                    stack.extend(children.iter().filter(|c| bbox.intersects(&c.bbox)));
                }
            }
        }
        false
    }

    /// Bulk-load items. An empty tree is rebuilt in one pass; otherwise the
    /// items are inserted one at a time. Non-finite boxes are skipped.
    pub fn load(&mut self, items: impl IntoIterator<Item = (T, Aabb)>) {
        let entries: Vec<Entry<T>> = items
            .into_iter()
            .filter(|(_, bbox)| bbox.is_finite())
            .map(|(item, bbox)| Entry { bbox, item })
            .collect();

        if entries.is_empty() {
            return;
        }

        if self.len > 0 || entries.len() < self.min_entries {
            for entry in entries {
                self.insert_entry(entry);
            }
            return;
        }

        self.len = entries.len();
        self.root = Self::build(entries, None, self.max_entries);
    }

    /// Index a single item; a non-finite box is ignored
    pub fn insert(&mut self, item: T, bbox: Aabb) {
        if bbox.is_finite() {
            self.insert_entry(Entry { bbox, item });
        }
    }

    /// Remove an item, using `hint` (the box it was indexed with) to prune
    /// the descent. Falls back to a full scan if the hint is stale.
    pub fn remove(&mut self, item: &T, hint: Option<&Aabb>) -> bool {
        if self.len == 0 {
            return false;
        }

        let found = Self::remove_rec(&mut self.root, item, hint)
            || (hint.is_some() && Self::remove_rec(&mut self.root, item, None));

        if found {
            self.len -= 1;
            if self.len == 0 {
                self.clear();
            }
        }
        found
    }

    fn insert_entry(&mut self, entry: Entry<T>) {
        let (max, min) = (self.max_entries, self.min_entries);
        if let Some(sibling) = Self::insert_rec(&mut self.root, entry, max, min) {
            let height = self.root.height + 1;
            let old_root = std::mem::replace(&mut self.root, Node::leaf(Vec::new()));
            self.root = Node::branch(vec![old_root, sibling], height);
        }
        self.len += 1;
    }

    fn insert_rec(node: &mut Node<T>, entry: Entry<T>, max: usize, min: usize) -> Option<Node<T>> {
        node.bbox.extend(&entry.bbox);

        let overflow = match &mut node.kind {
            NodeKind::Leaf(entries) => {
                entries.push(entry);
                entries.len() > max
            }
            NodeKind::Branch(children) => {
                let index = Self::choose_subtree(children, &entry.bbox);
                match Self::insert_rec(&mut children[index], entry, max, min) {
                    Some(sibling) => {
                        children.push(sibling);
                        children.len() > max
                    }
                    None => false,
                }
            }
        };

        if overflow {
            Some(Self::split(node, min))
        } else {
            None
        }
    }

    fn choose_subtree(children: &[Node<T>], bbox: &Aabb) -> usize {
        let mut best = 0;
        let mut min_enlargement = f32::INFINITY;
        let mut min_area = f32::INFINITY;

        for (i, child) in children.iter().enumerate() {
            let area = child.bbox.area();
            let enlargement = child.bbox.enlarged_area(bbox) - area;

            if enlargement < min_enlargement
                || (enlargement == min_enlargement && area < min_area)
            {
                min_enlargement = enlargement;
                min_area = area;
                best = i;
            }
        }
        best
    }

    fn split(node: &mut Node<T>, min: usize) -> Node<T> {
        let height = node.height;
        let sibling = match &mut node.kind {
            NodeKind::Leaf(entries) => Node::leaf(split_children(entries, min)),
            NodeKind::Branch(children) => Node::branch(split_children(children, min), height),
        };
        node.recalc_bbox();
        sibling
    }

    fn remove_rec(node: &mut Node<T>, item: &T, hint: Option<&Aabb>) -> bool {
        let found = match &mut node.kind {
            NodeKind::Leaf(entries) => match entries.iter().position(|e| &e.item == item) {
                Some(pos) => {
                    entries.remove(pos);
                    true
                }
                None => false,
            },
            NodeKind::Branch(children) => {
                let mut found = false;
                for i in 0..children.len() {
                    let candidate = hint.map_or(true, |bbox| children[i].bbox.contains(bbox));
                    if candidate && Self::remove_rec(&mut children[i], item, hint) {
                        if children[i].child_count() == 0 {
                            children.remove(i);
                        }
                        found = true;
                        break;
                    }
                }
                found
            }
        };

        if found {
            node.recalc_bbox();
        }
        found
    }

    fn build(mut entries: Vec<Entry<T>>, height: Option<usize>, max: usize) -> Node<T> {
        let n = entries.len();
        if n <= max || height == Some(1) {
            return Node::leaf(entries);
        }

        let (height, m) = match height {
            Some(height) => (height, max),
            None => {
                // target height of the bulk-loaded tree and root fan-out
                let height = ((n as f64).ln() / (max as f64).ln()).ceil() as usize;
                let m = (n as f64 / (max as f64).powi(height as i32 - 1)).ceil() as usize;
                (height.max(2), m.max(2))
            }
        };

        let n2 = (n as f64 / m as f64).ceil() as usize;
        let n1 = n2 * (m as f64).sqrt().ceil() as usize;

        entries.sort_by(|a, b| a.bbox.min_x.total_cmp(&b.bbox.min_x));

        let mut children = Vec::new();
        let mut rest = entries;
        while !rest.is_empty() {
            let tail = rest.split_off(n1.min(rest.len()));
            let mut slice = rest;
            rest = tail;

            slice.sort_by(|a, b| a.bbox.min_y.total_cmp(&b.bbox.min_y));

            while !slice.is_empty() {
                let tail = slice.split_off(n2.min(slice.len()));
                children.push(Self::build(slice, Some(height - 1), max));
                slice = tail;
            }
        }

        Node::branch(children, height)
    }
}

impl<T: Clone + PartialEq> Default for RTree<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

/// Sum of the margins of every left/right distribution along the current order
fn all_dist_margin<C: Bounded>(children: &[C], min: usize) -> f32 {
    let count = children.len();
    let mut left = dist_bbox(&children[..min]);
    let mut right = dist_bbox(&children[count - min..]);
    let mut margin = left.margin() + right.margin();

    for child in &children[min..count - min] {
        left.extend(child.bbox());
        margin += left.margin();
    }

    for child in children[min..count - min].iter().rev() {
        right.extend(child.bbox());
        margin += right.margin();
    }

    margin
}

fn sort_by_min_x<C: Bounded>(children: &mut [C]) {
    children.sort_by(|a, b| a.bbox().min_x.total_cmp(&b.bbox().min_x));
}

fn sort_by_min_y<C: Bounded>(children: &mut [C]) {
    children.sort_by(|a, b| a.bbox().min_y.total_cmp(&b.bbox().min_y));
}

/// Reorder `children` along the best axis and split off the upper group
fn split_children<C: Bounded>(children: &mut Vec<C>, min: usize) -> Vec<C> {
    let count = children.len();

    sort_by_min_x(children);
    let x_margin = all_dist_margin(children, min);
    sort_by_min_y(children);
    let y_margin = all_dist_margin(children, min);

    if x_margin < y_margin {
        sort_by_min_x(children);
    }

    let mut index = count - min;
    let mut min_overlap = f32::INFINITY;
    let mut min_area = f32::INFINITY;

    for i in min..=count - min {
        let left = dist_bbox(&children[..i]);
        let right = dist_bbox(&children[i..]);

        let overlap = left.intersection_area(&right);
        let area = left.area() + right.area();

        if overlap < min_overlap {
            min_overlap = overlap;
            index = i;
            min_area = min_area.min(area);
        } else if overlap == min_overlap && area < min_area {
            min_area = area;
            index = i;
        }
    }

    children.split_off(index)
}
