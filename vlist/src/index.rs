use alloc::vec::Vec;
use core::cmp::{self, Ordering};
use core::fmt;

use crate::{Located, RangeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeId(u32);

impl NodeId {
    fn get(self) -> usize {
        self.0 as usize
    }
}

type Link = Option<NodeId>;

#[derive(Clone, Debug)]
struct Node<T> {
    item: Option<T>, // `None` while the slot sits on the free list
    length: u32,
    left: Link,
    right: Link,
    height: u8,
    size: usize,
    total: u64,
}

impl<T> Node<T> {
    fn leaf(item: T, length: u32) -> Self {
        Self {
            item: Some(item),
            length,
            left: None,
            right: None,
            height: 1,
            size: 1,
            total: length as u64,
        }
    }
}

fn height<T>(nodes: &[Node<T>], link: Link) -> u8 {
    link.map_or(0, |id| nodes[id.get()].height)
}

fn size<T>(nodes: &[Node<T>], link: Link) -> usize {
    link.map_or(0, |id| nodes[id.get()].size)
}

fn total<T>(nodes: &[Node<T>], link: Link) -> u64 {
    link.map_or(0, |id| nodes[id.get()].total)
}

fn refresh<T>(nodes: &mut [Node<T>], id: NodeId) {
    let (left, right) = (nodes[id.get()].left, nodes[id.get()].right);
    let h = 1 + cmp::max(height(nodes, left), height(nodes, right));
    let s = 1 + size(nodes, left) + size(nodes, right);
    let t = (nodes[id.get()].length as u64)
        .saturating_add(total(nodes, left))
        .saturating_add(total(nodes, right));
    let node = &mut nodes[id.get()];
    node.height = h;
    node.size = s;
    node.total = t;
}

fn build<T>(nodes: &mut [Node<T>], lo: usize, hi: usize) -> Link {
    if lo >= hi {
        return None;
    }
    let mid = lo + (hi - lo) / 2;
    let left = build(nodes, lo, mid);
    let right = build(nodes, mid + 1, hi);
    let id = NodeId(mid as u32);
    nodes[mid].left = left;
    nodes[mid].right = right;
    refresh(nodes, id);
    Some(id)
}

/// An ordered sequence of `(item, length)` pairs with logarithmic index and distance lookups.
///
/// This is a weighted AVL tree: every node memoizes its subtree height, item count and total
/// length, so that
/// - `get_by_index(i)` also reports the cumulative length before `i` (`outer_distance`), and
/// - `get_by_distance(d)` finds the item whose half-open interval
///   `[outer_distance, outer_distance + length)` contains `d`.
///
/// Nodes live in a flat arena addressed by integer handles; freed slots are recycled through a
/// free list. All mutations and queries run in `O(log n)`; [`Self::from_entries`] builds a
/// perfectly balanced tree in `O(n)`.
#[derive(Clone)]
pub struct PositionIndex<T> {
    nodes: Vec<Node<T>>,
    free: Vec<NodeId>,
    root: Link,
}

impl<T> Default for PositionIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PositionIndex<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            root: None,
        }
    }

    /// Builds a balanced index from items in order.
    pub fn from_entries(entries: impl IntoIterator<Item = (T, u32)>) -> Self {
        let mut nodes: Vec<Node<T>> = entries
            .into_iter()
            .map(|(item, length)| Node::leaf(item, length))
            .collect();
        let n = nodes.len();
        let root = build(&mut nodes, 0, n);
        vdebug!(len = n, "PositionIndex::from_entries");
        Self {
            nodes,
            free: Vec::new(),
            root,
        }
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        size(&self.nodes, self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Sum of all item lengths.
    pub fn total_length(&self) -> u64 {
        total(&self.nodes, self.root)
    }

    pub fn clear(&mut self) {
        vtrace!(len = self.len(), "PositionIndex::clear");
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    /// Inserts `item` at ordinal position `index`, shifting later items back.
    ///
    /// `index > len` appends.
    pub fn insert(&mut self, index: usize, item: T, length: u32) {
        let index = cmp::min(index, self.len());
        vtrace!(index, length, "PositionIndex::insert");
        let id = self.alloc(item, length);
        let root = self.insert_at(self.root, index, id);
        self.root = Some(root);
    }

    pub fn push_back(&mut self, item: T, length: u32) {
        self.insert(self.len(), item, length);
    }

    pub fn push_front(&mut self, item: T, length: u32) {
        self.insert(0, item, length);
    }

    /// Removes the item at `index` and returns it with its length.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn delete(&mut self, index: usize) -> Option<(T, u32)> {
        if index >= self.len() {
            return None;
        }
        let (root, removed) = self.delete_at(self.root?, index);
        self.root = root;

        let node = &mut self.nodes[removed.get()];
        node.left = None;
        node.right = None;
        let length = node.length;
        let item = node.item.take();
        self.free.push(removed);
        item.map(|item| (item, length))
    }

    /// Updates the length of the item at `index` (clamped into range).
    ///
    /// Returns the applied delta, or `None` when the index is empty.
    pub fn update_length(&mut self, index: usize, length: u32) -> Option<i64> {
        let root = self.root?;
        let index = cmp::min(index, self.len() - 1);
        Some(self.set_length_at(root, index, length))
    }

    /// Strict variant of [`Self::update_length`].
    pub fn try_update_length(&mut self, index: usize, length: u32) -> Result<i64, RangeError> {
        let len = self.len();
        match self.root {
            Some(root) if index < len => Ok(self.set_length_at(root, index, length)),
            _ => Err(RangeError::Index { index, len }),
        }
    }

    /// Looks up the item at `index` (clamped into range).
    ///
    /// Returns `None` only when the index is empty.
    pub fn get_by_index(&self, index: usize) -> Option<Located<'_, T>> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.locate_index(cmp::min(index, len - 1))
    }

    /// Strict variant of [`Self::get_by_index`].
    pub fn try_get_by_index(&self, index: usize) -> Result<Located<'_, T>, RangeError> {
        let len = self.len();
        if index >= len {
            return Err(RangeError::Index { index, len });
        }
        self.locate_index(index)
            .ok_or(RangeError::Index { index, len })
    }

    /// Looks up the item whose interval contains `distance` (clamped into `[0, total)`).
    ///
    /// Zero-length items never contain a distance. When every item has length 0 the first item
    /// is returned. Returns `None` only when the index is empty.
    pub fn get_by_distance(&self, distance: u64) -> Option<Located<'_, T>> {
        if self.is_empty() {
            return None;
        }
        let total = self.total_length();
        if total == 0 {
            return self.locate_index(0);
        }
        self.locate_distance(cmp::min(distance, total - 1))
    }

    /// Strict variant of [`Self::get_by_distance`].
    pub fn try_get_by_distance(&self, distance: u64) -> Result<Located<'_, T>, RangeError> {
        let total = self.total_length();
        if distance >= total {
            return Err(RangeError::Distance { distance, total });
        }
        self.locate_distance(distance)
            .ok_or(RangeError::Distance { distance, total })
    }

    /// Cumulative length of all items strictly before `index`.
    ///
    /// `index >= len` yields the total length.
    pub fn offset_of(&self, index: usize) -> u64 {
        let mut index = cmp::min(index, self.len());
        let mut link = self.root;
        let mut outer = 0u64;
        while let Some(id) = link {
            let node = &self.nodes[id.get()];
            let left_size = size(&self.nodes, node.left);
            match index.cmp(&left_size) {
                Ordering::Less => link = node.left,
                Ordering::Equal => return outer + total(&self.nodes, node.left),
                Ordering::Greater => {
                    outer += total(&self.nodes, node.left) + node.length as u64;
                    index -= left_size + 1;
                    link = node.right;
                }
            }
        }
        outer
    }

    /// Sum of the lengths of the items in `[start, end)`.
    pub fn span(&self, start: usize, end: usize) -> u64 {
        self.offset_of(end).saturating_sub(self.offset_of(start))
    }

    pub fn length(&self, index: usize) -> Option<u32> {
        self.try_get_by_index(index).ok().map(|found| found.length)
    }

    pub fn item(&self, index: usize) -> Option<&T> {
        self.try_get_by_index(index).ok().map(|found| found.item)
    }

    /// Iterates over `(item, length)` pairs in order.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
        };
        iter.descend(self.root);
        iter
    }

    fn alloc(&mut self, item: T, length: u32) -> NodeId {
        let node = Node::leaf(item, length);
        if let Some(id) = self.free.pop() {
            self.nodes[id.get()] = node;
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn insert_at(&mut self, link: Link, index: usize, new: NodeId) -> NodeId {
        let Some(id) = link else {
            return new;
        };
        let (left, right) = (self.nodes[id.get()].left, self.nodes[id.get()].right);
        let left_size = size(&self.nodes, left);
        if index <= left_size {
            let l = self.insert_at(left, index, new);
            self.nodes[id.get()].left = Some(l);
        } else {
            let r = self.insert_at(right, index - left_size - 1, new);
            self.nodes[id.get()].right = Some(r);
        }
        self.rebalance(id)
    }

    fn delete_at(&mut self, id: NodeId, index: usize) -> (Link, NodeId) {
        let (left, right) = (self.nodes[id.get()].left, self.nodes[id.get()].right);
        let left_size = size(&self.nodes, left);
        match (index.cmp(&left_size), left, right) {
            (Ordering::Less, Some(l), _) => {
                let (rest, removed) = self.delete_at(l, index);
                self.nodes[id.get()].left = rest;
                (Some(self.rebalance(id)), removed)
            }
            (Ordering::Greater, _, Some(r)) => {
                let (rest, removed) = self.delete_at(r, index - left_size - 1);
                self.nodes[id.get()].right = rest;
                (Some(self.rebalance(id)), removed)
            }
            _ => (self.unlink(id), id),
        }
    }

    /// Removes `id` from its subtree and returns the subtree's new root.
    fn unlink(&mut self, id: NodeId) -> Link {
        let (left, right) = (self.nodes[id.get()].left, self.nodes[id.get()].right);
        match (left, right) {
            (None, r) => r,
            (l, None) => l,
            (Some(l), Some(r)) => {
                let (rest, successor) = self.detach_min(r);
                self.nodes[successor.get()].left = Some(l);
                self.nodes[successor.get()].right = rest;
                Some(self.rebalance(successor))
            }
        }
    }

    fn detach_min(&mut self, id: NodeId) -> (Link, NodeId) {
        match self.nodes[id.get()].left {
            None => (self.nodes[id.get()].right, id),
            Some(l) => {
                let (rest, min) = self.detach_min(l);
                self.nodes[id.get()].left = rest;
                (Some(self.rebalance(id)), min)
            }
        }
    }

    fn set_length_at(&mut self, id: NodeId, index: usize, length: u32) -> i64 {
        let (left, right) = (self.nodes[id.get()].left, self.nodes[id.get()].right);
        let left_size = size(&self.nodes, left);
        let delta = match (index.cmp(&left_size), left, right) {
            (Ordering::Less, Some(l), _) => self.set_length_at(l, index, length),
            (Ordering::Greater, _, Some(r)) => self.set_length_at(r, index - left_size - 1, length),
            _ => {
                let node = &mut self.nodes[id.get()];
                let prev = node.length;
                node.length = length;
                length as i64 - prev as i64
            }
        };
        if delta != 0 {
            refresh(&mut self.nodes, id);
        }
        delta
    }

    fn rebalance(&mut self, id: NodeId) -> NodeId {
        refresh(&mut self.nodes, id);
        let (left, right) = (self.nodes[id.get()].left, self.nodes[id.get()].right);
        let balance = height(&self.nodes, left) as i16 - height(&self.nodes, right) as i16;

        if balance > 1 {
            if let Some(l) = left {
                let node = &self.nodes[l.get()];
                if height(&self.nodes, node.left) < height(&self.nodes, node.right) {
                    let rotated = self.rotate_left(l);
                    self.nodes[id.get()].left = Some(rotated);
                }
            }
            return self.rotate_right(id);
        }
        if balance < -1 {
            if let Some(r) = right {
                let node = &self.nodes[r.get()];
                if height(&self.nodes, node.right) < height(&self.nodes, node.left) {
                    let rotated = self.rotate_right(r);
                    self.nodes[id.get()].right = Some(rotated);
                }
            }
            return self.rotate_left(id);
        }
        id
    }

    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.nodes[id.get()].left else {
            return id;
        };
        self.nodes[id.get()].left = self.nodes[pivot.get()].right;
        self.nodes[pivot.get()].right = Some(id);
        refresh(&mut self.nodes, id);
        refresh(&mut self.nodes, pivot);
        pivot
    }

    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.nodes[id.get()].right else {
            return id;
        };
        self.nodes[id.get()].right = self.nodes[pivot.get()].left;
        self.nodes[pivot.get()].left = Some(id);
        refresh(&mut self.nodes, id);
        refresh(&mut self.nodes, pivot);
        pivot
    }

    fn locate_index(&self, target: usize) -> Option<Located<'_, T>> {
        let mut index = target;
        let mut link = self.root;
        let mut outer = 0u64;
        while let Some(id) = link {
            let node = &self.nodes[id.get()];
            let left_size = size(&self.nodes, node.left);
            match index.cmp(&left_size) {
                Ordering::Less => link = node.left,
                Ordering::Equal => {
                    return Some(Located {
                        item: node.item.as_ref()?,
                        length: node.length,
                        index: target,
                        outer_distance: outer + total(&self.nodes, node.left),
                        inner_distance: 0,
                    });
                }
                Ordering::Greater => {
                    outer += total(&self.nodes, node.left) + node.length as u64;
                    index -= left_size + 1;
                    link = node.right;
                }
            }
        }
        None
    }

    fn locate_distance(&self, distance: u64) -> Option<Located<'_, T>> {
        let mut remaining = distance;
        let mut link = self.root;
        let mut outer = 0u64;
        let mut before = 0usize;
        while let Some(id) = link {
            let node = &self.nodes[id.get()];
            let left_total = total(&self.nodes, node.left);
            if remaining < left_total {
                link = node.left;
                continue;
            }
            let left_size = size(&self.nodes, node.left);
            let within = remaining - left_total;
            if within < node.length as u64 {
                return Some(Located {
                    item: node.item.as_ref()?,
                    length: node.length,
                    index: before + left_size,
                    outer_distance: outer + left_total,
                    inner_distance: within,
                });
            }
            remaining = within - node.length as u64;
            outer += left_total + node.length as u64;
            before += left_size + 1;
            link = node.right;
        }
        None
    }

    /// Checks every structural invariant; used by tests.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        fn walk<T>(nodes: &[Node<T>], link: Link) -> (u8, usize, u64) {
            let Some(id) = link else {
                return (0, 0, 0);
            };
            let node = &nodes[id.get()];
            assert!(node.item.is_some(), "live link to a vacant slot");
            let (lh, ls, lt) = walk(nodes, node.left);
            let (rh, rs, rt) = walk(nodes, node.right);
            assert!((lh as i16 - rh as i16).abs() <= 1, "unbalanced node");
            assert_eq!(node.height, 1 + cmp::max(lh, rh));
            assert_eq!(node.size, 1 + ls + rs);
            assert_eq!(node.total, node.length as u64 + lt + rt);
            (node.height, node.size, node.total)
        }
        let (_, live, _) = walk(&self.nodes, self.root);
        assert_eq!(live + self.free.len(), self.nodes.len(), "leaked arena slots");
    }
}

impl<T> FromIterator<(T, u32)> for PositionIndex<T> {
    fn from_iter<I: IntoIterator<Item = (T, u32)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<T> fmt::Debug for PositionIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionIndex")
            .field("len", &self.len())
            .field("total_length", &self.total_length())
            .field("height", &height(&self.nodes, self.root))
            .finish_non_exhaustive()
    }
}

/// In-order iterator over a [`PositionIndex`].
pub struct Iter<'a, T> {
    nodes: &'a [Node<T>],
    stack: Vec<NodeId>,
}

impl<T> Iter<'_, T> {
    fn descend(&mut self, mut link: Link) {
        while let Some(id) = link {
            self.stack.push(id);
            link = self.nodes[id.get()].left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (&'a T, u32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            let nodes = self.nodes;
            let node = &nodes[id.get()];
            self.descend(node.right);
            if let Some(item) = node.item.as_ref() {
                return Some((item, node.length));
            }
        }
    }
}
