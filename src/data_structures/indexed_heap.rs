use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::float_cost::FloatCost;

type HeapIndex = usize;
type Priority = FloatCost<f64>;

// Nodes are laid out level by level, so the root sits at 0 and the children
// of `i` at `2i+1` and `2i+2`.
#[inline(always)]
#[must_use]
fn up(i: HeapIndex) -> HeapIndex {
    debug_assert!(i != 0, "The root has no parent");
    (i - 1) / 2
}
#[inline(always)]
#[must_use]
fn down_left(i: HeapIndex) -> HeapIndex {
    2 * i + 1
}
#[inline(always)]
#[must_use]
fn down_right(i: HeapIndex) -> HeapIndex {
    2 * i + 2
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    #[error("The element is already in the heap.")]
    DuplicateElement,
    #[error("The element is not in the heap.")]
    ElementNotFound,
}

#[derive(Clone, Debug)]
struct HeapNode<E> {
    element: E,
    priority: Priority,
}

/// Indexed binary min-heap.
///
/// Elements are stored by value together with a mutable priority. A side
/// index from element to heap position allows finding and re-ranking any
/// element without a linear search.
///
/// ```pseudocode
/// for (i, node) in self.heap.enumerate():
///   assert_eq(self.index[node.element], i)
/// ```
#[derive(Clone, Debug)]
pub struct IndexedMinHeap<E>
where
    E: Clone + Debug + Eq + Hash,
{
    heap: Vec<HeapNode<E>>,
    index: FxHashMap<E, HeapIndex>,
}

impl<E> IndexedMinHeap<E>
where
    E: Clone + Debug + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            heap: vec![],
            index: FxHashMap::default(),
        }
    }
    pub fn with_capacity(s: usize) -> Self {
        let mut index = FxHashMap::default();
        index.reserve(s);
        Self {
            heap: Vec::with_capacity(s),
            index,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    pub fn contains(&self, e: &E) -> bool {
        self.index.contains_key(e)
    }

    /// Current priority of `e`, if it's in the heap.
    pub fn priority(&self, e: &E) -> Option<f64> {
        self.index.get(e).map(|&i| self.heap[i].priority.get())
    }

    /// The element with the smallest priority.
    #[inline(always)]
    pub fn peek(&self) -> Option<&E> {
        self.heap.first().map(|n| &n.element)
    }
    #[inline(always)]
    pub fn min(&self) -> Option<&E> {
        self.peek()
    }
    /// The smallest priority in the heap.
    #[inline(always)]
    pub fn peek_priority(&self) -> Option<f64> {
        self.heap.first().map(|n| n.priority.get())
    }

    pub fn insert(&mut self, e: E, priority: f64) -> Result<(), HeapError> {
        if self.contains(&e) {
            return Err(HeapError::DuplicateElement);
        }
        self.verify_heap();

        let heap_index = self.heap.len(); // Future heap_index
        self.index.insert(e.clone(), heap_index);
        self.heap.push(HeapNode {
            element: e,
            priority: FloatCost::new(priority),
        });
        self.sift_up(heap_index);

        self.verify_heap();
        Ok(())
    }

    /// Removes the element with the smallest priority.
    pub fn pop(&mut self) -> Option<E> {
        self.verify_heap();

        let last = self.heap.len().checked_sub(1)?;
        if last != 0 {
            self.swap(0, last);
        }
        let node = self.heap.pop()?;
        self.index.remove(&node.element);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }

        self.verify_heap();
        Some(node.element)
    }
    #[inline(always)]
    pub fn remove_min(&mut self) -> Option<E> {
        self.pop()
    }
    #[inline(always)]
    pub fn poll(&mut self) -> Option<E> {
        self.pop()
    }

    /// Re-ranks an element already in the heap.
    pub fn change_priority(&mut self, e: &E, priority: f64) -> Result<(), HeapError> {
        let Some(&heap_index) = self.index.get(e) else {
            return Err(HeapError::ElementNotFound);
        };
        self.verify_heap();

        self.heap[heap_index].priority = FloatCost::new(priority);
        // Only one of these moves the node.
        let heap_index = self.sift_up(heap_index);
        self.sift_down(heap_index);

        self.verify_heap();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_heap(&self) {
        // All good... (hopefully)
    }

    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_heap(&self) {
        debug_assert_eq!(self.heap.len(), self.index.len());
        // Every node,
        for (i, node) in self.heap.iter().enumerate() {
            // - Has the right index set.
            debug_assert_eq!(self.index.get(&node.element), Some(&i));

            // - Goes after its parent node, if any.
            if i == 0 {
                continue;
            }
            let p = up(i);
            debug_assert!(
                self.heap[p].priority <= node.priority,
                "Node[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.heap[p],
                node,
                self.heap.len(),
            );
        }
    }

    // Implementation details

    /// Raises a node
    /// Returns it's new index
    #[inline(always)]
    fn sift_up(&mut self, index: usize) -> usize {
        debug_assert!(
            index < self.heap.len(),
            "Node is way out of sync. Index out of bounds..."
        );

        let mut pos = index;
        while pos != 0 {
            let parent = up(pos);
            if self.heap[parent].priority <= self.heap[pos].priority {
                break;
            }
            self.swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Lowers a node
    /// Returns it's new index
    #[inline(always)]
    fn sift_down(&mut self, mut index: usize) -> usize {
        let len = self.heap.len();
        debug_assert!(
            index < len,
            "Node is way out of sync. Index out of bounds..."
        );

        loop {
            // Find the best child
            let left = down_left(index);
            if left >= len {
                break;
            }
            let right = down_right(index);
            let child = if right < len && self.heap[right].priority < self.heap[left].priority {
                right
            } else {
                left
            };

            if self.heap[index].priority <= self.heap[child].priority {
                break;
            }

            self.swap(index, child);
            index = child;
        }
        index
    }

    /// Swaps two elements in the heap.
    ///
    /// For consistency in calling code `l < r` is checked.
    ///
    /// Keeps the position index in sync.
    #[inline(always)]
    fn swap(&mut self, l: usize, r: usize) {
        debug_assert!(l < r, "Swap({l}, {r}) uses wrong argument order");

        let len = self.heap.len();
        debug_assert!(l < len, "Left  swap index {l} is OUT OF BOUNDS({len})");
        debug_assert!(r < len, "Right swap index {r} is OUT OF BOUNDS({len})");
        self.heap.swap(l, r);
        if let Some(i) = self.index.get_mut(&self.heap[l].element) {
            *i = l;
        }
        if let Some(i) = self.index.get_mut(&self.heap[r].element) {
            *i = r;
        }
    }
}

impl<E> Default for IndexedMinHeap<E>
where
    E: Clone + Debug + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
