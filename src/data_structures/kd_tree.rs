//! 2D nearest-neighbor tree.
//!
//! Points are inserted one by one, alternating the splitting axis with depth.
//! Nodes live in an arena and own their children through indices, so there
//! are no back-pointers and queries always walk root-down.
use derive_more::Display;
use nonmax::NonMaxUsize;

/// An immutable 2D coordinate.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq)]
#[display("({x},{y})")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline(always)]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    #[inline(always)]
    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline(always)]
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Axis {
    #[display("x")]
    X,
    #[display("y")]
    Y,
}

impl Axis {
    #[inline(always)]
    fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

type NodeIndex = NonMaxUsize;

#[derive(Clone, Debug)]
struct KdNode {
    point: Point,
    axis: Axis,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
}

impl KdNode {
    /// Whether `p` belongs to the left subtree. Ties go right.
    #[inline(always)]
    fn goes_left(&self, p: &Point) -> bool {
        p.coord(self.axis) < self.point.coord(self.axis)
    }
}

/// Nearest-neighbor index over a static set of points.
#[derive(Clone, Debug, Default)]
pub struct NearestNeighborTree {
    /// Arena of nodes. The root, if any, is at index 0.
    nodes: Vec<KdNode>,
}

impl NearestNeighborTree {
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        let mut tree = Self::default();
        for p in points {
            tree.insert(p);
        }
        tree
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a point below the leaf it compares into.
    pub fn insert(&mut self, point: Point) {
        // A `Vec<KdNode>` can't hold `usize::MAX` nodes, its length always
        // leaves room for the niche.
        let Some(new_index) = NodeIndex::new(self.nodes.len()) else {
            unreachable!("NearestNeighborTree can't index {} nodes", self.nodes.len());
        };

        let mut axis = Axis::X;
        if !self.nodes.is_empty() {
            let mut current = 0usize;
            loop {
                let node = &mut self.nodes[current];
                let slot = if node.goes_left(&point) {
                    &mut node.left
                } else {
                    &mut node.right
                };
                axis = node.axis.next();
                match *slot {
                    Some(child) => current = child.get(),
                    None => {
                        *slot = Some(new_index);
                        break;
                    }
                }
            }
        }

        self.nodes.push(KdNode {
            point,
            axis,
            left: None,
            right: None,
        });
    }

    /// The indexed point closest to `(x, y)`.
    ///
    /// Returns `None` on an empty tree.
    pub fn nearest(&self, x: f64, y: f64) -> Option<Point> {
        let goal = Point::new(x, y);
        let root = self.nodes.first()?;

        let mut best = root.point;
        let mut best_distance = best.distance_squared(&goal);

        // Pending visits. A bound is the squared distance to the splitting
        // plane the subtree sits behind, re-checked when it's popped since
        // `best_distance` may have improved meanwhile.
        let mut stack: Vec<(usize, Option<f64>)> = vec![(0usize, None)];
        while let Some((index, bound)) = stack.pop() {
            if let Some(bound) = bound {
                if bound >= best_distance {
                    continue;
                }
            }

            let node = &self.nodes[index];
            let d = node.point.distance_squared(&goal);
            if d < best_distance {
                best = node.point;
                best_distance = d;
            }

            let (good, bad) = if node.goes_left(&goal) {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };
            // The bad side goes first so it's explored after the good one.
            if let Some(bad) = bad {
                let plane = goal.coord(node.axis) - node.point.coord(node.axis);
                stack.push((bad.get(), Some(plane * plane)));
            }
            if let Some(good) = good {
                stack.push((good.get(), None));
            }
        }

        Some(best)
    }

    /// Depth of the deepest node, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        let mut deepest = 0usize;
        let mut stack = Vec::new();
        if !self.nodes.is_empty() {
            stack.push((0usize, 1usize));
        }
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[index];
            for child in [node.left, node.right].into_iter().flatten() {
                stack.push((child.get(), depth + 1));
            }
        }
        deepest
    }
}

impl FromIterator<Point> for NearestNeighborTree {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter)
    }
}
