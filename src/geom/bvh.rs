use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{BBox2, Point2};

/// Primitives per leaf before a node is split.
const LEAF_SIZE: usize = 8;

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf { bbox: BBox2, start: usize, end: usize },
    Split { bbox: BBox2, left: usize, right: usize },
}

impl Node {
    const fn bbox(&self) -> BBox2 {
        match *self {
            Self::Leaf { bbox, .. } | Self::Split { bbox, .. } => bbox,
        }
    }
}

/// Bounding-volume hierarchy over 2-D boxes, split at the centroid median of
/// the wider axis.
///
/// Strip segments are indexed here for crossing candidates, and cluster
/// points for the closest-pair search of the discontinuity merge.
#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<Node>,
    order: Vec<usize>,
}

impl Bvh {
    /// `None` for an empty input.
    #[must_use]
    pub(crate) fn build(boxes: &[BBox2]) -> Option<Self> {
        if boxes.is_empty() {
            return None;
        }
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * boxes.len() / LEAF_SIZE + 1),
            order: (0..boxes.len()).collect(),
        };
        bvh.split(boxes, 0, boxes.len());
        Some(bvh)
    }

    fn split(&mut self, boxes: &[BBox2], start: usize, end: usize) -> usize {
        let slot = self.nodes.len();
        let bbox = self.order[start + 1..end]
            .iter()
            .fold(boxes[self.order[start]], |acc, &i| acc.union(boxes[i]));
        self.nodes.push(Node::Leaf { bbox, start, end });
        if end - start <= LEAF_SIZE {
            return slot;
        }

        let centres = BBox2::from_points(
            &self.order[start..end]
                .iter()
                .map(|&i| boxes[i].center())
                .collect::<Vec<_>>(),
        )
        .unwrap_or(bbox);
        let along_x = centres.width() >= centres.height();
        let key = |i: usize| {
            let c = boxes[i].center();
            if along_x { c.x } else { c.y }
        };

        let mid = start + (end - start) / 2;
        self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| key(a).total_cmp(&key(b)));

        let left = self.split(boxes, start, mid);
        let right = self.split(boxes, mid, end);
        self.nodes[slot] = Node::Split { bbox, left, right };
        slot
    }

    /// Calls `visit` with every primitive whose box overlaps `query` until it
    /// returns `false`.
    pub(crate) fn query_bbox<F>(&self, query: BBox2, mut visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        let mut pending = vec![0usize];
        while let Some(index) = pending.pop() {
            let node = self.nodes[index];
            if !node.bbox().intersects(query) {
                continue;
            }
            match node {
                Node::Leaf { start, end, .. } => {
                    for &prim in &self.order[start..end] {
                        if !visit(prim) {
                            return;
                        }
                    }
                }
                Node::Split { left, right, .. } => pending.extend([right, left]),
            }
        }
    }

    /// Closest primitive to `point` with a squared distance strictly below
    /// `bound2`. `distance2` measures one primitive or returns `None` to skip
    /// it.
    pub(crate) fn nearest<F>(&self, point: Point2, bound2: f64, mut distance2: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut bound2 = bound2;
        let mut best = None;
        let mut frontier = BinaryHeap::from([Candidate {
            dist2: self.nodes[0].bbox().distance_squared_to_point(point),
            node: 0,
        }]);

        while let Some(Candidate { dist2, node }) = frontier.pop() {
            if dist2 > bound2 {
                break;
            }
            match self.nodes[node] {
                Node::Leaf { start, end, .. } => {
                    for &prim in &self.order[start..end] {
                        if let Some(d2) = distance2(prim).filter(|d| d.is_finite() && *d < bound2) {
                            bound2 = d2;
                            best = Some((prim, d2));
                        }
                    }
                }
                Node::Split { left, right, .. } => {
                    for child in [left, right] {
                        let d2 = self.nodes[child].bbox().distance_squared_to_point(point);
                        if d2 <= bound2 {
                            frontier.push(Candidate { dist2: d2, node: child });
                        }
                    }
                }
            }
        }

        best
    }
}

/// Min-heap entry keyed on the squared distance to a node box.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist2: f64,
    node: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| other.node.cmp(&self.node))
    }
}
