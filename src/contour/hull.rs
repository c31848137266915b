//! Concave hull of a point set (chi-shape over a Delaunay triangulation).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use delaunator::{EMPTY, next_halfedge};

use crate::geom::{BBox2, Point2, signed_area};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullOptions {
    /// Edge-length threshold in grid resolutions for the first pass.
    pub concavity: f64,
    /// Threshold multiplier applied on each further pass.
    pub growth: f64,
    pub passes: usize,
}

impl Default for HullOptions {
    fn default() -> Self {
        Self {
            concavity: 1.5,
            growth: 2.0,
            passes: 3,
        }
    }
}

/// Counter-clockwise outline of `points` as an open ring.
///
/// Boundary triangles are peeled off longest edge first while that edge is
/// longer than `concavity × resolution`. Each refinement pass loosens the
/// threshold by `growth`; the first pass that yields one simple ring wins,
/// then the convex hull, then a box around the points for inputs with no
/// triangulation (fewer than three points, or all collinear).
#[must_use]
pub fn concave_hull(points: &[Point2], resolution: f64, options: &HullOptions) -> Vec<Point2> {
    let pad = 0.5 * resolution.abs().max(f64::EPSILON);
    let Some(bbox) = BBox2::from_points(points) else {
        return Vec::new();
    };

    let input: Vec<delaunator::Point> = points
        .iter()
        .map(|p| delaunator::Point { x: p.x, y: p.y })
        .collect();
    let triangulation = delaunator::triangulate(&input);
    if triangulation.triangles.is_empty() {
        return box_ring(bbox.expand_by(pad));
    }

    let mut threshold = options.concavity * resolution;
    for pass in 0..options.passes.max(1) {
        if let Some(ring) = chi_shape(points, &triangulation, threshold) {
            log::trace!("hull: pass {pass} accepted {} vertices", ring.len());
            return counter_clockwise(ring);
        }
        threshold *= options.growth;
    }

    let convex: Vec<Point2> = triangulation.hull.iter().map(|&i| points[i]).collect();
    if convex.len() >= 3 && signed_area(&convex).abs() > 0.0 {
        return counter_clockwise(convex);
    }
    box_ring(bbox.expand_by(pad))
}

#[derive(Debug, Clone, Copy)]
struct EdgeEntry {
    length: f64,
    halfedge: usize,
}

impl PartialEq for EdgeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EdgeEntry {}

impl PartialOrd for EdgeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.length
            .total_cmp(&other.length)
            .then_with(|| other.halfedge.cmp(&self.halfedge))
    }
}

fn chi_shape(
    points: &[Point2],
    triangulation: &delaunator::Triangulation,
    threshold: f64,
) -> Option<Vec<Point2>> {
    let triangles = &triangulation.triangles;
    let halfedges = &triangulation.halfedges;
    let edge_length = |e: usize| points[triangles[e]].distance_to(points[triangles[next_halfedge(e)]]);

    let mut alive = vec![true; triangles.len() / 3];
    let mut boundary_edge = vec![false; triangles.len()];
    let mut boundary_vertex = vec![false; points.len()];
    let mut heap = BinaryHeap::new();

    for e in 0..triangles.len() {
        if halfedges[e] == EMPTY {
            boundary_edge[e] = true;
            boundary_vertex[triangles[e]] = true;
            heap.push(EdgeEntry {
                length: edge_length(e),
                halfedge: e,
            });
        }
    }

    while let Some(EdgeEntry { length, halfedge }) = heap.pop() {
        if length <= threshold {
            break;
        }
        let triangle = halfedge / 3;
        if !boundary_edge[halfedge] || !alive[triangle] {
            continue;
        }
        let e1 = next_halfedge(halfedge);
        let e2 = next_halfedge(e1);
        let opposite = triangles[e2];
        if boundary_vertex[opposite] {
            continue;
        }

        alive[triangle] = false;
        boundary_edge[halfedge] = false;
        boundary_vertex[opposite] = true;
        for e in [e1, e2] {
            let twin = halfedges[e];
            if twin == EMPTY {
                continue;
            }
            boundary_edge[twin] = true;
            heap.push(EdgeEntry {
                length: edge_length(twin),
                halfedge: twin,
            });
        }
    }

    // Chain the surviving boundary edges; exactly one loop is a valid hull.
    let mut next_from: HashMap<usize, usize> = HashMap::new();
    let mut count = 0;
    for e in 0..triangles.len() {
        if boundary_edge[e] && alive[e / 3] {
            if next_from.insert(triangles[e], e).is_some() {
                return None;
            }
            count += 1;
        }
    }
    let (&start, _) = next_from.iter().min_by_key(|(v, _)| **v)?;
    let mut ring = Vec::with_capacity(count);
    let mut vertex = start;
    loop {
        ring.push(points[vertex]);
        let e = *next_from.get(&vertex)?;
        vertex = triangles[next_halfedge(e)];
        if vertex == start || ring.len() > count {
            break;
        }
    }

    (ring.len() == count && ring.len() >= 3 && signed_area(&ring).abs() > 0.0).then_some(ring)
}

fn counter_clockwise(mut ring: Vec<Point2>) -> Vec<Point2> {
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }
    ring
}

fn box_ring(bbox: BBox2) -> Vec<Point2> {
    vec![
        bbox.min,
        Point2::new(bbox.max.x, bbox.min.y),
        bbox.max,
        Point2::new(bbox.min.x, bbox.max.y),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::contains_point;

    #[test]
    fn single_point_gets_padded_box() {
        let ring = concave_hull(&[Point2::new(2.0, 3.0)], 1.0, &HullOptions::default());
        assert_eq!(ring.len(), 4);
        assert!((signed_area(&ring) - 1.0).abs() < 1e-12);
        assert!(concave_hull(&[], 1.0, &HullOptions::default()).is_empty());
    }

    #[test]
    fn collinear_points_get_padded_box() {
        let points: Vec<Point2> = (0..4).map(|i| Point2::new(i as f64, 0.0)).collect();
        let ring = concave_hull(&points, 1.0, &HullOptions::default());
        assert_eq!(ring.len(), 4);
        assert!(signed_area(&ring) > 0.0);
    }

    #[test]
    fn l_shape_keeps_its_notch() {
        let mut points = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                if i < 2 || j < 2 {
                    points.push(Point2::new(i as f64, j as f64));
                }
            }
        }
        let ring = concave_hull(&points, 1.0, &HullOptions::default());
        assert!(signed_area(&ring) > 0.0);
        assert!(!contains_point(&ring, Point2::new(4.0, 4.0)));
        assert!(contains_point(&ring, Point2::new(0.5, 4.5)));
        assert!(contains_point(&ring, Point2::new(4.5, 0.5)));
    }

    #[test]
    fn square_grid_hull_is_its_outline() {
        let mut points = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                points.push(Point2::new(i as f64, j as f64));
            }
        }
        let ring = concave_hull(&points, 1.0, &HullOptions::default());
        assert!((signed_area(&ring) - 4.0).abs() < 1e-9);
    }
}
