//! Level-set tracer interface plus two in-crate tracers.
//!
//! [`GridTracer`] samples a [`ScalarField`] on a regular grid and traces it
//! with marching squares. [`StripTracer`] holds hand-built strips and is what
//! hosts with their own tracer output (and most fixtures) use.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use super::border::Boundary;
use super::field::ScalarField;
use crate::geom::{Point2, Tolerance};

/// Where an iso-value label goes. Rotation is in radians within
/// `(-π/2, π/2]` so text never renders upside down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelPlacement {
    pub level: usize,
    pub position: Point2,
    pub rotation: f64,
}

/// Source of raw strips for every level.
///
/// Strips are lists of point indices; a strip whose first and last index
/// are equal is closed.
pub trait Tracer {
    fn level_count(&self) -> usize;

    fn strip_list(&self, level: usize) -> &[Vec<usize>];

    /// Additional strips the tracer stores apart from the primary list.
    fn extra_strip_list(&self, _level: usize) -> Option<&[Vec<usize>]> {
        None
    }

    fn is_node_on_boundary(&self, index: usize) -> bool;

    fn point(&self, index: usize) -> Option<Point2>;

    /// Sample points where the field is undefined.
    fn undefined_point_indices(&self) -> &[usize];

    /// Grid spacing along x and y.
    fn grid_deltas(&self) -> (f64, f64);

    /// Sample grid as `(rows, cols)`.
    fn grid_size(&self) -> (usize, usize);

    /// Label placements for a level: the middle point of each strip with
    /// the local tangent as rotation.
    fn labels(&self, level: usize) -> Vec<LabelPlacement> {
        self.strip_list(level)
            .iter()
            .filter_map(|strip| {
                if strip.len() < 2 {
                    return None;
                }
                let mid = strip.len() / 2;
                let position = self.point(strip[mid])?;
                let before = self.point(strip[mid - 1])?;
                Some(LabelPlacement {
                    level,
                    position,
                    rotation: upright_angle((position - before).angle()),
                })
            })
            .collect()
    }
}

fn upright_angle(angle: f64) -> f64 {
    if angle > FRAC_PI_2 {
        angle - PI
    } else if angle <= -FRAC_PI_2 {
        angle + PI
    } else {
        angle
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GridTracer
// ─────────────────────────────────────────────────────────────────────────────

/// Marching-squares tracer over a sampled field.
///
/// Node `(row, col)` has index `row * cols + col`; crossing points are
/// appended after the nodes and shared between the two cells of their edge.
#[derive(Debug, Clone)]
pub struct GridTracer {
    rows: usize,
    cols: usize,
    deltas: (f64, f64),
    points: Vec<Point2>,
    on_boundary: Vec<bool>,
    values: Vec<f64>,
    undefined: Vec<usize>,
    strips: Vec<Vec<Vec<usize>>>,
}

impl GridTracer {
    /// Samples `field` on `rows × cols` nodes spanning `boundary` and traces
    /// every level in `levels`. Fewer than two rows or columns are raised
    /// to two.
    #[must_use]
    pub fn new(
        field: &dyn ScalarField,
        boundary: &Boundary,
        rows: usize,
        cols: usize,
        levels: &[f64],
    ) -> Self {
        let rows = rows.max(2);
        let cols = cols.max(2);
        let dx = boundary.width() / (cols - 1) as f64;
        let dy = boundary.height() / (rows - 1) as f64;

        let mut points = Vec::with_capacity(rows * cols);
        let mut on_boundary = Vec::with_capacity(rows * cols);
        let mut values = Vec::with_capacity(rows * cols);
        let mut undefined = Vec::new();

        for row in 0..rows {
            for col in 0..cols {
                // Pin the last row and column to the boundary exactly.
                let x = if col == cols - 1 {
                    boundary.right
                } else {
                    boundary.left + col as f64 * dx
                };
                let y = if row == rows - 1 {
                    boundary.top
                } else {
                    boundary.bottom + row as f64 * dy
                };
                let value = field.value_at(x, y);
                if value.is_nan() {
                    undefined.push(points.len());
                }
                points.push(Point2::new(x, y));
                on_boundary.push(row == 0 || col == 0 || row == rows - 1 || col == cols - 1);
                values.push(value);
            }
        }

        let mut tracer = Self {
            rows,
            cols,
            deltas: (dx, dy),
            points,
            on_boundary,
            values,
            undefined,
            strips: Vec::with_capacity(levels.len()),
        };
        for &level in levels {
            let strips = tracer.trace_level(level);
            log::trace!("grid tracer: level {level} -> {} strips", strips.len());
            tracer.strips.push(strips);
        }
        tracer
    }

    /// Sampled value at a node, `None` for crossing points.
    #[must_use]
    pub fn node_value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    fn node(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn horizontal_edge(&self, row: usize, col: usize) -> usize {
        2 * self.node(row, col)
    }

    fn vertical_edge(&self, row: usize, col: usize) -> usize {
        2 * self.node(row, col) + 1
    }

    fn trace_level(&mut self, level: f64) -> Vec<Vec<usize>> {
        let mut crossings: HashMap<usize, usize> = HashMap::new();
        let mut segments: Vec<(usize, usize)> = Vec::new();

        for row in 0..self.rows - 1 {
            for col in 0..self.cols - 1 {
                let corners = [
                    self.node(row, col),
                    self.node(row, col + 1),
                    self.node(row + 1, col + 1),
                    self.node(row + 1, col),
                ];
                let values = corners.map(|n| self.values[n]);
                if values.iter().any(|v| v.is_nan()) {
                    continue;
                }
                let below = values.map(|v| v < level);

                // Edges: bottom, right, top, left, each with its two corners
                // and whether it lies on the plot boundary.
                let edges = [
                    (self.horizontal_edge(row, col), 0, 1, row == 0),
                    (self.vertical_edge(row, col + 1), 1, 2, col + 2 == self.cols),
                    (self.horizontal_edge(row + 1, col), 3, 2, row + 2 == self.rows),
                    (self.vertical_edge(row, col), 0, 3, col == 0),
                ];
                let mut hit = [None; 4];
                for (slot, &(edge, a, b, border)) in edges.iter().enumerate() {
                    if below[a] != below[b] {
                        hit[slot] = Some(self.crossing(
                            &mut crossings,
                            edge,
                            (corners[a], corners[b]),
                            border,
                            level,
                        ));
                    }
                }

                match hit {
                    [None, None, None, None] => {}
                    [Some(b), Some(r), Some(t), Some(l)] => {
                        let centre = values.iter().sum::<f64>() / 4.0;
                        if (centre < level) == below[0] {
                            // Corners 1 and 3 are cut off.
                            segments.push((b, r));
                            segments.push((t, l));
                        } else {
                            segments.push((b, l));
                            segments.push((r, t));
                        }
                    }
                    _ => {
                        let mut ends = hit.iter().flatten();
                        if let (Some(&a), Some(&b)) = (ends.next(), ends.next()) {
                            segments.push((a, b));
                        }
                    }
                }
            }
        }

        join_segments(&segments)
    }

    fn crossing(
        &mut self,
        crossings: &mut HashMap<usize, usize>,
        edge: usize,
        (a, b): (usize, usize),
        border: bool,
        level: f64,
    ) -> usize {
        if let Some(&index) = crossings.get(&edge) {
            return index;
        }
        let (va, vb) = (self.values[a], self.values[b]);
        let t = ((level - va) / (vb - va)).clamp(0.0, 1.0);
        let point = self.points[a].lerp(self.points[b], t);
        let index = self.points.len();
        self.points.push(point);
        self.on_boundary.push(border);
        crossings.insert(edge, index);
        index
    }
}

/// Chains undirected segments into strips: open chains first (starting at
/// degree-one ends), then cycles, which repeat their first index.
fn join_segments(segments: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut incident: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, &(a, b)) in segments.iter().enumerate() {
        incident.entry(a).or_default().push(i);
        incident.entry(b).or_default().push(i);
    }

    let mut nodes: Vec<usize> = incident.keys().copied().collect();
    nodes.sort_unstable();

    let mut used = vec![false; segments.len()];
    let mut strips = Vec::new();

    let walk = |start: usize, used: &mut [bool]| -> Vec<usize> {
        let mut strip = vec![start];
        let mut current = start;
        while let Some(&segment) = incident
            .get(&current)
            .and_then(|list| list.iter().find(|&&s| !used[s]))
        {
            used[segment] = true;
            let (a, b) = segments[segment];
            current = if a == current { b } else { a };
            strip.push(current);
            if current == start {
                break;
            }
        }
        strip
    };

    for &node in &nodes {
        if incident[&node].len() == 1 && !used[incident[&node][0]] {
            strips.push(walk(node, &mut used));
        }
    }
    for &node in &nodes {
        if incident[&node].iter().any(|&s| !used[s]) {
            strips.push(walk(node, &mut used));
        }
    }

    strips
}

impl Tracer for GridTracer {
    fn level_count(&self) -> usize {
        self.strips.len()
    }

    fn strip_list(&self, level: usize) -> &[Vec<usize>] {
        self.strips.get(level).map_or(&[], Vec::as_slice)
    }

    fn is_node_on_boundary(&self, index: usize) -> bool {
        self.on_boundary.get(index).copied().unwrap_or(false)
    }

    fn point(&self, index: usize) -> Option<Point2> {
        self.points.get(index).copied()
    }

    fn undefined_point_indices(&self) -> &[usize] {
        &self.undefined
    }

    fn grid_deltas(&self) -> (f64, f64) {
        self.deltas
    }

    fn grid_size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StripTracer
// ─────────────────────────────────────────────────────────────────────────────

/// Tracer over strips supplied directly as point lists.
#[derive(Debug, Clone)]
pub struct StripTracer {
    boundary: Boundary,
    points: Vec<Point2>,
    on_boundary: Vec<bool>,
    strips: Vec<Vec<Vec<usize>>>,
    extra: Vec<Option<Vec<Vec<usize>>>>,
    undefined: Vec<usize>,
    deltas: (f64, f64),
    size: (usize, usize),
}

impl StripTracer {
    #[must_use]
    pub fn new(boundary: Boundary, level_count: usize) -> Self {
        Self {
            boundary,
            points: Vec::new(),
            on_boundary: Vec::new(),
            strips: vec![Vec::new(); level_count],
            extra: vec![None; level_count],
            undefined: Vec::new(),
            deltas: (1.0, 1.0),
            size: (0, 0),
        }
    }

    /// Declares the grid the strips were traced on.
    #[must_use]
    pub fn with_grid(mut self, deltas: (f64, f64), size: (usize, usize)) -> Self {
        self.deltas = deltas;
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_undefined_points(mut self, points: &[Point2]) -> Self {
        for &p in points {
            let index = self.add_point(p);
            self.undefined.push(index);
        }
        self
    }

    /// Adds a point; its boundary flag comes from the plot tolerance.
    pub fn add_point(&mut self, p: Point2) -> usize {
        self.points.push(p);
        self.on_boundary
            .push(self.boundary.edge_of(p, Tolerance::PLOT).is_some());
        self.points.len() - 1
    }

    /// Adds a strip from points. A strip whose last point equals its first
    /// reuses the first index, so it reads as closed.
    pub fn add_strip(&mut self, level: usize, points: &[Point2]) -> &mut Self {
        let indices = self.intern(points);
        self.add_strip_indices(level, indices)
    }

    pub fn add_strip_indices(&mut self, level: usize, indices: Vec<usize>) -> &mut Self {
        self.ensure_level(level);
        self.strips[level].push(indices);
        self
    }

    pub fn add_extra_strip(&mut self, level: usize, points: &[Point2]) -> &mut Self {
        let indices = self.intern(points);
        self.ensure_level(level);
        self.extra[level].get_or_insert_with(Vec::new).push(indices);
        self
    }

    fn intern(&mut self, points: &[Point2]) -> Vec<usize> {
        let mut indices: Vec<usize> = points.iter().map(|&p| self.add_point(p)).collect();
        if points.len() > 2 && points.first() == points.last() {
            let last = indices.len() - 1;
            indices[last] = indices[0];
        }
        indices
    }

    fn ensure_level(&mut self, level: usize) {
        if level >= self.strips.len() {
            self.strips.resize(level + 1, Vec::new());
            self.extra.resize(level + 1, None);
        }
    }
}

impl Tracer for StripTracer {
    fn level_count(&self) -> usize {
        self.strips.len()
    }

    fn strip_list(&self, level: usize) -> &[Vec<usize>] {
        self.strips.get(level).map_or(&[], Vec::as_slice)
    }

    fn extra_strip_list(&self, level: usize) -> Option<&[Vec<usize>]> {
        self.extra.get(level)?.as_deref()
    }

    fn is_node_on_boundary(&self, index: usize) -> bool {
        self.on_boundary.get(index).copied().unwrap_or(false)
    }

    fn point(&self, index: usize) -> Option<Point2> {
        self.points.get(index).copied()
    }

    fn undefined_point_indices(&self) -> &[usize] {
        &self.undefined
    }

    fn grid_deltas(&self) -> (f64, f64) {
        self.deltas
    }

    fn grid_size(&self) -> (usize, usize) {
        self.size
    }
}
