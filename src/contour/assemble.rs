//! Region assembly: perimeter walk with strip splicing, interior loops and
//! nesting, and region dedupe.
//!
//! The walk runs anti-clockwise over the sorted [`BorderIndex`] list. Every
//! arc between two consecutive stops belongs to exactly one region: the walk
//! that starts on it follows the perimeter until it reaches a strip endpoint,
//! splices the strip in, and resumes from the strip's far end. Traversal
//! state lives in a `used` vector parallel to the index list and is dropped
//! with the assembly.

use serde::{Deserialize, Serialize};

use super::border::{BorderIndex, Boundary, border_indices, collect_border_strips};
use super::config::Tunables;
use super::strip::{Strip, StripKind};
use crate::geom::{
    AssemblyDiagnostics, BBox2, Point2, Tolerance, centroid, contains_point, interior_point,
    is_closed, open_ring, signed_area,
};

/// Area below which a walk is treated as degenerate, relative to the plot.
const NEGLIGIBLE_AREA: f64 = 1e-9;

/// An assembled region: closed outer ring (counter-clockwise, first point
/// repeated at the end), closed holes (clockwise) and the levels bounding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPath {
    pub points: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
    /// Sorted, deduplicated level indices of every strip on the outline.
    pub levels: Vec<usize>,
    /// Outer ring is an interior closed strip rather than a perimeter walk.
    pub from_loop: bool,
    /// The walk lost its far end and was closed with a straight segment.
    pub fallback: bool,
}

impl ClosedPath {
    fn new(outer: Vec<Point2>, levels: Vec<usize>, from_loop: bool, fallback: bool) -> Self {
        let mut levels = levels;
        levels.sort_unstable();
        levels.dedup();
        Self {
            points: closed_ring(outer, true),
            holes: Vec::new(),
            levels,
            from_loop,
            fallback,
        }
    }

    fn add_hole(&mut self, ring: &[Point2], level: Option<usize>) {
        self.holes.push(closed_ring(ring.to_vec(), false));
        if let Some(level) = level {
            if let Err(slot) = self.levels.binary_search(&level) {
                self.levels.insert(slot, level);
            }
        }
    }

    /// Outer area minus hole areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.points).abs() - holes
    }

    #[must_use]
    pub fn centroid(&self) -> Option<Point2> {
        centroid(&self.points)
    }

    #[must_use]
    pub fn bbox(&self) -> Option<BBox2> {
        BBox2::from_points(&self.points)
    }

    /// A point inside the outer ring and outside every hole.
    #[must_use]
    pub fn interior_point(&self) -> Option<Point2> {
        interior_point(&self.points, &self.holes)
    }

    #[must_use]
    pub fn is_closed(&self, tol: Tolerance) -> bool {
        is_closed(&self.points, tol)
    }

    /// Vertex count without the closing repeat.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        open_ring(&self.points).len()
    }

    fn same_region(&self, other: &Self, tol: Tolerance) -> bool {
        if self.vertex_count() != other.vertex_count() {
            return false;
        }
        let centroids = match (self.centroid(), other.centroid()) {
            (Some(a), Some(b)) => tol.approx_eq_point2(a, b),
            _ => false,
        };
        let boxes = match (self.bbox(), other.bbox()) {
            (Some(a), Some(b)) => a.approx_eq(b, tol),
            _ => false,
        };
        centroids && boxes
    }
}

/// Closes `ring`, drops consecutive duplicates and orients it.
fn closed_ring(ring: Vec<Point2>, counter_clockwise: bool) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(ring.len() + 1);
    for p in ring {
        if out
            .last()
            .is_none_or(|last| !Tolerance::DEFAULT.approx_eq_point2(*last, p))
        {
            out.push(p);
        }
    }
    while out.len() > 1 && Tolerance::DEFAULT.approx_eq_point2(out[0], out[out.len() - 1]) {
        out.pop();
    }
    if (signed_area(&out) > 0.0) != counter_clockwise {
        out.reverse();
    }
    if let Some(&first) = out.first() {
        out.push(first);
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub paths: Vec<ClosedPath>,
    pub diagnostics: AssemblyDiagnostics,
}

/// Assembles every fillable strip into closed regions.
///
/// Boundary strips take part in the perimeter walk; closed strips become
/// loop regions nested into the smallest region containing them. Identical
/// regions are emitted once.
#[must_use]
pub fn assemble_regions(boundary: &Boundary, strips: &[Strip], tunables: &Tunables) -> Assembly {
    let buckets = collect_border_strips(boundary, strips);
    let entries = border_indices(boundary, strips, &buckets);
    assemble_with_index(boundary, strips, &entries, tunables)
}

/// [`assemble_regions`] over a perimeter list already built from `strips`.
#[must_use]
pub fn assemble_with_index(
    boundary: &Boundary,
    strips: &[Strip],
    entries: &[BorderIndex],
    tunables: &Tunables,
) -> Assembly {
    let mut diagnostics = AssemblyDiagnostics::new();
    let tol = tunables.tolerance();
    log::debug!("assemble: {} perimeter stops", entries.len());

    let mut walks = perimeter_walks(boundary, strips, entries, tunables, &mut diagnostics);
    let loops = interior_loops(strips, tol);

    // Nest loops: direct parent is the smallest larger loop containing it.
    let mut loop_paths: Vec<ClosedPath> = loops
        .iter()
        .map(|&i| ClosedPath::new(strips[i].points.clone(), strips[i].level.into_iter().collect(), true, false))
        .collect();
    for (k, &i) in loops.iter().enumerate() {
        let probe = strips[i].points[0];
        let parent = (0..k)
            .rev()
            .find(|&j| contains_point(&strips[loops[j]].points, probe));
        match parent {
            Some(j) => loop_paths[j].add_hole(&strips[i].points, strips[i].level),
            None => {
                let host = walks
                    .iter_mut()
                    .filter(|w| contains_point(&w.points, probe))
                    .min_by(|a, b| a.area().total_cmp(&b.area()));
                if let Some(host) = host {
                    host.add_hole(&strips[i].points, strips[i].level);
                }
            }
        }
    }

    let mut paths: Vec<ClosedPath> = Vec::with_capacity(walks.len() + loop_paths.len());
    for path in walks.into_iter().chain(loop_paths) {
        if paths.iter().any(|p| p.same_region(&path, tol)) {
            diagnostics.duplicate_region_count += 1;
            log::trace!("assemble: dropping duplicate region");
            continue;
        }
        paths.push(path);
    }
    diagnostics.region_count = paths.len();

    log::debug!(
        "assemble: {} regions ({} duplicates, {} discarded walks, {} fallbacks)",
        diagnostics.region_count,
        diagnostics.duplicate_region_count,
        diagnostics.discarded_walk_count,
        diagnostics.fallback_closure_count
    );
    Assembly { paths, diagnostics }
}

fn perimeter_walks(
    boundary: &Boundary,
    strips: &[Strip],
    entries: &[BorderIndex],
    tunables: &Tunables,
    diagnostics: &mut AssemblyDiagnostics,
) -> Vec<ClosedPath> {
    let n = entries.len();
    let min_area = NEGLIGIBLE_AREA * boundary.area().max(1.0);
    let mut used = vec![false; n];
    let mut walks = Vec::new();

    for start in 0..n {
        if used[start] {
            continue;
        }
        let mut ring: Vec<Point2> = Vec::new();
        let mut levels: Vec<usize> = Vec::new();
        let mut fallback = false;
        let mut current = start;
        let mut steps = 0;

        loop {
            used[current] = true;
            ring.push(entries[current].point);
            let next = (current + 1) % n;
            let stop = entries[next];

            current = match stop.strip {
                Some(index) => {
                    let strip = &strips[index];
                    let mut spliced = strip.points_from(stop.at_start);
                    levels.extend(strip.level);
                    let Some(partner) = stop.partner else {
                        ring.append(&mut spliced);
                        fallback = true;
                        log::warn!("assemble: strip {index} has no far end on the perimeter, closing straight");
                        break;
                    };
                    spliced.pop();
                    ring.append(&mut spliced);
                    partner
                }
                None => next,
            };

            if current == start {
                break;
            }
            steps += 1;
            if used[current] || steps > tunables.max_walk_steps {
                fallback = true;
                log::warn!("assemble: walk from stop {start} did not return, closing straight");
                break;
            }
        }

        if fallback {
            diagnostics.fallback_closure_count += 1;
            diagnostics.add_warning(format!("perimeter walk from stop {start} closed with a fallback segment"));
        }

        let path = ClosedPath::new(ring, levels, false, fallback);
        if path.vertex_count() < 3 || path.area().abs() <= min_area {
            diagnostics.discarded_walk_count += 1;
            log::trace!("assemble: discarding degenerate walk from stop {start}");
            continue;
        }
        walks.push(path);
    }

    walks
}

/// Closed strips, duplicates removed, largest first.
fn interior_loops(strips: &[Strip], tol: Tolerance) -> Vec<usize> {
    let mut loops: Vec<usize> = Vec::new();
    for (i, strip) in strips.iter().enumerate() {
        if strip.kind != StripKind::Closed || strip.points.len() < 4 {
            continue;
        }
        let duplicate = loops.iter().any(|&j| {
            let other = &strips[j];
            other.level == strip.level
                && other.points.len() == strip.points.len()
                && match (BBox2::from_points(&other.points), BBox2::from_points(&strip.points)) {
                    (Some(a), Some(b)) => a.approx_eq(b, tol),
                    _ => false,
                }
        });
        if !duplicate {
            loops.push(i);
        }
    }
    loops.sort_by(|&a, &b| {
        signed_area(&strips[b].points)
            .abs()
            .total_cmp(&signed_area(&strips[a].points).abs())
    });
    loops
}
