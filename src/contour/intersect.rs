//! Crossing detection between strips of one level and reorganization of
//! crossing strips into non-crossing ones.
//!
//! Crossings and strip endpoints become nodes of a graph whose edges are the
//! strip pieces between consecutive nodes. Paths through the graph always
//! bounce at a crossing: a path that arrives on one strip leaves on the
//! other. Boundary endpoints are paired with a bidirectional breadth-first
//! search, preferring the nearest unresolved endpoint along the perimeter;
//! pieces left over form closed cycles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::border::Boundary;
use super::config::Tunables;
use super::strip::{Strip, StripKind, StripSource};
use crate::geom::{
    BBox2, Bvh, Point2, Tolerance, Vec2, collapse_collinear, segment_intersection, signed_area,
};

const PARAM_EPS: f64 = 1e-9;

/// Two strips crossing at `point`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub strip_a: usize,
    pub strip_b: usize,
    /// Segment index on `strip_a`.
    pub index_a: usize,
    pub index_b: usize,
    pub point: Point2,
    /// Parameter along segment `index_a`, in `[0, 1)`.
    pub t_a: f64,
    pub t_b: f64,
    /// Rank by angle around the sort centre.
    pub intersection_index: usize,
}

impl Intersection {
    fn param_a(&self) -> f64 {
        self.index_a as f64 + self.t_a
    }

    fn param_b(&self) -> f64 {
        self.index_b as f64 + self.t_b
    }
}

/// Every crossing between the segments of `strips`, including a strip
/// crossing itself. Segments are half-open, so a crossing at a shared vertex
/// is reported once, and a shared vertex where both strips merely touch is
/// not reported. Results are ranked by angle around `centre`.
#[must_use]
pub fn find_intersections(strips: &[Strip], centre: Point2) -> Vec<Intersection> {
    let mut segments: Vec<(usize, usize)> = Vec::new();
    let mut boxes: Vec<BBox2> = Vec::new();
    for (s, strip) in strips.iter().enumerate() {
        for k in 0..strip.points.len().saturating_sub(1) {
            segments.push((s, k));
            boxes.push(BBox2::from_segment(strip.points[k], strip.points[k + 1]));
        }
    }
    let Some(bvh) = Bvh::build(&boxes) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for (i, &(sa, ka)) in segments.iter().enumerate() {
        let a = &strips[sa];
        bvh.query_bbox(boxes[i], |j| {
            if j <= i {
                return true;
            }
            let (sb, kb) = segments[j];
            let b = &strips[sb];
            if sa == sb && adjacent_segments(a, ka, kb) {
                return true;
            }
            let hit = segment_intersection(
                a.points[ka],
                a.points[ka + 1],
                b.points[kb],
                b.points[kb + 1],
            );
            if let Some((point, t, u)) = hit {
                let half_open = t < 1.0 - PARAM_EPS && u < 1.0 - PARAM_EPS;
                let touching = t <= PARAM_EPS && u <= PARAM_EPS;
                let at_start = (ka == 0 && t <= PARAM_EPS && !a.is_closed())
                    || (kb == 0 && u <= PARAM_EPS && !b.is_closed());
                if half_open && !touching && !at_start {
                    found.push(Intersection {
                        strip_a: sa,
                        strip_b: sb,
                        index_a: ka,
                        index_b: kb,
                        point,
                        t_a: t,
                        t_b: u,
                        intersection_index: 0,
                    });
                }
            }
            true
        });
    }

    found.sort_by(|x, y| {
        let ax = (x.point - centre).angle();
        let ay = (y.point - centre).angle();
        ax.total_cmp(&ay)
            .then(x.strip_a.cmp(&y.strip_a))
            .then(x.param_a().total_cmp(&y.param_a()))
    });
    for (rank, x) in found.iter_mut().enumerate() {
        x.intersection_index = rank;
    }
    found
}

fn adjacent_segments(strip: &Strip, a: usize, b: usize) -> bool {
    let last = strip.points.len().saturating_sub(2);
    a.abs_diff(b) <= 1 || (strip.is_closed() && ((a == 0 && b == last) || (b == 0 && a == last)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Crossing graph
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    /// Boundary end of an open strip, with its perimeter position.
    Endpoint { position: f64 },
    Crossing,
}

#[derive(Debug, Clone)]
struct GraphEdge {
    nodes: [usize; 2],
    /// Crossing side at each end; `None` at endpoints.
    sides: [Option<u8>; 2],
    points: Vec<Point2>,
}

/// Directed traversal state: `edge * 2 + dir`, `dir == 0` running from
/// `nodes[0]` to `nodes[1]`.
type State = usize;

struct CrossingGraph {
    kinds: Vec<NodeKind>,
    edges: Vec<GraphEdge>,
    incident: Vec<Vec<(usize, usize)>>,
}

impl CrossingGraph {
    fn build(
        strips: &[Strip],
        intersections: &[Intersection],
        involved: &[bool],
        boundary: &Boundary,
    ) -> Self {
        let mut kinds: Vec<NodeKind> = vec![NodeKind::Crossing; intersections.len()];
        let mut stops: Vec<Vec<(f64, usize, Option<u8>, Point2)>> = vec![Vec::new(); strips.len()];
        for (node, x) in intersections.iter().enumerate() {
            stops[x.strip_a].push((x.param_a(), node, Some(0), x.point));
            stops[x.strip_b].push((x.param_b(), node, Some(1), x.point));
        }

        let mut edges = Vec::new();
        for (s, strip) in strips.iter().enumerate() {
            if !involved[s] {
                continue;
            }
            let list = &mut stops[s];
            list.sort_by(|a, b| a.0.total_cmp(&b.0));
            let closed = strip.kind == StripKind::Closed;

            if !closed {
                let last = strip.points.len() - 1;
                for (param, p, edge) in [
                    (0.0, strip.points[0], strip.start.edge()),
                    (last as f64, strip.points[last], strip.end.edge()),
                ] {
                    let position = match edge {
                        Some(edge) => boundary.perimeter_position(p, edge),
                        None => {
                            let (edge, q) = boundary.nearest_edge(p);
                            boundary.perimeter_position(q, edge)
                        }
                    };
                    kinds.push(NodeKind::Endpoint { position });
                    let stop = (param, kinds.len() - 1, None, p);
                    if param == 0.0 {
                        list.insert(0, stop);
                    } else {
                        list.push(stop);
                    }
                }
            }

            let count = list.len();
            let pairs = if closed { count } else { count - 1 };
            for i in 0..pairs {
                let from = list[i];
                let to = list[(i + 1) % count];
                edges.push(GraphEdge {
                    nodes: [from.1, to.1],
                    sides: [from.2, to.2],
                    points: slice(&strip.points, (from.0, from.3), (to.0, to.3), closed),
                });
            }
        }

        let mut incident = vec![Vec::new(); kinds.len()];
        for (e, edge) in edges.iter().enumerate() {
            incident[edge.nodes[0]].push((e, 0));
            incident[edge.nodes[1]].push((e, 1));
        }

        Self {
            kinds,
            edges,
            incident,
        }
    }

    fn tail(&self, state: State) -> (usize, usize) {
        let (e, dir) = (state / 2, state % 2);
        (self.edges[e].nodes[dir], dir)
    }

    fn head(&self, state: State) -> (usize, usize) {
        let (e, dir) = (state / 2, state % 2);
        (self.edges[e].nodes[1 - dir], 1 - dir)
    }

    /// States leaving the head of `state` on the other crossing side.
    fn successors(&self, state: State, used: &[bool]) -> Vec<State> {
        let (node, end) = self.head(state);
        let Some(side) = self.edges[state / 2].sides[end] else {
            return Vec::new();
        };
        self.incident[node]
            .iter()
            .filter(|&&(e, at)| !used[e] && self.edges[e].sides[at] == Some(1 - side))
            .map(|&(e, at)| e * 2 + at)
            .collect()
    }

    /// States arriving at the tail of `state` on the other crossing side.
    fn predecessors(&self, state: State, used: &[bool]) -> Vec<State> {
        let (node, end) = self.tail(state);
        let Some(side) = self.edges[state / 2].sides[end] else {
            return Vec::new();
        };
        self.incident[node]
            .iter()
            .filter(|&&(e, at)| !used[e] && self.edges[e].sides[at] == Some(1 - side))
            .map(|&(e, at)| e * 2 + (1 - at))
            .collect()
    }

    /// Shortest bouncing path from `start` to `goal`, searching from both
    /// ends and expanding the smaller frontier first.
    fn search(&self, start: State, goal: State, used: &[bool]) -> Option<Vec<State>> {
        if used[start / 2] || used[goal / 2] {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let mut forward: HashMap<State, Option<State>> = HashMap::from([(start, None)]);
        let mut backward: HashMap<State, Option<State>> = HashMap::from([(goal, None)]);
        let mut front = vec![start];
        let mut back = vec![goal];

        while !front.is_empty() && !back.is_empty() {
            let meet = if front.len() <= back.len() {
                let mut next = Vec::new();
                let mut meet = None;
                'expand: for &s in &front {
                    for t in self.successors(s, used) {
                        if forward.contains_key(&t) {
                            continue;
                        }
                        forward.insert(t, Some(s));
                        if backward.contains_key(&t) {
                            meet = Some(t);
                            break 'expand;
                        }
                        next.push(t);
                    }
                }
                front = next;
                meet
            } else {
                let mut next = Vec::new();
                let mut meet = None;
                'expand: for &s in &back {
                    for t in self.predecessors(s, used) {
                        if backward.contains_key(&t) {
                            continue;
                        }
                        backward.insert(t, Some(s));
                        if forward.contains_key(&t) {
                            meet = Some(t);
                            break 'expand;
                        }
                        next.push(t);
                    }
                }
                back = next;
                meet
            };

            if let Some(meet) = meet {
                let mut path = Vec::new();
                let mut cursor = Some(meet);
                while let Some(s) = cursor {
                    path.push(s);
                    cursor = forward.get(&s).copied().flatten();
                }
                path.reverse();
                let mut cursor = backward.get(&meet).copied().flatten();
                while let Some(s) = cursor {
                    path.push(s);
                    cursor = backward.get(&s).copied().flatten();
                }
                return Some(path);
            }
        }
        None
    }

    fn state_points(&self, state: State) -> Vec<Point2> {
        let points = &self.edges[state / 2].points;
        if state % 2 == 0 {
            points.clone()
        } else {
            points.iter().rev().copied().collect()
        }
    }

    fn path_points(&self, path: &[State]) -> Vec<Point2> {
        let mut out: Vec<Point2> = Vec::new();
        for &state in path {
            for p in self.state_points(state) {
                if out
                    .last()
                    .is_none_or(|last| !Tolerance::DEFAULT.approx_eq_point2(*last, p))
                {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Closed walk over unused edges starting with `start`, turning as far
    /// left as possible at every crossing. `None` if the walk gets stuck.
    fn cycle_from(&self, start: State, used: &mut [bool]) -> Option<Vec<State>> {
        let mut path = vec![start];
        used[start / 2] = true;
        let mut current = start;
        loop {
            let (node, end) = self.head(current);
            let side = self.edges[current / 2].sides[end]?;

            let closes = self.incident[node]
                .iter()
                .any(|&(e, at)| e * 2 + at == start && self.edges[e].sides[at] == Some(1 - side));
            if closes {
                return Some(path);
            }

            let incoming = direction_at_end(&self.state_points(current));
            let next = self
                .successors(current, used)
                .into_iter()
                .max_by(|&a, &b| {
                    let ta = turn(incoming, direction_at_start(&self.state_points(a)));
                    let tb = turn(incoming, direction_at_start(&self.state_points(b)));
                    ta.total_cmp(&tb)
                })?;
            used[next / 2] = true;
            path.push(next);
            current = next;
        }
    }
}

/// Strip geometry between parameters `from` and `to`, inclusive of both
/// stop points. On closed strips `to <= from` wraps past the closing vertex.
fn slice(points: &[Point2], from: (f64, Point2), to: (f64, Point2), closed: bool) -> Vec<Point2> {
    let mut out = vec![from.1];
    let first = from.0.floor() as usize + 1;
    let last = to.0.ceil() as usize;
    if closed && to.0 <= from.0 {
        let ring_len = points.len() - 1;
        out.extend(points.iter().take(ring_len).skip(first));
        out.extend(points.iter().take(last));
    } else if first < last {
        out.extend_from_slice(&points[first..last]);
    }
    out.push(to.1);
    out
}

fn direction_at_end(points: &[Point2]) -> Vec2 {
    let n = points.len();
    let last = points[n - 1];
    let prev = points[..n - 1]
        .iter()
        .rev()
        .find(|p| !Tolerance::DEFAULT.approx_eq_point2(**p, last))
        .copied()
        .unwrap_or(last);
    last - prev
}

fn direction_at_start(points: &[Point2]) -> Vec2 {
    let first = points[0];
    let next = points[1..]
        .iter()
        .find(|p| !Tolerance::DEFAULT.approx_eq_point2(**p, first))
        .copied()
        .unwrap_or(first);
    next - first
}

/// Signed turning angle from `a` to `b`, positive to the left.
fn turn(a: Vec2, b: Vec2) -> f64 {
    a.cross(b).atan2(a.dot(b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Reorganization
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ReorganizeOutcome {
    pub strips: Vec<Strip>,
    pub intersections: Vec<Intersection>,
    /// Crossing strips were replaced.
    pub reorganized: bool,
    pub reorganized_strips: usize,
    pub collapse_fallbacks: usize,
    pub slivers: usize,
    /// Boundary endpoints without a partner; nonzero means the original
    /// strips were kept.
    pub unresolved: usize,
}

/// Replaces crossing strips of one level with non-crossing ones.
///
/// `strips` are the fillable strips of `level`. Strips without crossings
/// pass through unchanged. If some boundary endpoint cannot be paired the
/// level keeps its original strips.
#[must_use]
pub fn reorganize_level(
    level: usize,
    strips: Vec<Strip>,
    boundary: &Boundary,
    tunables: &Tunables,
) -> ReorganizeOutcome {
    let intersections = find_intersections(&strips, boundary.center());
    if intersections.is_empty() {
        return ReorganizeOutcome {
            strips,
            ..ReorganizeOutcome::default()
        };
    }
    log::debug!(
        "reorganize: level {level} has {} crossings",
        intersections.len()
    );

    let mut involved = vec![false; strips.len()];
    for x in &intersections {
        involved[x.strip_a] = true;
        involved[x.strip_b] = true;
    }

    let graph = CrossingGraph::build(&strips, &intersections, &involved, boundary);
    let mut used = vec![false; graph.edges.len()];

    // Endpoint node -> (state leaving it, state arriving at it).
    let mut endpoints: Vec<(usize, f64, State, State)> = Vec::new();
    for (node, kind) in graph.kinds.iter().enumerate() {
        if let NodeKind::Endpoint { position } = *kind {
            if let Some(&(e, at)) = graph.incident[node].first() {
                endpoints.push((node, position, e * 2 + at, e * 2 + (1 - at)));
            }
        }
    }
    endpoints.sort_by(|a, b| a.1.total_cmp(&b.1));

    let perimeter = boundary.perimeter();
    let circular = |a: f64, b: f64| {
        let d = (a - b).abs();
        d.min(perimeter - d)
    };

    let mut resolved = vec![false; endpoints.len()];
    let mut chords: Vec<Vec<Point2>> = Vec::new();
    for i in 0..endpoints.len() {
        if resolved[i] {
            continue;
        }
        let (_, position, leaving, _) = endpoints[i];
        let mut candidates: Vec<usize> = (0..endpoints.len())
            .filter(|&j| j != i && !resolved[j])
            .collect();
        candidates.sort_by(|&a, &b| {
            circular(position, endpoints[a].1).total_cmp(&circular(position, endpoints[b].1))
        });

        for j in candidates {
            let Some(path) = graph.search(leaving, endpoints[j].3, &used) else {
                continue;
            };
            let mut edges: Vec<usize> = path.iter().map(|s| s / 2).collect();
            edges.sort_unstable();
            edges.dedup();
            if edges.len() != path.len() {
                continue;
            }
            for e in edges {
                used[e] = true;
            }
            resolved[i] = true;
            resolved[j] = true;
            chords.push(graph.path_points(&path));
            break;
        }
    }

    let unresolved = resolved.iter().filter(|r| !**r).count();
    if unresolved > 0 {
        log::warn!("reorganize: level {level} left {unresolved} endpoints unpaired, keeping original strips");
        return ReorganizeOutcome {
            strips,
            intersections,
            unresolved,
            ..ReorganizeOutcome::default()
        };
    }

    let mut cycles: Vec<Vec<Point2>> = Vec::new();
    for e in 0..graph.edges.len() {
        if used[e] {
            continue;
        }
        if let Some(path) = graph.cycle_from(e * 2, &mut used) {
            let mut ring = graph.path_points(&path);
            if let Some(&first) = ring.first() {
                if ring.last().is_some_and(|l| !Tolerance::DEFAULT.approx_eq_point2(*l, first)) {
                    ring.push(first);
                }
            }
            cycles.push(ring);
        }
    }

    let largest = cycles
        .iter()
        .map(|c| signed_area(c).abs())
        .fold(0.0, f64::max);
    let before = cycles.len();
    cycles.retain(|c| signed_area(c).abs() >= tunables.min_region_area_ratio * largest && c.len() >= 4);
    let slivers = before - cycles.len();

    let tolerance = tunables.tolerance();
    let mut collapse_fallbacks = 0;
    let mut out: Vec<Strip> = strips
        .into_iter()
        .zip(&involved)
        .filter(|(_, involved)| !**involved)
        .map(|(strip, _)| strip)
        .collect();
    let mut reorganized_strips = 0;

    for (points, closed) in chords
        .into_iter()
        .map(|c| (c, false))
        .chain(cycles.into_iter().map(|c| (c, true)))
    {
        let collapsed = collapse_collinear(&points, tunables.collinear_epsilon);
        let degenerate = if closed {
            collapsed.len() < 4 || signed_area(&collapsed).abs() < 0.5 * signed_area(&points).abs()
        } else {
            collapsed.len() < 2
        };
        let points = if degenerate {
            collapse_fallbacks += 1;
            log::debug!("reorganize: collinear collapse degenerated, keeping raw geometry");
            points
        } else {
            collapsed
        };
        let mut strip = Strip::new(Some(level), StripSource::Reorganized, Vec::new(), points);
        strip.classify(boundary, tolerance, false, None);
        out.push(strip);
        reorganized_strips += 1;
    }

    ReorganizeOutcome {
        strips: out,
        intersections,
        reorganized: true,
        reorganized_strips,
        collapse_fallbacks,
        slivers,
        unresolved: 0,
    }
}
