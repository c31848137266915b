//! Plot boundary, per-edge strip buckets and the perimeter index list.
//!
//! Perimeter positions are arc lengths measured anti-clockwise from the
//! bottom-left corner: the bottom edge covers `[0, w)`, the right edge
//! `[w, w + h)`, the top edge `[w + h, 2w + h)` and the left edge
//! `[2w + h, 2w + 2h)`.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::ConfigError;
use super::strip::{BorderDirection, Strip, StripKind};
use crate::geom::{BBox2, Point2, Tolerance};

// ─────────────────────────────────────────────────────────────────────────────
// Boundary
// ─────────────────────────────────────────────────────────────────────────────

/// The plot rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Boundary {
    #[must_use]
    pub const fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [self.left, self.bottom, self.right, self.top];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidBoundary(format!(
                "non-finite edge in {self:?}"
            )));
        }
        if self.right <= self.left || self.top <= self.bottom {
            return Err(ConfigError::InvalidBoundary(format!(
                "empty rectangle {self:?}"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[must_use]
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }

    #[must_use]
    pub fn bbox(&self) -> BBox2 {
        BBox2::new(
            Point2::new(self.left, self.bottom),
            Point2::new(self.right, self.top),
        )
    }

    #[must_use]
    pub fn center(&self) -> Point2 {
        self.bbox().center()
    }

    /// Corners anti-clockwise from bottom-left.
    #[must_use]
    pub fn corners(&self) -> [Point2; 4] {
        [
            Point2::new(self.left, self.bottom),
            Point2::new(self.right, self.bottom),
            Point2::new(self.right, self.top),
            Point2::new(self.left, self.top),
        ]
    }

    /// Perimeter positions of the corners, matching [`Boundary::corners`].
    #[must_use]
    pub fn corner_positions(&self) -> [f64; 4] {
        let (w, h) = (self.width(), self.height());
        [0.0, w, w + h, 2.0 * w + h]
    }

    #[must_use]
    pub fn contains(&self, p: Point2) -> bool {
        self.bbox().contains_point(p)
    }

    /// First edge within `tol` of `p`, testing bottom, right, top, left.
    #[must_use]
    pub fn edge_of(&self, p: Point2, tol: Tolerance) -> Option<BorderEdge> {
        let eps = tol.eps;
        let in_x = p.x >= self.left - eps && p.x <= self.right + eps;
        let in_y = p.y >= self.bottom - eps && p.y <= self.top + eps;
        BorderEdge::ALL.into_iter().find(|edge| match edge {
            BorderEdge::Bottom => in_x && (p.y - self.bottom).abs() <= eps,
            BorderEdge::Right => in_y && (p.x - self.right).abs() <= eps,
            BorderEdge::Top => in_x && (p.y - self.top).abs() <= eps,
            BorderEdge::Left => in_y && (p.x - self.left).abs() <= eps,
        })
    }

    /// Moves `p` onto `edge`, pinning it to a corner within `tol`.
    #[must_use]
    pub fn snap(&self, p: Point2, edge: BorderEdge, tol: Tolerance) -> Point2 {
        if let Some(corner) = self
            .corners()
            .into_iter()
            .find(|c| tol.approx_eq_point2(*c, p))
        {
            return corner;
        }
        self.project(p, edge)
    }

    /// Orthogonal projection of `p` onto `edge`, clamped to the edge.
    #[must_use]
    pub fn project(&self, p: Point2, edge: BorderEdge) -> Point2 {
        let x = p.x.clamp(self.left, self.right);
        let y = p.y.clamp(self.bottom, self.top);
        match edge {
            BorderEdge::Bottom => Point2::new(x, self.bottom),
            BorderEdge::Right => Point2::new(self.right, y),
            BorderEdge::Top => Point2::new(x, self.top),
            BorderEdge::Left => Point2::new(self.left, y),
        }
    }

    /// Closest edge and the projection of `p` onto it.
    #[must_use]
    pub fn nearest_edge(&self, p: Point2) -> (BorderEdge, Point2) {
        let mut best = (BorderEdge::Bottom, self.project(p, BorderEdge::Bottom));
        let mut best_dist = best.1.distance_squared_to(p);
        for edge in [BorderEdge::Right, BorderEdge::Top, BorderEdge::Left] {
            let q = self.project(p, edge);
            let d = q.distance_squared_to(p);
            if d < best_dist {
                best = (edge, q);
                best_dist = d;
            }
        }
        best
    }

    /// Anti-clockwise arc length from the bottom-left corner to `p` on `edge`.
    #[must_use]
    pub fn perimeter_position(&self, p: Point2, edge: BorderEdge) -> f64 {
        let (w, h) = (self.width(), self.height());
        let pos = match edge {
            BorderEdge::Bottom => (p.x - self.left).clamp(0.0, w),
            BorderEdge::Right => w + (p.y - self.bottom).clamp(0.0, h),
            BorderEdge::Top => w + h + (self.right - p.x).clamp(0.0, w),
            BorderEdge::Left => 2.0 * w + h + (self.top - p.y).clamp(0.0, h),
        };
        let perimeter = self.perimeter();
        if pos >= perimeter { pos - perimeter } else { pos }
    }

    /// Whether the segment `a`–`b` runs along a single edge.
    #[must_use]
    pub fn segment_on_edge(&self, a: Point2, b: Point2, tol: Tolerance) -> bool {
        let eps = tol.eps;
        ((a.y - self.bottom).abs() <= eps && (b.y - self.bottom).abs() <= eps)
            || ((a.x - self.right).abs() <= eps && (b.x - self.right).abs() <= eps)
            || ((a.y - self.top).abs() <= eps && (b.y - self.top).abs() <= eps)
            || ((a.x - self.left).abs() <= eps && (b.x - self.left).abs() <= eps)
    }
}

/// One side of the plot rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BorderEdge {
    Bottom,
    Right,
    Top,
    Left,
}

impl BorderEdge {
    /// Test order for endpoint classification.
    pub const ALL: [Self; 4] = [Self::Bottom, Self::Right, Self::Top, Self::Left];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Bottom => 0,
            Self::Right => 1,
            Self::Top => 2,
            Self::Left => 3,
        }
    }

    #[must_use]
    pub const fn direction(self) -> BorderDirection {
        match self {
            Self::Bottom => BorderDirection::XForward,
            Self::Right => BorderDirection::YForward,
            Self::Top => BorderDirection::XBackward,
            Self::Left => BorderDirection::YBackward,
        }
    }

    /// Whether travelling from `a` to `b` follows the edge's canonical
    /// direction.
    #[must_use]
    pub fn runs_forward(self, a: Point2, b: Point2) -> bool {
        match self {
            Self::Bottom => b.x >= a.x,
            Self::Right => b.y >= a.y,
            Self::Top => b.x <= a.x,
            Self::Left => b.y <= a.y,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-edge buckets
// ─────────────────────────────────────────────────────────────────────────────

/// A boundary strip filed under one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderEntry {
    pub strip: usize,
    /// Index into the strip's points of the end that comes first along the
    /// edge's canonical direction.
    pub point_index: usize,
    pub reversed: bool,
}

/// Boundary strips bucketed by the edge of their start point.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BorderBuckets {
    edges: [Vec<BorderEntry>; 4],
}

impl BorderBuckets {
    #[must_use]
    pub fn edge(&self, edge: BorderEdge) -> &[BorderEntry] {
        &self.edges[edge.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &BorderEntry> {
        self.edges.iter().flatten()
    }
}

/// Buckets every boundary strip under exactly one edge.
///
/// A strip goes under its start edge, or its end edge when the start end
/// could not be placed. Strips touching the same edge twice stay in that
/// single bucket with their `reversed` flag. Entries within a bucket are
/// ordered along the edge.
#[must_use]
pub fn collect_border_strips(boundary: &Boundary, strips: &[Strip]) -> BorderBuckets {
    let mut buckets = BorderBuckets::default();

    for (index, strip) in strips.iter().enumerate() {
        if strip.kind != StripKind::Boundary || strip.points.is_empty() {
            continue;
        }
        let last = strip.points.len() - 1;
        let (edge, point_index) = match (strip.start.edge(), strip.end.edge()) {
            (Some(edge), _) => (edge, if strip.reversed { last } else { 0 }),
            (None, Some(edge)) => (edge, last),
            (None, None) => continue,
        };
        buckets.edges[edge.index()].push(BorderEntry {
            strip: index,
            point_index,
            reversed: strip.reversed,
        });
    }

    for (edge, bucket) in BorderEdge::ALL.into_iter().zip(buckets.edges.iter_mut()) {
        bucket.sort_by(|a, b| {
            let pa = boundary.perimeter_position(strips[a.strip].points[a.point_index], edge);
            let pb = boundary.perimeter_position(strips[b.strip].points[b.point_index], edge);
            pa.total_cmp(&pb).then(a.strip.cmp(&b.strip))
        });
    }

    buckets
}

// ─────────────────────────────────────────────────────────────────────────────
// Perimeter index list
// ─────────────────────────────────────────────────────────────────────────────

/// One stop on the perimeter walk: a corner or a strip endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderIndex {
    pub point: Point2,
    /// Owning strip; `None` for corners.
    pub strip: Option<usize>,
    /// Whether this is the strip's first point.
    pub at_start: bool,
    pub position: f64,
    pub corner: bool,
    /// Position in the sorted list of the strip's other end, if it has one.
    pub partner: Option<usize>,
}

/// Sorted perimeter list: the four corners plus both ends of every bucketed
/// strip, ordered anti-clockwise from the bottom-left corner.
///
/// Entries sharing a position keep strips properly nested: corners first,
/// then the strip whose other end lies farther along the perimeter.
#[must_use]
pub fn border_indices(
    boundary: &Boundary,
    strips: &[Strip],
    buckets: &BorderBuckets,
) -> Vec<BorderIndex> {
    let mut entries: Vec<BorderIndex> = boundary
        .corners()
        .into_iter()
        .zip(boundary.corner_positions())
        .map(|(point, position)| BorderIndex {
            point,
            strip: None,
            at_start: false,
            position,
            corner: true,
            partner: None,
        })
        .collect();

    for entry in buckets.iter() {
        let strip = &strips[entry.strip];
        let last = strip.points.len() - 1;
        let ends = [
            (strip.start, strip.points[0], true),
            (strip.end, strip.points[last], false),
        ];
        for (direction, point, at_start) in ends {
            let Some(edge) = direction.edge() else {
                continue;
            };
            entries.push(BorderIndex {
                point,
                strip: Some(entry.strip),
                at_start,
                position: boundary.perimeter_position(point, edge),
                corner: false,
                partner: None,
            });
        }
    }

    let perimeter = boundary.perimeter();
    let mut partner_position: HashMap<(usize, bool), f64> = HashMap::new();
    for e in &entries {
        if let Some(strip) = e.strip {
            partner_position.insert((strip, e.at_start), e.position);
        }
    }
    let span = |e: &BorderIndex| -> Option<f64> {
        let strip = e.strip?;
        let other = partner_position.get(&(strip, !e.at_start))?;
        Some((other - e.position).rem_euclid(perimeter))
    };

    entries.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then_with(|| b.corner.cmp(&a.corner))
            .then_with(|| match (span(a), span(b)) {
                (Some(sa), Some(sb)) => sb.total_cmp(&sa).then_with(|| {
                    // Equal spans: reverse the order at the far end so the
                    // two strips nest instead of crossing.
                    let lower = sa <= perimeter * 0.5;
                    let by_strip = a.strip.cmp(&b.strip);
                    if lower { by_strip } else { by_strip.reverse() }
                }),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.strip.cmp(&b.strip),
            })
            .then_with(|| b.at_start.cmp(&a.at_start))
    });

    let mut slot: HashMap<(usize, bool), usize> = HashMap::new();
    for (i, e) in entries.iter().enumerate() {
        if let Some(strip) = e.strip {
            slot.insert((strip, e.at_start), i);
        }
    }
    for e in &mut entries {
        if let Some(strip) = e.strip {
            e.partner = slot.get(&(strip, !e.at_start)).copied();
        }
    }

    entries
}
