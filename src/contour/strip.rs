//! Strips and their boundary classification.

use serde::{Deserialize, Serialize};

use super::border::{BorderEdge, Boundary};
use crate::geom::{Point2, Tolerance};

/// Canonical travel direction of the edge an endpoint touches.
///
/// Bottom runs with increasing x, right with increasing y, top with
/// decreasing x and left with decreasing y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BorderDirection {
    XForward,
    YForward,
    XBackward,
    YBackward,
    #[default]
    None,
}

impl BorderDirection {
    #[must_use]
    pub const fn edge(self) -> Option<BorderEdge> {
        match self {
            Self::XForward => Some(BorderEdge::Bottom),
            Self::YForward => Some(BorderEdge::Right),
            Self::XBackward => Some(BorderEdge::Top),
            Self::YBackward => Some(BorderEdge::Left),
            Self::None => None,
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

/// Where a strip came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StripSource {
    /// Position `list` in the tracer's strip list for its level.
    Traced { list: usize },
    /// Position `list` in the tracer's extra strip store.
    Extra { list: usize },
    /// Outline of discontinuity cluster `cluster`.
    Discontinuity { cluster: usize },
    /// Rebuilt from crossing strips of one level.
    Reorganized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StripKind {
    /// First and last point coincide; never touches the boundary.
    Closed,
    /// Both ends rest on the plot boundary.
    Boundary,
    /// Open strip with at most one end on the boundary; drawn but not filled.
    Dangling,
}

/// One traced polyline at a fixed level.
#[derive(Debug, Clone, PartialEq)]
pub struct Strip {
    /// Owning level, `None` for discontinuity outlines.
    pub level: Option<usize>,
    pub source: StripSource,
    /// Tracer point indices; empty for synthetic strips.
    pub indices: Vec<usize>,
    pub points: Vec<Point2>,
    pub kind: StripKind,
    pub start: BorderDirection,
    pub end: BorderDirection,
    /// Both ends on one edge with the geometric order against the edge's
    /// canonical direction.
    pub reversed: bool,
}

impl Strip {
    /// An unclassified strip; call [`Strip::classify`] before use.
    #[must_use]
    pub fn new(
        level: Option<usize>,
        source: StripSource,
        indices: Vec<usize>,
        points: Vec<Point2>,
    ) -> Self {
        Self {
            level,
            source,
            indices,
            points,
            kind: StripKind::Dangling,
            start: BorderDirection::None,
            end: BorderDirection::None,
            reversed: false,
        }
    }

    /// Synthetic strips are anything not read directly from the tracer's
    /// primary list.
    #[must_use]
    pub const fn is_extra(&self) -> bool {
        !matches!(self.source, StripSource::Traced { .. })
    }

    #[must_use]
    pub fn first_point(&self) -> Option<Point2> {
        self.points.first().copied()
    }

    #[must_use]
    pub fn last_point(&self) -> Option<Point2> {
        self.points.last().copied()
    }

    /// Closed by index identity, or by geometry for synthetic strips.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        if self.indices.len() > 2 {
            return self.indices.first() == self.indices.last();
        }
        self.points.len() > 3
            && Tolerance::DEFAULT.approx_eq_point2(self.points[0], self.points[self.points.len() - 1])
    }

    #[must_use]
    pub const fn is_fillable(&self) -> bool {
        matches!(self.kind, StripKind::Closed | StripKind::Boundary)
    }

    /// Points from the end at `from_start` to the opposite end.
    #[must_use]
    pub fn points_from(&self, from_start: bool) -> Vec<Point2> {
        if from_start {
            self.points.clone()
        } else {
            self.points.iter().rev().copied().collect()
        }
    }

    /// Classifies the strip against `boundary`, snapping boundary endpoints
    /// onto their edge.
    ///
    /// Edges are tested bottom, right, top, left; the first match wins.
    /// `hint` carries the tracer's own on-boundary flags for both ends: an
    /// end the tracer reports on the boundary but that lies off every edge
    /// still makes the strip a boundary strip, with `None` for that end.
    pub fn classify(
        &mut self,
        boundary: &Boundary,
        tolerance: Tolerance,
        extrapolate_to_limits: bool,
        hint: Option<[bool; 2]>,
    ) -> StripKind {
        self.start = BorderDirection::None;
        self.end = BorderDirection::None;
        self.reversed = false;

        if self.points.len() < 2 {
            self.kind = StripKind::Dangling;
            return self.kind;
        }

        if self.is_closed() {
            self.kind = StripKind::Closed;
            return self.kind;
        }

        let last = self.points.len() - 1;
        let mut start_edge = boundary.edge_of(self.points[0], tolerance);
        let mut end_edge = boundary.edge_of(self.points[last], tolerance);

        if extrapolate_to_limits {
            if start_edge.is_none() {
                let (edge, projected) = boundary.nearest_edge(self.points[0]);
                self.points.insert(0, projected);
                self.indices.clear();
                start_edge = Some(edge);
            }
            if end_edge.is_none() {
                let (edge, projected) = boundary.nearest_edge(self.points[self.points.len() - 1]);
                self.points.push(projected);
                self.indices.clear();
                end_edge = Some(edge);
            }
        }

        let [start_hint, end_hint] = hint.unwrap_or([false, false]);
        self.kind = match (start_edge, end_edge) {
            (Some(_), Some(_)) => StripKind::Boundary,
            (Some(_), None) if end_hint => StripKind::Boundary,
            (None, Some(_)) if start_hint => StripKind::Boundary,
            _ => StripKind::Dangling,
        };

        if self.kind != StripKind::Boundary {
            return self.kind;
        }

        let last = self.points.len() - 1;
        if let Some(edge) = start_edge {
            self.points[0] = boundary.snap(self.points[0], edge, tolerance);
            self.start = edge.direction();
        }
        if let Some(edge) = end_edge {
            self.points[last] = boundary.snap(self.points[last], edge, tolerance);
            self.end = edge.direction();
        }

        if let (Some(s), Some(e)) = (start_edge, end_edge) {
            if s == e {
                self.reversed = !s.runs_forward(self.points[0], self.points[last]);
            }
        }

        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary() -> Boundary {
        Boundary::new(0.0, 0.0, 10.0, 10.0)
    }

    fn strip(points: &[(f64, f64)]) -> Strip {
        Strip::new(
            Some(0),
            StripSource::Traced { list: 0 },
            Vec::new(),
            points.iter().map(|&p| Point2::from(p)).collect(),
        )
    }

    #[test]
    fn bottom_to_right_strip() {
        let mut s = strip(&[(5.0, 0.0), (8.0, 2.0), (10.0, 5.0)]);
        let kind = s.classify(&boundary(), Tolerance::PLOT, false, None);
        assert_eq!(kind, StripKind::Boundary);
        assert_eq!(s.start, BorderDirection::XForward);
        assert_eq!(s.end, BorderDirection::YForward);
        assert!(!s.reversed);
    }

    #[test]
    fn corner_endpoint_uses_first_matching_edge() {
        let mut s = strip(&[(0.0, 0.0), (3.0, 3.0), (10.0, 10.0)]);
        s.classify(&boundary(), Tolerance::PLOT, false, None);
        assert_eq!(s.start, BorderDirection::XForward);
        assert_eq!(s.end, BorderDirection::YForward);
    }

    #[test]
    fn same_edge_strip_against_direction_is_reversed() {
        let mut forward = strip(&[(2.0, 0.0), (4.0, 2.0), (6.0, 0.0)]);
        forward.classify(&boundary(), Tolerance::PLOT, false, None);
        assert!(!forward.reversed);

        let mut backward = strip(&[(6.0, 0.0), (4.0, 2.0), (2.0, 0.0)]);
        backward.classify(&boundary(), Tolerance::PLOT, false, None);
        assert_eq!(backward.start, BorderDirection::XForward);
        assert_eq!(backward.end, BorderDirection::XForward);
        assert!(backward.reversed);

        let mut top = strip(&[(2.0, 10.0), (4.0, 8.0), (6.0, 10.0)]);
        top.classify(&boundary(), Tolerance::PLOT, false, None);
        assert_eq!(top.start, BorderDirection::XBackward);
        assert!(top.reversed);
    }

    #[test]
    fn closed_and_dangling() {
        let mut closed = strip(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 4.0)]);
        assert_eq!(
            closed.classify(&boundary(), Tolerance::PLOT, false, None),
            StripKind::Closed
        );

        let mut dangling = strip(&[(5.0, 0.0), (5.0, 5.0)]);
        assert_eq!(
            dangling.classify(&boundary(), Tolerance::PLOT, false, None),
            StripKind::Dangling
        );
        assert!(!dangling.is_fillable());
    }

    #[test]
    fn extrapolation_extends_loose_end() {
        let mut s = strip(&[(5.0, 0.0), (5.0, 8.0)]);
        let kind = s.classify(&boundary(), Tolerance::PLOT, true, None);
        assert_eq!(kind, StripKind::Boundary);
        assert_eq!(s.end, BorderDirection::XBackward);
        assert_eq!(s.last_point(), Some(Point2::new(5.0, 10.0)));
    }

    #[test]
    fn tracer_hint_keeps_inconsistent_end() {
        let mut s = strip(&[(5.0, 0.0), (5.0, 5.0)]);
        let kind = s.classify(&boundary(), Tolerance::PLOT, false, Some([true, true]));
        assert_eq!(kind, StripKind::Boundary);
        assert_eq!(s.start, BorderDirection::XForward);
        assert_eq!(s.end, BorderDirection::None);
    }

    #[test]
    fn endpoints_snap_onto_edges() {
        let mut s = strip(&[(5.0, 0.2), (9.7, 5.0)]);
        s.classify(&boundary(), Tolerance::PLOT, false, None);
        assert_eq!(s.first_point(), Some(Point2::new(5.0, 0.0)));
        assert_eq!(s.last_point(), Some(Point2::new(10.0, 5.0)));
    }
}
