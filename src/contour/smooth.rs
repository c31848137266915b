//! Curve smoothing for iso-lines and region outlines.
//!
//! Every mode starts its path exactly at the first input point and ends
//! exactly at the last one; only the interior shape differs.

use serde::{Deserialize, Serialize};

use super::border::Boundary;
use crate::geom::{Point2, Tolerance, Vec2, open_ring};

const DUPLICATE_EPS: f64 = 1e-12;

/// Catmull-Rom parameterization.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatmullRomAlpha {
    Uniform,
    #[default]
    Centripetal,
    Chordal,
    /// Any alpha, clamped to `[0, 1]`.
    Custom(f64),
}

impl CatmullRomAlpha {
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::Uniform => 0.0,
            Self::Centripetal => 0.5,
            Self::Chordal => 1.0,
            Self::Custom(alpha) if alpha.is_finite() => alpha.clamp(0.0, 1.0),
            Self::Custom(_) => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Straight segments.
    #[default]
    Linear,
    /// Natural cubic spline through every point.
    CubicSpline,
    CatmullRom(CatmullRomAlpha),
    /// Tangents from the symmetric difference of the neighbours.
    Hermite,
    /// Hermite with tangents clamped so monotonic input never overshoots.
    MonotoneHermite,
}

impl InterpolationMode {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::CubicSpline => "cubic",
            Self::CatmullRom(_) => "catmull-rom",
            Self::Hermite => "hermite",
            Self::MonotoneHermite => "monotone",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path geometry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(Point2),
    LineTo(Point2),
    CubicTo { c1: Point2, c2: Point2, to: Point2 },
    /// Closes the current subpath back to its `MoveTo`.
    Close,
}

/// Drawing commands handed to the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurvePath {
    pub commands: Vec<PathCommand>,
}

impl CurvePath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn move_to(&mut self, p: Point2) {
        self.commands.push(PathCommand::MoveTo(p));
    }

    pub fn line_to(&mut self, p: Point2) {
        self.commands.push(PathCommand::LineTo(p));
    }

    pub fn cubic_to(&mut self, c1: Point2, c2: Point2, to: Point2) {
        self.commands.push(PathCommand::CubicTo { c1, c2, to });
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn append(&mut self, other: CurvePath) {
        self.commands.extend(other.commands);
    }

    /// First point of the path.
    #[must_use]
    pub fn start(&self) -> Option<Point2> {
        match self.commands.first()? {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
            PathCommand::CubicTo { to, .. } => Some(*to),
            PathCommand::Close => None,
        }
    }

    /// Point the pen rests on after the last command.
    #[must_use]
    pub fn end(&self) -> Option<Point2> {
        let mut subpath_start = None;
        let mut current = None;
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => {
                    subpath_start = Some(p);
                    current = Some(p);
                }
                PathCommand::LineTo(p) | PathCommand::CubicTo { to: p, .. } => current = Some(p),
                PathCommand::Close => current = subpath_start,
            }
        }
        current
    }

    #[must_use]
    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    /// Polyline approximation, one list per subpath; each cubic contributes
    /// `steps` points.
    #[must_use]
    pub fn flatten(&self, steps: usize) -> Vec<Vec<Point2>> {
        let steps = steps.max(1);
        let mut out: Vec<Vec<Point2>> = Vec::new();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => out.push(vec![p]),
                PathCommand::LineTo(p) => {
                    if let Some(current) = out.last_mut() {
                        current.push(p);
                    }
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    if let Some(current) = out.last_mut() {
                        let Some(&from) = current.last() else {
                            continue;
                        };
                        for i in 1..=steps {
                            let t = i as f64 / steps as f64;
                            current.push(cubic_point(from, c1, c2, to, t));
                        }
                    }
                }
                PathCommand::Close => {
                    if let Some(current) = out.last_mut() {
                        if let Some(&first) = current.first() {
                            current.push(first);
                        }
                    }
                }
            }
        }
        out
    }
}

fn cubic_point(p0: Point2, c1: Point2, c2: Point2, p1: Point2, t: f64) -> Point2 {
    let u = 1.0 - t;
    let (b0, b1, b2, b3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point2::new(
        b0 * p0.x + b1 * c1.x + b2 * c2.x + b3 * p1.x,
        b0 * p0.y + b1 * c1.y + b2 * c2.y + b3 * p1.y,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Smoother
// ─────────────────────────────────────────────────────────────────────────────

/// Converts point sequences into [`CurvePath`]s under one interpolation mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurveSmoother {
    mode: InterpolationMode,
    gap_limit: Option<Vec2>,
}

impl CurveSmoother {
    #[must_use]
    pub const fn new(mode: InterpolationMode) -> Self {
        Self {
            mode,
            gap_limit: None,
        }
    }

    /// Linear mode starts a new subpath when a step exceeds `limit` on
    /// either axis.
    #[must_use]
    pub const fn with_gap_limit(mut self, limit: Vec2) -> Self {
        self.gap_limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn mode(&self) -> InterpolationMode {
        self.mode
    }

    #[must_use]
    pub fn smooth_points(&self, points: &[Point2]) -> CurvePath {
        self.smooth_points_with_context(points, None, None)
    }

    /// Smooths `points` using `before` and `after` as neighbours of the two
    /// ends. Context shapes the curve but is never drawn.
    #[must_use]
    pub fn smooth_points_with_context(
        &self,
        points: &[Point2],
        before: Option<Point2>,
        after: Option<Point2>,
    ) -> CurvePath {
        let mut path = CurvePath::new();
        let points = dedup_points(points);
        let Some(&first) = points.first() else {
            return path;
        };
        path.move_to(first);
        self.extend(&mut path, &points, before, after);
        path
    }

    /// Closed outline through a ring whose last point repeats the first.
    #[must_use]
    pub fn smooth_closed(&self, ring: &[Point2]) -> CurvePath {
        let open = dedup_points(open_ring(ring));
        let mut path = CurvePath::new();
        let Some(&first) = open.first() else {
            return path;
        };
        path.move_to(first);
        if open.len() > 1 {
            let mut closed = open.clone();
            closed.push(first);
            let before = open.get(open.len() - 1).copied();
            let after = open.get(1).copied();
            self.extend_with(&mut path, &closed, before, after, false);
        }
        path.close();
        path
    }

    /// Appends segments from `points[0]`, which must be the current point,
    /// through `points[last]`.
    pub fn extend(
        &self,
        path: &mut CurvePath,
        points: &[Point2],
        before: Option<Point2>,
        after: Option<Point2>,
    ) {
        self.extend_with(path, points, before, after, true);
    }

    fn extend_with(
        &self,
        path: &mut CurvePath,
        points: &[Point2],
        before: Option<Point2>,
        after: Option<Point2>,
        allow_gaps: bool,
    ) {
        if points.len() < 2 {
            return;
        }

        if self.mode == InterpolationMode::Linear {
            for pair in points.windows(2) {
                let step = pair[1] - pair[0];
                let jump = allow_gaps
                    && self
                        .gap_limit
                        .is_some_and(|limit| step.x.abs() > limit.x || step.y.abs() > limit.y);
                if jump {
                    path.move_to(pair[1]);
                } else {
                    path.line_to(pair[1]);
                }
            }
            return;
        }

        if points.len() == 2 && before.is_none() && after.is_none() {
            path.cubic_to(points[0], points[1], points[1]);
            return;
        }

        let controls = match self.mode {
            InterpolationMode::Linear => return,
            InterpolationMode::CubicSpline => spline_controls(points, before, after),
            InterpolationMode::CatmullRom(alpha) => {
                catmull_rom_controls(points, before, after, alpha.value())
            }
            InterpolationMode::Hermite => hermite_controls(points, before, after, false),
            InterpolationMode::MonotoneHermite => hermite_controls(points, before, after, true),
        };
        for (i, (c1, c2)) in controls.into_iter().enumerate() {
            path.cubic_to(c1, c2, points[i + 1]);
        }
    }

    /// Outline of an assembled region. Stretches running along the plot
    /// boundary stay straight; interior stretches are smoothed.
    #[must_use]
    pub fn smooth_region(
        &self,
        outer: &[Point2],
        holes: &[Vec<Point2>],
        boundary: &Boundary,
        tolerance: Tolerance,
    ) -> CurvePath {
        let mut path = self.smooth_ring_on_boundary(outer, boundary, tolerance);
        for hole in holes {
            path.append(self.smooth_ring_on_boundary(hole, boundary, tolerance));
        }
        path
    }

    fn smooth_ring_on_boundary(
        &self,
        ring: &[Point2],
        boundary: &Boundary,
        tolerance: Tolerance,
    ) -> CurvePath {
        let open = dedup_points(open_ring(ring));
        let n = open.len();
        let on_edge =
            |i: usize| boundary.segment_on_edge(open[i], open[(i + 1) % n], tolerance);

        let Some(start) = (0..n).find(|&i| on_edge(i)) else {
            return self.smooth_closed(ring);
        };

        let mut path = CurvePath::new();
        path.move_to(open[start]);
        let mut run: Vec<Point2> = vec![open[start]];
        for step in 0..n {
            let i = (start + step) % n;
            let next = open[(i + 1) % n];
            if on_edge(i) {
                if run.len() > 1 {
                    self.extend_with(&mut path, &run, None, None, false);
                }
                path.line_to(next);
                run = vec![next];
            } else {
                run.push(next);
            }
        }
        if run.len() > 1 {
            self.extend_with(&mut path, &run, None, None, false);
        }
        path.close();
        path
    }
}

fn dedup_points(points: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for &p in points {
        if out
            .last()
            .is_none_or(|last| last.distance_squared_to(p) > DUPLICATE_EPS * DUPLICATE_EPS)
        {
            out.push(p);
        }
    }
    out
}

/// Knot list with optional context on both ends; returns the knots and the
/// offset of `points[0]` within them.
fn with_context(points: &[Point2], before: Option<Point2>, after: Option<Point2>) -> (Vec<Point2>, usize) {
    let mut knots = Vec::with_capacity(points.len() + 2);
    knots.extend(before);
    knots.extend_from_slice(points);
    knots.extend(after);
    (knots, usize::from(before.is_some()))
}

/// Natural cubic spline control points, one pair per segment of `points`.
fn spline_controls(
    points: &[Point2],
    before: Option<Point2>,
    after: Option<Point2>,
) -> Vec<(Point2, Point2)> {
    let (knots, offset) = with_context(points, before, after);
    let n = knots.len() - 1;
    if n == 1 {
        let (a, b) = (knots[0], knots[1]);
        return vec![(a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0))];
    }

    let xs: Vec<f64> = knots.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = knots.iter().map(|p| p.y).collect();
    let (x1, x2) = spline_axis(&xs);
    let (y1, y2) = spline_axis(&ys);

    (offset..offset + points.len() - 1)
        .map(|i| (Point2::new(x1[i], y1[i]), Point2::new(x2[i], y2[i])))
        .collect()
}

/// Thomas solve of the natural-spline system for one axis.
fn spline_axis(k: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = k.len() - 1;
    let mut a = vec![1.0; n];
    let mut b = vec![4.0; n];
    let mut c = vec![1.0; n];
    let mut r: Vec<f64> = (0..n).map(|i| 4.0 * k[i] + 2.0 * k[i + 1]).collect();

    a[0] = 0.0;
    b[0] = 2.0;
    r[0] = k[0] + 2.0 * k[1];
    a[n - 1] = 2.0;
    b[n - 1] = 7.0;
    c[n - 1] = 0.0;
    r[n - 1] = 8.0 * k[n - 1] + k[n];

    for i in 1..n {
        let m = a[i] / b[i - 1];
        b[i] -= m * c[i - 1];
        r[i] -= m * r[i - 1];
    }

    let mut p1 = vec![0.0; n];
    p1[n - 1] = r[n - 1] / b[n - 1];
    for i in (0..n - 1).rev() {
        p1[i] = (r[i] - c[i] * p1[i + 1]) / b[i];
    }

    let mut p2 = vec![0.0; n];
    for i in 0..n - 1 {
        p2[i] = 2.0 * k[i + 1] - p1[i + 1];
    }
    p2[n - 1] = 0.5 * (k[n] + p1[n - 1]);

    (p1, p2)
}

/// Alpha-parameterized Catmull-Rom as cubic Bézier controls. A missing
/// neighbour pins that control to the segment end.
fn catmull_rom_controls(
    points: &[Point2],
    before: Option<Point2>,
    after: Option<Point2>,
    alpha: f64,
) -> Vec<(Point2, Point2)> {
    let n = points.len();
    (0..n - 1)
        .map(|i| {
            let p0 = if i == 0 { before } else { Some(points[i - 1]) };
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = if i + 2 < n { Some(points[i + 2]) } else { after };

            let l12 = p1.distance_to(p2).powf(alpha);
            let l12_2 = l12 * l12;

            let c1 = match p0 {
                Some(p0) => {
                    let l01 = p0.distance_to(p1).powf(alpha);
                    if l01 > DUPLICATE_EPS {
                        let l01_2 = l01 * l01;
                        let a = 2.0 * l01_2 + 3.0 * l01 * l12 + l12_2;
                        let m = 3.0 * l01 * (l01 + l12);
                        combine(&[(p1, a), (p0, -l12_2), (p2, l01_2)], m)
                    } else {
                        p1
                    }
                }
                None => p1,
            };

            let c2 = match p3 {
                Some(p3) => {
                    let l23 = p2.distance_to(p3).powf(alpha);
                    if l23 > DUPLICATE_EPS {
                        let l23_2 = l23 * l23;
                        let b = 2.0 * l23_2 + 3.0 * l23 * l12 + l12_2;
                        let m = 3.0 * l23 * (l23 + l12);
                        combine(&[(p2, b), (p1, l23_2), (p3, -l12_2)], m)
                    } else {
                        p2
                    }
                }
                None => p2,
            };

            (c1, c2)
        })
        .collect()
}

fn combine(terms: &[(Point2, f64)], denominator: f64) -> Point2 {
    let (x, y) = terms
        .iter()
        .fold((0.0, 0.0), |(x, y), (p, w)| (x + p.x * w, y + p.y * w));
    Point2::new(x / denominator, y / denominator)
}

/// Cubic Hermite controls with symmetric-difference tangents.
fn hermite_controls(
    points: &[Point2],
    before: Option<Point2>,
    after: Option<Point2>,
    monotone: bool,
) -> Vec<(Point2, Point2)> {
    let (knots, offset) = with_context(points, before, after);
    let n = knots.len();

    let mut tangents: Vec<Vec2> = (0..n)
        .map(|i| {
            let prev = knots[i.saturating_sub(1)];
            let next = knots[(i + 1).min(n - 1)];
            let span = if i == 0 || i == n - 1 { 1.0 } else { 0.5 };
            (next - prev) * span
        })
        .collect();

    if monotone {
        let xs: Vec<f64> = knots.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = knots.iter().map(|p| p.y).collect();
        let mut tx: Vec<f64> = tangents.iter().map(|t| t.x).collect();
        let mut ty: Vec<f64> = tangents.iter().map(|t| t.y).collect();
        clamp_monotone(&xs, &mut tx);
        clamp_monotone(&ys, &mut ty);
        tangents = tx.into_iter().zip(ty).map(|(x, y)| Vec2::new(x, y)).collect();
    }

    (offset..offset + points.len() - 1)
        .map(|i| {
            let c1 = knots[i] + tangents[i] * (1.0 / 3.0);
            let c2 = knots[i + 1] - tangents[i + 1] * (1.0 / 3.0);
            (c1, c2)
        })
        .collect()
}

/// Fritsch–Carlson tangent limiting on one axis.
fn clamp_monotone(values: &[f64], tangents: &mut [f64]) {
    let n = values.len();
    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    for i in 1..n - 1 {
        if deltas[i - 1] * deltas[i] <= 0.0 {
            tangents[i] = 0.0;
        }
    }
    for (k, &delta) in deltas.iter().enumerate() {
        if delta == 0.0 {
            tangents[k] = 0.0;
            tangents[k + 1] = 0.0;
            continue;
        }
        let a = tangents[k] / delta;
        let b = tangents[k + 1] / delta;
        if a < 0.0 {
            tangents[k] = 0.0;
        }
        if b < 0.0 {
            tangents[k + 1] = 0.0;
        }
        let (a, b) = (a.max(0.0), b.max(0.0));
        let sum = a * a + b * b;
        if sum > 9.0 {
            let tau = 3.0 / sum.sqrt();
            tangents[k] = tau * a * delta;
            tangents[k + 1] = tau * b * delta;
        }
    }
}
