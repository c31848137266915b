//! Planar polygon helpers shared by the contour engine.
//!
//! Polygons are plain `&[Point2]` rings. A ring may or may not repeat its
//! first vertex at the end; every helper here treats the ring as implicitly
//! closed and ignores a duplicated closing vertex.

use super::core::{BBox2, Point2, Tolerance};

/// Returns the ring without a duplicated closing vertex.
#[must_use]
pub fn open_ring(points: &[Point2]) -> &[Point2] {
    if points.len() > 1 {
        let first = points[0];
        let last = points[points.len() - 1];
        if Tolerance::ZERO_LENGTH.approx_eq_point2(first, last) {
            return &points[..points.len() - 1];
        }
    }
    points
}

/// Signed shoelace area; positive for counter-clockwise rings.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let ring = open_ring(points);
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice * 0.5
}

/// Area centroid of a ring. Falls back to the vertex average for rings with
/// vanishing area.
#[must_use]
pub fn centroid(points: &[Point2]) -> Option<Point2> {
    let ring = open_ring(points);
    if ring.is_empty() {
        return None;
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut twice_area = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let cross = a.x * b.y - b.x * a.y;
        twice_area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }

    if twice_area.abs() <= Tolerance::ZERO_LENGTH.eps {
        return Some(vertex_average(ring));
    }

    Some(Point2::new(cx / (3.0 * twice_area), cy / (3.0 * twice_area)))
}

fn vertex_average(ring: &[Point2]) -> Point2 {
    let n = ring.len() as f64;
    let (sx, sy) = ring
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2::new(sx / n, sy / n)
}

/// Even-odd containment test.
#[must_use]
pub fn contains_point(points: &[Point2], p: Point2) -> bool {
    let ring = open_ring(points);
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether `p` lies inside `outer` and outside every ring in `holes`.
#[must_use]
pub fn region_contains_point(outer: &[Point2], holes: &[Vec<Point2>], p: Point2) -> bool {
    contains_point(outer, p) && !holes.iter().any(|hole| contains_point(hole, p))
}

/// Distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= Tolerance::ZERO_LENGTH.eps {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_to(a + ab * t)
}

/// Distance from `p` to the nearest edge of a ring.
#[must_use]
pub fn distance_to_ring(points: &[Point2], p: Point2) -> f64 {
    let ring = open_ring(points);
    match ring.len() {
        0 => f64::INFINITY,
        1 => p.distance_to(ring[0]),
        n => (0..n)
            .map(|i| distance_to_segment(p, ring[i], ring[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// A point strictly inside the region bounded by `outer` minus `holes`.
///
/// The centroid is used when the region has no holes and the centroid lies
/// inside. Otherwise horizontal scanlines are intersected with every edge and
/// the midpoint of the widest inside interval wins, which places the sample
/// between the outer boundary and the nearest inner one.
#[must_use]
pub fn interior_point(outer: &[Point2], holes: &[Vec<Point2>]) -> Option<Point2> {
    let bbox = BBox2::from_points(open_ring(outer))?;

    if holes.is_empty() {
        if let Some(c) = centroid(outer) {
            let margin = Tolerance::DEFAULT.eps * (1.0 + bbox.width().max(bbox.height()));
            if contains_point(outer, c) && distance_to_ring(outer, c) > margin {
                return Some(c);
            }
        }
    }

    const FRACTIONS: [f64; 9] = [0.5, 0.25, 0.75, 0.375, 0.625, 0.125, 0.875, 0.0625, 0.9375];

    let mut best: Option<(f64, Point2)> = None;
    for frac in FRACTIONS {
        let y = bbox.min.y + bbox.height() * frac;
        let mut xs = scanline_crossings(outer, y);
        for hole in holes {
            xs.extend(scanline_crossings(hole, y));
        }
        xs.sort_by(f64::total_cmp);

        for pair in xs.chunks_exact(2) {
            let width = pair[1] - pair[0];
            if width > best.map_or(0.0, |(w, _)| w) {
                best = Some((width, Point2::new((pair[0] + pair[1]) * 0.5, y)));
            }
        }
    }

    best.map(|(_, p)| p)
}

fn scanline_crossings(points: &[Point2], y: f64) -> Vec<f64> {
    let ring = open_ring(points);
    let mut xs = Vec::new();
    if ring.len() < 2 {
        return xs;
    }
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        if (a.y > y) != (b.y > y) {
            xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
        }
    }
    xs
}

/// Crossing of segments `a0`–`a1` and `b0`–`b1`.
///
/// Returns the crossing point and the parameters along both segments.
/// Parallel and collinear segments report no crossing.
#[must_use]
pub fn segment_intersection(
    a0: Point2,
    a1: Point2,
    b0: Point2,
    b1: Point2,
) -> Option<(Point2, f64, f64)> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.cross(s);
    if denom.abs() <= Tolerance::ZERO_LENGTH.eps * (1.0 + r.length() * s.length()) {
        return None;
    }
    let qp = b0 - a0;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((a0 + r * t, t, u))
    } else {
        None
    }
}

/// Drops consecutive duplicates and the middle vertex of every run of three
/// collinear vertices whose direction changes by less than `slope_eps`
/// (sine of the turning angle).
#[must_use]
pub fn collapse_collinear(points: &[Point2], slope_eps: f64) -> Vec<Point2> {
    let mut deduped: Vec<Point2> = Vec::with_capacity(points.len());
    for &p in points {
        if deduped
            .last()
            .is_some_and(|&last| Tolerance::DEFAULT.approx_eq_point2(last, p))
        {
            continue;
        }
        deduped.push(p);
    }

    if deduped.len() < 3 {
        return deduped;
    }

    let mut out: Vec<Point2> = Vec::with_capacity(deduped.len());
    out.push(deduped[0]);
    for i in 1..deduped.len() - 1 {
        let prev = out[out.len() - 1];
        let current = deduped[i];
        let next = deduped[i + 1];
        if is_straight_through(prev, current, next, slope_eps) {
            continue;
        }
        out.push(current);
    }
    out.push(deduped[deduped.len() - 1]);
    out
}

fn is_straight_through(a: Point2, b: Point2, c: Point2, slope_eps: f64) -> bool {
    let ab = b - a;
    let bc = c - b;
    let denom = ab.length() * bc.length();
    if denom <= Tolerance::ZERO_LENGTH.eps {
        return true;
    }
    (ab.cross(bc) / denom).abs() < slope_eps && ab.dot(bc) > 0.0
}

/// Whether first and last vertex coincide within `tol`.
#[must_use]
pub fn is_closed(points: &[Point2], tol: Tolerance) -> bool {
    points.len() > 2 && tol.approx_eq_point2(points[0], points[points.len() - 1])
}
