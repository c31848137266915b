use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Vec2
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// Unit vector along the X axis.
    pub const X: Self = Self::new(1.0, 0.0);
    /// Unit vector along the Y axis.
    pub const Y: Self = Self::new(0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub const fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// Z component of the 3-D cross product; positive when `rhs` turns
    /// counter-clockwise from `self`.
    #[must_use]
    pub const fn cross(self, rhs: Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > 0.0 {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn mul_scalar(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Angle of the vector in radians, in `(-π, π]`.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;
    fn mul(self, rhs: Vec2) -> Self::Output {
        Vec2::new(self * rhs.x, self * rhs.y)
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point2
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// The origin point (0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }

    #[must_use]
    pub const fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[must_use]
    pub const fn sub_point(self, rhs: Self) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }

    /// Linear interpolation between two points.
    /// Returns `self * (1 - t) + rhs * t`.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(self.x + (rhs.x - self.x) * t, self.y + (rhs.y - self.y) * t)
    }

    #[must_use]
    pub fn midpoint(self, rhs: Self) -> Self {
        self.lerp(rhs, 0.5)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        self.sub_point(other).length()
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        self.sub_point(other).length_squared()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point2 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(arr: [f64; 2]) -> Self {
        Self::new(arr[0], arr[1])
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        p.to_array()
    }
}

impl Add<Vec2> for Point2 {
    type Output = Self;
    fn add(self, rhs: Vec2) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub<Vec2> for Point2 {
    type Output = Self;
    fn sub(self, rhs: Vec2) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Vec2;
    fn sub(self, rhs: Self) -> Self::Output {
        self.sub_point(rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox2
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BBox2 {
    #[must_use]
    pub const fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let mut iter = points.iter().copied();
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::new(min, max))
    }

    /// Bounding box of a single segment.
    #[must_use]
    pub fn from_segment(a: Point2, b: Point2) -> Self {
        Self::new(
            Point2::new(a.x.min(b.x), a.y.min(b.y)),
            Point2::new(a.x.max(b.x), a.y.max(b.y)),
        )
    }

    #[must_use]
    pub fn center(self) -> Point2 {
        self.min.midpoint(self.max)
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn area(self) -> f64 {
        self.width() * self.height()
    }

    /// Check if a point is inside the bounding box (inclusive).
    #[must_use]
    pub fn contains_point(self, p: Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Expand the bounding box by a scalar amount in all directions.
    #[must_use]
    pub fn expand_by(self, amount: f64) -> Self {
        Self::new(
            Point2::new(self.min.x - amount, self.min.y - amount),
            Point2::new(self.max.x + amount, self.max.y + amount),
        )
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(
            Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Squared distance from `point` to the box; zero inside.
    #[must_use]
    pub fn distance_squared_to_point(self, point: Point2) -> f64 {
        let dx = if point.x < self.min.x {
            self.min.x - point.x
        } else if point.x > self.max.x {
            point.x - self.max.x
        } else {
            0.0
        };
        let dy = if point.y < self.min.y {
            self.min.y - point.y
        } else if point.y > self.max.y {
            point.y - self.max.y
        } else {
            0.0
        };
        dx * dx + dy * dy
    }

    /// Whether both boxes agree corner-by-corner within `tol`.
    #[must_use]
    pub fn approx_eq(self, other: Self, tol: Tolerance) -> bool {
        tol.approx_eq_point2(self.min, other.min) && tol.approx_eq_point2(self.max, other.max)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Tolerance configuration for geometric comparisons.
///
/// Plot-space comparisons (strip endpoints against the boundary, region
/// dedupe) use [`Tolerance::PLOT`]; numeric guards inside the kernel use the
/// tighter constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Default numeric tolerance (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    /// Tolerance for detecting zero-length/degenerate vectors and edges (1e-12).
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };

    /// Point equality in plot units (0.5).
    pub const PLOT: Self = Self { eps: 0.5 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub const fn eps_squared(self) -> f64 {
        self.eps * self.eps
    }

    #[must_use]
    pub fn scaled(self, scale: f64) -> Self {
        Self::new(self.eps * scale.abs())
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_zero_f64(self, a: f64) -> bool {
        a.abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point2(self, a: Point2, b: Point2) -> bool {
        a.distance_squared_to(b) <= self.eps_squared()
    }

    #[must_use]
    pub fn is_zero_vec2(self, v: Vec2) -> bool {
        v.length_squared() <= self.eps_squared()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operators() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 5.0);

        assert_eq!(a + b, Vec2::new(5.0, 7.0));
        assert_eq!(b - a, Vec2::new(3.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(2.0 * a, Vec2::new(2.0, 4.0));
        assert_eq!(a / 2.0, Vec2::new(0.5, 1.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));
    }

    #[test]
    fn test_vec2_cross_sign() {
        assert!(Vec2::X.cross(Vec2::Y) > 0.0);
        assert!(Vec2::Y.cross(Vec2::X) < 0.0);
    }

    #[test]
    fn test_point2_lerp_and_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 20.0);

        assert_eq!(a.lerp(b, 0.5), Point2::new(5.0, 10.0));
        assert!((Point2::new(3.0, 4.0).distance_to(a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_bbox_methods() {
        let bbox = BBox2::from_points(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 4.0),
            Point2::new(1.0, -1.0),
        ])
        .unwrap();

        assert_eq!(bbox.min, Point2::new(0.0, -1.0));
        assert_eq!(bbox.max, Point2::new(2.0, 4.0));
        assert!((bbox.area() - 10.0).abs() < 1e-12);
        assert!(bbox.contains_point(Point2::new(1.0, 1.0)));
        assert!(!bbox.contains_point(Point2::new(3.0, 1.0)));
        assert!((bbox.distance_squared_to_point(Point2::new(5.0, 0.0)) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_tolerance_plot_comparison() {
        let tol = Tolerance::PLOT;
        assert!(tol.approx_eq_point2(Point2::new(1.0, 1.0), Point2::new(1.3, 1.2)));
        assert!(!tol.approx_eq_point2(Point2::new(1.0, 1.0), Point2::new(1.6, 1.0)));
    }
}
