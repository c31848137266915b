//! Device-pixel alignment of output points.
//!
//! Each point maps to the centre of the device pixel it falls in, so thin
//! lines render crisp. Points are independent, which makes this the one
//! stage that runs in parallel under the `parallel` feature.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geom::Point2;

#[cfg(feature = "parallel")]
const CHUNK: usize = 1024;

fn align_point(p: Point2, scale: f64) -> Point2 {
    Point2::new(
        ((p.x * scale).floor() + 0.5) / scale,
        ((p.y * scale).floor() + 0.5) / scale,
    )
}

/// Snaps every point to its device-pixel centre in place. A non-positive or
/// non-finite `scale` leaves the points unchanged.
#[cfg(feature = "parallel")]
pub fn align_to_device_pixels(points: &mut [Point2], scale: f64) {
    if !scale.is_finite() || scale <= 0.0 {
        return;
    }
    points.par_chunks_mut(CHUNK).for_each(|chunk| {
        for p in chunk {
            *p = align_point(*p, scale);
        }
    });
}

/// Snaps every point to its device-pixel centre in place. A non-positive or
/// non-finite `scale` leaves the points unchanged.
#[cfg(not(feature = "parallel"))]
pub fn align_to_device_pixels(points: &mut [Point2], scale: f64) {
    if !scale.is_finite() || scale <= 0.0 {
        return;
    }
    for p in points {
        *p = align_point(*p, scale);
    }
}

#[must_use]
pub fn aligned_copy(points: &[Point2], scale: f64) -> Vec<Point2> {
    let mut out = points.to_vec();
    align_to_device_pixels(&mut out, scale);
    out
}
