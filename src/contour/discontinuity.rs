//! Outlines of zones where the field is undefined.
//!
//! Undefined sample points are split into sub-clusters by a Gaussian
//! mixture, each sub-cluster gets a concave hull, and clusters closer than
//! `merge_distance_factor` grid resolutions are merged until no pair is
//! close enough or fewer than `merge_floor` clusters remain. Every final
//! cluster becomes one or more synthetic strips with no level.

use serde::{Deserialize, Serialize};

use super::border::Boundary;
use super::config::Tunables;
use super::hull::{HullOptions, concave_hull};
use super::mixture::{MixtureOptions, cluster_points};
use super::strip::{Strip, StripSource};
use crate::geom::{BBox2, Bvh, Point2, Tolerance, contains_point, distance_to_ring, signed_area};

/// Undefined points plus their outline (open, counter-clockwise ring).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscontinuityCluster {
    pub points: Vec<Point2>,
    pub hull: Vec<Point2>,
}

impl DiscontinuityCluster {
    #[must_use]
    pub fn new(points: Vec<Point2>, resolution: f64, options: &HullOptions) -> Self {
        let hull = concave_hull(&points, resolution, options);
        Self { points, hull }
    }

    /// Inside the hull or on its outline.
    #[must_use]
    pub fn contains(&self, p: Point2) -> bool {
        self.hull.len() >= 3
            && (contains_point(&self.hull, p)
                || distance_to_ring(&self.hull, p) <= Tolerance::DEFAULT.eps)
    }

    #[must_use]
    pub fn bbox(&self) -> Option<BBox2> {
        BBox2::from_points(&self.hull)
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.hull).abs()
    }
}

fn hull_options(tunables: &Tunables) -> HullOptions {
    HullOptions {
        concavity: tunables.concavity,
        growth: tunables.concavity_growth,
        passes: tunables.hull_refinement_passes,
    }
}

/// Clusters `points` and merges clusters until convergence.
#[must_use]
pub fn resolve_discontinuities(
    points: &[Point2],
    resolution: f64,
    tunables: &Tunables,
) -> Vec<DiscontinuityCluster> {
    if points.is_empty() {
        return Vec::new();
    }

    let resolution = if resolution.is_finite() && resolution > 0.0 {
        resolution
    } else {
        1.0
    };
    let options = MixtureOptions {
        components: tunables.mixture_components,
        max_iterations: tunables.mixture_max_iterations,
        tolerance: tunables.mixture_tolerance,
        seed: tunables.mixture_seed,
        regularization: (0.5 * resolution).powi(2),
    };
    let hull = hull_options(tunables);

    let mut clusters: Vec<DiscontinuityCluster> = cluster_points(points, &options)
        .into_iter()
        .map(|group| DiscontinuityCluster::new(group, resolution, &hull))
        .collect();
    log::debug!(
        "discontinuity: {} undefined points in {} sub-clusters",
        points.len(),
        clusters.len()
    );

    let limit = tunables.merge_distance_factor * resolution;
    while clusters.len() >= tunables.merge_floor.max(2) {
        let Some((a, b, distance)) = closest_pair(&clusters, limit) else {
            break;
        };
        log::trace!("discontinuity: merging clusters {a} and {b} at distance {distance:.3}");
        let absorbed = clusters.remove(b);
        let mut merged = std::mem::take(&mut clusters[a].points);
        merged.extend(absorbed.points);
        clusters[a] = DiscontinuityCluster::new(merged, resolution, &hull);
    }

    log::debug!("discontinuity: {} clusters after merging", clusters.len());
    clusters
}

/// Closest pair of distinct clusters strictly under `limit`, as
/// `(lower index, higher index, distance)`.
fn closest_pair(clusters: &[DiscontinuityCluster], limit: f64) -> Option<(usize, usize, f64)> {
    let mut owner = Vec::new();
    let mut boxes = Vec::new();
    for (label, cluster) in clusters.iter().enumerate() {
        for &p in &cluster.points {
            owner.push((label, p));
            boxes.push(BBox2::new(p, p));
        }
    }
    let bvh = Bvh::build(&boxes)?;

    let mut best: Option<(usize, usize, f64)> = None;
    for &(label, p) in &owner {
        let bound = best.map_or(limit * limit, |(_, _, d)| d * d);
        let hit = bvh.nearest(p, bound, |prim| {
            let (other, q) = owner[prim];
            (other > label).then(|| p.distance_squared_to(q))
        });
        if let Some((prim, d2)) = hit {
            let distance = d2.sqrt();
            if distance < limit && best.is_none_or(|(_, _, d)| distance < d) {
                best = Some((label, owner[prim].0, distance));
            }
        }
    }
    best
}

/// Synthetic strips outlining each cluster.
///
/// A cluster clear of the boundary yields one closed strip. A cluster
/// touching the boundary yields one open strip per stretch of its outline
/// between boundary vertices, with both ends on the boundary.
#[must_use]
pub fn synthetic_strips(
    clusters: &[DiscontinuityCluster],
    boundary: &Boundary,
    tolerance: Tolerance,
) -> Vec<Strip> {
    let mut strips = Vec::new();

    for (index, cluster) in clusters.iter().enumerate() {
        let hull = &cluster.hull;
        let n = hull.len();
        if n < 3 {
            continue;
        }
        let source = StripSource::Discontinuity { cluster: index };
        let on_edge: Vec<bool> = hull
            .iter()
            .map(|&p| boundary.edge_of(p, tolerance).is_some())
            .collect();

        let Some(anchor) = on_edge.iter().position(|&on| on) else {
            let mut points = hull.clone();
            points.push(hull[0]);
            let mut strip = Strip::new(None, source, Vec::new(), points);
            strip.classify(boundary, tolerance, false, None);
            strips.push(strip);
            continue;
        };

        let mut run = vec![hull[anchor]];
        for step in 1..=n {
            let i = (anchor + step) % n;
            run.push(hull[i]);
            if on_edge[i] {
                if run.len() > 2 {
                    let mut strip = Strip::new(None, source, Vec::new(), std::mem::take(&mut run));
                    strip.classify(boundary, tolerance, false, None);
                    strips.push(strip);
                }
                run = vec![hull[i]];
            }
        }
    }

    strips
}
