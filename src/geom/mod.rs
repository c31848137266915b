mod bvh;
mod core;
mod diagnostics;
mod metrics;
mod polygon;

pub(crate) use bvh::Bvh;
pub use core::{BBox2, Point2, Tolerance, Vec2};
pub use diagnostics::AssemblyDiagnostics;
pub use metrics::{EngineMetrics, TimingBucket, TimingReport};
pub use polygon::{
    centroid, collapse_collinear, contains_point, distance_to_ring, distance_to_segment,
    interior_point, is_closed, open_ring, region_contains_point, segment_intersection,
    signed_area,
};

#[cfg(test)]
mod tests;
