//! Contour region assembly and fill engine.
//!
//! Data flows strictly downward: tracer strips are classified against the
//! plot boundary, crossing strips are reorganized, undefined zones become
//! synthetic strips, the perimeter walk assembles closed regions, each
//! region gets a fill, and lines and outlines are smoothed for drawing.

pub mod align;
pub mod assemble;
pub mod border;
pub mod config;
pub mod discontinuity;
pub mod engine;
pub mod field;
pub mod fill;
pub mod hull;
pub mod intersect;
pub mod mixture;
pub mod smooth;
pub mod strip;
pub mod style;
pub mod tracer;

pub use align::{align_to_device_pixels, aligned_copy};
pub use assemble::{Assembly, ClosedPath, assemble_regions};
pub use border::{BorderEdge, BorderIndex, Boundary, border_indices, collect_border_strips};
pub use config::{ConfigError, ContourConfig, LevelStyle, Tunables};
pub use discontinuity::{DiscontinuityCluster, resolve_discontinuities, synthetic_strips};
pub use engine::{ContourEngine, ContourFrame, FilledRegion, IsoLine, UpdateReason};
pub use field::{ExpressionField, FieldError, ScalarField};
pub use fill::{Color, ContourFill, Fill, FillResolver, FillTable, ImageFill, ThresholdTable};
pub use intersect::{Intersection, find_intersections, reorganize_level};
pub use smooth::{CatmullRomAlpha, CurvePath, CurveSmoother, InterpolationMode, PathCommand};
pub use strip::{BorderDirection, Strip, StripKind, StripSource};
pub use style::{LevelStyleStrategy, StyleEntry, StyleResult, StyleStrategy};
pub use tracer::{GridTracer, LabelPlacement, StripTracer, Tracer};

#[cfg(test)]
mod tests;
