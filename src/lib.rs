#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Region assembly and fill resolution for filled contour charts.
//!
//! A [`Tracer`] supplies iso-level strips; the [`ContourEngine`] turns them
//! into closed, non-overlapping filled regions plus smoothed iso-lines,
//! outlines undefined zones of the field, and caches the resulting
//! [`ContourFrame`] until something changes.

pub mod contour;
pub mod geom;

pub use contour::{
    Boundary, ClosedPath, Color, ConfigError, ContourConfig, ContourEngine, ContourFill,
    ContourFrame, ExpressionField, Fill, FilledRegion, GridTracer, InterpolationMode, IsoLine,
    LevelStyle, ScalarField, StripTracer, StyleStrategy, Tracer, Tunables, UpdateReason,
};
pub use geom::{AssemblyDiagnostics, Point2, Tolerance, Vec2};

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        /// Installs an `env_logger` backend at debug level unless `RUST_LOG`
        /// says otherwise. Safe to call more than once.
        pub fn init_logger() {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("debug"),
            )
            .try_init();
        }
    } else {
        /// No-op without the `debug_logs` feature.
        pub fn init_logger() {}
    }
}
