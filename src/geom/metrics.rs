//! Opt-in stage timing for the contour pipeline.
//!
//! Timing is only collected when the `engine_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). When
//! disabled, every call compiles down to running the closure.
//!
//! # Usage
//!
//! ```ignore
//! use contour_engine::geom::{EngineMetrics, TimingBucket};
//!
//! let mut metrics = EngineMetrics::default();
//! metrics.begin();
//! let strips = metrics.time(TimingBucket::Classify, || classify_all(&strips));
//! if let Some(report) = metrics.end() {
//!     println!("classify: {} ns", report.classify_ns);
//! }
//! ```

/// Pipeline stages that accumulate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Reading strips from the tracer.
    Trace,
    /// Boundary classification of strips.
    Classify,
    /// Per-edge bucketing and perimeter list construction.
    Border,
    /// Clustering, hull extraction and synthetic strips for undefined points.
    Discontinuity,
    /// Self-intersection detection and strip reorganization.
    Reorganize,
    /// Perimeter walk, nesting and dedupe.
    Assemble,
    /// Fill selection and dedupe.
    Fill,
    /// Curve smoothing of lines and region boundaries.
    Smooth,
    /// Device-pixel alignment.
    Align,
}

/// Cumulative nanoseconds per stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimingReport {
    pub trace_ns: u64,
    pub classify_ns: u64,
    pub border_ns: u64,
    pub discontinuity_ns: u64,
    pub reorganize_ns: u64,
    pub assemble_ns: u64,
    pub fill_ns: u64,
    pub smooth_ns: u64,
    pub align_ns: u64,
}

impl TimingReport {
    /// Returns the total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.trace_ns
            .saturating_add(self.classify_ns)
            .saturating_add(self.border_ns)
            .saturating_add(self.discontinuity_ns)
            .saturating_add(self.reorganize_ns)
            .saturating_add(self.assemble_ns)
            .saturating_add(self.fill_ns)
            .saturating_add(self.smooth_ns)
            .saturating_add(self.align_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[cfg(feature = "engine_metrics")]
    fn bucket_mut(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::Trace => &mut self.trace_ns,
            TimingBucket::Classify => &mut self.classify_ns,
            TimingBucket::Border => &mut self.border_ns,
            TimingBucket::Discontinuity => &mut self.discontinuity_ns,
            TimingBucket::Reorganize => &mut self.reorganize_ns,
            TimingBucket::Assemble => &mut self.assemble_ns,
            TimingBucket::Fill => &mut self.fill_ns,
            TimingBucket::Smooth => &mut self.smooth_ns,
            TimingBucket::Align => &mut self.align_ns,
        }
    }
}

/// Accumulator for stage timings.
///
/// Call [`begin`](Self::begin) to reset, wrap stages with
/// [`time`](Self::time), and read the report with [`end`](Self::end).
#[derive(Debug, Default)]
pub struct EngineMetrics {
    #[cfg(feature = "engine_metrics")]
    report: TimingReport,
}

impl EngineMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(feature = "engine_metrics")]
        {
            self.report = TimingReport::default();
        }
    }

    /// Returns the accumulated report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<TimingReport> {
        #[cfg(feature = "engine_metrics")]
        {
            Some(self.report.clone())
        }
        #[cfg(not(feature = "engine_metrics"))]
        {
            None
        }
    }

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(feature = "engine_metrics")]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.bucket_mut(bucket);
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(feature = "engine_metrics"))]
        {
            let _ = bucket;
            f()
        }
    }
}
