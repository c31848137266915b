//! Per-recompute diagnostics for region assembly.
//!
//! Nothing in the contour pipeline is fatal. Conditions that would otherwise
//! be errors (a perimeter walk with no matching far end, an unresolvable
//! crossing, a `NaN` sample at a fill point) are recovered locally and
//! counted here so callers can tell a clean frame from a degraded one.
//!
//! # Example
//!
//! ```ignore
//! use contour_engine::contour::ContourEngine;
//!
//! let frame = engine.frame();
//! if !frame.diagnostics.is_clean() {
//!     for warning in &frame.diagnostics.warnings {
//!         eprintln!("contour: {warning}");
//!     }
//! }
//! ```

use std::fmt;

/// Counts and warnings collected while assembling one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AssemblyDiagnostics {
    /// Strips whose first and last point coincide.
    pub closed_strip_count: usize,

    /// Strips with both endpoints on the plot boundary.
    pub boundary_strip_count: usize,

    /// Open strips that touch the boundary at most once; drawn as lines only.
    pub dangling_strip_count: usize,

    /// Closed regions emitted after dedupe.
    pub region_count: usize,

    /// Regions dropped because an identical region was already emitted.
    pub duplicate_region_count: usize,

    /// Perimeter walks discarded as not bounding a valid region.
    pub discarded_walk_count: usize,

    /// Walks closed with a straight fallback segment after losing their
    /// far end.
    pub fallback_closure_count: usize,

    /// Crossings found between strips of the same level.
    pub intersection_count: usize,

    /// Synthetic strips produced by crossing reorganization.
    pub reorganized_strip_count: usize,

    /// Cycles whose collinear collapse degenerated; the raw strip was kept.
    pub collapse_fallback_count: usize,

    /// Reorganized cycles dropped for being below the area ratio.
    pub sliver_cycle_count: usize,

    /// Discontinuity clusters after merge convergence.
    pub cluster_count: usize,

    /// Fill samples that evaluated to `NaN` and received an empty fill.
    pub undefined_fill_count: usize,

    /// Optional timing breakdown, populated under the `engine_metrics`
    /// feature on native targets.
    pub timing: Option<super::metrics::TimingReport>,

    /// Human-readable notes about recovered inconsistencies.
    pub warnings: Vec<String>,
}

impl AssemblyDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no recovery path was taken.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.discarded_walk_count == 0
            && self.fallback_closure_count == 0
            && self.collapse_fallback_count == 0
            && self.undefined_fill_count == 0
            && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Total number of local recoveries performed.
    #[must_use]
    pub fn recovery_count(&self) -> usize {
        self.fallback_closure_count + self.collapse_fallback_count + self.undefined_fill_count
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Sums counts and appends warnings from `other`. Timing is not merged.
    pub fn merge(&mut self, other: &AssemblyDiagnostics) {
        self.closed_strip_count += other.closed_strip_count;
        self.boundary_strip_count += other.boundary_strip_count;
        self.dangling_strip_count += other.dangling_strip_count;
        self.region_count += other.region_count;
        self.duplicate_region_count += other.duplicate_region_count;
        self.discarded_walk_count += other.discarded_walk_count;
        self.fallback_closure_count += other.fallback_closure_count;
        self.intersection_count += other.intersection_count;
        self.reorganized_strip_count += other.reorganized_strip_count;
        self.collapse_fallback_count += other.collapse_fallback_count;
        self.sliver_cycle_count += other.sliver_cycle_count;
        self.cluster_count += other.cluster_count;
        self.undefined_fill_count += other.undefined_fill_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Short one-line summary for logging.
    ///
    /// Format: `"R:{regions} S:{boundary}/{closed} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "R:{} S:{}/{}",
            self.region_count, self.boundary_strip_count, self.closed_strip_count
        )];

        if self.duplicate_region_count > 0 {
            parts.push(format!("dup:{}", self.duplicate_region_count));
        }
        if self.discarded_walk_count > 0 {
            parts.push(format!("discarded:{}", self.discarded_walk_count));
        }
        if self.fallback_closure_count > 0 {
            parts.push(format!("fallback:{}", self.fallback_closure_count));
        }
        if self.intersection_count > 0 {
            parts.push(format!("crossings:{}", self.intersection_count));
        }
        if self.cluster_count > 0 {
            parts.push(format!("clusters:{}", self.cluster_count));
        }
        if self.undefined_fill_count > 0 {
            parts.push(format!("nan-fill:{}", self.undefined_fill_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for AssemblyDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Assembly Diagnostics:")?;
        writeln!(f, "  Regions: {}", self.region_count)?;
        writeln!(
            f,
            "  Strips: {} boundary, {} closed, {} dangling",
            self.boundary_strip_count, self.closed_strip_count, self.dangling_strip_count
        )?;

        if self.intersection_count > 0 {
            writeln!(
                f,
                "  Crossings: {} ({} reorganized strips, {} slivers dropped)",
                self.intersection_count, self.reorganized_strip_count, self.sliver_cycle_count
            )?;
        }
        if self.cluster_count > 0 {
            writeln!(f, "  Discontinuity clusters: {}", self.cluster_count)?;
        }

        if self.recovery_count() > 0 || self.discarded_walk_count > 0 {
            writeln!(f, "  Recoveries:")?;
            if self.discarded_walk_count > 0 {
                writeln!(f, "    - Discarded walks: {}", self.discarded_walk_count)?;
            }
            if self.fallback_closure_count > 0 {
                writeln!(f, "    - Fallback closures: {}", self.fallback_closure_count)?;
            }
            if self.collapse_fallback_count > 0 {
                writeln!(f, "    - Collapse fallbacks: {}", self.collapse_fallback_count)?;
            }
            if self.undefined_fill_count > 0 {
                writeln!(f, "    - Undefined fill samples: {}", self.undefined_fill_count)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        writeln!(f, "  Status: {}", if self.is_clean() { "CLEAN" } else { "DEGRADED" })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean() {
        let diag = AssemblyDiagnostics::default();
        assert!(diag.is_clean());
        assert!(!diag.has_warnings());
        assert_eq!(diag.recovery_count(), 0);
    }

    #[test]
    fn test_fallback_is_not_clean() {
        let diag = AssemblyDiagnostics {
            fallback_closure_count: 1,
            ..Default::default()
        };
        assert!(!diag.is_clean());
        assert_eq!(diag.recovery_count(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = AssemblyDiagnostics {
            region_count: 3,
            intersection_count: 2,
            warnings: vec!["first".to_string()],
            ..Default::default()
        };
        let b = AssemblyDiagnostics {
            region_count: 4,
            undefined_fill_count: 1,
            warnings: vec!["second".to_string()],
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.region_count, 7);
        assert_eq!(a.intersection_count, 2);
        assert_eq!(a.undefined_fill_count, 1);
        assert_eq!(a.warnings.len(), 2);
    }

    #[test]
    fn test_summary() {
        let diag = AssemblyDiagnostics {
            region_count: 5,
            boundary_strip_count: 4,
            closed_strip_count: 1,
            fallback_closure_count: 2,
            ..Default::default()
        };
        let summary = diag.summary();
        assert!(summary.contains("R:5"));
        assert!(summary.contains("S:4/1"));
        assert!(summary.contains("fallback:2"));
    }
}
