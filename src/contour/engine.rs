//! The recompute pipeline and its frame cache.
//!
//! A frame is rebuilt only after an [`UpdateReason`] has been registered;
//! otherwise [`ContourEngine::frame`] hands back the cached one. A recompute
//! always runs to completion and never fails: recovered problems end up in
//! the frame's diagnostics.

use std::collections::HashSet;
use std::fmt;

use super::align::align_to_device_pixels;
use super::assemble::{ClosedPath, assemble_with_index};
use super::border::{Boundary, border_indices, collect_border_strips};
use super::config::{ConfigError, ContourConfig, LevelStyle};
use super::discontinuity::{DiscontinuityCluster, resolve_discontinuities, synthetic_strips};
use super::field::ScalarField;
use super::fill::{ContourFill, FillResolver, FillTable, ThresholdTable};
use super::intersect::reorganize_level;
use super::smooth::{CurvePath, CurveSmoother};
use super::strip::{Strip, StripKind, StripSource};
use super::style::{LevelStyleStrategy, StyleEntry, StyleResult, StyleStrategy};
use super::tracer::{GridTracer, LabelPlacement, Tracer};
use crate::geom::{AssemblyDiagnostics, EngineMetrics, Point2, TimingBucket, TimingReport, Vec2};

/// What changed since the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateReason {
    Data,
    ValueLimits,
    PlotSize,
    Configuration,
}

/// A region with the index of its fill in [`ContourFrame::fills`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilledRegion {
    pub path: ClosedPath,
    pub fill: usize,
    pub curve: CurvePath,
}

/// One traced iso-line ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoLine {
    pub level: usize,
    pub points: Vec<Point2>,
    pub curve: CurvePath,
    pub style: StyleResult,
}

/// Everything a canvas needs to draw one contour plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourFrame {
    pub regions: Vec<FilledRegion>,
    pub fills: Vec<ContourFill>,
    pub lines: Vec<IsoLine>,
    pub labels: Vec<LabelPlacement>,
    pub clusters: Vec<DiscontinuityCluster>,
    pub diagnostics: AssemblyDiagnostics,
    pub timing: Option<TimingReport>,
}

impl ContourFrame {
    #[must_use]
    pub fn fill_of(&self, region: &FilledRegion) -> Option<&ContourFill> {
        self.fills.get(region.fill)
    }

    /// Sum of region areas, holes excluded.
    #[must_use]
    pub fn covered_area(&self) -> f64 {
        self.regions.iter().map(|r| r.path.area()).sum()
    }
}

/// Owns the configuration, the tracer and the last computed frame.
pub struct ContourEngine {
    config: ContourConfig,
    tracer: Box<dyn Tracer>,
    /// Sampled for fills when present.
    field: Option<Box<dyn ScalarField>>,
    /// Rows and columns for re-tracing `field` on every recompute.
    grid: Option<(usize, usize)>,
    style: Option<Box<dyn StyleStrategy>>,
    dirty: HashSet<UpdateReason>,
    frame: ContourFrame,
    recompute_count: usize,
}

impl fmt::Debug for ContourEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContourEngine")
            .field("config", &self.config)
            .field("has_field", &self.field.is_some())
            .field("grid", &self.grid)
            .field("dirty", &self.dirty)
            .field("recompute_count", &self.recompute_count)
            .finish_non_exhaustive()
    }
}

impl ContourEngine {
    pub fn new(config: ContourConfig, tracer: Box<dyn Tracer>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            tracer,
            field: None,
            grid: None,
            style: None,
            dirty: HashSet::from([UpdateReason::Data]),
            frame: ContourFrame::default(),
            recompute_count: 0,
        })
    }

    /// An engine that traces `field` itself on a `rows × cols` grid and
    /// samples it for fills.
    pub fn from_field(
        config: ContourConfig,
        field: Box<dyn ScalarField>,
        rows: usize,
        cols: usize,
    ) -> Result<Self, ConfigError> {
        let tracer = GridTracer::new(
            &*field,
            &config.boundary,
            rows,
            cols,
            &config.level_values(),
        );
        let mut engine = Self::new(config, Box::new(tracer))?;
        engine.field = Some(field);
        engine.grid = Some((rows, cols));
        Ok(engine)
    }

    /// Field sampled to pick region fills.
    #[must_use]
    pub fn with_field(mut self, field: Box<dyn ScalarField>) -> Self {
        self.field = Some(field);
        self.dirty.insert(UpdateReason::Data);
        self
    }

    #[must_use]
    pub fn with_style_strategy(mut self, style: Box<dyn StyleStrategy>) -> Self {
        self.style = Some(style);
        self.dirty.insert(UpdateReason::Configuration);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ContourConfig {
        &self.config
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = tracer;
        self.grid = None;
        self.dirty.insert(UpdateReason::Data);
    }

    pub fn set_config(&mut self, config: ContourConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.dirty.insert(UpdateReason::Configuration);
        Ok(())
    }

    pub fn set_boundary(&mut self, boundary: Boundary) -> Result<(), ConfigError> {
        boundary.validate()?;
        self.config.boundary = boundary;
        self.dirty.insert(UpdateReason::PlotSize);
        Ok(())
    }

    /// Replaces the levels; the previous levels stay if the new ones are
    /// rejected.
    pub fn set_levels(&mut self, levels: Vec<LevelStyle>) -> Result<(), ConfigError> {
        let mut candidate = self.config.clone();
        candidate.levels = levels;
        candidate.validate()?;
        self.config = candidate;
        self.dirty.insert(UpdateReason::ValueLimits);
        Ok(())
    }

    pub fn mark_dirty(&mut self, reason: UpdateReason) {
        self.dirty.insert(reason);
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Number of recomputes run so far.
    #[must_use]
    pub fn recompute_count(&self) -> usize {
        self.recompute_count
    }

    /// The current frame, recomputed first if anything changed.
    pub fn frame(&mut self) -> &ContourFrame {
        if !self.dirty.is_empty() {
            self.recompute();
        }
        &self.frame
    }

    fn recompute(&mut self) {
        let reasons: Vec<UpdateReason> = self.dirty.drain().collect();
        log::debug!("engine: recompute for {reasons:?}");

        let mut metrics = EngineMetrics::default();
        metrics.begin();

        if let (Some(field), Some((rows, cols))) = (&self.field, self.grid) {
            let values = self.config.level_values();
            let boundary = self.config.boundary;
            let tracer = metrics.time(TimingBucket::Trace, || {
                GridTracer::new(&**field, &boundary, rows, cols, &values)
            });
            self.tracer = Box::new(tracer);
        }

        let mut frame = self.compute(&mut metrics);
        frame.timing = metrics.end();
        frame.diagnostics.timing.clone_from(&frame.timing);

        log::debug!("engine: {}", frame.diagnostics.summary());
        for warning in &frame.diagnostics.warnings {
            log::warn!("engine: {warning}");
        }

        self.frame = frame;
        self.recompute_count += 1;
    }

    fn compute(&self, metrics: &mut EngineMetrics) -> ContourFrame {
        let config = &self.config;
        let tunables = &config.tunables;
        let tol = tunables.tolerance();
        let boundary = config.boundary;
        let tracer = &*self.tracer;
        let default_style;
        let style: &dyn StyleStrategy = match &self.style {
            Some(style) => &**style,
            None => {
                default_style = LevelStyleStrategy::new(config.levels.clone());
                &default_style
            }
        };
        let mut diagnostics = AssemblyDiagnostics::new();

        // Trace + classify.
        let (mut strips, hints) = metrics.time(TimingBucket::Trace, || read_strips(tracer));
        metrics.time(TimingBucket::Classify, || {
            for (strip, hint) in strips.iter_mut().zip(&hints) {
                strip.classify(&boundary, tol, config.extrapolate_to_limits, Some(*hint));
                match strip.kind {
                    StripKind::Closed => diagnostics.closed_strip_count += 1,
                    StripKind::Boundary => diagnostics.boundary_strip_count += 1,
                    StripKind::Dangling => diagnostics.dangling_strip_count += 1,
                }
            }
        });
        log::debug!(
            "engine: {} strips ({} boundary, {} closed, {} dangling)",
            strips.len(),
            diagnostics.boundary_strip_count,
            diagnostics.closed_strip_count,
            diagnostics.dangling_strip_count
        );

        let mut lines: Vec<IsoLine> = strips
            .iter()
            .filter(|s| matches!(s.source, StripSource::Traced { .. }) && s.points.len() >= 2)
            .filter_map(|s| {
                let level = s.level?;
                let value = config.levels.get(level).map_or(f64::NAN, |l| l.value);
                Some(IsoLine {
                    level,
                    points: s.points.clone(),
                    curve: CurvePath::new(),
                    style: style.style(&StyleEntry { level, value }),
                })
            })
            .collect();
        let labels: Vec<LabelPlacement> = (0..tracer.level_count())
            .flat_map(|level| tracer.labels(level))
            .collect();

        // Per-level crossing reorganization of the fillable strips.
        let mut fillable = metrics.time(TimingBucket::Reorganize, || {
            let mut by_level: Vec<Vec<Strip>> = vec![Vec::new(); tracer.level_count()];
            for strip in strips.drain(..).filter(Strip::is_fillable) {
                if let Some(level) = strip.level {
                    if level >= by_level.len() {
                        by_level.resize(level + 1, Vec::new());
                    }
                    by_level[level].push(strip);
                }
            }
            let mut fillable = Vec::new();
            for (level, level_strips) in by_level.into_iter().enumerate() {
                let outcome = reorganize_level(level, level_strips, &boundary, tunables);
                diagnostics.intersection_count += outcome.intersections.len();
                diagnostics.reorganized_strip_count += outcome.reorganized_strips;
                diagnostics.collapse_fallback_count += outcome.collapse_fallbacks;
                diagnostics.sliver_cycle_count += outcome.slivers;
                if outcome.unresolved > 0 {
                    diagnostics.add_warning(format!(
                        "level {level}: {} crossing endpoints unpaired, original strips kept",
                        outcome.unresolved
                    ));
                }
                fillable.extend(outcome.strips);
            }
            fillable
        });

        // Undefined zones.
        let (dx, dy) = tracer.grid_deltas();
        let clusters = metrics.time(TimingBucket::Discontinuity, || {
            let undefined: Vec<Point2> = tracer
                .undefined_point_indices()
                .iter()
                .filter_map(|&i| tracer.point(i))
                .collect();
            let clusters = resolve_discontinuities(&undefined, dx.max(dy), tunables);
            fillable.extend(synthetic_strips(&clusters, &boundary, tol));
            clusters
        });
        diagnostics.cluster_count = clusters.len();

        let entries = metrics.time(TimingBucket::Border, || {
            let buckets = collect_border_strips(&boundary, &fillable);
            border_indices(&boundary, &fillable, &buckets)
        });
        let assembly = metrics.time(TimingBucket::Assemble, || {
            assemble_with_index(&boundary, &fillable, &entries, tunables)
        });
        diagnostics.merge(&assembly.diagnostics);

        // Fills.
        let thresholds = ThresholdTable::normalized(config.level_values());
        let mut table = FillTable::new();
        let mut regions: Vec<FilledRegion> = metrics.time(TimingBucket::Fill, || {
            let resolver = FillResolver::new(&thresholds, style)
                .with_band_fills(config.band_fills.as_deref())
                .with_field(self.field.as_deref())
                .with_clusters(&clusters);
            assembly
                .paths
                .into_iter()
                .map(|path| {
                    let resolved = resolver.resolve(&path);
                    if resolved.undefined {
                        diagnostics.undefined_fill_count += 1;
                    }
                    FilledRegion {
                        fill: table.insert(resolved.fill),
                        path,
                        curve: CurvePath::new(),
                    }
                })
                .collect()
        });

        if let Some(scale) = config.pixel_scale {
            metrics.time(TimingBucket::Align, || {
                for region in &mut regions {
                    align_to_device_pixels(&mut region.path.points, scale);
                    for hole in &mut region.path.holes {
                        align_to_device_pixels(hole, scale);
                    }
                }
                for line in &mut lines {
                    align_to_device_pixels(&mut line.points, scale);
                }
            });
        }

        metrics.time(TimingBucket::Smooth, || {
            let smoother = CurveSmoother::new(config.interpolation);
            for region in &mut regions {
                region.curve =
                    smoother.smooth_region(&region.path.points, &region.path.holes, &boundary, tol);
            }
            let gap = Vec2::new(
                dx.abs() * tunables.linear_gap_factor,
                dy.abs() * tunables.linear_gap_factor,
            );
            let line_smoother = if gap.x > 0.0 && gap.y > 0.0 {
                smoother.with_gap_limit(gap)
            } else {
                smoother
            };
            for line in &mut lines {
                let closed = line.points.len() > 3 && line.points.first() == line.points.last();
                line.curve = if closed {
                    line_smoother.smooth_closed(&line.points)
                } else {
                    line_smoother.smooth_points(&line.points)
                };
            }
        });

        ContourFrame {
            regions,
            fills: table.into_vec(),
            lines,
            labels,
            clusters,
            diagnostics,
            timing: None,
        }
    }
}

/// Every strip the tracer holds, with the tracer's on-boundary flags for
/// both ends. Indices without coordinates are skipped.
fn read_strips(tracer: &dyn Tracer) -> (Vec<Strip>, Vec<[bool; 2]>) {
    let mut strips = Vec::new();
    let mut hints = Vec::new();
    for level in 0..tracer.level_count() {
        let traced = tracer
            .strip_list(level)
            .iter()
            .enumerate()
            .map(|(list, indices)| (StripSource::Traced { list }, indices));
        let extra = tracer
            .extra_strip_list(level)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(list, indices)| (StripSource::Extra { list }, indices));

        for (source, indices) in traced.chain(extra) {
            let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
                continue;
            };
            let points: Vec<Point2> = indices.iter().filter_map(|&i| tracer.point(i)).collect();
            if points.len() != indices.len() {
                log::debug!("engine: level {level} strip has indices without coordinates");
            }
            hints.push([tracer.is_node_on_boundary(first), tracer.is_node_on_boundary(last)]);
            strips.push(Strip::new(Some(level), source, indices.clone(), points));
        }
    }
    (strips, hints)
}
