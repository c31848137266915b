//! Contour configuration: boundary, levels, fills and tunable constants.

use serde::{Deserialize, Serialize};

use super::border::Boundary;
use super::fill::{Color, Fill, ThresholdTable};
use super::smooth::InterpolationMode;
use crate::geom::Tolerance;

/// Errors raised while validating a [`ContourConfig`].
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("level {index} is not finite")]
    NonFiniteLevel { index: usize },
    #[error("level {index} ({value}) is not above the previous level ({previous})")]
    NonAscendingLevels {
        index: usize,
        previous: f64,
        value: f64,
    },
    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),
    #[error("invalid tunable `{name}`: {value}")]
    InvalidTunable { name: &'static str, value: f64 },
    #[error("expected {expected} band fills for {levels} levels, got {actual}")]
    BandFillCount {
        levels: usize,
        expected: usize,
        actual: usize,
    },
    #[error("pixel scale must be finite and positive, got {0}")]
    InvalidPixelScale(f64),
}

/// Empirical constants of the pipeline, kept configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Point equality and boundary-touch tolerance in plot units.
    pub point_epsilon: f64,
    /// Reorganized cycles smaller than this fraction of the largest cycle on
    /// the same level are dropped.
    pub min_region_area_ratio: f64,
    /// Initial sub-cluster count of the mixture model.
    pub mixture_components: usize,
    pub mixture_seed: u64,
    pub mixture_max_iterations: usize,
    /// Log-likelihood change that ends EM iteration.
    pub mixture_tolerance: f64,
    /// Concave hull edge threshold in grid resolutions.
    pub concavity: f64,
    /// Factor applied to `concavity` on each refinement pass.
    pub concavity_growth: f64,
    pub hull_refinement_passes: usize,
    /// Clusters closer than this many grid resolutions are merged.
    pub merge_distance_factor: f64,
    /// Merging stops once fewer clusters than this remain.
    pub merge_floor: usize,
    /// Sine of the turning angle below which a vertex counts as collinear.
    pub collinear_epsilon: f64,
    /// Linear mode starts a new subpath when a step exceeds this many grid
    /// cells on either axis.
    pub linear_gap_factor: f64,
    /// Hop limit for a single perimeter walk.
    pub max_walk_steps: usize,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            point_epsilon: 0.5,
            min_region_area_ratio: 0.1,
            mixture_components: 19,
            mixture_seed: 0x5eed_c0de,
            mixture_max_iterations: 100,
            mixture_tolerance: 1e-6,
            concavity: 1.5,
            concavity_growth: 2.0,
            hull_refinement_passes: 3,
            merge_distance_factor: 2.0,
            merge_floor: 3,
            collinear_epsilon: 1e-3,
            linear_gap_factor: 4.0,
            max_walk_steps: 100_000,
        }
    }
}

impl Tunables {
    #[must_use]
    pub const fn with_point_epsilon(mut self, eps: f64) -> Self {
        self.point_epsilon = eps;
        self
    }

    #[must_use]
    pub const fn with_min_region_area_ratio(mut self, ratio: f64) -> Self {
        self.min_region_area_ratio = ratio;
        self
    }

    #[must_use]
    pub const fn with_mixture_components(mut self, count: usize) -> Self {
        self.mixture_components = count;
        self
    }

    #[must_use]
    pub const fn with_mixture_seed(mut self, seed: u64) -> Self {
        self.mixture_seed = seed;
        self
    }

    #[must_use]
    pub const fn with_concavity(mut self, concavity: f64) -> Self {
        self.concavity = concavity;
        self
    }

    #[must_use]
    pub const fn with_merge_distance_factor(mut self, factor: f64) -> Self {
        self.merge_distance_factor = factor;
        self
    }

    #[must_use]
    pub const fn with_merge_floor(mut self, floor: usize) -> Self {
        self.merge_floor = floor;
        self
    }

    #[must_use]
    pub const fn with_collinear_epsilon(mut self, eps: f64) -> Self {
        self.collinear_epsilon = eps;
        self
    }

    #[must_use]
    pub const fn with_linear_gap_factor(mut self, factor: f64) -> Self {
        self.linear_gap_factor = factor;
        self
    }

    #[must_use]
    pub const fn with_max_walk_steps(mut self, steps: usize) -> Self {
        self.max_walk_steps = steps;
        self
    }

    /// Plot-space tolerance derived from `point_epsilon`.
    #[must_use]
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.point_epsilon)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("point_epsilon", self.point_epsilon),
            ("mixture_tolerance", self.mixture_tolerance),
            ("concavity", self.concavity),
            ("merge_distance_factor", self.merge_distance_factor),
            ("collinear_epsilon", self.collinear_epsilon),
            ("linear_gap_factor", self.linear_gap_factor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidTunable { name, value });
            }
        }
        if !self.min_region_area_ratio.is_finite() || !(0.0..1.0).contains(&self.min_region_area_ratio)
        {
            return Err(ConfigError::InvalidTunable {
                name: "min_region_area_ratio",
                value: self.min_region_area_ratio,
            });
        }
        if !self.concavity_growth.is_finite() || self.concavity_growth < 1.0 {
            return Err(ConfigError::InvalidTunable {
                name: "concavity_growth",
                value: self.concavity_growth,
            });
        }
        if self.mixture_components == 0 {
            return Err(ConfigError::InvalidTunable {
                name: "mixture_components",
                value: 0.0,
            });
        }
        if self.max_walk_steps == 0 {
            return Err(ConfigError::InvalidTunable {
                name: "max_walk_steps",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Style of one contour level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStyle {
    pub value: f64,
    pub line_color: Color,
    pub line_width: f64,
    /// Fill used for regions bounded only by this level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
}

impl LevelStyle {
    #[must_use]
    pub fn new(value: f64, line_color: Color) -> Self {
        Self {
            value,
            line_color,
            line_width: 1.0,
            fill: None,
        }
    }

    #[must_use]
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }
}

/// Everything the pipeline needs besides the tracer and the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourConfig {
    pub boundary: Boundary,
    /// Levels in strictly ascending order of `value`.
    pub levels: Vec<LevelStyle>,
    /// One fill per band (`levels.len() + 1`), overriding level fills when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_fills: Option<Vec<Fill>>,
    #[serde(default)]
    pub interpolation: InterpolationMode,
    /// Treat every open strip as a boundary strip by extending loose ends to
    /// the nearest edge.
    #[serde(default)]
    pub extrapolate_to_limits: bool,
    /// Device pixels per plot unit; enables pixel alignment when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_scale: Option<f64>,
    #[serde(default)]
    pub tunables: Tunables,
}

impl ContourConfig {
    #[must_use]
    pub fn new(boundary: Boundary, levels: Vec<LevelStyle>) -> Self {
        Self {
            boundary,
            levels,
            band_fills: None,
            interpolation: InterpolationMode::default(),
            extrapolate_to_limits: false,
            pixel_scale: None,
            tunables: Tunables::default(),
        }
    }

    /// Levels from bare values, with gray line colors stepping from dark to
    /// light.
    #[must_use]
    pub fn with_level_values(boundary: Boundary, values: &[f64]) -> Self {
        let count = values.len().max(1) as f64;
        let levels = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                LevelStyle::new(value, Color::gray(0.2 + 0.6 * (i as f64) / count, 1.0))
            })
            .collect();
        Self::new(boundary, levels)
    }

    #[must_use]
    pub fn with_band_fills(mut self, fills: Vec<Fill>) -> Self {
        self.band_fills = Some(fills);
        self
    }

    #[must_use]
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    #[must_use]
    pub fn with_extrapolate_to_limits(mut self, extrapolate: bool) -> Self {
        self.extrapolate_to_limits = extrapolate;
        self
    }

    #[must_use]
    pub fn with_pixel_scale(mut self, scale: f64) -> Self {
        self.pixel_scale = Some(scale);
        self
    }

    #[must_use]
    pub fn with_tunables(mut self, tunables: Tunables) -> Self {
        self.tunables = tunables;
        self
    }

    /// Level values in configured order.
    #[must_use]
    pub fn level_values(&self) -> Vec<f64> {
        self.levels.iter().map(|level| level.value).collect()
    }

    /// Validated threshold table built from the level values.
    pub fn thresholds(&self) -> Result<ThresholdTable, ConfigError> {
        ThresholdTable::new(self.level_values())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.boundary.validate()?;
        self.thresholds()?;
        self.tunables.validate()?;

        if let Some(fills) = &self.band_fills {
            let expected = self.levels.len() + 1;
            if fills.len() != expected {
                return Err(ConfigError::BandFillCount {
                    levels: self.levels.len(),
                    expected,
                    actual: fills.len(),
                });
            }
        }

        if let Some(scale) = self.pixel_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::InvalidPixelScale(scale));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_boundary() -> Boundary {
        Boundary::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn default_tunables_are_valid() {
        let tunables = Tunables::default();
        assert!(tunables.validate().is_ok());
        assert_eq!(tunables.mixture_components, 19);
        assert!((tunables.point_epsilon - 0.5).abs() < f64::EPSILON);
        assert!((tunables.min_region_area_ratio - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_descending_levels() {
        let config = ContourConfig::with_level_values(unit_boundary(), &[50.0, 25.0]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonAscendingLevels { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_wrong_band_fill_count() {
        let config = ContourConfig::with_level_values(unit_boundary(), &[25.0, 50.0])
            .with_band_fills(vec![Fill::Empty]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BandFillCount { expected: 3, actual: 1, .. })
        ));
    }

    #[test]
    fn rejects_bad_tunable() {
        let config = ContourConfig::with_level_values(unit_boundary(), &[1.0])
            .with_tunables(Tunables::default().with_point_epsilon(-1.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTunable { name: "point_epsilon", .. })
        ));
    }

    #[test]
    fn level_values_build_valid_config() {
        let config = ContourConfig::with_level_values(unit_boundary(), &[1.0, 2.0]);
        assert_eq!(config.levels.len(), 2);
        assert_eq!(config.interpolation, InterpolationMode::Linear);
        assert!(config.validate().is_ok());
    }
}
