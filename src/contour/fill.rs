//! Fill descriptors, threshold bands and per-region fill selection.

use serde::{Deserialize, Serialize};

use super::assemble::ClosedPath;
use super::config::ConfigError;
use super::discontinuity::DiscontinuityCluster;
use super::field::ScalarField;
use super::style::{StyleEntry, StyleStrategy};
use crate::geom::Point2;

/// Component tolerance used when comparing fills for dedupe.
const COMPONENT_EPS: f64 = 1e-6;

// ─────────────────────────────────────────────────────────────────────────────
// Color / Fill
// ─────────────────────────────────────────────────────────────────────────────

/// A color in either gray + alpha or RGBA form. Components are in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Color {
    Gray { white: f64, alpha: f64 },
    Rgba { r: f64, g: f64, b: f64, a: f64 },
}

impl Color {
    #[must_use]
    pub const fn gray(white: f64, alpha: f64) -> Self {
        Self::Gray { white, alpha }
    }

    #[must_use]
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self::Rgba { r, g, b, a }
    }

    /// RGBA components; gray expands to equal channels.
    #[must_use]
    pub const fn components(self) -> [f64; 4] {
        match self {
            Self::Gray { white, alpha } => [white, white, white, alpha],
            Self::Rgba { r, g, b, a } => [r, g, b, a],
        }
    }

    #[must_use]
    pub const fn alpha(self) -> f64 {
        self.components()[3]
    }

    #[must_use]
    pub fn with_alpha_scaled(self, factor: f64) -> Self {
        match self {
            Self::Gray { white, alpha } => Self::Gray {
                white,
                alpha: alpha * factor,
            },
            Self::Rgba { r, g, b, a } => Self::Rgba {
                r,
                g,
                b,
                a: a * factor,
            },
        }
    }

    /// Channel-wise mean of two colors, alpha included.
    #[must_use]
    pub fn average(self, other: Self) -> Self {
        if let (Self::Gray { white: w0, alpha: a0 }, Self::Gray { white: w1, alpha: a1 }) =
            (self, other)
        {
            return Self::gray((w0 + w1) * 0.5, (a0 + a1) * 0.5);
        }
        let a = self.components();
        let b = other.components();
        Self::rgba(
            (a[0] + b[0]) * 0.5,
            (a[1] + b[1]) * 0.5,
            (a[2] + b[2]) * 0.5,
            (a[3] + b[3]) * 0.5,
        )
    }

    /// Component-wise equality, so a gray and its RGBA expansion compare equal.
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        self.components()
            .iter()
            .zip(other.components())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

/// Reference to a named image supplied by the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFill {
    pub name: String,
    #[serde(default)]
    pub tiled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fill {
    Color(Color),
    Image(ImageFill),
    /// Transparent; used for undefined field values and discontinuities.
    Empty,
}

impl Fill {
    #[must_use]
    pub const fn color(color: Color) -> Self {
        Self::Color(color)
    }

    #[must_use]
    pub fn image(name: impl Into<String>, tiled: bool) -> Self {
        Self::Image(ImageFill {
            name: name.into(),
            tiled,
        })
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        match (self, other) {
            (Self::Color(a), Self::Color(b)) => a.approx_eq(*b, eps),
            (Self::Image(a), Self::Image(b)) => a == b,
            (Self::Empty, Self::Empty) => true,
            _ => false,
        }
    }
}

/// A fill bound to the threshold interval it represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourFill {
    /// Lower bound, `None` when unbounded below.
    pub first: Option<f64>,
    /// Upper bound, `None` when unbounded above.
    pub second: Option<f64>,
    pub fill: Fill,
}

impl ContourFill {
    #[must_use]
    pub const fn new(first: Option<f64>, second: Option<f64>, fill: Fill) -> Self {
        Self {
            first,
            second,
            fill,
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::new(None, None, Fill::Empty)
    }

    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        bound_eq(self.first, other.first)
            && bound_eq(self.second, other.second)
            && self.fill.approx_eq(&other.fill, COMPONENT_EPS)
    }
}

fn bound_eq(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= COMPONENT_EPS * (1.0 + a.abs().max(b.abs())),
        _ => false,
    }
}

/// Deduplicated list of fills referenced by index from regions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FillTable {
    fills: Vec<ContourFill>,
}

impl FillTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of an equal fill, appending `fill` if none exists.
    pub fn insert(&mut self, fill: ContourFill) -> usize {
        if let Some(existing) = self.fills.iter().position(|f| f.matches(&fill)) {
            return existing;
        }
        self.fills.push(fill);
        self.fills.len() - 1
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ContourFill> {
        self.fills.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ContourFill> {
        self.fills
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Threshold bands
// ─────────────────────────────────────────────────────────────────────────────

/// Strictly ascending, finite threshold values.
///
/// `n` thresholds split the value axis into `n + 1` bands: band 0 is below
/// the first threshold, band `i` is `[t(i-1), t(i))` and band `n` is at or
/// above the last.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThresholdTable {
    values: Vec<f64>,
}

impl ThresholdTable {
    pub fn new(values: Vec<f64>) -> Result<Self, ConfigError> {
        for (index, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteLevel { index });
            }
            if index > 0 && values[index - 1] >= *value {
                return Err(ConfigError::NonAscendingLevels {
                    index,
                    previous: values[index - 1],
                    value: *value,
                });
            }
        }
        Ok(Self { values })
    }

    /// Sorts, drops non-finite values and removes duplicates.
    #[must_use]
    pub fn normalized(mut values: Vec<f64>) -> Self {
        values.retain(|v| v.is_finite());
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn band_count(&self) -> usize {
        self.values.len() + 1
    }

    /// Band containing `value`, `None` for `NaN`.
    #[must_use]
    pub fn band(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        Some(self.values.partition_point(|t| *t <= value))
    }

    /// Lower and upper threshold of a band.
    #[must_use]
    pub fn band_bounds(&self, band: usize) -> (Option<f64>, Option<f64>) {
        let first = band.checked_sub(1).and_then(|i| self.values.get(i).copied());
        let second = self.values.get(band).copied();
        (first, second)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Result of resolving one region.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFill {
    pub fill: ContourFill,
    /// Point used to sample the field, if one could be found.
    pub sample: Option<Point2>,
    /// The sample evaluated to `NaN`.
    pub undefined: bool,
}

/// Picks the fill for each assembled region.
pub struct FillResolver<'a> {
    thresholds: &'a ThresholdTable,
    style: &'a dyn StyleStrategy,
    band_fills: Option<&'a [Fill]>,
    field: Option<&'a dyn ScalarField>,
    clusters: &'a [DiscontinuityCluster],
}

impl<'a> FillResolver<'a> {
    #[must_use]
    pub fn new(thresholds: &'a ThresholdTable, style: &'a dyn StyleStrategy) -> Self {
        Self {
            thresholds,
            style,
            band_fills: None,
            field: None,
            clusters: &[],
        }
    }

    #[must_use]
    pub fn with_band_fills(mut self, fills: Option<&'a [Fill]>) -> Self {
        self.band_fills = fills;
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: Option<&'a dyn ScalarField>) -> Self {
        self.field = field;
        self
    }

    #[must_use]
    pub fn with_clusters(mut self, clusters: &'a [DiscontinuityCluster]) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn resolve(&self, path: &ClosedPath) -> ResolvedFill {
        let sample = path.interior_point();

        if let Some(p) = sample {
            if self.clusters.iter().any(|cluster| cluster.contains(p)) {
                return ResolvedFill {
                    fill: ContourFill::empty(),
                    sample,
                    undefined: false,
                };
            }
            if let Some(field) = self.field {
                let value = field.value_at(p.x, p.y);
                return match self.fill_for_value(value) {
                    Some(fill) => ResolvedFill {
                        fill,
                        sample,
                        undefined: false,
                    },
                    None => ResolvedFill {
                        fill: ContourFill::empty(),
                        sample,
                        undefined: true,
                    },
                };
            }
        }

        ResolvedFill {
            fill: self.fill_for_levels(&path.levels),
            sample,
            undefined: false,
        }
    }

    /// Fill of the band containing `value`; `None` for `NaN`.
    #[must_use]
    pub fn fill_for_value(&self, value: f64) -> Option<ContourFill> {
        let band = self.thresholds.band(value)?;
        let (first, second) = self.thresholds.band_bounds(band);
        if let Some(fill) = self.band_fill(band) {
            return Some(ContourFill::new(first, second, fill));
        }

        let n = self.thresholds.len();
        let bounding: Vec<usize> = match (band, n) {
            (_, 0) => Vec::new(),
            (0, _) => vec![0],
            (b, n) if b >= n => vec![n - 1],
            (b, _) => vec![b - 1, b],
        };
        Some(ContourFill::new(first, second, self.blend_levels(&bounding)))
    }

    /// Fill derived from the levels that bound a region.
    #[must_use]
    pub fn fill_for_levels(&self, levels: &[usize]) -> ContourFill {
        let mut levels: Vec<usize> = levels
            .iter()
            .copied()
            .filter(|&l| l < self.thresholds.len())
            .collect();
        levels.sort_unstable();
        levels.dedup();

        match levels.as_slice() {
            [] => ContourFill::empty(),
            [only] => ContourFill::new(
                self.thresholds.values().get(*only).copied(),
                None,
                self.blend_levels(&levels),
            ),
            [lo, .., hi] => {
                let first = self.thresholds.values().get(*lo).copied();
                let second = self.thresholds.values().get(*hi).copied();
                let fill = if *hi == *lo + 1 {
                    self.band_fill(*hi)
                } else {
                    None
                };
                ContourFill::new(
                    first,
                    second,
                    fill.unwrap_or_else(|| self.blend_levels(&[*lo, *hi])),
                )
            }
        }
    }

    fn band_fill(&self, band: usize) -> Option<Fill> {
        self.band_fills.and_then(|fills| fills.get(band).cloned())
    }

    fn blend_levels(&self, levels: &[usize]) -> Fill {
        match levels {
            [] => Fill::Empty,
            [only] => {
                let style = self.style_for(*only);
                style
                    .fill
                    .unwrap_or_else(|| Fill::color(style.color.with_alpha_scaled(0.5)))
            }
            [lo, .., hi] => {
                let a = self.style_for(*lo).color;
                let b = self.style_for(*hi).color;
                Fill::color(a.average(b))
            }
        }
    }

    fn style_for(&self, level: usize) -> super::style::StyleResult {
        let value = self.thresholds.values().get(level).copied().unwrap_or(f64::NAN);
        self.style.style(&StyleEntry { level, value })
    }
}
