//! Gaussian mixture clustering of 2-D points (expectation maximization).

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geom::Point2;

/// Responsibility mass below which a component counts as empty.
const EMPTY_COMPONENT: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureOptions {
    pub components: usize,
    pub max_iterations: usize,
    /// Relative log-likelihood change that ends iteration.
    pub tolerance: f64,
    pub seed: u64,
    /// Added to both covariance variances every step.
    pub regularization: f64,
}

impl Default for MixtureOptions {
    fn default() -> Self {
        Self {
            components: 19,
            max_iterations: 100,
            tolerance: 1e-6,
            seed: 0x5eed_c0de,
            regularization: 1e-6,
        }
    }
}

impl MixtureOptions {
    #[must_use]
    pub const fn with_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }

    #[must_use]
    pub const fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }
}

/// One weighted Gaussian with a full covariance `[xx, xy, yy]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianComponent {
    pub weight: f64,
    pub mean: Point2,
    pub covariance: [f64; 3],
}

impl GaussianComponent {
    fn log_density(&self, p: Point2) -> f64 {
        let [a, b, c] = self.covariance;
        let det = (a * c - b * b).max(f64::MIN_POSITIVE);
        let dx = p.x - self.mean.x;
        let dy = p.y - self.mean.y;
        let mahalanobis = (c * dx * dx - 2.0 * b * dx * dy + a * dy * dy) / det;
        -(2.0 * PI).ln() - 0.5 * det.ln() - 0.5 * mahalanobis
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianMixture {
    components: Vec<GaussianComponent>,
    log_likelihood: f64,
    iterations: usize,
    converged: bool,
}

impl GaussianMixture {
    /// Fits `min(options.components, points.len())` components. `None` for
    /// an empty point set.
    #[must_use]
    pub fn fit(points: &[Point2], options: &MixtureOptions) -> Option<Self> {
        let n = points.len();
        if n == 0 {
            return None;
        }
        let k = options.components.clamp(1, n);
        let mut rng = StdRng::seed_from_u64(options.seed);
        let reg = options.regularization.max(0.0);
        let global = covariance_of(points, None, reg);

        let mut components: Vec<GaussianComponent> = initial_means(points, k, &mut rng)
            .into_iter()
            .map(|mean| GaussianComponent {
                weight: 1.0 / k as f64,
                mean,
                covariance: global,
            })
            .collect();

        let mut resp = vec![0.0; n * k];
        let mut previous = f64::NEG_INFINITY;
        let mut log_likelihood = f64::NEG_INFINITY;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < options.max_iterations {
            iterations += 1;
            log_likelihood = expectation(points, &components, &mut resp);

            for (j, component) in components.iter_mut().enumerate() {
                let mass: f64 = (0..n).map(|i| resp[i * k + j]).sum();
                if mass < EMPTY_COMPONENT {
                    let i = rng.random_range(0..n);
                    *component = GaussianComponent {
                        weight: 1.0 / n as f64,
                        mean: points[i],
                        covariance: global,
                    };
                    continue;
                }
                let weights: Vec<f64> = (0..n).map(|i| resp[i * k + j]).collect();
                let (sx, sy) = points
                    .iter()
                    .zip(&weights)
                    .fold((0.0, 0.0), |(sx, sy), (p, w)| (sx + w * p.x, sy + w * p.y));
                component.weight = mass / n as f64;
                component.mean = Point2::new(sx / mass, sy / mass);
                component.covariance =
                    covariance_of(points, Some((&weights, mass, component.mean)), reg);
            }
            normalize_weights(&mut components);

            if (log_likelihood - previous).abs() <= options.tolerance * log_likelihood.abs().max(1.0) {
                converged = true;
                break;
            }
            previous = log_likelihood;
        }

        log::trace!(
            "mixture: {k} components, {iterations} iterations, log-likelihood {log_likelihood:.3}"
        );

        Some(Self {
            components,
            log_likelihood,
            iterations,
            converged,
        })
    }

    #[must_use]
    pub fn components(&self) -> &[GaussianComponent] {
        &self.components
    }

    #[must_use]
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Most responsible component for each point.
    #[must_use]
    pub fn assign(&self, points: &[Point2]) -> Vec<usize> {
        points
            .iter()
            .map(|&p| {
                self.components
                    .iter()
                    .enumerate()
                    .map(|(j, c)| (j, c.weight.max(f64::MIN_POSITIVE).ln() + c.log_density(p)))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map_or(0, |(j, _)| j)
            })
            .collect()
    }
}

/// Partitions `points` by mixture component; empty partitions are dropped.
#[must_use]
pub fn cluster_points(points: &[Point2], options: &MixtureOptions) -> Vec<Vec<Point2>> {
    let Some(model) = GaussianMixture::fit(points, options) else {
        return Vec::new();
    };
    let mut groups = vec![Vec::new(); model.components.len()];
    for (p, j) in points.iter().zip(model.assign(points)) {
        groups[j].push(*p);
    }
    groups.retain(|g| !g.is_empty());
    groups
}

/// One random seed point, then repeatedly the point farthest from every
/// mean chosen so far.
fn initial_means(points: &[Point2], k: usize, rng: &mut StdRng) -> Vec<Point2> {
    let first = points[rng.random_range(0..points.len())];
    let mut means = vec![first];
    let mut nearest: Vec<f64> = points.iter().map(|p| p.distance_squared_to(first)).collect();
    while means.len() < k {
        let Some((index, _)) = nearest.iter().enumerate().max_by(|a, b| a.1.total_cmp(b.1)) else {
            break;
        };
        let chosen = points[index];
        means.push(chosen);
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(p.distance_squared_to(chosen));
        }
    }
    means
}

/// E-step. Fills `resp` (row-major, one row per point) and returns the total
/// log-likelihood.
fn expectation(points: &[Point2], components: &[GaussianComponent], resp: &mut [f64]) -> f64 {
    let k = components.len();
    let mut total = 0.0;
    for (i, &p) in points.iter().enumerate() {
        let row = &mut resp[i * k..(i + 1) * k];
        for (slot, c) in row.iter_mut().zip(components) {
            *slot = c.weight.max(f64::MIN_POSITIVE).ln() + c.log_density(p);
        }
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = row.iter().map(|v| (v - max).exp()).sum();
        let log_sum = max + sum.ln();
        for slot in row.iter_mut() {
            *slot = (*slot - log_sum).exp();
        }
        total += log_sum;
    }
    total
}

fn normalize_weights(components: &mut [GaussianComponent]) {
    let total: f64 = components.iter().map(|c| c.weight).sum();
    if total > 0.0 {
        for c in components {
            c.weight /= total;
        }
    }
}

/// Weighted covariance `[xx, xy, yy]` plus `reg` on the diagonal. Without
/// weights this is the plain covariance about the mean.
fn covariance_of(points: &[Point2], weighted: Option<(&[f64], f64, Point2)>, reg: f64) -> [f64; 3] {
    let (mass, mean) = match weighted {
        Some((_, mass, mean)) => (mass, mean),
        None => {
            let n = points.len() as f64;
            let (sx, sy) = points.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
            (n, Point2::new(sx / n, sy / n))
        }
    };
    let mut cov = [0.0; 3];
    for (i, p) in points.iter().enumerate() {
        let w = weighted.map_or(1.0, |(weights, _, _)| weights[i]);
        let dx = p.x - mean.x;
        let dy = p.y - mean.y;
        cov[0] += w * dx * dx;
        cov[1] += w * dx * dy;
        cov[2] += w * dy * dy;
    }
    [cov[0] / mass + reg, cov[1] / mass, cov[2] / mass + reg]
}
