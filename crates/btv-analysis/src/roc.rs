//! ROC curves (b efficiency vs mistag rate) from the per-jet table.
//!
//! For one discriminator column, b jets (`flavour == 5`) are compared with a
//! single background flavour: light (`flavour == 0`) or charm
//! (`flavour == 4`). Jets of any other flavour, including gluons (21), are
//! left out. Every distinct score is a threshold, and a jet is tagged when
//! its score is at or above it.
//!
//! The optional uncertainty band resamples the jets with replacement. Each
//! replica's curve is interpolated linearly onto a log-spaced mistag grid,
//! and the band is the mean and sample standard deviation per grid point.

use std::fmt;
use std::str::FromStr;

use btv_core::{Error, Result, TreeRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Hadron flavour of signal jets.
pub const SIGNAL_FLAVOUR: i32 = 5;

/// Number of points on the band's mistag grid.
pub const BAND_GRID_POINTS: usize = 80;

/// Lowest mistag rate on the band grid, as a power of ten.
const BAND_GRID_MIN_EXP: f64 = -4.0;

/// Background flavour a ROC curve is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Light jets (`flavour == 0`).
    Light,
    /// Charm jets (`flavour == 4`).
    Charm,
}

impl Background {
    /// Both backgrounds, light first.
    pub const ALL: [Background; 2] = [Background::Light, Background::Charm];

    /// Table flavour code of the background jets.
    pub fn flavour(self) -> i32 {
        match self {
            Background::Light => 0,
            Background::Charm => 4,
        }
    }

    /// Curve label, e.g. `BvsL`.
    pub fn label(self) -> &'static str {
        match self {
            Background::Light => "BvsL",
            Background::Charm => "BvsC",
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Background::Light => "light",
            Background::Charm => "charm",
        })
    }
}

impl FromStr for Background {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" | "l" | "udsg" => Ok(Background::Light),
            "charm" | "c" => Ok(Background::Charm),
            other => Err(Error::Validation(format!(
                "unknown background '{other}' (expected light or c)"
            ))),
        }
    }
}

/// Kinematic selection applied before building a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocSelection {
    /// Minimum jet pt (exclusive).
    pub pt_min: f64,
    /// Maximum jet |eta| (inclusive).
    pub abs_eta_max: f64,
}

impl Default for RocSelection {
    fn default() -> Self {
        Self { pt_min: 100.0, abs_eta_max: 2.5 }
    }
}

impl RocSelection {
    /// Whether `row` enters the curve.
    pub fn accepts(&self, row: &TreeRecord) -> bool {
        row.jet_pt > self.pt_min && row.jet_eta.abs() <= self.abs_eta_max
    }
}

/// Curve options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocOptions {
    /// Jet selection.
    pub selection: RocSelection,
    /// Bootstrap replicas for the band; 0 disables it.
    pub bootstrap: usize,
    /// RNG seed for the bootstrap.
    pub seed: u64,
}

impl Default for RocOptions {
    fn default() -> Self {
        Self { selection: RocSelection::default(), bootstrap: 0, seed: 42 }
    }
}

/// One working point of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    /// Score threshold (tagged when `score >= threshold`).
    pub threshold: f64,
    /// Fraction of b jets tagged.
    pub efficiency: f64,
    /// Fraction of background jets tagged.
    pub mistag: f64,
}

/// Bootstrap uncertainty band on a fixed mistag grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocBand {
    /// Replicas that contained both classes.
    pub replicas: usize,
    /// Log-spaced mistag rates from 1e-4 to 1.
    pub mistag: Vec<f64>,
    /// Mean b efficiency per grid point.
    pub efficiency_mean: Vec<f64>,
    /// Sample standard deviation of the b efficiency per grid point.
    pub efficiency_std: Vec<f64>,
}

/// A ROC curve for one column and background.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    /// Discriminator column.
    pub column: String,
    /// Background flavour.
    pub background: Background,
    /// Curve label (`BvsL`, `BvsC`).
    pub label: String,
    /// Selected b jets.
    pub n_signal: usize,
    /// Selected background jets.
    pub n_background: usize,
    /// Working points by decreasing threshold.
    pub points: Vec<RocPoint>,
    /// Bootstrap band, if requested.
    pub band: Option<RocBand>,
}

/// `(score, is_signal)` for every selected jet of the two flavours.
fn labelled_scores(
    rows: &[TreeRecord],
    column: usize,
    background: Background,
    selection: &RocSelection,
) -> Vec<(f64, bool)> {
    rows.iter()
        .filter(|r| selection.accepts(r))
        .filter(|r| r.flavour == SIGNAL_FLAVOUR || r.flavour == background.flavour())
        .filter_map(|r| {
            let score = r.discriminators.get(column).copied()?;
            (!score.is_nan()).then_some((score, r.flavour == SIGNAL_FLAVOUR))
        })
        .collect()
}

/// Working points, or `None` when either class is empty.
fn curve_points(samples: &mut [(f64, bool)]) -> Option<Vec<RocPoint>> {
    let n_sig = samples.iter().filter(|s| s.1).count();
    let n_bkg = samples.len() - n_sig;
    if n_sig == 0 || n_bkg == 0 {
        return None;
    }
    samples.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut points = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < samples.len() {
        let threshold = samples[i].0;
        while i < samples.len() && samples[i].0 == threshold {
            if samples[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            efficiency: tp as f64 / n_sig as f64,
            mistag: fp as f64 / n_bkg as f64,
        });
    }
    Some(points)
}

fn band_grid() -> Vec<f64> {
    let step = -BAND_GRID_MIN_EXP / (BAND_GRID_POINTS - 1) as f64;
    (0..BAND_GRID_POINTS).map(|i| 10f64.powf(BAND_GRID_MIN_EXP + step * i as f64)).collect()
}

/// Linear interpolation through strictly increasing `xs`, extrapolating from
/// the end segments.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if xs.len() == 1 {
        return ys[0];
    }
    let k = xs.partition_point(|&v| v < x).clamp(1, xs.len() - 1);
    let (x0, x1, y0, y1) = (xs[k - 1], xs[k], ys[k - 1], ys[k]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Efficiency as a function of mistag, starting at the origin and keeping
/// the first point of each distinct mistag value.
fn efficiency_vs_mistag(points: &[RocPoint]) -> (Vec<f64>, Vec<f64>) {
    let mut xs = vec![0.0];
    let mut ys = vec![0.0];
    for p in points {
        if let Some(&last) = xs.last()
            && p.mistag > last
        {
            xs.push(p.mistag);
            ys.push(p.efficiency);
        }
    }
    (xs, ys)
}

fn bootstrap_band(samples: &[(f64, bool)], replicas: usize, seed: u64) -> Result<RocBand> {
    let grid = band_grid();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut curves: Vec<Vec<f64>> = Vec::with_capacity(replicas);
    let mut resampled = Vec::with_capacity(samples.len());

    for _ in 0..replicas {
        resampled.clear();
        resampled.extend((0..samples.len()).map(|_| samples[rng.random_range(0..samples.len())]));
        let Some(points) = curve_points(&mut resampled) else {
            continue;
        };
        let (xs, ys) = efficiency_vs_mistag(&points);
        curves.push(grid.iter().map(|&x| interpolate(&xs, &ys, x)).collect());
    }

    if curves.len() < 2 {
        return Err(Error::Computation(format!(
            "bootstrap needs at least 2 usable replicas, got {} of {replicas}",
            curves.len()
        )));
    }
    if curves.len() < replicas {
        tracing::debug!(
            usable = curves.len(),
            replicas,
            "bootstrap replicas without both classes skipped"
        );
    }

    let n = curves.len() as f64;
    let mut efficiency_mean = Vec::with_capacity(grid.len());
    let mut efficiency_std = Vec::with_capacity(grid.len());
    for j in 0..grid.len() {
        let mean = curves.iter().map(|c| c[j]).sum::<f64>() / n;
        let var = curves.iter().map(|c| (c[j] - mean).powi(2)).sum::<f64>() / (n - 1.0);
        efficiency_mean.push(mean);
        efficiency_std.push(var.sqrt());
    }
    Ok(RocBand { replicas: curves.len(), mistag: grid, efficiency_mean, efficiency_std })
}

/// ROC curve of discriminator column `column` against `background`.
///
/// `columns` names the discriminator values of each row, in order.
pub fn roc_curve(
    rows: &[TreeRecord],
    columns: &[String],
    column: &str,
    background: Background,
    options: &RocOptions,
) -> Result<RocCurve> {
    let index = columns.iter().position(|c| c == column).ok_or_else(|| {
        Error::Validation(format!("unknown discriminator column '{column}' (have {columns:?})"))
    })?;

    let mut samples = labelled_scores(rows, index, background, &options.selection);
    let n_signal = samples.iter().filter(|s| s.1).count();
    let n_background = samples.len() - n_signal;
    let points = curve_points(&mut samples).ok_or_else(|| {
        Error::Computation(format!(
            "{} for '{column}' needs both classes: {n_signal} b jets, {n_background} {background} jets selected",
            background.label()
        ))
    })?;
    let band = if options.bootstrap > 0 {
        Some(bootstrap_band(&samples, options.bootstrap, options.seed)?)
    } else {
        None
    };

    Ok(RocCurve {
        column: column.to_string(),
        background,
        label: background.label().to_string(),
        n_signal,
        n_background,
        points,
        band,
    })
}
