//! Tagging efficiency and mistag rate from the score profiles.
//!
//! For one alias group and x axis, each category's histogram is projected
//! onto x twice: once over every score bin (all jets) and once from the bin
//! containing the operating-point threshold up to the overflow (tagged jets).
//! Because integration starts at a bin boundary, the threshold is only
//! honoured to the score-axis bin width (0.005).

use std::str::FromStr;

use btv_core::{Error, Result};
use btv_hist::{Hist1D, Hist2D};
use serde::Serialize;
use statrs::distribution::{Beta, ContinuousCDF};

use crate::category::Category;
use crate::registry::{HistAxis, histogram_name};

/// Central 68.27% confidence level.
pub const CL_ONE_SIGMA: f64 = 0.682_689_492_137_086;

/// Named discriminator threshold, e.g. `medium=0.2770`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatingPoint {
    /// Label (loose / medium / tight, ...).
    pub name: String,
    /// Minimum combined score of a tagged jet.
    pub threshold: f64,
}

impl FromStr for OperatingPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = s.split_once('=').ok_or_else(|| {
            Error::Validation(format!("invalid operating point '{s}': expected name=threshold"))
        })?;
        let threshold: f64 = value
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("invalid threshold in '{s}'")))?;
        if name.trim().is_empty() || !threshold.is_finite() {
            return Err(Error::Validation(format!("invalid operating point '{s}'")));
        }
        Ok(Self { name: name.trim().to_string(), threshold })
    }
}

/// Efficiency per x bin for one category and operating point.
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyCurve {
    /// Source histogram name.
    pub histogram: String,
    /// Jet category.
    pub category: Category,
    /// Operating point label.
    pub operating_point: String,
    /// Threshold used.
    pub threshold: f64,
    /// X bin edges after rebinning.
    pub bin_edges: Vec<f64>,
    /// Tagged jets per bin.
    pub tagged: Vec<f64>,
    /// All jets per bin.
    pub total: Vec<f64>,
    /// `tagged / total`; `None` for empty bins.
    pub efficiency: Vec<Option<f64>>,
    /// Distance to the lower Clopper–Pearson bound.
    pub err_lo: Vec<Option<f64>>,
    /// Distance to the upper Clopper–Pearson bound.
    pub err_hi: Vec<Option<f64>>,
}

fn as_count(x: f64) -> Result<u64> {
    if !(x.is_finite() && x >= 0.0) {
        return Err(Error::Computation(format!("bin content {x} is not a count")));
    }
    let r = x.round();
    if (x - r).abs() > 1e-9 {
        return Err(Error::Computation(format!("bin content {x} is not an integer count")));
    }
    Ok(r as u64)
}

/// Clopper–Pearson interval `(lo, hi)` for `k` passes out of `n` trials.
pub fn clopper_pearson(k: u64, n: u64, cl: f64) -> Result<(f64, f64)> {
    if n == 0 || k > n {
        return Err(Error::Computation(format!("invalid binomial counts k={k}, n={n}")));
    }
    let alpha = 1.0 - cl;
    let (kf, nf) = (k as f64, n as f64);
    let lo = if k == 0 {
        0.0
    } else {
        Beta::new(kf, nf - kf + 1.0)
            .map_err(|e| Error::Computation(format!("beta distribution: {e}")))?
            .inverse_cdf(alpha / 2.0)
    };
    let hi = if k == n {
        1.0
    } else {
        Beta::new(kf + 1.0, nf - kf)
            .map_err(|e| Error::Computation(format!("beta distribution: {e}")))?
            .inverse_cdf(1.0 - alpha / 2.0)
    };
    Ok((lo, hi))
}

fn projections(hist: &Hist2D, threshold: f64, rebin: usize) -> Result<(Hist1D, Hist1D)> {
    let y = hist.y_axis();
    let total = hist.projection_x("total", 0, y.n_bins + 1);
    let tagged = hist.projection_x("tagged", y.find_bin(threshold), y.n_bins + 1);
    if rebin > 1 { Ok((tagged.rebin(rebin)?, total.rebin(rebin)?)) } else { Ok((tagged, total)) }
}

/// Efficiency curve of one histogram at one operating point.
pub fn efficiency_curve(
    hist: &Hist2D,
    category: Category,
    op: &OperatingPoint,
    rebin: usize,
) -> Result<EfficiencyCurve> {
    let (tagged, total) = projections(hist, op.threshold, rebin)?;
    tagged.check_compatible(&total)?;

    let n = total.axis.n_bins;
    let mut efficiency = Vec::with_capacity(n);
    let mut err_lo = Vec::with_capacity(n);
    let mut err_hi = Vec::with_capacity(n);
    for (&t, &a) in tagged.contents().iter().zip(total.contents()) {
        let (k, n_all) = (as_count(t)?, as_count(a)?);
        if n_all == 0 {
            efficiency.push(None);
            err_lo.push(None);
            err_hi.push(None);
            continue;
        }
        let eff = k as f64 / n_all as f64;
        let (lo, hi) = clopper_pearson(k, n_all, CL_ONE_SIGMA)?;
        efficiency.push(Some(eff));
        err_lo.push(Some(eff - lo));
        err_hi.push(Some(hi - eff));
    }

    Ok(EfficiencyCurve {
        histogram: hist.name().to_string(),
        category,
        operating_point: op.name.clone(),
        threshold: op.threshold,
        bin_edges: total.axis.edges(),
        tagged: tagged.contents().to_vec(),
        total: total.contents().to_vec(),
        efficiency,
        err_lo,
        err_hi,
    })
}

/// Efficiency (b) and mistag rates (c, udsg) of `group` versus `axis`, for
/// every operating point. Curves are ordered by category, then operating
/// point.
pub fn tag_efficiency(
    hists: &[Hist2D],
    group: &str,
    axis: HistAxis,
    ops: &[OperatingPoint],
    rebin: usize,
) -> Result<Vec<EfficiencyCurve>> {
    let mut curves = Vec::with_capacity(Category::ALL.len() * ops.len());
    for cat in Category::ALL {
        let name = histogram_name(group, cat, axis);
        let hist = hists
            .iter()
            .find(|h| h.name() == name)
            .ok_or_else(|| Error::UnregisteredHistogram(name.clone()))?;
        for op in ops {
            curves.push(efficiency_curve(hist, cat, op, rebin)?);
        }
    }
    Ok(curves)
}
