//! Uniform-width binning with ROOT bin numbering.
//!
//! Bin `0` is the underflow, bins `1..=n_bins` are in range and `n_bins + 1`
//! is the overflow. Every lookup returns one of those indices so fills never
//! lose entries.

use btv_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A fixed, uniform axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Number of in-range bins.
    pub n_bins: usize,
    /// Lower edge of bin 1.
    pub min: f64,
    /// Upper edge of bin `n_bins`.
    pub max: f64,
}

impl Axis {
    /// Checked constructor.
    pub fn new(n_bins: usize, min: f64, max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation("axis needs at least one bin".into()));
        }
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::Validation(format!("invalid axis range [{min}, {max})")));
        }
        Ok(Self { n_bins, min, max })
    }

    /// Unchecked constructor for compile-time constants.
    pub const fn fixed(n_bins: usize, min: f64, max: f64) -> Self {
        Self { n_bins, min, max }
    }

    /// Number of storage cells including under/overflow.
    pub fn n_cells(&self) -> usize {
        self.n_bins + 2
    }

    /// Width of every in-range bin.
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.n_bins as f64
    }

    /// Bin index for `x` (0 = underflow, `n_bins + 1` = overflow).
    ///
    /// NaN lands in the overflow, as in ROOT.
    pub fn find_bin(&self, x: f64) -> usize {
        if x < self.min {
            return 0;
        }
        if x.is_nan() || x >= self.max {
            return self.n_bins + 1;
        }
        let bin = 1 + ((self.n_bins as f64) * (x - self.min) / (self.max - self.min)) as usize;
        // Rounding just below `max` can push past the last bin.
        bin.min(self.n_bins)
    }

    /// Lower edge of in-range bin `bin` (1-based).
    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        self.min + (bin as f64 - 1.0) * self.bin_width()
    }

    /// Centre of in-range bin `bin` (1-based).
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.bin_low_edge(bin) + 0.5 * self.bin_width()
    }

    /// All `n_bins + 1` edges.
    pub fn edges(&self) -> Vec<f64> {
        (1..=self.n_bins + 1).map(|b| self.bin_low_edge(b)).collect()
    }

    /// Same range with `n_bins / group` bins.
    pub fn rebinned(&self, group: usize) -> Result<Self> {
        if group == 0 || self.n_bins % group != 0 {
            return Err(Error::Validation(format!(
                "cannot rebin {} bins in groups of {group}",
                self.n_bins
            )));
        }
        Ok(Self { n_bins: self.n_bins / group, min: self.min, max: self.max })
    }
}
