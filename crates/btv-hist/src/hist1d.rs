//! One-dimensional histograms, produced by projecting a [`Hist2D`](crate::Hist2D).

use btv_core::{Error, Result};
use serde::Serialize;

use crate::axis::Axis;

/// A 1D histogram with under/overflow cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hist1D {
    /// Histogram name.
    pub name: String,
    /// Binning.
    pub axis: Axis,
    /// Cell contents, length `axis.n_bins + 2` (index 0 = underflow).
    pub cells: Vec<f64>,
}

impl Hist1D {
    /// Empty histogram.
    pub fn new(name: impl Into<String>, axis: Axis) -> Self {
        Self { name: name.into(), axis, cells: vec![0.0; axis.n_cells()] }
    }

    /// Add `weight` to the cell containing `x`.
    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        let bin = self.axis.find_bin(x);
        self.cells[bin] += weight;
    }

    /// Content of cell `bin` (ROOT numbering).
    pub fn bin_content(&self, bin: usize) -> f64 {
        self.cells.get(bin).copied().unwrap_or(0.0)
    }

    /// In-range contents, excluding flows.
    pub fn contents(&self) -> &[f64] {
        &self.cells[1..=self.axis.n_bins]
    }

    /// Sum of in-range contents.
    pub fn integral(&self) -> f64 {
        self.contents().iter().sum()
    }

    /// Merge groups of `group` adjacent bins. Flow cells are carried over.
    pub fn rebin(&self, group: usize) -> Result<Self> {
        let axis = self.axis.rebinned(group)?;
        let mut cells = vec![0.0; axis.n_cells()];
        cells[0] = self.cells[0];
        cells[axis.n_bins + 1] = self.cells[self.axis.n_bins + 1];
        for (i, v) in self.contents().iter().enumerate() {
            cells[1 + i / group] += v;
        }
        Ok(Self { name: self.name.clone(), axis, cells })
    }

    /// Check that `other` has identical binning.
    pub fn check_compatible(&self, other: &Hist1D) -> Result<()> {
        if self.axis != other.axis {
            return Err(Error::Validation(format!(
                "incompatible binning between '{}' and '{}'",
                self.name, other.name
            )));
        }
        Ok(())
    }
}
