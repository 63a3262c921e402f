//! Two-dimensional fixed-binning histogram.
//!
//! Cell layout follows ROOT's TH2: `cell = bin_x + (n_x + 2) * bin_y`, with
//! under/overflow rows and columns addressed alongside the in-range bins.
//! Only non-empty cells are stored: the score axis alone carries 4400 bins and
//! a pt-profile would otherwise hold 4.4M mostly-empty cells.

use std::collections::BTreeMap;

use btv_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::hist1d::Hist1D;

/// A 2D histogram of unit-weight fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SparseHist2D", try_from = "SparseHist2D")]
pub struct Hist2D {
    name: String,
    title: String,
    x: Axis,
    y: Axis,
    cells: BTreeMap<usize, f64>,
    entries: u64,
}

impl Hist2D {
    /// Empty histogram with the given binning.
    pub fn new(name: impl Into<String>, title: impl Into<String>, x: Axis, y: Axis) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            x,
            y,
            cells: BTreeMap::new(),
            entries: 0,
        }
    }

    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Histogram title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// X binning.
    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    /// Y binning.
    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    /// Number of `fill` calls, including those landing in flow cells.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    fn cell(&self, bin_x: usize, bin_y: usize) -> usize {
        bin_x + self.x.n_cells() * bin_y
    }

    fn n_cells(&self) -> usize {
        self.x.n_cells() * self.y.n_cells()
    }

    /// Number of cells holding a non-zero content.
    pub fn n_filled_cells(&self) -> usize {
        self.cells.len()
    }

    /// Record one entry at `(x, y)`.
    pub fn fill(&mut self, x: f64, y: f64) {
        let c = self.cell(self.x.find_bin(x), self.y.find_bin(y));
        *self.cells.entry(c).or_insert(0.0) += 1.0;
        self.entries += 1;
    }

    /// Content of cell `(bin_x, bin_y)` in ROOT numbering; `0.0` outside.
    pub fn bin_content(&self, bin_x: usize, bin_y: usize) -> f64 {
        if bin_x >= self.x.n_cells() || bin_y >= self.y.n_cells() {
            return 0.0;
        }
        self.cells.get(&self.cell(bin_x, bin_y)).copied().unwrap_or(0.0)
    }

    /// Sum of all cells, flows included.
    pub fn total(&self) -> f64 {
        self.cells.values().sum()
    }

    /// Sum of y-bins `first_y..=last_y` for every x cell.
    ///
    /// Bounds use ROOT numbering, so `(0, n_y + 1)` covers the full y range
    /// including flows. `last_y` is clamped to the overflow row.
    pub fn projection_x(&self, name: impl Into<String>, first_y: usize, last_y: usize) -> Hist1D {
        let mut out = Hist1D::new(name, self.x);
        let last_y = last_y.min(self.y.n_bins + 1);
        let nx = self.x.n_cells();
        for (&c, &v) in &self.cells {
            let (bx, by) = (c % nx, c / nx);
            if (first_y..=last_y).contains(&by) {
                out.cells[bx] += v;
            }
        }
        out
    }

    /// Add the contents of `other`, which must share this binning.
    pub fn merge(&mut self, other: &Hist2D) -> Result<()> {
        if self.x != other.x || self.y != other.y {
            return Err(Error::Validation(format!(
                "cannot merge '{}' into '{}': binning differs",
                other.name, self.name
            )));
        }
        for (&c, &v) in &other.cells {
            *self.cells.entry(c).or_insert(0.0) += v;
        }
        self.entries += other.entries;
        Ok(())
    }
}

/// On-disk form: non-empty cells as `(index, content)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SparseHist2D {
    name: String,
    #[serde(default)]
    title: String,
    x_axis: Axis,
    y_axis: Axis,
    entries: u64,
    cells: Vec<(usize, f64)>,
}

impl From<Hist2D> for SparseHist2D {
    fn from(h: Hist2D) -> Self {
        let cells = h.cells.into_iter().collect();
        Self { name: h.name, title: h.title, x_axis: h.x, y_axis: h.y, entries: h.entries, cells }
    }
}

impl TryFrom<SparseHist2D> for Hist2D {
    type Error = String;

    fn try_from(s: SparseHist2D) -> std::result::Result<Self, Self::Error> {
        let x = Axis::new(s.x_axis.n_bins, s.x_axis.min, s.x_axis.max).map_err(|e| e.to_string())?;
        let y = Axis::new(s.y_axis.n_bins, s.y_axis.min, s.y_axis.max).map_err(|e| e.to_string())?;
        let mut h = Hist2D::new(s.name, s.title, x, y);
        let n_cells = h.n_cells();
        for (i, v) in s.cells {
            if i >= n_cells {
                return Err(format!("cell index {i} out of range for '{}'", h.name));
            }
            if v != 0.0 {
                h.cells.insert(i, v);
            }
        }
        h.entries = s.entries;
        Ok(h)
    }
}
