//! Eagerly allocated histogram registry.
//!
//! Every `(alias group, category, axis)` combination is allocated when the
//! registry is built. Filling a key that was never registered is an error
//! rather than an implicit insert.

use std::collections::HashMap;
use std::fmt;

use btv_core::{Error, Result};
use btv_hist::{Axis, Hist2D};
use serde::{Deserialize, Serialize};

use crate::alias::AliasGroupSet;
use crate::category::Category;

/// Binning of the combined-score (y) axis, shared by every histogram.
pub const SCORE_AXIS: Axis = Axis::fixed(4400, -11.0, 11.0);

/// Quantity on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistAxis {
    /// Jet transverse momentum.
    Pt,
    /// Jet pseudorapidity.
    Eta,
    /// In-time pileup.
    Pu,
}

impl HistAxis {
    /// All axes in registry order.
    pub const ALL: [HistAxis; 3] = [HistAxis::Pt, HistAxis::Eta, HistAxis::Pu];

    /// Name used in histogram names.
    pub fn as_str(self) -> &'static str {
        match self {
            HistAxis::Pt => "pt",
            HistAxis::Eta => "eta",
            HistAxis::Pu => "pu",
        }
    }

    /// Fixed x binning.
    pub fn binning(self) -> Axis {
        match self {
            HistAxis::Pt => Axis::fixed(1000, 0.0, 1000.0),
            HistAxis::Eta => Axis::fixed(100, -2.5, 2.5),
            HistAxis::Pu => Axis::fixed(30, 50.0, 80.0),
        }
    }

    fn index(self) -> usize {
        match self {
            HistAxis::Pt => 0,
            HistAxis::Eta => 1,
            HistAxis::Pu => 2,
        }
    }
}

impl fmt::Display for HistAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HistAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pt" => Ok(HistAxis::Pt),
            "eta" => Ok(HistAxis::Eta),
            "pu" => Ok(HistAxis::Pu),
            other => Err(Error::Validation(format!(
                "unknown histogram axis '{other}' (expected pt, eta or pu)"
            ))),
        }
    }
}

/// Output name of one histogram: `<group>_<category>_<axis>`.
pub fn histogram_name(group: &str, category: Category, axis: HistAxis) -> String {
    format!("{group}_{category}_{axis}")
}

const PER_GROUP: usize = Category::ALL.len() * HistAxis::ALL.len();

/// All histograms of a run.
#[derive(Debug, Clone)]
pub struct HistogramRegistry {
    hists: Vec<Hist2D>,
    groups: HashMap<String, usize>,
}

impl HistogramRegistry {
    /// Allocate one histogram per group × category × axis.
    pub fn build(aliases: &AliasGroupSet) -> Self {
        let mut hists = Vec::with_capacity(aliases.len() * PER_GROUP);
        let mut groups = HashMap::with_capacity(aliases.len());
        for (gi, group) in aliases.iter().enumerate() {
            groups.insert(group.name.clone(), gi * PER_GROUP);
            for cat in Category::ALL {
                for axis in HistAxis::ALL {
                    let name = histogram_name(&group.name, cat, axis);
                    let title = format!("{} ({cat} jets) vs {axis}", group.name);
                    hists.push(Hist2D::new(name, title, axis.binning(), SCORE_AXIS));
                }
            }
        }
        Self { hists, groups }
    }

    fn slot(&self, group: &str, category: Category, axis: HistAxis) -> Option<usize> {
        let base = *self.groups.get(group)?;
        Some(base + category.index() * HistAxis::ALL.len() + axis.index())
    }

    /// Fill `(x, score)` into a registered histogram.
    pub fn fill(
        &mut self,
        group: &str,
        category: Category,
        axis: HistAxis,
        x: f64,
        score: f64,
    ) -> Result<()> {
        let slot = self
            .slot(group, category, axis)
            .ok_or_else(|| Error::UnregisteredHistogram(histogram_name(group, category, axis)))?;
        self.hists[slot].fill(x, score);
        Ok(())
    }

    /// Histogram for a key, if registered.
    pub fn get(&self, group: &str, category: Category, axis: HistAxis) -> Option<&Hist2D> {
        self.slot(group, category, axis).map(|i| &self.hists[i])
    }

    /// Histograms in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Hist2D> {
        self.hists.iter()
    }

    /// Number of histograms.
    pub fn len(&self) -> usize {
        self.hists.len()
    }

    /// `true` when no alias group was configured.
    pub fn is_empty(&self) -> bool {
        self.hists.is_empty()
    }

    /// Take ownership of the histograms, in registration order.
    pub fn into_histograms(self) -> Vec<Hist2D> {
        self.hists
    }
}
