use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use btv_analysis::{HistAxis, OperatingPoint, tag_efficiency};
use btv_io::read_histograms;

pub fn cmd_efficiency(
    histograms: &Path,
    group: &str,
    axis: HistAxis,
    ops: &[OperatingPoint],
    rebin: usize,
    output: Option<&PathBuf>,
) -> Result<()> {
    let hists = read_histograms(histograms)
        .with_context(|| format!("failed to read {}", histograms.display()))?;
    let curves = tag_efficiency(&hists, group, axis, ops, rebin)
        .with_context(|| format!("efficiency of '{group}' vs {axis}"))?;
    tracing::info!(group, axis = %axis, curves = curves.len(), "efficiency computed");

    let value = serde_json::json!({
        "group": group,
        "axis": axis,
        "rebin": rebin,
        "curves": curves,
    });
    crate::write_json(output, value)
}
