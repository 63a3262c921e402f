use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use btv_analysis::{Background, RocOptions, roc_curve};
use btv_io::read_tree;

pub fn cmd_roc(
    tree: &Path,
    column: &str,
    backgrounds: &[Background],
    options: &RocOptions,
    output: Option<&PathBuf>,
) -> Result<()> {
    let table = read_tree(tree).with_context(|| format!("failed to read {}", tree.display()))?;
    tracing::debug!(rows = table.rows.len(), columns = ?table.columns, "jet table loaded");

    let mut curves = Vec::with_capacity(backgrounds.len());
    for &background in backgrounds {
        let curve = roc_curve(&table.rows, &table.columns, column, background, options)
            .with_context(|| format!("{} ROC of '{column}'", background.label()))?;
        tracing::info!(
            column,
            background = %background,
            n_signal = curve.n_signal,
            n_background = curve.n_background,
            points = curve.points.len(),
            "ROC computed"
        );
        curves.push(curve);
    }

    let value = serde_json::json!({
        "column": column,
        "selection": options.selection,
        "bootstrap": options.bootstrap,
        "seed": options.seed,
        "curves": curves,
    });
    crate::write_json(output, value)
}
