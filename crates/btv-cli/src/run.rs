use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use btv_analysis::{AnalyzerConfig, EventAccumulator};
use btv_io::{JsonLinesEventSource, ParquetTableWriter, write_histograms};

pub const TREE_FILE: &str = "tree.parquet";
pub const HISTOGRAMS_FILE: &str = "histograms.json";

fn load_config(config: &Path) -> Result<AnalyzerConfig> {
    AnalyzerConfig::load(config)
        .with_context(|| format!("failed to load config {}", config.display()))
}

pub fn cmd_run(
    config: &Path,
    input: &Path,
    out_dir: &Path,
    max_events: Option<u64>,
) -> Result<()> {
    let cfg = load_config(config)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;

    let mut acc = EventAccumulator::from_config(&cfg);
    let mut source = JsonLinesEventSource::open(input, &cfg.jets, &cfg.pu_info)
        .with_context(|| format!("failed to open events {}", input.display()))?;

    let tree_path = out_dir.join(TREE_FILE);
    let mut sink = ParquetTableWriter::create(&tree_path, &acc.column_names())
        .with_context(|| format!("failed to create {}", tree_path.display()))?;

    let limit = max_events.or(cfg.event_limit());
    let stats = acc
        .run(&mut source, &mut sink, limit, cfg.report_every)
        .with_context(|| format!("processing {} failed", input.display()))?;

    let (registry, _) = acc.finish();
    let hists = registry.into_histograms();
    let hist_path: PathBuf = out_dir.join(HISTOGRAMS_FILE);
    write_histograms(&hist_path, &hists)
        .with_context(|| format!("failed to write {}", hist_path.display()))?;

    tracing::info!(
        events = stats.events,
        rows = stats.rows,
        histograms = hists.len(),
        "run complete"
    );

    let summary = serde_json::json!({
        "events": stats.events,
        "jets": stats.jets,
        "selected_jets": stats.selected_jets,
        "rows": stats.rows,
        "fills": stats.fills,
        "histograms": hists.len(),
        "tree": tree_path,
        "histograms_path": hist_path,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn cmd_groups(config: &Path, output: Option<&PathBuf>) -> Result<()> {
    let cfg = load_config(config)?;
    let acc = EventAccumulator::from_config(&cfg);
    let histograms: Vec<&str> = acc.registry().iter().map(|h| h.name()).collect();
    let value = serde_json::json!({
        "alias_groups": acc.aliases(),
        "sum_groups": acc.sum_groups(),
        "columns": acc.column_names(),
        "histograms": histograms,
    });
    crate::write_json(output, value)
}
