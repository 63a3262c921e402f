//! Versioned JSON histogram store.
//!
//! ```json
//! {"schema_version": "fastbtv_histograms_v1", "histograms": [ ... ]}
//! ```
//!
//! Histograms are written in the order given (registry order for a run), and
//! each histogram lists only its non-empty cells, so the document is
//! byte-for-byte reproducible for identical inputs.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use btv_core::{Error, Result};
use btv_hist::Hist2D;
use serde::{Deserialize, Serialize};

/// Schema version tag of the histogram document.
pub const HISTOGRAMS_SCHEMA_V1: &str = "fastbtv_histograms_v1";

#[derive(Serialize)]
struct HistogramDocRef<'a> {
    schema_version: &'a str,
    histograms: &'a [Hist2D],
}

#[derive(Deserialize)]
struct HistogramDoc {
    schema_version: String,
    histograms: Vec<Hist2D>,
}

/// Write `hists` to `path`.
pub fn write_histograms(path: &Path, hists: &[Hist2D]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let doc = HistogramDocRef { schema_version: HISTOGRAMS_SCHEMA_V1, histograms: hists };
    serde_json::to_writer(&mut out, &doc)?;
    out.write_all(b"\n")?;
    out.flush()?;
    tracing::debug!(path = %path.display(), histograms = hists.len(), "histograms written");
    Ok(())
}

/// Read a histogram document written by [`write_histograms`].
pub fn read_histograms(path: &Path) -> Result<Vec<Hist2D>> {
    let reader = BufReader::new(File::open(path)?);
    let doc: HistogramDoc = serde_json::from_reader(reader)?;
    if doc.schema_version != HISTOGRAMS_SCHEMA_V1 {
        return Err(Error::Validation(format!(
            "{}: unsupported histogram schema '{}' (expected '{HISTOGRAMS_SCHEMA_V1}')",
            path.display(),
            doc.schema_version
        )));
    }
    Ok(doc.histograms)
}
