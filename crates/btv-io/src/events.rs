//! JSON-lines event input.
//!
//! Each non-blank line is one event:
//!
//! ```json
//! {"run": 1, "lumi": 7, "event": 1234,
//!  "jets": {"slimmedJets": [{"pt": 41.2, "eta": -0.3, "phi": 2.1,
//!                            "hadronFlavour": 5,
//!                            "bDiscriminators": {"pfDeepCSVJetTags:probb": 0.71}}]},
//!  "pileup": {"slimmedAddPileupInfo": [{"bunchCrossing": 0, "trueNumInteractions": 61.3}]}}
//! ```
//!
//! Collections are keyed by label so the same file can feed analyzers
//! configured for different jet collections. A configured label missing from
//! an event is a hard error.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use btv_core::{Error, Event, EventId, EventSource, JetObservation, PileupFrame, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawEvent {
    run: u32,
    lumi: u32,
    event: u64,
    #[serde(default)]
    jets: HashMap<String, Vec<JetObservation>>,
    #[serde(default)]
    pileup: HashMap<String, Vec<PileupFrame>>,
}

/// Streaming reader over a JSON-lines event file.
#[derive(Debug)]
pub struct JsonLinesEventSource<R> {
    reader: R,
    jets_label: String,
    pileup_label: String,
    line_no: usize,
    buf: String,
}

impl JsonLinesEventSource<BufReader<File>> {
    /// Open `path`, selecting the given jet and pileup collection labels.
    pub fn open(path: &Path, jets_label: &str, pileup_label: &str) -> Result<Self> {
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), jets = jets_label, pileup = pileup_label, "opened event stream");
        Ok(Self::new(BufReader::new(file), jets_label, pileup_label))
    }
}

impl<R: BufRead> JsonLinesEventSource<R> {
    /// Wrap any buffered reader.
    pub fn new(reader: R, jets_label: &str, pileup_label: &str) -> Self {
        Self {
            reader,
            jets_label: jets_label.to_string(),
            pileup_label: pileup_label.to_string(),
            line_no: 0,
            buf: String::new(),
        }
    }

    fn decode(&self, line: &str) -> Result<Event> {
        let mut raw: RawEvent = serde_json::from_str(line)
            .map_err(|e| Error::Validation(format!("line {}: invalid event: {e}", self.line_no)))?;
        let jets = raw.jets.remove(&self.jets_label).ok_or_else(|| {
            Error::Validation(format!(
                "line {}: jet collection '{}' not found",
                self.line_no, self.jets_label
            ))
        })?;
        let pileup = raw.pileup.remove(&self.pileup_label).ok_or_else(|| {
            Error::Validation(format!(
                "line {}: pileup collection '{}' not found",
                self.line_no, self.pileup_label
            ))
        })?;
        Ok(Event { id: EventId::new(raw.run, raw.lumi, raw.event), jets, pileup })
    }
}

impl<R: BufRead> EventSource for JsonLinesEventSource<R> {
    fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return self.decode(line).map(Some);
        }
    }
}
