//! Collaborator seams.
//!
//! The accumulation core never touches files or framework handles. Event
//! iteration and table persistence sit behind these traits so the same core
//! runs against JSON-lines input and Parquet output in production, and
//! against in-memory vectors in tests.

use crate::Result;
use crate::types::{Event, TreeRecord};

/// Source of fully materialised events, in stream order.
pub trait EventSource {
    /// Next event, or `None` at end of stream.
    fn next_event(&mut self) -> Result<Option<Event>>;
}

impl EventSource for std::vec::IntoIter<Event> {
    fn next_event(&mut self) -> Result<Option<Event>> {
        Ok(self.next())
    }
}

/// Destination for per-jet table rows.
pub trait TableSink {
    /// Append one row.
    fn write_row(&mut self, row: &TreeRecord) -> Result<()>;

    /// Flush buffered rows and close the underlying store.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl TableSink for Vec<TreeRecord> {
    fn write_row(&mut self, row: &TreeRecord) -> Result<()> {
        self.push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventId;

    #[test]
    fn vec_source_yields_in_order_then_none() {
        let events = vec![
            Event { id: EventId::new(1, 1, 10), jets: vec![], pileup: vec![] },
            Event { id: EventId::new(1, 1, 11), jets: vec![], pileup: vec![] },
        ];
        let mut src = events.into_iter();
        assert_eq!(src.next_event().unwrap().unwrap().id.event, 10);
        assert_eq!(src.next_event().unwrap().unwrap().id.event, 11);
        assert!(src.next_event().unwrap().is_none());
    }

    #[test]
    fn vec_sink_collects_rows() {
        let mut sink: Vec<TreeRecord> = Vec::new();
        let row = TreeRecord {
            run: 1,
            lumi: 2,
            evt: 3,
            flavour: 5,
            jet_pt: 30.0,
            jet_eta: 0.5,
            jet_phi: 1.0,
            pu: 40,
            discriminators: vec![0.9],
        };
        sink.write_row(&row).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink, vec![row]);
    }
}
