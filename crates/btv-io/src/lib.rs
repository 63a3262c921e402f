//! # btv-io
//!
//! Concrete collaborators for the accumulation core:
//!
//! - [`JsonLinesEventSource`]: one JSON event per line, with jets and pileup
//!   summaries keyed by collection label.
//! - [`ParquetTableWriter`]: the per-jet table, buffered into Arrow record
//!   batches and written with Snappy compression; [`read_tree`] reads it back.
//! - [`write_histograms`] / [`read_histograms`]: versioned JSON histogram
//!   store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod events;
pub mod hist_store;
pub mod table;

pub use error::TableError;
pub use events::JsonLinesEventSource;
pub use hist_store::{HISTOGRAMS_SCHEMA_V1, read_histograms, write_histograms};
pub use table::{
    ParquetTableWriter, TREE_SCHEMA_V1, TreeTable, read_parquet_batches, read_table_schema,
    read_tree,
};
