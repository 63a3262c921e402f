//! # btv-core
//!
//! Shared vocabulary for FastBTV: event and jet records, the output row type,
//! the error enum, and the traits the accumulation core uses to talk to its
//! input and output collaborators.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{EventSource, TableSink};
pub use types::{Event, EventId, JetObservation, PileupFrame, TreeRecord};
