//! # btv-analysis
//!
//! The b-tagging validation core: flavour classification, the two
//! discriminator grouping mechanisms, pileup resolution and per-event
//! accumulation into an eagerly built histogram registry. Efficiency and
//! ROC curves are computed from the stored histograms and jet table.
//!
//! ## Example
//!
//! ```
//! use btv_analysis::{AnalyzerConfig, EventAccumulator};
//! use btv_core::{Event, EventId, JetObservation, TreeRecord};
//!
//! let cfg = AnalyzerConfig::from_yaml_str(
//!     "jets: slimmedJets\npuInfo: slimmedAddPileupInfo\nbDiscriminators_hist: [csv]\n",
//! )
//! .unwrap();
//! let mut acc = EventAccumulator::from_config(&cfg);
//! let jet = JetObservation::new(35.0, 0.4, 1.0, 5).with_discriminator("csv", 0.9);
//! let event = Event { id: EventId::new(1, 1, 1), jets: vec![jet], pileup: vec![] };
//!
//! let mut rows: Vec<TreeRecord> = Vec::new();
//! acc.process_event(&event, &mut rows).unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(acc.stats().fills, 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod alias;
pub mod category;
pub mod config;
pub mod efficiency;
pub mod family;
pub mod pileup;
pub mod registry;
pub mod roc;
pub mod sum_group;

pub use accumulator::{AccumulatorStats, EventAccumulator, passes_selection};
pub use alias::{AliasGroup, AliasGroupSet, CombineRule};
pub use category::{Category, classify};
pub use config::AnalyzerConfig;
pub use efficiency::{EfficiencyCurve, OperatingPoint, tag_efficiency};
pub use family::{DiscriminatorKind, classify_discriminator};
pub use pileup::PileupResolver;
pub use registry::{HistAxis, HistogramRegistry, histogram_name};
pub use roc::{Background, RocBand, RocCurve, RocOptions, RocPoint, RocSelection, roc_curve};
pub use sum_group::{SumGroup, SumGroupSet};
