//! Per-event accumulation.
//!
//! For each event the in-time pileup is resolved once; each jet then
//! produces one table row and, if it passes the kinematic selection, three
//! histogram fills per alias group (score vs pt, eta and pileup) in the
//! jet's flavour category.

use btv_core::{Event, EventSource, JetObservation, Result, TableSink, TreeRecord};
use serde::Serialize;

use crate::alias::AliasGroupSet;
use crate::category::classify;
use crate::config::AnalyzerConfig;
use crate::pileup::PileupResolver;
use crate::registry::{HistAxis, HistogramRegistry};
use crate::sum_group::SumGroupSet;

/// Minimum jet pt (exclusive) for histogram filling.
pub const PT_MIN: f64 = 20.0;
/// Maximum jet |eta| (exclusive) for histogram filling.
pub const ABS_ETA_MAX: f64 = 2.5;

/// Kinematic selection applied before histogramming.
pub fn passes_selection(jet: &JetObservation) -> bool {
    jet.pt > PT_MIN && jet.eta.abs() < ABS_ETA_MAX
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccumulatorStats {
    /// Events processed.
    pub events: u64,
    /// Jets seen.
    pub jets: u64,
    /// Jets passing the selection.
    pub selected_jets: u64,
    /// Table rows written.
    pub rows: u64,
    /// Histogram fills.
    pub fills: u64,
}

/// Owns the resolved groups, the histograms and the pileup state of a run.
#[derive(Debug, Clone)]
pub struct EventAccumulator {
    aliases: AliasGroupSet,
    sum_groups: SumGroupSet,
    registry: HistogramRegistry,
    pileup: PileupResolver,
    stats: AccumulatorStats,
}

impl EventAccumulator {
    /// Build from already-resolved groups.
    pub fn new(aliases: AliasGroupSet, sum_groups: SumGroupSet) -> Self {
        let registry = HistogramRegistry::build(&aliases);
        Self {
            aliases,
            sum_groups,
            registry,
            pileup: PileupResolver::new(),
            stats: AccumulatorStats::default(),
        }
    }

    /// Resolve both group sets from a configuration.
    pub fn from_config(cfg: &AnalyzerConfig) -> Self {
        let aliases = AliasGroupSet::resolve(&cfg.b_discriminators_hist);
        let sum_groups = SumGroupSet::from_config(&cfg.b_discriminators);
        let acc = Self::new(aliases, sum_groups);
        tracing::info!(
            alias_groups = acc.aliases.len(),
            sum_groups = acc.sum_groups.len(),
            histograms = acc.registry.len(),
            "discriminator groups resolved"
        );
        acc
    }

    /// Alias groups (histograms).
    pub fn aliases(&self) -> &AliasGroupSet {
        &self.aliases
    }

    /// Sum groups (table columns).
    pub fn sum_groups(&self) -> &SumGroupSet {
        &self.sum_groups
    }

    /// Table column names after the fixed columns.
    pub fn column_names(&self) -> Vec<String> {
        self.sum_groups.names()
    }

    /// Histograms accumulated so far.
    pub fn registry(&self) -> &HistogramRegistry {
        &self.registry
    }

    /// Counters so far.
    pub fn stats(&self) -> AccumulatorStats {
        self.stats
    }

    /// Process one event, writing one row per jet to `sink`.
    pub fn process_event(&mut self, event: &Event, sink: &mut dyn TableSink) -> Result<()> {
        let pu = self.pileup.resolve(&event.pileup);

        for jet in &event.jets {
            let category = classify(jet.flavour);
            self.stats.jets += 1;

            if passes_selection(jet) {
                self.stats.selected_jets += 1;
                for group in self.aliases.iter() {
                    let score = group.combined_score(jet)?;
                    for (axis, x) in
                        [(HistAxis::Pt, jet.pt), (HistAxis::Eta, jet.eta), (HistAxis::Pu, pu as f64)]
                    {
                        self.registry.fill(&group.name, category, axis, x, score)?;
                        self.stats.fills += 1;
                    }
                }
            }

            let row = TreeRecord {
                run: event.id.run,
                lumi: event.id.lumi,
                evt: event.id.event,
                flavour: jet.flavour.saturating_abs(),
                jet_pt: jet.pt,
                jet_eta: jet.eta,
                jet_phi: jet.phi,
                pu,
                discriminators: self.sum_groups.evaluate(jet)?,
            };
            sink.write_row(&row)?;
            self.stats.rows += 1;
        }

        self.stats.events += 1;
        Ok(())
    }

    /// Drain `source` (up to `limit` events), then finish the sink.
    ///
    /// `report_every` controls the progress log cadence (0 = silent).
    pub fn run(
        &mut self,
        source: &mut dyn EventSource,
        sink: &mut dyn TableSink,
        limit: Option<u64>,
        report_every: u64,
    ) -> Result<AccumulatorStats> {
        while limit.is_none_or(|max| self.stats.events < max) {
            let Some(event) = source.next_event()? else {
                break;
            };
            self.process_event(&event, sink)?;
            if report_every > 0 && self.stats.events % report_every == 0 {
                tracing::info!(
                    events = self.stats.events,
                    run = event.id.run,
                    lumi = event.id.lumi,
                    event = event.id.event,
                    "processing"
                );
            }
        }
        sink.finish()?;
        Ok(self.stats)
    }

    /// Consume the accumulator, returning the histograms and final counters.
    pub fn finish(self) -> (HistogramRegistry, AccumulatorStats) {
        (self.registry, self.stats)
    }
}
