//! Common data types for FastBTV

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Event identifier as delivered by the surrounding pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Run number
    pub run: u32,
    /// Luminosity block
    pub lumi: u32,
    /// Event number within the run
    pub event: u64,
}

impl EventId {
    /// Create a new event id
    pub fn new(run: u32, lumi: u32, event: u64) -> Self {
        Self { run, lumi, event }
    }
}

/// One reconstructed jet of one event.
///
/// Kinematics and the truth flavour are computed upstream; the core only
/// reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetObservation {
    /// Transverse momentum (GeV)
    pub pt: f64,
    /// Pseudorapidity
    pub eta: f64,
    /// Azimuthal angle
    pub phi: f64,
    /// Hadron flavour code (5 = b, 4 = c, anything else = light)
    #[serde(rename = "hadronFlavour", alias = "flavour")]
    pub flavour: i32,
    /// Raw discriminator scores keyed by their full name
    /// (e.g. `pfDeepCSVJetTags:probb`).
    #[serde(rename = "bDiscriminators", default)]
    pub discriminators: HashMap<String, f64>,
}

impl JetObservation {
    /// Create a jet without any discriminator scores.
    pub fn new(pt: f64, eta: f64, phi: f64, flavour: i32) -> Self {
        Self { pt, eta, phi, flavour, discriminators: HashMap::new() }
    }

    /// Builder-style helper attaching one raw score.
    pub fn with_discriminator(mut self, name: impl Into<String>, value: f64) -> Self {
        self.discriminators.insert(name.into(), value);
        self
    }

    /// Raw score by exact name.
    pub fn discriminator(&self, name: &str) -> Option<f64> {
        self.discriminators.get(name).copied()
    }
}

/// Pileup summary for one bunch crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PileupFrame {
    /// Bunch crossing relative to the triggering one (0 = in-time).
    #[serde(rename = "bunchCrossing")]
    pub bunch_crossing: i32,
    /// Expected number of interactions for this crossing.
    #[serde(rename = "trueNumInteractions")]
    pub true_num_interactions: f32,
}

/// One event with its jet and pileup collections already selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Jets in collection order
    pub jets: Vec<JetObservation>,
    /// Pileup summaries in collection order
    pub pileup: Vec<PileupFrame>,
}

/// One output table row; emitted for every jet, selected or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRecord {
    /// Run number
    pub run: u32,
    /// Luminosity block
    pub lumi: u32,
    /// Event number
    pub evt: u64,
    /// Absolute hadron flavour
    pub flavour: i32,
    /// Jet transverse momentum
    pub jet_pt: f64,
    /// Jet pseudorapidity
    pub jet_eta: f64,
    /// Jet azimuth
    pub jet_phi: f64,
    /// In-time pileup
    pub pu: i32,
    /// Summed discriminator columns, aligned with the sink's column names.
    pub discriminators: Vec<f64>,
}
