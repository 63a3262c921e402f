//! Analyzer configuration (YAML; JSON is accepted as a YAML subset).
//!
//! Keys keep the names used by the framework configuration this tool was
//! driven from. Unknown keys are ignored.

use std::collections::BTreeMap;
use std::path::Path;

use btv_core::{Error, Result};
use serde::Deserialize;

fn default_report_every() -> u64 {
    10
}

fn default_max_events() -> i64 {
    -1
}

/// Parsed analyzer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Label of the jet collection in the event stream.
    pub jets: String,
    /// Label of the pileup-summary collection.
    #[serde(rename = "puInfo")]
    pub pu_info: String,
    /// Table columns: group name -> raw names to sum.
    #[serde(rename = "bDiscriminators", default)]
    pub b_discriminators: BTreeMap<String, Vec<String>>,
    /// Raw names to resolve into histogrammed alias groups.
    #[serde(rename = "bDiscriminators_hist", default)]
    pub b_discriminators_hist: Vec<String>,
    /// Progress log cadence in events (0 disables).
    #[serde(rename = "reportEvery", default = "default_report_every")]
    pub report_every: u64,
    /// Event limit; negative means all.
    #[serde(rename = "maxEvents", default = "default_max_events")]
    pub max_events: i64,
}

impl AnalyzerConfig {
    /// Parse from YAML/JSON text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml_ng::from_str(text)
            .map_err(|e| Error::Validation(format!("invalid analyzer config: {e}")))
    }

    /// Read and parse a config file. The path is left to the caller's context.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Event limit as an option (`None` = unlimited).
    pub fn event_limit(&self) -> Option<u64> {
        u64::try_from(self.max_events).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
jets: slimmedJets
puInfo: slimmedAddPileupInfo
bDiscriminators:
  DeepFlavour:
    - "pfDeepFlavourJetTags:probb"
    - "pfDeepFlavourJetTags:probbb"
    - "pfDeepFlavourJetTags:problepb"
  CSVv2: [pfCombinedInclusiveSecondaryVertexV2BJetTags]
bDiscriminators_hist:
  - "pfDeepFlavourJetTags:probb"
  - "pfDeepFlavourJetTags:probbb"
someFrameworkOption: true
"#;

    #[test]
    fn parses_and_ignores_unknown_keys() {
        let cfg = AnalyzerConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(cfg.jets, "slimmedJets");
        assert_eq!(cfg.pu_info, "slimmedAddPileupInfo");
        let cols: Vec<_> = cfg.b_discriminators.keys().cloned().collect();
        assert_eq!(cols, ["CSVv2", "DeepFlavour"]);
        assert_eq!(cfg.b_discriminators_hist.len(), 2);
        assert_eq!(cfg.report_every, 10);
        assert_eq!(cfg.event_limit(), None);
    }

    #[test]
    fn json_is_accepted() {
        let cfg = AnalyzerConfig::from_yaml_str(
            r#"{"jets": "j", "puInfo": "p", "maxEvents": 5, "bDiscriminators_hist": ["csv"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.event_limit(), Some(5));
        assert!(cfg.b_discriminators.is_empty());
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let err = AnalyzerConfig::from_yaml_str("jets: j\n").unwrap_err();
        assert!(err.to_string().contains("puInfo"), "{err}");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("btv.yaml");
        std::fs::write(&path, YAML).unwrap();
        let cfg = AnalyzerConfig::load(&path).unwrap();
        assert_eq!(cfg.b_discriminators["DeepFlavour"].len(), 3);
    }

    #[test]
    fn load_error_is_wrapped_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "jets: [unclosed\n").unwrap();
        let msg = AnalyzerConfig::load(&path).unwrap_err().to_string();
        assert_eq!(msg.matches("Validation error").count(), 1, "{msg}");
        assert_eq!(msg.matches("invalid analyzer config").count(), 1, "{msg}");
        assert!(!msg.contains("broken.yaml"), "{msg}");
    }
}
