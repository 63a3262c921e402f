//! Sum groups: the summed discriminator columns of the output table.
//!
//! Configured independently of the alias groups as an explicit
//! `name -> [raw names]` map and combined by plain summation, with no family
//! rules. Columns come out in lexicographic group-name order.

use std::collections::BTreeMap;

use btv_core::{Error, JetObservation, Result};
use serde::Serialize;

/// One table column: the sum of the listed raw scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumGroup {
    /// Column name.
    pub name: String,
    /// Raw discriminator names, summed in order.
    pub members: Vec<String>,
}

impl SumGroup {
    /// Summed score for `jet`. A group with no members sums to `0.0`.
    pub fn combined_score(&self, jet: &JetObservation) -> Result<f64> {
        self.members.iter().try_fold(0.0, |acc, m| {
            let v = jet.discriminator(m).ok_or_else(|| Error::MissingDiscriminator {
                name: m.clone(),
                group: self.name.clone(),
            })?;
            Ok(acc + v)
        })
    }
}

/// All configured sum groups in column order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SumGroupSet {
    groups: Vec<SumGroup>,
}

impl SumGroupSet {
    /// Build from the `bDiscriminators` mapping.
    pub fn from_config(cfg: &BTreeMap<String, Vec<String>>) -> Self {
        let groups = cfg
            .iter()
            .map(|(name, members)| SumGroup { name: name.clone(), members: members.clone() })
            .collect();
        Self { groups }
    }

    /// Column names in order.
    pub fn names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    /// Groups in column order.
    pub fn iter(&self) -> impl Iterator<Item = &SumGroup> {
        self.groups.iter()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `true` when no column is configured.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every column value for `jet`, aligned with [`SumGroupSet::names`].
    pub fn evaluate(&self, jet: &JetObservation) -> Result<Vec<f64>> {
        self.groups.iter().map(|g| g.combined_score(jet)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cfg() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            (
                "DeepFlavour".to_string(),
                vec![
                    "pfDeepFlavourJetTags:probb".to_string(),
                    "pfDeepFlavourJetTags:probbb".to_string(),
                    "pfDeepFlavourJetTags:problepb".to_string(),
                ],
            ),
            (
                "CSVv2".to_string(),
                vec!["pfCombinedInclusiveSecondaryVertexV2BJetTags".to_string()],
            ),
            ("Empty".to_string(), vec![]),
        ])
    }

    fn jet() -> JetObservation {
        JetObservation::new(50.0, 1.0, 0.0, 4)
            .with_discriminator("pfDeepFlavourJetTags:probb", 0.1)
            .with_discriminator("pfDeepFlavourJetTags:probbb", 0.2)
            .with_discriminator("pfDeepFlavourJetTags:problepb", 0.05)
            .with_discriminator("pfCombinedInclusiveSecondaryVertexV2BJetTags", 0.8)
    }

    #[test]
    fn columns_are_sorted_by_name() {
        let set = SumGroupSet::from_config(&cfg());
        assert_eq!(set.names(), ["CSVv2", "DeepFlavour", "Empty"]);
    }

    #[test]
    fn plain_sum_per_column() {
        let set = SumGroupSet::from_config(&cfg());
        let vals = set.evaluate(&jet()).unwrap();
        assert_relative_eq!(vals[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(vals[1], 0.35, epsilon = 1e-12);
        assert_eq!(vals[2], 0.0);
    }

    #[test]
    fn no_family_rules_apply() {
        // A lone secondary output is still a valid column.
        let cfg = BTreeMap::from([(
            "lepb".to_string(),
            vec!["pfDeepFlavourJetTags:problepb".to_string()],
        )]);
        let set = SumGroupSet::from_config(&cfg);
        assert_relative_eq!(set.evaluate(&jet()).unwrap()[0], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn missing_member_is_fatal() {
        let cfg = BTreeMap::from([(
            "DeepCSV".to_string(),
            vec!["pfDeepCSVJetTags:probb".to_string(), "pfDeepCSVJetTags:probbb".to_string()],
        )]);
        let set = SumGroupSet::from_config(&cfg);
        let err = set.evaluate(&jet()).unwrap_err();
        assert!(matches!(err, Error::MissingDiscriminator { ref group, .. } if group == "DeepCSV"));
    }
}
