//! Alias groups: the combined scores that get histogrammed.
//!
//! Built once from the flat `bDiscriminators_hist` list. Secondary outputs of
//! the DeepCSV and DeepFlavour families never form a group of their own; they
//! are folded into the group created for the family's `probb` output, so the
//! b probability is histogrammed exactly once per tagger.

use std::collections::HashMap;

use btv_core::{Error, JetObservation, Result};
use serde::Serialize;

use crate::family::{DiscriminatorKind, Role, classify_discriminator};

/// How an alias group turns raw scores into its combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombineRule {
    /// The single member's raw score.
    Direct,
    /// DeepCSV `probb + probbb`.
    DeepcsvSum,
    /// DeepFlavour `probb + probbb + problepb`.
    DeepflavourSum,
}

/// A named combined discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasGroup {
    /// Group name, used as the histogram name prefix.
    pub name: String,
    /// Raw names summed by the rule, in order.
    pub members: Vec<String>,
    /// Combination rule.
    pub rule: CombineRule,
}

impl AliasGroup {
    /// Combined score for `jet`. Every member must be present.
    pub fn combined_score(&self, jet: &JetObservation) -> Result<f64> {
        let mut sum = 0.0;
        for m in &self.members {
            sum += jet.discriminator(m).ok_or_else(|| Error::MissingDiscriminator {
                name: m.clone(),
                group: self.name.clone(),
            })?;
        }
        Ok(sum)
    }
}

/// Outcome of resolving one raw name.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Secondary family output, absorbed by its `probb` sibling's group.
    Skip,
    /// The group this name maps to.
    Group(AliasGroup),
}

/// Resolve a single raw discriminator name.
pub fn resolve_name(name: &str) -> Resolution {
    match classify_discriminator(name) {
        DiscriminatorKind::DeepCsv(m) => match m.role {
            Role::ProbB => Resolution::Group(AliasGroup {
                name: m.canonical_tag(),
                members: vec![m.sibling(Role::ProbB), m.sibling(Role::ProbBb)],
                rule: CombineRule::DeepcsvSum,
            }),
            _ => Resolution::Skip,
        },
        DiscriminatorKind::DeepFlavour(m) => match m.role {
            Role::ProbB => Resolution::Group(AliasGroup {
                name: m.canonical_tag(),
                members: vec![
                    m.sibling(Role::ProbB),
                    m.sibling(Role::ProbBb),
                    m.sibling(Role::ProbLepB),
                ],
                rule: CombineRule::DeepflavourSum,
            }),
            _ => Resolution::Skip,
        },
        DiscriminatorKind::Direct => Resolution::Group(AliasGroup {
            name: name.to_string(),
            members: vec![name.to_string()],
            rule: CombineRule::Direct,
        }),
    }
}

/// Deduplicated alias groups in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AliasGroupSet {
    groups: Vec<AliasGroup>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl AliasGroupSet {
    /// Resolve the configured raw names. A group requested twice is kept once.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Self {
        let mut set = Self::default();
        for name in names {
            let name = name.as_ref();
            match resolve_name(name) {
                Resolution::Skip => {
                    tracing::debug!(name, "secondary tagger output folded into its family group");
                }
                Resolution::Group(g) => {
                    if !set.index.contains_key(&g.name) {
                        set.index.insert(g.name.clone(), set.groups.len());
                        set.groups.push(g);
                    }
                }
            }
        }
        set
    }

    /// Groups in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AliasGroup> {
        self.groups.iter()
    }

    /// Group by name.
    pub fn get(&self, name: &str) -> Option<&AliasGroup> {
        self.index.get(name).map(|&i| &self.groups[i])
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `true` when no group was resolved.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
