//! Tagger family detection for raw discriminator names.
//!
//! Raw names have the form `<producer>:<output>`, e.g.
//! `pfDeepFlavourJetTags:problepb`. The DeepCSV and DeepFlavour taggers split
//! the b-jet probability over several outputs that must be summed before
//! histogramming; every other name is used as-is.

/// Output of a multi-class tagger that contributes to its b probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Single b hadron (`probb`), the primary output.
    ProbB,
    /// Two b hadrons (`probbb`).
    ProbBb,
    /// Leptonic b decay (`problepb`), DeepFlavour only.
    ProbLepB,
}

impl Role {
    /// Output name as it appears after the `:`.
    pub fn output(self) -> &'static str {
        match self {
            Role::ProbB => "probb",
            Role::ProbBb => "probbb",
            Role::ProbLepB => "problepb",
        }
    }

    fn parse(output: &str) -> Option<Role> {
        match output {
            "probb" => Some(Role::ProbB),
            "probbb" => Some(Role::ProbBb),
            "problepb" => Some(Role::ProbLepB),
            _ => None,
        }
    }
}

/// Producer and role of a name that belongs to a tagger family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyMember<'a> {
    /// Producer label, e.g. `pfDeepCSVJetTags`.
    pub producer: &'a str,
    /// Which b-probability output this name is.
    pub role: Role,
}

impl FamilyMember<'_> {
    /// Name of the combined group: producer followed by `ProbB`.
    pub fn canonical_tag(&self) -> String {
        format!("{}ProbB", self.producer)
    }

    /// Raw name of a sibling output of the same producer.
    pub fn sibling(&self, role: Role) -> String {
        format!("{}:{}", self.producer, role.output())
    }
}

/// Classification of one raw discriminator name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminatorKind<'a> {
    /// Used unchanged under its own name.
    Direct,
    /// DeepCSV b-probability output (`probb` or `probbb`).
    DeepCsv(FamilyMember<'a>),
    /// DeepFlavour b-probability output (`probb`, `probbb` or `problepb`).
    DeepFlavour(FamilyMember<'a>),
}

/// Classify a raw discriminator name.
///
/// The family comes from the producer (`DeepCSV` is checked before
/// `DeepFlavour`), the role from the exact output name. Outputs that are not
/// part of the family's b probability (e.g. `probc`) are [`Direct`].
///
/// [`Direct`]: DiscriminatorKind::Direct
pub fn classify_discriminator(name: &str) -> DiscriminatorKind<'_> {
    let Some((producer, output)) = name.split_once(':') else {
        return DiscriminatorKind::Direct;
    };
    let Some(role) = Role::parse(output) else {
        return DiscriminatorKind::Direct;
    };
    let member = FamilyMember { producer, role };
    if producer.contains("DeepCSV") {
        if role == Role::ProbLepB {
            return DiscriminatorKind::Direct;
        }
        return DiscriminatorKind::DeepCsv(member);
    }
    if producer.contains("DeepFlavour") {
        return DiscriminatorKind::DeepFlavour(member);
    }
    DiscriminatorKind::Direct
}
