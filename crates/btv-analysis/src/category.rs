//! Truth-flavour categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Truth category of a jet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Bottom (`|flavour| == 5`).
    B,
    /// Charm (`|flavour| == 4`).
    C,
    /// Light quarks and gluons (everything else).
    Udsg,
}

impl Category {
    /// All categories in registry order.
    pub const ALL: [Category; 3] = [Category::B, Category::C, Category::Udsg];

    /// Name used in histogram names.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::B => "b",
            Category::C => "c",
            Category::Udsg => "udsg",
        }
    }

    /// Position within [`Category::ALL`].
    pub fn index(self) -> usize {
        match self {
            Category::B => 0,
            Category::C => 1,
            Category::Udsg => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a hadron flavour code to its category. Sign is ignored.
pub fn classify(flavour: i32) -> Category {
    match flavour.unsigned_abs() {
        5 => Category::B,
        4 => Category::C,
        _ => Category::Udsg,
    }
}
