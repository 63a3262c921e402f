//! Error types for FastBTV

use thiserror::Error;

/// FastBTV error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (malformed configuration or input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configured discriminator is absent from a jet's score map.
    ///
    /// Signals a structural mismatch between configuration and input data;
    /// processing of the run must stop.
    #[error("missing discriminator '{name}' required by group '{group}'")]
    MissingDiscriminator {
        /// Raw discriminator name that was looked up.
        name: String,
        /// Alias group or sum group that referenced it.
        group: String,
    },

    /// A histogram was requested that the registry never allocated.
    #[error("histogram not registered: {0}")]
    UnregisteredHistogram(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_discriminator_names_group_and_member() {
        let e = Error::MissingDiscriminator {
            name: "pfDeepCSVJetTags:probbb".into(),
            group: "pfDeepCSVJetTagsProbB".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pfDeepCSVJetTags:probbb"));
        assert!(msg.contains("pfDeepCSVJetTagsProbB"));
    }
}
