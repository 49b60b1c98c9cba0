//! Error types for assignment generation.
//!
//! Input problems are reported before any search starts. Search failures
//! are reported once the configured attempt bound is spent.

use thiserror::Error;

/// Error type for assignment generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The participant list or exclusion set is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No valid assignment was found within the attempt bound.
    #[error("No valid assignment found after {attempts} attempt(s)")]
    Unsatisfiable {
        /// Number of full passes made before giving up.
        attempts: u32,
    },

    /// The generator configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GenerationError {
    /// Short, stable name of the error variant.
    ///
    /// Safe to log: unlike the display message it never carries participant
    /// identifiers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Unsatisfiable { .. } => "unsatisfiable",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Result type alias for assignment generation.
pub type Result<T> = std::result::Result<T, GenerationError>;

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
