//! Generator configuration.

use serde::{Deserialize, Serialize};

use super::error::{GenerationError, Result};

/// Default number of full randomized passes before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Search strategy used to build an assignment set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Shuffle givers and receivers, take the first allowed receiver for
    /// each giver, and restart the whole pass on any dead end.
    ///
    /// Not complete: a satisfiable input can still fail if every attempt
    /// dead-ends. The chance is negligible for groups of four or more with
    /// few couples.
    #[default]
    RandomizedRetry,
    /// Augmenting-path bipartite matching over allowed edges. Fails only
    /// when no valid assignment exists.
    Matching,
}

impl Strategy {
    /// Converts to string representation for storage and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RandomizedRetry => "randomized_retry",
            Self::Matching => "matching",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "randomized_retry" => Some(Self::RandomizedRetry),
            "matching" => Some(Self::Matching),
            _ => None,
        }
    }
}

/// Configuration for an [`AssignmentGenerator`](super::AssignmentGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Maximum number of randomized passes. Ignored by [`Strategy::Matching`].
    pub max_attempts: u32,
    /// Search strategy.
    pub strategy: Strategy,
    /// Fixed seed for reproducible shuffles. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            strategy: Strategy::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attempt bound.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the search strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Fixes the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if the JSON is malformed or
    /// the resulting configuration fails [`GeneratorConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can drive a search.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if `max_attempts` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(GenerationError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
