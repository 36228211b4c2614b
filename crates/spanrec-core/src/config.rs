//! # Recommender Configuration
//!
//! Traits of a recommender instance: which layer and feature it learns, and
//! the hyperparameters handed to the sequence labeler. Loaded by the caller
//! (JSON file, CLI flags) and immutable once given to a recommender.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RecommenderError, Result};

/// Default number of passes over the training samples.
pub const DEFAULT_ITERATIONS: usize = 100;
/// Default minimum number of occurrences for a feature to be kept.
pub const DEFAULT_CUTOFF: usize = 1;
/// Default shuffle seed, so training is reproducible unless asked otherwise.
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// Hyperparameters for the sequence labeler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParameters {
    /// Passes over the training samples
    pub iterations: usize,
    /// Features seen fewer times than this are dropped
    pub cutoff: usize,
    /// Seed for the per-pass sample shuffle
    pub seed: u64,
    /// Stop early once the per-token error rate of a pass falls below this
    pub epsilon: f64,
}

impl Default for TrainingParameters {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            cutoff: DEFAULT_CUTOFF,
            seed: DEFAULT_SEED,
            epsilon: 0.0,
        }
    }
}

impl TrainingParameters {
    /// Create training parameters with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of training passes.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the feature frequency cutoff.
    pub fn with_cutoff(mut self, cutoff: usize) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the early-stopping error rate.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Rejects parameters the labeler cannot train with.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(RecommenderError::Config(
                "iterations must be at least 1".into(),
            ));
        }
        if !(self.epsilon >= 0.0) {
            return Err(RecommenderError::Config(format!(
                "epsilon must be non-negative, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Configuration of one recommender instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderTraits {
    /// Layer whose spans are learned and predicted
    pub layer: String,
    /// Span feature holding the label
    pub feature: String,
    #[serde(default)]
    pub parameters: TrainingParameters,
}

impl RecommenderTraits {
    pub fn new(layer: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            feature: feature.into(),
            parameters: TrainingParameters::default(),
        }
    }

    /// Replace the training parameters.
    pub fn with_parameters(mut self, parameters: TrainingParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Load traits from a JSON file and validate them.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let traits: Self = serde_json::from_str(&content)?;
        traits.validate()?;
        Ok(traits)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layer.trim().is_empty() {
            return Err(RecommenderError::Config("layer must not be empty".into()));
        }
        if self.feature.trim().is_empty() {
            return Err(RecommenderError::Config(
                "feature must not be empty".into(),
            ));
        }
        self.parameters.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainingParameters::default().validate().is_ok());
        assert!(RecommenderTraits::new("NamedEntity", "value")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TrainingParameters::new().with_iterations(0).validate().is_err());
        assert!(TrainingParameters::new().with_epsilon(-0.1).validate().is_err());
        assert!(RecommenderTraits::new("", "value").validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"layer":"NamedEntity","feature":"value","parameters":{"iterations":7}}"#;
        let traits: RecommenderTraits = serde_json::from_str(json).unwrap();
        assert_eq!(traits.parameters.iterations, 7);
        assert_eq!(traits.parameters.cutoff, DEFAULT_CUTOFF);
        assert_eq!(traits.parameters.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("spanrec-traits-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"layer":"NE","feature":"value"}"#).unwrap();
        let traits = RecommenderTraits::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(traits.layer, "NE");
        assert_eq!(traits.parameters, TrainingParameters::default());
    }
}
