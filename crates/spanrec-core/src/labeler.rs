//! Seams for the black-box sequence labeler.
//!
//! Any statistical or neural tagger that can learn from [`Sample`]s and
//! find labeled token spans in a token sequence plugs in here.

use crate::config::TrainingParameters;
use crate::sample::{Sample, TokenSpan};

/// Learns a [`NameFinder`] from samples.
pub trait SequenceLabeler: Send + Sync {
    /// The trained artifact, cached in a recommender context and read concurrently.
    type Model: NameFinder + Send + Sync + 'static;
    /// Failure raised while training.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fit a model. Must fail rather than return a degenerate model on
    /// unusable input such as an empty sample set.
    fn train(
        &self,
        samples: &[Sample],
        parameters: &TrainingParameters,
    ) -> Result<Self::Model, Self::Error>;
}

/// A trained model that finds labeled spans in a token sequence.
pub trait NameFinder {
    /// Failure raised while decoding.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Spans over `tokens`, ordered by start and non-overlapping, with
    /// end-exclusive token indices and a confidence in `[0, 1]`.
    fn find(&self, tokens: &[&str]) -> Result<Vec<TokenSpan>, Self::Error>;
}
