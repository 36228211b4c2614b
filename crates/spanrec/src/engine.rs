//! # Recommendation Engine
//!
//! The interface an orchestrator drives: train a recommender on a corpus,
//! let it annotate a document, or estimate how well it would do.

use std::fmt;

use serde::{Deserialize, Serialize};
use spanrec_core::{
    DataSplitter, Document, RecommenderContext, RecommenderTraits, Result, SpanMetrics,
};

/// Result of an evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EvaluationOutcome {
    /// Too few samples on one side of the split; nothing was trained.
    Skipped {
        /// Samples assigned to training
        train: usize,
        /// Samples assigned to testing
        test: usize,
    },
    /// A model was trained and scored on the test samples.
    Scored(SpanMetrics),
}

impl EvaluationOutcome {
    /// The F-measure, or `0.0` when evaluation was skipped.
    pub fn score(&self) -> f64 {
        match self {
            Self::Skipped { .. } => 0.0,
            Self::Scored(metrics) => metrics.f_measure(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn metrics(&self) -> Option<&SpanMetrics> {
        match self {
            Self::Skipped { .. } => None,
            Self::Scored(metrics) => Some(metrics),
        }
    }
}

impl fmt::Display for EvaluationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { train, test } => {
                write!(f, "skipped (train: {train}, test: {test})")
            }
            Self::Scored(m) => write!(
                f,
                "P={:.4} R={:.4} F={:.4}",
                m.precision(),
                m.recall(),
                m.f_measure()
            ),
        }
    }
}

/// A recommender that can learn from curated spans and suggest new ones.
///
/// Engines hold no mutable state of their own: trained models live in the
/// [`RecommenderContext`] the caller hands in, so one engine can serve many
/// documents from many threads once training is done.
pub trait RecommendationEngine: Send + Sync {
    /// Identifier of this recommender instance; contexts are bound to it.
    fn id(&self) -> &str;

    /// Layer, feature and hyperparameters this engine was built with.
    fn traits(&self) -> &RecommenderTraits;

    /// An empty context owned by this engine.
    fn new_context(&self) -> RecommenderContext {
        RecommenderContext::new(self.id())
    }

    /// Whether `context` holds a trained model.
    fn is_ready(&self, context: &RecommenderContext) -> bool;

    /// Train on `documents` and store the model in `context`, replacing any previous one.
    fn train(&self, context: &mut RecommenderContext, documents: &[Document]) -> Result<()>;

    /// Append predicted spans to the target layer of `document`.
    ///
    /// Existing spans are left untouched; repeated calls accumulate predictions.
    fn predict(&self, context: &RecommenderContext, document: &mut Document) -> Result<()>;

    /// Split the samples of `documents`, train on one part and score on the other.
    fn evaluate_detailed(
        &self,
        context: &RecommenderContext,
        documents: &[Document],
        splitter: &mut dyn DataSplitter,
    ) -> Result<EvaluationOutcome>;

    /// F-measure in `[0, 1]`; `0.0` also when there was too little data to evaluate.
    fn evaluate(
        &self,
        context: &RecommenderContext,
        documents: &[Document],
        splitter: &mut dyn DataSplitter,
    ) -> Result<f64> {
        Ok(self.evaluate_detailed(context, documents, splitter)?.score())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_scores_zero() {
        let outcome = EvaluationOutcome::Skipped { train: 1, test: 2 };
        assert_eq!(outcome.score(), 0.0);
        assert!(outcome.is_skipped());
        assert!(outcome.metrics().is_none());
    }

    #[test]
    fn test_scored_uses_f_measure() {
        let metrics = SpanMetrics {
            true_positives: 1,
            false_positives: 1,
            false_negatives: 0,
        };
        let outcome = EvaluationOutcome::Scored(metrics);
        assert!((outcome.score() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(outcome.to_string(), "P=0.5000 R=1.0000 F=0.6667");
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(EvaluationOutcome::Skipped { train: 0, test: 3 }).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["test"], 3);
    }
}
