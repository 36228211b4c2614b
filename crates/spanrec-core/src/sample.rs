//! # Sample Extraction
//!
//! Turns each sentence of each document into one [`Sample`]: the token texts
//! plus the curated target-layer spans mapped onto inclusive token indices.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::align::TokenAligner;
use crate::document::Document;
use crate::error::Result;

/// A gold span in token coordinates, end index inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoldSpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl GoldSpan {
    #[must_use]
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }
}

/// A span found by the sequence labeler, end index exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub confidence: f64,
}

impl TokenSpan {
    #[must_use]
    pub fn new(start: usize, end: usize, label: impl Into<String>, confidence: f64) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            confidence,
        }
    }

    /// The same span in the inclusive convention used by gold spans.
    ///
    /// Returns `None` for an empty span.
    #[must_use]
    pub fn to_gold(&self) -> Option<GoldSpan> {
        (self.end > self.start).then(|| GoldSpan::new(self.start, self.end - 1, self.label.clone()))
    }
}

/// One training example: a sentence's token texts and its gold spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub tokens: Vec<String>,
    pub gold_spans: Vec<GoldSpan>,
}

impl Sample {
    #[must_use]
    pub fn new(tokens: Vec<String>, gold_spans: Vec<GoldSpan>) -> Self {
        Self { tokens, gold_spans }
    }

    /// Token texts as string slices, the shape the labeler consumes.
    #[must_use]
    pub fn token_refs(&self) -> Vec<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }
}

/// Extracts samples for one target layer and label feature.
#[derive(Debug, Clone)]
pub struct SampleExtractor {
    layer: String,
    feature: String,
}

impl SampleExtractor {
    #[must_use]
    pub fn new(layer: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            feature: feature.into(),
        }
    }

    /// One sample per sentence across `documents`, in document then sentence order.
    ///
    /// Sentences without target spans still yield a sample with no gold spans.
    /// Predicted spans on the target layer are not training data and are skipped.
    ///
    /// # Errors
    /// Fails with [`crate::RecommenderError::Alignment`] on the first curated
    /// span whose offsets are not on token boundaries.
    pub fn extract(&self, documents: &[Document]) -> Result<Vec<Sample>> {
        let mut samples = Vec::new();
        for doc in documents {
            self.extract_into(doc, &mut samples)?;
        }
        debug!(
            documents = documents.len(),
            samples = samples.len(),
            layer = %self.layer,
            "extracted samples"
        );
        Ok(samples)
    }

    /// Samples of a single document.
    pub fn extract_document(&self, doc: &Document) -> Result<Vec<Sample>> {
        let mut samples = Vec::with_capacity(doc.sentences().len());
        self.extract_into(doc, &mut samples)?;
        Ok(samples)
    }

    fn extract_into(&self, doc: &Document, out: &mut Vec<Sample>) -> Result<()> {
        for sentence in doc.sentences() {
            let tokens = doc.tokens_covered(sentence);
            let aligner = TokenAligner::new(tokens);

            let gold_spans = doc
                .spans_covered(&self.layer, sentence)
                .filter(|span| !span.predicted)
                .map(|span| {
                    let (start, end) = aligner.to_token_span(span.begin, span.end)?;
                    Ok(GoldSpan::new(start, end, span.label(&self.feature)))
                })
                .collect::<Result<Vec<_>>>()?;

            out.push(Sample::new(
                tokens.iter().map(|t| t.text.clone()).collect(),
                gold_spans,
            ));
        }
        Ok(())
    }
}
