//! # Document Model
//!
//! An ordered character buffer with three annotation indexes: sentences,
//! tokens and spans grouped by layer name. All offsets are byte offsets
//! into the text and are validated against UTF-8 character boundaries on
//! insertion, so covered text can always be sliced without panicking.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RecommenderError, Result};

/// Feature under which predicted spans carry their confidence.
pub const SCORE_FEATURE: &str = "score";

/// Label used for curated spans that carry no value for the target feature.
pub const DEFAULT_LABEL: &str = "default";

/// Stable identity of a token within one document.
///
/// Two tokens with identical offsets still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub usize);

/// A token with its character offsets and covered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Document-unique identity.
    pub id: TokenId,
    /// Start offset in the document text.
    pub begin: usize,
    /// End offset (exclusive) in the document text.
    pub end: usize,
    /// The covered text.
    pub text: String,
}

/// A sentence boundary annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sentence {
    pub begin: usize,
    pub end: usize,
}

impl Sentence {
    #[must_use]
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Whether `[begin, end)` lies inside this sentence.
    #[must_use]
    pub fn covers(&self, begin: usize, end: usize) -> bool {
        begin >= self.begin && end <= self.end
    }
}

/// A primitive feature value attached to a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl FeatureValue {
    /// Numeric view of the value, if it is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A labeled character-offset annotation on some layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureValue>,
    /// Set on spans produced by a recommender rather than curated by a user.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub predicted: bool,
}

impl Span {
    /// Creates a curated span without features.
    #[must_use]
    pub fn new(begin: usize, end: usize) -> Self {
        Self {
            begin,
            end,
            features: BTreeMap::new(),
            predicted: false,
        }
    }

    /// Creates a predicted span carrying `label` under `feature` and its confidence.
    #[must_use]
    pub fn prediction(
        begin: usize,
        end: usize,
        feature: &str,
        label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let mut span = Self::new(begin, end)
            .with_feature(feature, FeatureValue::String(label.into()))
            .with_feature(SCORE_FEATURE, FeatureValue::Number(confidence));
        span.predicted = true;
        span
    }

    /// Sets a feature value, builder style.
    #[must_use]
    pub fn with_feature(mut self, name: &str, value: impl Into<FeatureValue>) -> Self {
        self.features.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }

    /// The label stored under `feature`, rendered as a string.
    ///
    /// Spans without a value for the feature read as [`DEFAULT_LABEL`].
    #[must_use]
    pub fn label(&self, feature: &str) -> String {
        self.feature(feature)
            .map(ToString::to_string)
            .unwrap_or_else(|| DEFAULT_LABEL.to_string())
    }

    /// Confidence of a predicted span.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.feature(SCORE_FEATURE).and_then(FeatureValue::as_f64)
    }
}

/// An annotated document.
///
/// Sentences and tokens are kept sorted by `(begin, end)`. Spans within a
/// layer are kept sorted by begin ascending, then end descending, so that
/// an enclosing span comes before the spans it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DocumentData", into = "DocumentData")]
pub struct Document {
    text: String,
    sentences: Vec<Sentence>,
    tokens: Vec<Token>,
    layers: BTreeMap<String, Vec<Span>>,
    next_token_id: usize,
}

impl Document {
    /// Creates a document over `text` with empty indexes.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sentences: Vec::new(),
            tokens: Vec::new(),
            layers: BTreeMap::new(),
            next_token_id: 0,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text covered by `[begin, end)`, if those offsets are valid.
    #[must_use]
    pub fn covered_text(&self, begin: usize, end: usize) -> Option<&str> {
        self.text.get(begin..end)
    }

    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Spans of `layer` in index order. A layer never written to is empty.
    #[must_use]
    pub fn spans(&self, layer: &str) -> &[Span] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of all layers holding at least one span.
    pub fn layers(&self) -> impl Iterator<Item = &str> {
        self.layers
            .iter()
            .filter(|(_, spans)| !spans.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Adds a sentence annotation.
    pub fn add_sentence(&mut self, begin: usize, end: usize) -> Result<()> {
        self.check_offsets(begin, end)?;
        let sentence = Sentence::new(begin, end);
        let at = self.sentences.partition_point(|s| *s <= sentence);
        self.sentences.insert(at, sentence);
        Ok(())
    }

    /// Adds a token annotation and returns its identity.
    pub fn add_token(&mut self, begin: usize, end: usize) -> Result<TokenId> {
        let text = self.check_offsets(begin, end)?.to_string();
        let id = TokenId(self.next_token_id);
        self.next_token_id += 1;

        let at = self
            .tokens
            .partition_point(|t| (t.begin, t.end) <= (begin, end));
        self.tokens.insert(
            at,
            Token {
                id,
                begin,
                end,
                text,
            },
        );
        Ok(id)
    }

    /// Appends a span to `layer`, keeping the layer index ordered.
    ///
    /// Existing spans are never touched.
    pub fn add_span(&mut self, layer: &str, span: Span) -> Result<()> {
        self.check_offsets(span.begin, span.end)?;
        let spans = self.layers.entry(layer.to_string()).or_default();
        let key = (span.begin, std::cmp::Reverse(span.end));
        let at = spans.partition_point(|s| (s.begin, std::cmp::Reverse(s.end)) <= key);
        spans.insert(at, span);
        Ok(())
    }

    /// Removes all predicted spans from `layer`, returning how many were dropped.
    pub fn clear_predictions(&mut self, layer: &str) -> usize {
        match self.layers.get_mut(layer) {
            Some(spans) => {
                let before = spans.len();
                spans.retain(|s| !s.predicted);
                before - spans.len()
            }
            None => 0,
        }
    }

    /// Tokens lying inside `sentence`, in document order.
    #[must_use]
    pub fn tokens_covered(&self, sentence: &Sentence) -> &[Token] {
        let lo = self.tokens.partition_point(|t| t.begin < sentence.begin);
        let mut hi = self.tokens.partition_point(|t| t.begin < sentence.end);
        // Tokens do not overlap, so only the last candidate can cross the sentence end.
        while hi > lo && self.tokens[hi - 1].end > sentence.end {
            hi -= 1;
        }
        &self.tokens[lo..hi]
    }

    /// Spans of `layer` lying inside `sentence`, in index order.
    pub fn spans_covered<'a>(
        &'a self,
        layer: &str,
        sentence: &'a Sentence,
    ) -> impl Iterator<Item = &'a Span> + 'a {
        self.spans(layer)
            .iter()
            .filter(move |s| sentence.covers(s.begin, s.end))
    }

    fn check_offsets(&self, begin: usize, end: usize) -> Result<&str> {
        if begin > end {
            return Err(RecommenderError::InvalidDocument(format!(
                "begin {begin} is after end {end}"
            )));
        }
        self.text.get(begin..end).ok_or_else(|| {
            RecommenderError::InvalidDocument(format!(
                "offsets [{begin}, {end}) are outside the text or split a character (text length {})",
                self.text.len()
            ))
        })
    }
}

/// Token offsets as stored on disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct TokenOffsets {
    begin: usize,
    end: usize,
}

/// Serialized form of a [`Document`]; validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentData {
    text: String,
    #[serde(default)]
    sentences: Vec<Sentence>,
    #[serde(default)]
    tokens: Vec<TokenOffsets>,
    #[serde(default)]
    layers: BTreeMap<String, Vec<Span>>,
}

impl TryFrom<DocumentData> for Document {
    type Error = RecommenderError;

    fn try_from(data: DocumentData) -> Result<Self> {
        let mut doc = Document::new(data.text);
        for s in data.sentences {
            doc.add_sentence(s.begin, s.end)?;
        }
        for t in data.tokens {
            doc.add_token(t.begin, t.end)?;
        }
        for (layer, spans) in data.layers {
            for span in spans {
                doc.add_span(&layer, span)?;
            }
        }
        Ok(doc)
    }
}

impl From<Document> for DocumentData {
    fn from(doc: Document) -> Self {
        Self {
            text: doc.text,
            sentences: doc.sentences,
            tokens: doc
                .tokens
                .iter()
                .map(|t| TokenOffsets {
                    begin: t.begin,
                    end: t.end,
                })
                .collect(),
            layers: doc.layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Document {
        // "Ana met Bo. Bo left."
        let mut doc = Document::new("Ana met Bo. Bo left.");
        doc.add_sentence(0, 11).unwrap();
        doc.add_sentence(12, 20).unwrap();
        for (b, e) in [(0, 3), (4, 7), (8, 10), (10, 11), (12, 14), (15, 19), (19, 20)] {
            doc.add_token(b, e).unwrap();
        }
        doc
    }

    #[test]
    fn test_tokens_covered_by_sentence() {
        let doc = sample_doc();
        let first = doc.sentences()[0];
        let texts: Vec<_> = doc
            .tokens_covered(&first)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Ana", "met", "Bo", "."]);

        let second = doc.sentences()[1];
        let texts: Vec<_> = doc
            .tokens_covered(&second)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Bo", "left", "."]);
    }

    #[test]
    fn test_token_ids_distinct_for_equal_offsets() {
        let mut doc = Document::new("abc");
        let a = doc.add_token(0, 3).unwrap();
        let b = doc.add_token(0, 3).unwrap();
        assert_ne!(a, b);
        assert_eq!(doc.tokens().len(), 2);
    }

    #[test]
    fn test_span_order_enclosing_first() {
        let mut doc = sample_doc();
        doc.add_span("ne", Span::new(8, 10)).unwrap();
        doc.add_span("ne", Span::new(0, 3)).unwrap();
        doc.add_span("ne", Span::new(0, 7)).unwrap();
        let offsets: Vec<_> = doc.spans("ne").iter().map(|s| (s.begin, s.end)).collect();
        assert_eq!(offsets, vec![(0, 7), (0, 3), (8, 10)]);
    }

    #[test]
    fn test_spans_covered_filters_by_sentence() {
        let mut doc = sample_doc();
        doc.add_span("ne", Span::new(0, 3)).unwrap();
        doc.add_span("ne", Span::new(12, 14)).unwrap();
        let second = doc.sentences()[1];
        let covered: Vec<_> = doc.spans_covered("ne", &second).collect();
        assert_eq!(covered.len(), 1);
        assert_eq!(covered[0].begin, 12);
    }

    #[test]
    fn test_missing_layer_is_empty() {
        let doc = sample_doc();
        assert!(doc.spans("nothing").is_empty());
    }

    #[test]
    fn test_invalid_offsets_rejected() {
        let mut doc = Document::new("héllo");
        assert!(doc.add_token(0, 2).is_err()); // splits 'é'
        assert!(doc.add_token(3, 1).is_err());
        assert!(doc.add_token(0, 99).is_err());
        assert!(doc.add_token(0, 3).is_ok());
    }

    #[test]
    fn test_clear_predictions_keeps_curated() {
        let mut doc = sample_doc();
        doc.add_span("ne", Span::new(0, 3).with_feature("value", "PER"))
            .unwrap();
        doc.add_span("ne", Span::prediction(8, 10, "value", "PER", 0.7))
            .unwrap();
        assert_eq!(doc.clear_predictions("ne"), 1);
        assert_eq!(doc.spans("ne").len(), 1);
        assert!(!doc.spans("ne")[0].predicted);
    }

    #[test]
    fn test_label_defaults_when_feature_missing() {
        let span = Span::new(0, 3);
        assert_eq!(span.label("value"), DEFAULT_LABEL);
        let span = span.with_feature("value", "LOC");
        assert_eq!(span.label("value"), "LOC");
    }

    #[test]
    fn test_json_roundtrip_preserves_indexes() {
        let mut doc = sample_doc();
        doc.add_span("ne", Span::new(0, 3).with_feature("value", "PER"))
            .unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text(), doc.text());
        assert_eq!(back.sentences(), doc.sentences());
        assert_eq!(back.tokens().len(), doc.tokens().len());
        assert_eq!(back.spans("ne"), doc.spans("ne"));
    }

    #[test]
    fn test_json_with_bad_offsets_rejected() {
        let json = r#"{"text":"abc","tokens":[{"begin":0,"end":9}]}"#;
        assert!(serde_json::from_str::<Document>(json).is_err());
    }
}
