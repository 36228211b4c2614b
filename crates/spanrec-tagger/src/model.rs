//! Trained tagger model: feature weights, transition scores and decoding.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spanrec_core::{NameFinder, TokenSpan};

use crate::error::{Result, TaggerError};
use crate::features::sentence_features;
use crate::labels::LabelSet;
use crate::viterbi::{self, TransitionMask};

/// A linear-chain tagger over BIO tags.
///
/// Immutable once trained, so it can be shared across threads and queried concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerModel {
    labels: LabelSet,
    features: HashMap<String, usize>,
    /// `[num_features * num_tags]`, indexed `feature * num_tags + tag`
    emission: Vec<f32>,
    /// `[num_tags * num_tags]`, indexed `from * num_tags + to`
    transition: Vec<f32>,
    /// `[num_tags]`
    start: Vec<f32>,
    #[serde(skip)]
    mask: Option<TransitionMask>,
}

impl TaggerModel {
    pub(crate) fn from_parts(
        labels: LabelSet,
        features: HashMap<String, usize>,
        emission: Vec<f32>,
        transition: Vec<f32>,
        start: Vec<f32>,
    ) -> Result<Self> {
        let mut model = Self {
            labels,
            features,
            emission,
            transition,
            start,
            mask: None,
        };
        model.check()?;
        model.mask = Some(TransitionMask::new(&model.labels));
        Ok(model)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Tag sequence for `tokens`, one tag index per token.
    pub fn tag(&self, tokens: &[&str]) -> Result<Vec<usize>> {
        let (emissions, _) = self.score(tokens)?;
        let mask = self.mask()?;
        viterbi::decode(&emissions, &self.start, &self.transition, &mask)
    }

    /// Labeled spans over `tokens`, end-exclusive, ordered by start.
    ///
    /// Each span's confidence is the mean, over its tokens, of the softmax
    /// probability of the decoded tag given the decoded predecessor.
    pub fn find_spans(&self, tokens: &[&str]) -> Result<Vec<TokenSpan>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let (emissions, num_tags) = self.score(tokens)?;
        let mask = self.mask()?;
        let path = viterbi::decode(&emissions, &self.start, &self.transition, &mask)?;

        let token_probs: Vec<f64> = path
            .iter()
            .enumerate()
            .map(|(pos, &tag)| {
                let logits = (0..num_tags).map(|t| {
                    let (allowed, base) = if pos == 0 {
                        (mask.allows_start(t), self.start[t])
                    } else {
                        let prev = path[pos - 1];
                        (mask.allows(prev, t), self.transition[prev * num_tags + t])
                    };
                    allowed.then(|| f64::from(base + emissions[pos][t]))
                });
                softmax_at(logits, tag)
            })
            .collect();

        let spans = self
            .labels
            .decode(&path)
            .into_iter()
            .filter_map(|(start, end, k)| {
                let label = self.labels.label(k)?;
                let confidence = token_probs[start..end].iter().sum::<f64>() / (end - start) as f64;
                Some(TokenSpan::new(start, end, label, confidence))
            })
            .collect();

        Ok(spans)
    }

    /// Write the model as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a model written by [`TaggerModel::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: Self = serde_json::from_str(&content)?;
        Self::from_parts(raw.labels, raw.features, raw.emission, raw.transition, raw.start)
    }

    /// Emission scores for every token and tag; unknown features contribute nothing.
    fn score(&self, tokens: &[&str]) -> Result<(Vec<Vec<f32>>, usize)> {
        let num_tags = self.labels.num_tags();
        let emissions = sentence_features(tokens)
            .iter()
            .map(|feats| {
                let mut row = vec![0.0f32; num_tags];
                for id in feats.iter().filter_map(|f| self.features.get(f)) {
                    let weights = &self.emission[id * num_tags..(id + 1) * num_tags];
                    for (score, w) in row.iter_mut().zip(weights) {
                        *score += w;
                    }
                }
                row
            })
            .collect();
        Ok((emissions, num_tags))
    }

    fn mask(&self) -> Result<std::borrow::Cow<'_, TransitionMask>> {
        Ok(match &self.mask {
            Some(mask) => std::borrow::Cow::Borrowed(mask),
            None => {
                self.check()?;
                std::borrow::Cow::Owned(TransitionMask::new(&self.labels))
            }
        })
    }

    fn check(&self) -> Result<()> {
        let num_tags = self.labels.num_tags();
        if self.emission.len() != self.features.len() * num_tags {
            return Err(TaggerError::CorruptModel(format!(
                "{} emission weights for {} features and {} tags",
                self.emission.len(),
                self.features.len(),
                num_tags
            )));
        }
        if self.transition.len() != num_tags * num_tags || self.start.len() != num_tags {
            return Err(TaggerError::CorruptModel(format!(
                "transition scores do not match {num_tags} tags"
            )));
        }
        if let Some((name, id)) = self.features.iter().find(|(_, id)| **id >= self.features.len()) {
            return Err(TaggerError::CorruptModel(format!(
                "feature {name:?} has out-of-range id {id}"
            )));
        }
        Ok(())
    }
}

impl NameFinder for TaggerModel {
    type Error = TaggerError;

    fn find(&self, tokens: &[&str]) -> Result<Vec<TokenSpan>> {
        self.find_spans(tokens)
    }
}

/// Probability of entry `at` under a softmax over the allowed (`Some`) logits.
fn softmax_at(logits: impl Iterator<Item = Option<f64>>, at: usize) -> f64 {
    let logits: Vec<Option<f64>> = logits.collect();
    let max = logits
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return 0.0;
    }

    let total: f64 = logits.iter().flatten().map(|l| (l - max).exp()).sum();
    match logits.get(at).copied().flatten() {
        Some(l) => ((l - max).exp() / total).clamp(0.0, 1.0),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One label `LOC`, one feature `w=paris` voting B-LOC.
    fn tiny_model() -> TaggerModel {
        let labels = LabelSet::new(["LOC"]);
        let features = HashMap::from([("w=paris".to_string(), 0)]);
        TaggerModel::from_parts(
            labels,
            features,
            vec![-1.0, 4.0, -1.0],
            vec![0.0; 9],
            vec![0.0; 3],
        )
        .unwrap()
    }

    #[test]
    fn test_find_known_word() {
        let model = tiny_model();
        let spans = model.find_spans(&["to", "Paris", "."]).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (1, 2));
        assert_eq!(spans[0].label, "LOC");
        assert!(spans[0].confidence > 0.5 && spans[0].confidence <= 1.0);
    }

    #[test]
    fn test_find_empty_tokens() {
        assert!(tiny_model().find_spans(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_words_are_outside() {
        let spans = tiny_model().find_spans(&["nothing", "here"]).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_corrupt_dimensions_rejected() {
        let result = TaggerModel::from_parts(
            LabelSet::new(["LOC"]),
            HashMap::from([("w=x".to_string(), 0)]),
            vec![0.0; 2],
            vec![0.0; 9],
            vec![0.0; 3],
        );
        assert!(matches!(result, Err(TaggerError::CorruptModel(_))));
    }

    #[test]
    fn test_save_and_load() {
        let model = tiny_model();
        let path = std::env::temp_dir().join(format!("spanrec-model-{}.json", std::process::id()));
        model.save(&path).unwrap();
        let loaded = TaggerModel::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(
            loaded.find_spans(&["to", "Paris"]).unwrap(),
            model.find_spans(&["to", "Paris"]).unwrap()
        );
    }

    #[test]
    fn test_softmax_bounds() {
        let p = softmax_at([Some(1.0), None, Some(1.0)].into_iter(), 0);
        assert!((p - 0.5).abs() < 1e-9);
        assert_eq!(softmax_at([Some(1.0), None].into_iter(), 1), 0.0);
    }
}
