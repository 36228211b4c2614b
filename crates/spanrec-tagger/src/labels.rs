//! # BIO Tags
//!
//! Defines the tag set for sequence labeling over an open label inventory.
//! Uses the BIO (Begin-Inside-Outside) tagging scheme: index 0 is `O`,
//! label `k` owns `B-k` at `1 + 2k` and `I-k` at `2 + 2k`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use spanrec_core::Sample;
use tracing::debug;

use crate::error::{Result, TaggerError};

/// A decoded BIO tag, with labels referred to by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Outside,
    Begin(usize),
    Inside(usize),
}

/// The labels a model knows, in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Index of the `O` tag.
    pub const OUTSIDE: usize = 0;

    /// Build a label set from explicit labels; duplicates are dropped, order is sorted.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self {
            labels: labels.into_iter().collect(),
        }
    }

    /// All labels occurring in the gold spans of `samples`.
    pub fn from_samples(samples: &[Sample]) -> Self {
        Self::new(
            samples
                .iter()
                .flat_map(|s| s.gold_spans.iter().map(|g| g.label.clone())),
        )
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .ok()
    }

    /// Total number of distinct tags.
    pub fn num_tags(&self) -> usize {
        1 + 2 * self.labels.len()
    }

    /// Get the tag index for weight lookups.
    pub fn index(&self, tag: Tag) -> usize {
        match tag {
            Tag::Outside => Self::OUTSIDE,
            Tag::Begin(k) => 1 + 2 * k,
            Tag::Inside(k) => 2 + 2 * k,
        }
    }

    /// Get tag from index.
    pub fn tag(&self, idx: usize) -> Option<Tag> {
        match idx {
            0 => Some(Tag::Outside),
            i if i < self.num_tags() && i % 2 == 1 => Some(Tag::Begin((i - 1) / 2)),
            i if i < self.num_tags() => Some(Tag::Inside((i - 2) / 2)),
            _ => None,
        }
    }

    /// Whether a sequence may open with `to`.
    pub fn is_valid_start(to: Tag) -> bool {
        !matches!(to, Tag::Inside(_))
    }

    /// Check if transitioning from `from` tag to `to` tag is valid.
    ///
    /// `I-k` may only continue a `B-k` or `I-k`.
    pub fn is_valid_transition(from: Tag, to: Tag) -> bool {
        match to {
            Tag::Inside(k) => matches!(from, Tag::Begin(j) | Tag::Inside(j) if j == k),
            _ => true,
        }
    }

    /// Encode a sample's gold spans as one tag index per token.
    ///
    /// BIO cannot express nesting, so a span touching a token already
    /// claimed by an earlier span is dropped. Spans arrive begin ascending
    /// with the longer span first, so the enclosing span wins.
    ///
    /// `index` is the sample's position, reported in errors.
    pub fn encode(&self, sample: &Sample, index: usize) -> Result<Vec<usize>> {
        let len = sample.tokens.len();
        let mut tags = vec![Self::OUTSIDE; len];

        for gold in &sample.gold_spans {
            if gold.start > gold.end || gold.end >= len {
                return Err(TaggerError::MalformedSample {
                    index,
                    reason: format!(
                        "span [{}, {}] does not fit {} tokens",
                        gold.start, gold.end, len
                    ),
                });
            }
            let k = self.label_index(&gold.label).ok_or_else(|| TaggerError::MalformedSample {
                index,
                reason: format!("unknown label {:?}", gold.label),
            })?;
            if tags[gold.start..=gold.end].iter().any(|&t| t != Self::OUTSIDE) {
                debug!(
                    index,
                    start = gold.start,
                    end = gold.end,
                    label = %gold.label,
                    "Dropping overlapping gold span"
                );
                continue;
            }
            tags[gold.start] = self.index(Tag::Begin(k));
            for tag in &mut tags[gold.start + 1..=gold.end] {
                *tag = self.index(Tag::Inside(k));
            }
        }

        Ok(tags)
    }

    /// Group a tag sequence into `(start, end_exclusive, label_index)` runs, ordered by start.
    ///
    /// A stray `I-k` (which constrained decoding never produces) opens a new run.
    pub fn decode(&self, tags: &[usize]) -> Vec<(usize, usize, usize)> {
        let mut runs = Vec::new();
        let mut open: Option<(usize, usize)> = None;

        for (pos, &idx) in tags.iter().enumerate() {
            let tag = self.tag(idx).unwrap_or(Tag::Outside);
            match (tag, open) {
                (Tag::Inside(k), Some((_, j))) if j == k => {}
                (Tag::Begin(k) | Tag::Inside(k), _) => {
                    if let Some((start, j)) = open.take() {
                        runs.push((start, pos, j));
                    }
                    open = Some((pos, k));
                }
                (Tag::Outside, _) => {
                    if let Some((start, j)) = open.take() {
                        runs.push((start, pos, j));
                    }
                }
            }
        }

        if let Some((start, j)) = open {
            runs.push((start, tags.len(), j));
        }
        runs
    }

    /// Render a tag index, e.g. `B-LOC`.
    pub fn tag_name(&self, idx: usize) -> String {
        match self.tag(idx) {
            Some(Tag::Outside) => "O".to_string(),
            Some(Tag::Begin(k)) => format!("B-{}", self.labels[k]),
            Some(Tag::Inside(k)) => format!("I-{}", self.labels[k]),
            None => format!("?{idx}"),
        }
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.labels.join(", "))
    }
}
