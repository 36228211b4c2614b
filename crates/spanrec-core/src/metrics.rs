//! Span-level evaluation metrics.
//!
//! A predicted span counts as a true positive only when its start, end and
//! label all equal those of a not yet matched gold span in the same sample.

use serde::{Deserialize, Serialize};

use crate::sample::GoldSpan;

/// Accumulated exact-match counts over one or more samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanMetrics {
    /// Predicted spans matching a gold span exactly
    pub true_positives: usize,
    /// Predicted spans without a matching gold span
    pub false_positives: usize,
    /// Gold spans no prediction matched
    pub false_negatives: usize,
}

impl SpanMetrics {
    /// Counts for a single sample.
    #[must_use]
    pub fn of_sample(predicted: &[GoldSpan], gold: &[GoldSpan]) -> Self {
        let mut matched = vec![false; gold.len()];
        let mut true_positives = 0;

        for pred in predicted {
            let hit = gold
                .iter()
                .enumerate()
                .find(|(idx, g)| !matched[*idx] && *g == pred)
                .map(|(idx, _)| idx);
            if let Some(idx) = hit {
                matched[idx] = true;
                true_positives += 1;
            }
        }

        Self {
            true_positives,
            false_positives: predicted.len() - true_positives,
            false_negatives: gold.len() - true_positives,
        }
    }

    /// Adds the counts of one sample.
    pub fn add_sample(&mut self, predicted: &[GoldSpan], gold: &[GoldSpan]) {
        *self += Self::of_sample(predicted, gold);
    }

    #[must_use]
    pub fn predicted_total(&self) -> usize {
        self.true_positives + self.false_positives
    }

    #[must_use]
    pub fn gold_total(&self) -> usize {
        self.true_positives + self.false_negatives
    }

    /// TP / (TP + FP), 0 when nothing was predicted.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.predicted_total())
    }

    /// TP / (TP + FN), 0 when there was nothing to find.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.gold_total())
    }

    /// Harmonic mean of precision and recall, 0 when both are 0.
    #[must_use]
    pub fn f_measure(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl std::ops::AddAssign for SpanMetrics {
    fn add_assign(&mut self, rhs: Self) {
        self.true_positives += rhs.true_positives;
        self.false_positives += rhs.false_positives;
        self.false_negatives += rhs.false_negatives;
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
