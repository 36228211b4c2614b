//! # Data Splitters
//!
//! Strategies that assign each extracted sample to the training set, the
//! test set, or neither, for one evaluation run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RecommenderError, Result};
use crate::sample::Sample;

/// Which partition a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSet {
    Train,
    Test,
    Ignore,
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Test => write!(f, "test"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

/// Classifies samples into train/test/ignore.
///
/// A splitter may be stateful across calls within one evaluation run: the
/// evaluator announces the total first, then classifies every sample in
/// extraction order.
pub trait DataSplitter {
    /// Announce how many samples will be classified.
    fn set_total(&mut self, total: usize);

    /// Decide the target set for the next sample.
    fn target_set(&mut self, sample: &Sample) -> TargetSet;
}

/// Sends the first `train_percentage` of samples to training and the rest to testing.
///
/// The decision depends only on the running position, so the split is
/// reproducible for a fixed corpus.
#[derive(Debug, Clone)]
pub struct PercentageBasedSplitter {
    train_percentage: f64,
    total: usize,
    count: usize,
}

impl PercentageBasedSplitter {
    /// Creates a splitter putting `train_percentage` (in `(0, 1)`) of the samples into training.
    pub fn new(train_percentage: f64) -> Result<Self> {
        if !(train_percentage > 0.0 && train_percentage < 1.0) {
            return Err(RecommenderError::Config(format!(
                "train percentage must be in (0, 1), got {train_percentage}"
            )));
        }
        Ok(Self {
            train_percentage,
            total: 0,
            count: 0,
        })
    }

    #[must_use]
    pub fn train_percentage(&self) -> f64 {
        self.train_percentage
    }
}

impl DataSplitter for PercentageBasedSplitter {
    fn set_total(&mut self, total: usize) {
        self.total = total;
        self.count = 0;
    }

    fn target_set(&mut self, _sample: &Sample) -> TargetSet {
        self.count += 1;
        if self.count as f64 <= self.total as f64 * self.train_percentage {
            TargetSet::Train
        } else {
            TargetSet::Test
        }
    }
}

/// Adapts a closure over `(position, total, sample)` into a splitter.
pub struct FnSplitter<F> {
    classify: F,
    total: usize,
    position: usize,
}

impl<F> FnSplitter<F>
where
    F: FnMut(usize, usize, &Sample) -> TargetSet,
{
    pub fn new(classify: F) -> Self {
        Self {
            classify,
            total: 0,
            position: 0,
        }
    }
}

impl<F> DataSplitter for FnSplitter<F>
where
    F: FnMut(usize, usize, &Sample) -> TargetSet,
{
    fn set_total(&mut self, total: usize) {
        self.total = total;
        self.position = 0;
    }

    fn target_set(&mut self, sample: &Sample) -> TargetSet {
        let position = self.position;
        self.position += 1;
        (self.classify)(position, self.total, sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Sample {
        Sample::new(vec!["x".into()], Vec::new())
    }

    fn split_all(splitter: &mut dyn DataSplitter, n: usize) -> Vec<TargetSet> {
        splitter.set_total(n);
        (0..n).map(|_| splitter.target_set(&empty())).collect()
    }

    #[test]
    fn test_percentage_split() {
        let mut splitter = PercentageBasedSplitter::new(0.8).unwrap();
        let sets = split_all(&mut splitter, 10);
        let train = sets.iter().filter(|s| **s == TargetSet::Train).count();
        assert_eq!(train, 8);
        assert_eq!(sets[7], TargetSet::Train);
        assert_eq!(sets[8], TargetSet::Test);
    }

    #[test]
    fn test_percentage_split_resets_on_total() {
        let mut splitter = PercentageBasedSplitter::new(0.5).unwrap();
        let first = split_all(&mut splitter, 4);
        let second = split_all(&mut splitter, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(PercentageBasedSplitter::new(0.0).is_err());
        assert!(PercentageBasedSplitter::new(1.0).is_err());
        assert!(PercentageBasedSplitter::new(f64::NAN).is_err());
    }

    #[test]
    fn test_fn_splitter_sees_positions() {
        let mut splitter = FnSplitter::new(|pos, total, _: &Sample| {
            if pos + 1 == total {
                TargetSet::Ignore
            } else if pos % 2 == 0 {
                TargetSet::Train
            } else {
                TargetSet::Test
            }
        });
        let sets = split_all(&mut splitter, 4);
        assert_eq!(
            sets,
            vec![
                TargetSet::Train,
                TargetSet::Test,
                TargetSet::Train,
                TargetSet::Ignore
            ]
        );
    }
}
