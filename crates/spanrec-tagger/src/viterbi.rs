//! # Viterbi Decoding
//!
//! Finds the highest scoring tag sequence given per-token emission scores,
//! start scores, tag-to-tag transition scores, and the BIO constraints of a
//! label set. Forbidden transitions are never taken.

use crate::error::{Result, TaggerError};
use crate::labels::LabelSet;

/// Precomputed BIO constraints for one label set.
#[derive(Debug, Clone)]
pub struct TransitionMask {
    num_tags: usize,
    start: Vec<bool>,
    pairs: Vec<bool>,
}

impl TransitionMask {
    pub fn new(labels: &LabelSet) -> Self {
        let num_tags = labels.num_tags();
        let mut start = vec![false; num_tags];
        let mut pairs = vec![false; num_tags * num_tags];

        for to_idx in 0..num_tags {
            if let Some(to) = labels.tag(to_idx) {
                start[to_idx] = LabelSet::is_valid_start(to);
                for from_idx in 0..num_tags {
                    if let Some(from) = labels.tag(from_idx) {
                        pairs[from_idx * num_tags + to_idx] = LabelSet::is_valid_transition(from, to);
                    }
                }
            }
        }

        Self {
            num_tags,
            start,
            pairs,
        }
    }

    pub fn num_tags(&self) -> usize {
        self.num_tags
    }

    pub fn allows_start(&self, to: usize) -> bool {
        self.start[to]
    }

    pub fn allows(&self, from: usize, to: usize) -> bool {
        self.pairs[from * self.num_tags + to]
    }
}

/// Decode the optimal tag sequence.
///
/// # Arguments
/// * `emissions` - `[seq_len][num_tags]` emission scores
/// * `start` - `[num_tags]` scores for opening the sequence with each tag
/// * `transitions` - `[num_tags * num_tags]` scores, indexed `from * num_tags + to`
/// * `mask` - which starts and transitions are allowed
///
/// # Returns
/// The optimal tag sequence as indices.
pub fn decode(
    emissions: &[Vec<f32>],
    start: &[f32],
    transitions: &[f32],
    mask: &TransitionMask,
) -> Result<Vec<usize>> {
    let seq_len = emissions.len();
    if seq_len == 0 {
        return Ok(Vec::new());
    }

    let num_tags = mask.num_tags();
    if emissions.iter().any(|row| row.len() != num_tags)
        || start.len() != num_tags
        || transitions.len() != num_tags * num_tags
    {
        return Err(TaggerError::CorruptModel(format!(
            "score dimensions do not match {num_tags} tags"
        )));
    }

    // DP table
    let mut dp: Vec<Vec<f32>> = vec![vec![f32::NEG_INFINITY; num_tags]; seq_len];
    let mut backptr: Vec<Vec<usize>> = vec![vec![0; num_tags]; seq_len];

    // Initialize
    for tag in 0..num_tags {
        if mask.allows_start(tag) {
            dp[0][tag] = start[tag] + emissions[0][tag];
        }
    }

    // Forward pass with constraints
    for pos in 1..seq_len {
        for curr in 0..num_tags {
            let mut best_score = f32::NEG_INFINITY;
            let mut best_prev = LabelSet::OUTSIDE;

            for prev in 0..num_tags {
                if !mask.allows(prev, curr) || dp[pos - 1][prev] == f32::NEG_INFINITY {
                    continue;
                }

                let score = dp[pos - 1][prev] + transitions[prev * num_tags + curr];
                if score > best_score {
                    best_score = score;
                    best_prev = prev;
                }
            }

            if best_score > f32::NEG_INFINITY {
                dp[pos][curr] = best_score + emissions[pos][curr];
                backptr[pos][curr] = best_prev;
            }
        }
    }

    // Backtrack from the best reachable final tag; `O` is always reachable.
    let mut best_final = LabelSet::OUTSIDE;
    for tag in 0..num_tags {
        if dp[seq_len - 1][tag] > dp[seq_len - 1][best_final] {
            best_final = tag;
        }
    }

    let mut path = vec![best_final];
    let mut curr = best_final;
    for pos in (1..seq_len).rev() {
        curr = backptr[pos][curr];
        path.push(curr);
    }

    path.reverse();
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask() -> TransitionMask {
        // O, B-LOC, I-LOC
        TransitionMask::new(&LabelSet::new(["LOC"]))
    }

    #[test]
    fn test_viterbi_empty() {
        let mask = mask();
        let path = decode(&[], &[0.0; 3], &[0.0; 9], &mask).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_viterbi_follows_emissions() {
        let mask = mask();
        let emissions = vec![vec![0.0, 2.0, 0.0], vec![0.0, 0.0, 2.0], vec![2.0, 0.0, 0.0]];
        let path = decode(&emissions, &[0.0; 3], &[0.0; 9], &mask).unwrap();
        assert_eq!(path, vec![1, 2, 0]);
    }

    #[test]
    fn test_viterbi_never_starts_inside() {
        let mask = mask();
        let emissions = vec![vec![0.0, 0.0, 5.0]];
        let path = decode(&emissions, &[0.0; 3], &[0.0; 9], &mask).unwrap();
        assert_ne!(path[0], 2);
    }

    #[test]
    fn test_viterbi_never_inside_after_outside() {
        let mask = mask();
        // Strongly prefers O then I-LOC, which is forbidden.
        let emissions = vec![vec![5.0, 0.0, 0.0], vec![0.0, 0.0, 5.0]];
        let path = decode(&emissions, &[0.0; 3], &[0.0; 9], &mask).unwrap();
        assert!(!(path[0] == 0 && path[1] == 2));
    }

    #[test]
    fn test_viterbi_dimension_mismatch() {
        let mask = mask();
        let emissions = vec![vec![0.0, 0.0]];
        assert!(decode(&emissions, &[0.0; 3], &[0.0; 9], &mask).is_err());
    }
}
