//! # Offset/Token Alignment
//!
//! Converts between character-offset spans (storage and display) and
//! token-index spans (what the sequence labeler consumes), one sentence at
//! a time. Gold spans are token-inclusive `[start, end]`; spans coming back
//! from the labeler are end-exclusive and are reconciled here through
//! [`TokenAligner::char_span_of`], never by callers.

use std::collections::HashMap;

use crate::document::{Token, TokenId};
use crate::error::{RecommenderError, Result};
use crate::sample::TokenSpan;

/// Lookup tables over the ordered tokens of one sentence.
#[derive(Debug)]
pub struct TokenAligner<'a> {
    tokens: &'a [Token],
    by_begin: HashMap<usize, TokenId>,
    by_last_char: HashMap<usize, TokenId>,
    position: HashMap<TokenId, usize>,
}

impl<'a> TokenAligner<'a> {
    /// Build the tables for `tokens`, which must be ordered by position in the sentence.
    #[must_use]
    pub fn new(tokens: &'a [Token]) -> Self {
        let mut by_begin = HashMap::with_capacity(tokens.len());
        let mut by_last_char = HashMap::with_capacity(tokens.len());
        let mut position = HashMap::with_capacity(tokens.len());

        for (idx, token) in tokens.iter().enumerate() {
            by_begin.insert(token.begin, token.id);
            if token.end > token.begin {
                by_last_char.insert(token.end - 1, token.id);
            }
            position.insert(token.id, idx);
        }

        Self {
            tokens,
            by_begin,
            by_last_char,
            position,
        }
    }

    /// Map a character span `[begin, end)` onto inclusive token indices.
    ///
    /// # Errors
    /// [`RecommenderError::Alignment`] when `begin` is not the start of a
    /// token or `end - 1` is not the last character of a token.
    pub fn to_token_span(&self, begin: usize, end: usize) -> Result<(usize, usize)> {
        let start = self.by_begin.get(&begin);
        let last = end
            .checked_sub(1)
            .filter(|_| end > begin)
            .and_then(|last_char| self.by_last_char.get(&last_char));

        match (start, last) {
            (Some(start), Some(last)) => {
                let start = self.position[start];
                let last = self.position[last];
                if start <= last {
                    Ok((start, last))
                } else {
                    Err(self.misaligned(begin, end))
                }
            }
            _ => Err(self.misaligned(begin, end)),
        }
    }

    /// Map inclusive token indices back to a character span `[begin, end)`.
    pub fn to_char_span(&self, start: usize, end_inclusive: usize) -> Result<(usize, usize)> {
        if start > end_inclusive || end_inclusive >= self.tokens.len() {
            return Err(RecommenderError::TokenRange {
                start,
                end: end_inclusive,
                len: self.tokens.len(),
            });
        }
        Ok((self.tokens[start].begin, self.tokens[end_inclusive].end))
    }

    /// Character span of an end-exclusive span produced by the labeler.
    pub fn char_span_of(&self, span: &TokenSpan) -> Result<(usize, usize)> {
        match span.end.checked_sub(1) {
            Some(last) => self.to_char_span(span.start, last),
            None => Err(RecommenderError::TokenRange {
                start: span.start,
                end: span.end,
                len: self.tokens.len(),
            }),
        }
    }

    fn misaligned(&self, begin: usize, end: usize) -> RecommenderError {
        let (sentence_begin, sentence_end) = match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => (first.begin, last.end),
            _ => (0, 0),
        };
        RecommenderError::Alignment {
            begin,
            end,
            sentence_begin,
            sentence_end,
        }
    }
}

/// Convenience wrapper: character span to inclusive token indices within `tokens`.
pub fn to_token_span(tokens: &[Token], begin: usize, end: usize) -> Result<(usize, usize)> {
    TokenAligner::new(tokens).to_token_span(begin, end)
}

/// Convenience wrapper: inclusive token indices to character span within `tokens`.
pub fn to_char_span(tokens: &[Token], start: usize, end_inclusive: usize) -> Result<(usize, usize)> {
    TokenAligner::new(tokens).to_char_span(start, end_inclusive)
}
