//! # Segmentation
//!
//! Builds a [`Document`] from plain text by splitting it into word and
//! punctuation tokens and grouping the tokens into sentences at terminal
//! punctuation. Production callers normally bring their own segmentation;
//! this is what the CLI and the test corpora use.

use regex::Regex;

use crate::document::Document;
use crate::error::Result;

/// Token pattern: runs of word characters, or any single other non-space character.
const TOKEN_PATTERN: &str = r"\w+|[^\w\s]";

/// Tokens that close a sentence.
const SENTENCE_TERMINATORS: &[&str] = &[".", "!", "?"];

/// Whitespace/punctuation segmenter.
#[derive(Debug, Clone)]
pub struct Segmenter {
    token_re: Regex,
}

impl Segmenter {
    /// Create a new segmenter instance.
    pub fn new() -> Result<Self> {
        Ok(Self {
            token_re: Regex::new(TOKEN_PATTERN)?,
        })
    }

    /// Split `text` into token offsets `[begin, end)`.
    ///
    /// # Examples
    /// ```
    /// use spanrec_core::segmentation::Segmenter;
    ///
    /// let segmenter = Segmenter::new().unwrap();
    /// let tokens = segmenter.tokenize("Hello, world.");
    /// assert_eq!(tokens, vec![(0, 5), (5, 6), (7, 12), (12, 13)]);
    /// ```
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<(usize, usize)> {
        self.token_re
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    /// Segment `text` into a document with sentence and token annotations.
    ///
    /// A sentence ends after `.`, `!` or `?`; trailing tokens without a
    /// terminator form a final sentence.
    pub fn segment(&self, text: &str) -> Result<Document> {
        let mut doc = Document::new(text);
        let mut sentence_begin: Option<usize> = None;
        let mut last_end = 0;

        for (begin, end) in self.tokenize(text) {
            doc.add_token(begin, end)?;
            let start = *sentence_begin.get_or_insert(begin);
            last_end = end;

            if SENTENCE_TERMINATORS.contains(&&text[begin..end]) {
                doc.add_sentence(start, end)?;
                sentence_begin = None;
            }
        }

        if let Some(start) = sentence_begin {
            doc.add_sentence(start, last_end)?;
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_words_and_punctuation() {
        let segmenter = Segmenter::new().unwrap();
        let text = "The capital of Galicia is Santiago de Compostela.";
        let words: Vec<_> = segmenter
            .tokenize(text)
            .into_iter()
            .map(|(b, e)| &text[b..e])
            .collect();
        assert_eq!(
            words,
            vec![
                "The",
                "capital",
                "of",
                "Galicia",
                "is",
                "Santiago",
                "de",
                "Compostela",
                "."
            ]
        );
    }

    #[test]
    fn test_segment_sentences() {
        let segmenter = Segmenter::new().unwrap();
        let doc = segmenter.segment("Ana sings. Bo dances! And then").unwrap();
        let sentences: Vec<_> = doc
            .sentences()
            .iter()
            .map(|s| doc.covered_text(s.begin, s.end).unwrap())
            .collect();
        assert_eq!(sentences, vec!["Ana sings.", "Bo dances!", "And then"]);
    }

    #[test]
    fn test_segment_empty() {
        let segmenter = Segmenter::new().unwrap();
        let doc = segmenter.segment("   ").unwrap();
        assert!(doc.tokens().is_empty());
        assert!(doc.sentences().is_empty());
    }

    #[test]
    fn test_segment_multibyte() {
        let segmenter = Segmenter::new().unwrap();
        let doc = segmenter.segment("José vive en Cádiz.").unwrap();
        let texts: Vec<_> = doc.tokens().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["José", "vive", "en", "Cádiz", "."]);
    }
}
