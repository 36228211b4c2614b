//! # Spanrec Core
//!
//! The shared half of the spanrec recommendation engine: the annotated
//! document model, conversion between character offsets and token indices,
//! per-sentence sample extraction, the per-recommender model cache, data
//! splitting and span-level metrics.
//!
//! ## Quick Start
//!
//! ```rust
//! use spanrec_core::{GoldSpan, SampleExtractor, Segmenter, Span};
//!
//! let mut doc = Segmenter::new()
//!     .unwrap()
//!     .segment("The capital of Galicia is Santiago de Compostela.")
//!     .unwrap();
//! doc.add_span("NamedEntity", Span::new(15, 22).with_feature("value", "LOC"))
//!     .unwrap();
//!
//! let samples = SampleExtractor::new("NamedEntity", "value")
//!     .extract(&[doc])
//!     .unwrap();
//! assert_eq!(samples[0].gold_spans, vec![GoldSpan::new(3, 3, "LOC")]);
//! ```
pub mod align;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod labeler;
pub mod metrics;
pub mod sample;
pub mod segmentation;
pub mod splitter;

// Re-export primary API
pub use align::{to_char_span, to_token_span, TokenAligner};
pub use config::{RecommenderTraits, TrainingParameters};
pub use context::{Key, RecommenderContext};
pub use document::{
    Document, FeatureValue, Sentence, Span, Token, TokenId, DEFAULT_LABEL, SCORE_FEATURE,
};
pub use error::{RecommenderError, Result};
pub use labeler::{NameFinder, SequenceLabeler};
pub use metrics::SpanMetrics;
pub use sample::{GoldSpan, Sample, SampleExtractor, TokenSpan};
pub use segmentation::Segmenter;
pub use splitter::{DataSplitter, FnSplitter, PercentageBasedSplitter, TargetSet};
