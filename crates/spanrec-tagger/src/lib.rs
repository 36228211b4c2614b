//! # Spanrec Tagger
//!
//! A linear-chain BIO tagger trained with the averaged perceptron. It is the
//! default [`spanrec_core::SequenceLabeler`] behind spanrec's NER recommender:
//! training consumes [`spanrec_core::Sample`]s, and the resulting
//! [`TaggerModel`] finds labeled token spans with constrained Viterbi
//! decoding, so an `I-` tag never opens a span or continues a different label.
//!
//! ## Quick Start
//!
//! ```rust
//! use spanrec_core::{GoldSpan, Sample, TrainingParameters};
//! use spanrec_tagger::PerceptronTagger;
//!
//! let samples = vec![
//!     Sample::new(
//!         vec!["Ana".into(), "visited".into(), "Vigo".into()],
//!         vec![GoldSpan::new(2, 2, "LOC")],
//!     ),
//!     Sample::new(vec!["Nothing".into(), "here".into()], vec![]),
//! ];
//!
//! let params = TrainingParameters::new().with_iterations(10);
//! let model = PerceptronTagger::new().fit(&samples, &params).unwrap();
//!
//! let spans = model.find_spans(&["Ana", "visited", "Vigo"]).unwrap();
//! assert_eq!(spans[0].label, "LOC");
//! assert_eq!((spans[0].start, spans[0].end), (2, 3));
//! ```
pub mod error;
pub mod features;
pub mod labels;
pub mod model;
pub mod trainer;
pub mod viterbi;

// Re-export primary API
pub use error::{Result, TaggerError};
pub use labels::{LabelSet, Tag};
pub use model::TaggerModel;
pub use trainer::PerceptronTagger;
