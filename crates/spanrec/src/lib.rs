//! # Spanrec
//!
//! Incremental named-entity recommendations for annotation workflows. A
//! recommender learns from the spans users have curated on one layer of a
//! set of documents, then suggests new spans (with a confidence) on other
//! documents, and can estimate its own quality on a train/test split.
//!
//! ## Quick Start
//!
//! ```rust
//! use spanrec::{RecommendationEngine, RecommenderRegistry, RecommenderTraits, Segmenter, Span};
//!
//! let segmenter = Segmenter::new().unwrap();
//! let mut corpus = Vec::new();
//! for (text, city) in [("Ana lives in Vigo.", "Vigo"), ("Bruno lives in Porto.", "Porto")] {
//!     let mut doc = segmenter.segment(text).unwrap();
//!     let begin = text.find(city).unwrap();
//!     doc.add_span("NamedEntity", Span::new(begin, begin + city.len()).with_feature("value", "LOC"))
//!         .unwrap();
//!     corpus.push(doc);
//! }
//!
//! let registry = RecommenderRegistry::with_defaults();
//! let engine = registry
//!     .create("perceptron-ner", "ner", RecommenderTraits::new("NamedEntity", "value"))
//!     .unwrap();
//!
//! let mut context = engine.new_context();
//! engine.train(&mut context, &corpus).unwrap();
//!
//! let mut doc = segmenter.segment("Carla lives in Vigo.").unwrap();
//! engine.predict(&context, &mut doc).unwrap();
//! assert!(doc.spans("NamedEntity").iter().all(|s| s.predicted));
//! ```
pub mod engine;
pub mod ner;
pub mod registry;

pub use engine::{EvaluationOutcome, RecommendationEngine};
pub use ner::NerRecommender;
pub use registry::{Factory, RecommenderRegistry, PERCEPTRON_NER};

// Re-export the building blocks callers need alongside an engine
pub use spanrec_core::{
    DataSplitter, Document, FnSplitter, Key, PercentageBasedSplitter, RecommenderContext,
    RecommenderError, RecommenderTraits, Result, Sample, SampleExtractor, Segmenter, Span,
    SpanMetrics, TargetSet, TrainingParameters,
};
pub use spanrec_tagger::{PerceptronTagger, TaggerError, TaggerModel};
