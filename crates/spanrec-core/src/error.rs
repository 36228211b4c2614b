use thiserror::Error;

/// Errors surfaced by the recommendation core.
#[derive(Debug, Error)]
pub enum RecommenderError {
    /// A span's character offsets do not land on token boundaries of its sentence.
    #[error(
        "span [{begin}, {end}) is not aligned to token boundaries of sentence [{sentence_begin}, {sentence_end})"
    )]
    Alignment {
        /// Character begin of the offending span.
        begin: usize,
        /// Character end (exclusive) of the offending span.
        end: usize,
        /// Character begin of the containing sentence.
        sentence_begin: usize,
        /// Character end of the containing sentence.
        sentence_end: usize,
    },

    /// A token index range does not fit the sentence it was applied to.
    #[error("token range [{start}, {end}] is outside a sentence of {len} tokens")]
    TokenRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// A context key was read before anything was stored under it.
    #[error("no value stored under context key {key:?}")]
    MissingKey {
        /// The key name.
        key: String,
    },

    /// A context key holds a value of a different type than requested.
    #[error("context key {key:?} does not hold a value of type {expected}")]
    KeyTypeMismatch {
        /// The key name.
        key: String,
        /// The requested type name.
        expected: &'static str,
    },

    /// A context owned by one recommender was handed to another.
    #[error("context belongs to recommender {owner:?}, not {recommender:?}")]
    ForeignContext { owner: String, recommender: String },

    /// The underlying sequence labeler failed while training or predicting.
    #[error("sequence labeler failed: {0}")]
    Model(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Offsets handed to the document model are unusable.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Recommender traits or training parameters are invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No factory is registered for the requested recommender type.
    #[error("unknown recommender type: {id:?}")]
    UnknownRecommender {
        /// The requested type id.
        id: String,
    },

    /// A segmentation pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    /// Reading a configuration or model file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration or corpus file is not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecommenderError {
    /// Wraps a failure raised by the black-box labeler.
    pub fn model<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Model(Box::new(err))
    }
}

/// Result type alias for recommender operations.
pub type Result<T> = std::result::Result<T, RecommenderError>;
