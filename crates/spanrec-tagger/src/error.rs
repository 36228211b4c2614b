use thiserror::Error;

/// Errors that can occur while training or running the tagger.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// There was nothing to learn from.
    #[error("cannot train on an empty sample set")]
    EmptyTrainingSet,

    /// A sample's gold spans do not fit its tokens.
    #[error("sample {index} is malformed: {reason}")]
    MalformedSample {
        /// Position of the sample in the training input.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// A training parameter is out of range.
    #[error("invalid training parameter: {0}")]
    InvalidParameter(String),

    /// Model dimensions do not agree with each other.
    #[error("inconsistent model: {0}")]
    CorruptModel(String),

    /// Model file could not be read or written.
    #[error("model I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model file is not valid JSON.
    #[error("model serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tagger operations.
pub type Result<T> = std::result::Result<T, TaggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = TaggerError::MalformedSample {
            index: 4,
            reason: "unknown label \"ORG\"".into(),
        };
        assert_eq!(err.to_string(), "sample 4 is malformed: unknown label \"ORG\"");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TaggerError>();
    }
}
