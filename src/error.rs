//! Error types shared by the ingestible, digestible and façade layers.

use thiserror::Error;

/// Errors raised by explabox operations.
///
/// Every error is surfaced at the call site; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// A required ingestible (data, model, labels) is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A split name that is neither an alias nor a physical split.
    #[error("unknown split \"{name}\", choose from {choices:?}")]
    UnknownSplit { name: String, choices: Vec<String> },

    /// A method, generator or perturbation name that is not recognised.
    #[error("unknown {kind} \"{name}\", choose from {choices:?}")]
    UnknownIdentifier {
        kind: &'static str,
        name: String,
        choices: Vec<String>,
    },

    #[error("unknown key {0}")]
    UnknownKey(String),

    #[error("unknown instance identifier {0}")]
    UnknownInstance(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("unknown type of indexer: {0}")]
    InvalidFilterType(String),

    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Operation not supported for the attached model.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// No implementation registered for a recognised method.
    #[error("{0} is not available, register an implementation first")]
    Unavailable(String),

    /// Failure reported by an external model or algorithm.
    #[error("model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for explabox operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unknown_identifier<I, S>(kind: &'static str, name: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::UnknownIdentifier {
            kind,
            name: name.to_string(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_split_lists_choices() {
        let err = Error::UnknownSplit {
            name: "dev".into(),
            choices: vec!["train".into(), "test".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown split \"dev\", choose from [\"train\", \"test\"]"
        );
    }

    #[test]
    fn unknown_identifier_message() {
        let err = Error::unknown_identifier("perturbation", "uper", ["lower", "upper"]);
        assert!(err.to_string().starts_with("unknown perturbation \"uper\""));
        assert!(err.to_string().contains("\"upper\""));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
