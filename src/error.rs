use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed manifest row at line {line}: {message}")]
    ManifestFormat { line: usize, message: String },
    #[error("alignment mismatch for '{id}': {message}")]
    Alignment { id: String, message: String },
    #[error("invariant violation in {context}: {message}")]
    InvariantViolation {
        context: &'static str,
        message: String,
    },
    #[error("no examples left after filtering and bucketing")]
    EmptyDataset,
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl DataError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn manifest_format(line: usize, message: impl Into<String>) -> Self {
        Self::ManifestFormat {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn alignment(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Alignment {
            id: id.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invariant(context: &'static str, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            context,
            message: message.into(),
        }
    }

    pub(crate) fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
