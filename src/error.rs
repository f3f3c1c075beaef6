//! Error types for sohub

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HubError>;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("corpus load failed: {0}")]
    CorpusLoad(String),

    #[error("vector index load failed: {0}")]
    IndexLoad(String),

    /// Corpus rows and index vectors are aligned by position; any count
    /// difference means the two artifacts were not built together.
    #[error("corpus has {corpus} rows but vector index has {index} vectors")]
    IndexMismatch { corpus: usize, index: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("encoder failure: {0}")]
    Encoder(String),

    #[error("answer fetch failed: {0}")]
    AnswerFetch(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("document not found: {0}")]
    DocumentNotFound(i64),
}

impl HubError {
    /// Stable machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Database(_) => "database",
            Self::Config(_) | Self::MissingConfig(_) => "config",
            Self::CorpusLoad(_) => "corpus_load",
            Self::IndexLoad(_) => "index_load",
            Self::IndexMismatch { .. } => "index_mismatch",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InvalidInput(_) => "invalid_input",
            Self::Encoder(_) => "encoder",
            Self::AnswerFetch(_) => "answer_fetch",
            Self::Serialization(_) => "serialization",
            Self::DocumentNotFound(_) => "not_found",
        }
    }

    /// Whether the process must refuse to serve after this error.
    #[must_use]
    pub const fn is_load_fatal(&self) -> bool {
        matches!(
            self,
            Self::CorpusLoad(_) | Self::IndexLoad(_) | Self::IndexMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
