//! Error types for the evaluation harness.

/// Harness errors at library boundaries.
///
/// Trait seams (agents, checks, LLM clients) return `anyhow::Result` so
/// implementors can attach their own context; these variants cover the
/// harness's own I/O and configuration.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Blob store read/write failure.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Cache entry could not be encoded or decoded.
    #[error("codec error for {key}: {message}")]
    Codec { key: String, message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Benchmark file could not be read or parsed.
    #[error("test file error at line {line}: {message}")]
    Loader { line: usize, message: String },

    /// External check or agent command failed.
    #[error("command `{program}` failed: {message}")]
    Command { program: String, message: String },

    /// Report or records file could not be written.
    #[error("cannot write {path}: {message}")]
    Output { path: String, message: String },

    /// Judge model returned something unusable.
    #[error("judge error: {message}")]
    Judge { message: String },
}

impl EvalError {
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::Loader { .. } => 2,
            Self::Cache { .. }
            | Self::Codec { .. }
            | Self::Output { .. }
            | Self::Command { .. }
            | Self::Judge { .. } => 3,
        }
    }
}

/// Result type for harness operations.
pub type EvalResult<T> = Result<T, EvalError>;
