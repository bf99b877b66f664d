use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Failures that abort processing of a single input source.
///
/// Everything else the pipeline can run into (no cells, unknown cell
/// containers, cells missing their content) is reported as a
/// [`crate::converter::Diagnostic`] instead.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("failed to parse HTML from {name}: {reason}")]
    Parse { name: String, reason: String },

    #[error("failed to serialize notebook: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("none of the {count} input source(s) could be converted")]
    NoUsableSource { count: usize },
}

impl ConvertError {
    /// True for errors that only invalidate the source they came from.
    pub fn is_source_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::Read { .. } | ConvertError::InvalidUtf8 { .. } | ConvertError::Parse { .. }
        )
    }
}
