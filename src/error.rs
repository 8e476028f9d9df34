//! Error types for protocol loading, analysis and embedding.

use std::path::PathBuf;

use thiserror::Error;

/// Broad class of a [`GuardError`], used by callers that only need to know
/// whether to fix configuration, fix input, or look at the model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Input,
    Model,
}

#[derive(Debug, Error)]
pub enum GuardError {
    // === Configuration ===
    /// Protocol or checker configuration file does not exist.
    #[error("configuration file {path} not found")]
    ConfigNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    ConfigParse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document parsed but does not describe a category -> phrase list mapping.
    #[error("invalid protocol definition: {message}")]
    InvalidProtocol { message: String },

    // === Input ===
    #[error("empty input text provided")]
    EmptyInput,

    #[error("unknown protocol category: {name}")]
    UnknownCategory { name: String },

    // === Model ===
    /// Embedding backend failed to load or to encode.
    #[error("embedding model error: {message}")]
    Model { message: String },
}

impl GuardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GuardError::ConfigNotFound { .. }
            | GuardError::ConfigIo { .. }
            | GuardError::ConfigParse { .. }
            | GuardError::InvalidProtocol { .. } => ErrorKind::Config,
            GuardError::EmptyInput | GuardError::UnknownCategory { .. } => ErrorKind::Input,
            GuardError::Model { .. } => ErrorKind::Model,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GuardError::InvalidProtocol {
            message: message.into(),
        }
    }

    pub(crate) fn model(message: impl Into<String>) -> Self {
        GuardError::Model {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;

/// Read a configuration file, distinguishing a missing file from other I/O failures.
pub(crate) fn read_config_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            GuardError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            GuardError::ConfigIo {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
