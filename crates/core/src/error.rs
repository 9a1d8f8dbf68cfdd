use std::io;
use std::path::PathBuf;

use crate::types::Dialect;

/// Errors that can occur while extracting or assembling descriptors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt class file {path}: {reason}")]
    ClassFormat { path: PathBuf, reason: String },

    #[error("Failed to read archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    ScriptParse { path: PathBuf, reason: String },

    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    #[error("Invalid descriptor document: {0}")]
    Document(String),

    #[error("XML error: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("Cyclic inheritance detected: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    #[error("Goal declared by {implementation} has an empty name")]
    EmptyGoal { implementation: String },

    #[error("Duplicate parameter '{parameter}' in goal '{goal}'")]
    DuplicateParameter { goal: String, parameter: String },

    #[error("Invalid parameter '{parameter}' in {implementation}: {reason}")]
    InvalidParameter {
        implementation: String,
        parameter: String,
        reason: String,
    },

    #[error("Invalid @{tag} tag in {implementation}: {reason}")]
    InvalidTag {
        implementation: String,
        tag: String,
        reason: String,
    },

    #[error("Goal '{goal}' is declared by both {first} and {second}")]
    DuplicateGoal {
        goal: String,
        first: String,
        second: String,
    },

    #[error("No mojo definitions were found for plugin: {plugin}")]
    NoGoalsFound { plugin: String },

    #[error("No mojo extractor with '{0}' id.")]
    UnknownExtractor(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Pattern error: {0}")]
    PatternError(#[from] globset::Error),

    #[error("{dialect} extractor failed: {source}")]
    Backend {
        dialect: Dialect,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn class_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ClassFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn script(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ScriptParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure with the dialect that produced it
    pub fn in_backend(self, dialect: Dialect) -> Self {
        match self {
            already @ Self::Backend { .. } => already,
            other => Self::Backend {
                dialect,
                source: Box::new(other),
            },
        }
    }
}

/// Result type alias for mojo-tools operations
pub type Result<T> = std::result::Result<T, Error>;
