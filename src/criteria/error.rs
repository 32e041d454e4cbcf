// SPDX-License-Identifier: MIT

//! Typed error handling for recruitment-criteria
//!
//! Structural problems with a rule tree are reported once, when the tree is
//! parsed or a rules file is loaded. Evaluation itself has no error path.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CriteriaError>;

/// Top-level error type for recruitment-criteria
#[derive(Debug, Error)]
pub enum CriteriaError {
    /// A serialized rule tree is not valid JSON or does not have the
    /// group/condition shape
    #[error("Malformed rule at {path}: {message}")]
    MalformedRule { path: String, message: String },

    /// Removing a child that does not exist
    #[error("Index {index} out of range for group with {len} conditions")]
    IndexOutOfRange { index: usize, len: usize },

    /// A child-index path that does not lead to the requested node
    #[error("Invalid node path {path:?}: {reason}")]
    InvalidPath { path: Vec<usize>, reason: String },

    /// Configuration errors (bad dates, inconsistent settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Batch evaluation task failed to complete
    #[error("Job error: {0}")]
    Job(#[from] tokio::task::JoinError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl CriteriaError {
    /// Create a malformed rule error for the node at `path`
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRule {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: &[usize], reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
