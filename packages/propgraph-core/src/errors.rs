//! Error types for propgraph-core
//!
//! Provides unified error handling across the crate. Note that a failed
//! value evaluation is *not* an error: the evaluator reports that outcome
//! as [`EvalResult::CannotEvaluate`](crate::features::value_evaluation::EvalResult)
//! instead of going through these types.

use crate::pipeline::PassId;
use thiserror::Error;

/// Main error type for propgraph operations
#[derive(Debug, Error)]
pub enum PropGraphError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A frontend failed to parse a source file
    #[error("Failed to parse {file}: {reason}")]
    Parse { file: String, reason: String },

    /// Invalid configuration (unknown frontend, bad pass setup, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A graph invariant would have been violated
    #[error("Graph error: {0}")]
    Graph(String),

    /// An analysis pass failed
    #[error("Pass {pass} failed: {reason}")]
    Pass { pass: PassId, reason: String },

    /// The translation run was cancelled cooperatively
    #[error("Translation run was cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PropGraphError {
    /// Create a parse error
    pub fn parse(file: impl Into<String>, reason: impl Into<String>) -> Self {
        PropGraphError::Parse {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        PropGraphError::Configuration(msg.into())
    }

    /// Create a graph invariant error
    pub fn graph(msg: impl Into<String>) -> Self {
        PropGraphError::Graph(msg.into())
    }

    /// Create a pass execution error
    pub fn pass(pass: PassId, reason: impl Into<String>) -> Self {
        PropGraphError::Pass {
            pass,
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        PropGraphError::Internal(msg.into())
    }
}

/// Result type alias for propgraph operations
pub type Result<T> = std::result::Result<T, PropGraphError>;
