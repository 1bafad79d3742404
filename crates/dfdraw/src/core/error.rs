//! Core error types for diagram editing and rendering
//!
//! Every failure in the core is recoverable: callers keep the previous graph
//! and surface the message to the user.

use thiserror::Error;

/// Core error types for DFD editing, proposing and rendering
#[derive(Error, Debug)]
pub enum DfdError {
    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    #[error("Unresolved reference: flow '{flow_id}' points at missing node '{node_id}'")]
    UnresolvedReference { flow_id: String, node_id: String },

    #[error("Structure proposer failed: {message}")]
    ProposerFailure { message: String },

    #[error("Malformed proposer response: {message}")]
    MalformedProposer { message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Formatting error: {source}")]
    FormatError {
        #[from]
        source: std::fmt::Error,
    },
}

impl DfdError {
    /// Create a new precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create a new unresolved reference error
    pub fn unresolved_reference(flow_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            flow_id: flow_id.into(),
            node_id: node_id.into(),
        }
    }

    /// Create a new proposer failure
    pub fn proposer_failure(message: impl Into<String>) -> Self {
        Self::ProposerFailure {
            message: message.into(),
        }
    }

    /// Create a new malformed proposer response error
    pub fn malformed_proposer(message: impl Into<String>) -> Self {
        Self::MalformedProposer {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render_error(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }

    /// True for failures reported by (or about) the structure proposer
    pub fn is_proposer_error(&self) -> bool {
        matches!(
            self,
            Self::ProposerFailure { .. } | Self::MalformedProposer { .. }
        )
    }
}
