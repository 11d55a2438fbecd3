//! Error types for the periscope client runtime.
//!
//! One taxonomy covers the whole call path: descriptor ingestion, name
//! lookup, argument encoding, the remote exchange itself, and stream
//! teardown. Transport internals stay opaque and are propagated unchanged.

use thiserror::Error;

/// The kind of a named definition inside a service descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Service,
    Procedure,
    Class,
    Enumeration,
    Exception,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Service => "service",
            DefinitionKind::Procedure => "procedure",
            DefinitionKind::Class => "class",
            DefinitionKind::Enumeration => "enumeration",
            DefinitionKind::Exception => "exception",
        }
    }
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the periscope client runtime.
#[derive(Debug, Error)]
pub enum RpcError {
    // Ingestion errors (fatal: no partially built service is exposed)
    #[error("Duplicate {kind} definition in service {service}: {name}")]
    DuplicateDefinition {
        service: String,
        kind: DefinitionKind,
        name: String,
    },

    // Lookup errors
    #[error("Unknown service: {name}")]
    UnknownService { name: String },

    #[error("Unknown member {member} on {owner}")]
    UnknownMember { owner: String, member: String },

    // Call construction errors
    #[error("Procedure {procedure} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        procedure: String,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to encode argument {position} of {procedure}: {message}")]
    ArgumentEncoding {
        procedure: String,
        position: usize,
        message: String,
    },

    #[error("Failed to decode result of {procedure}: {message}")]
    ValueDecoding { procedure: String, message: String },

    // Remote-side errors
    #[error("Remote error {service}.{name}: {description}")]
    Remote {
        service: String,
        name: String,
        description: String,
    },

    // Transport errors (opaque, propagated unchanged from the collaborator)
    #[error("Transport failure: {message}")]
    Transport { message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for periscope operations.
pub type Result<T> = std::result::Result<T, RpcError>;

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl RpcError {
    /// Create an `UnknownMember` error for a missing operation or property.
    pub fn unknown_member(owner: impl Into<String>, member: impl Into<String>) -> Self {
        RpcError::UnknownMember {
            owner: owner.into(),
            member: member.into(),
        }
    }

    /// Create an opaque transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        RpcError::Transport {
            message: message.into(),
        }
    }

    /// Whether this error originated on the remote side of the call.
    pub fn is_remote(&self) -> bool {
        matches!(self, RpcError::Remote { .. })
    }

    /// Whether this error was raised before anything went on the wire.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RpcError::DuplicateDefinition { .. }
                | RpcError::UnknownService { .. }
                | RpcError::UnknownMember { .. }
                | RpcError::ArityMismatch { .. }
                | RpcError::ArgumentEncoding { .. }
        )
    }
}
