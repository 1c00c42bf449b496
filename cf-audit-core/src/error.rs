//! Error types for audit event queries

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving scope, fetching or decoding audit events
#[derive(Error, Debug)]
pub enum AuditError {
    /// An org, space or service instance name could not be resolved
    #[error("{kind} '{name}' not found")]
    Lookup { kind: &'static str, name: String },

    /// Nothing is targeted and no name was given on the command line
    #[error("No {kind} targeted.\n\nTarget one with:\n  cf target {flag} NAME\n\nor pass {flag} NAME to this command.")]
    NotTargeted {
        kind: &'static str,
        flag: &'static str,
    },

    /// The HTTP request never produced a response
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with an empty body
    #[error("No response received from endpoint: {url}")]
    EmptyResponse { url: String },

    /// The response body was not the expected JSON envelope
    #[error("Failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The API answered with a non-success status
    #[error("HTTP {status} from {url}: {detail}")]
    Api {
        status: u16,
        url: String,
        detail: String,
    },

    /// The cf CLI config file could not be read or is incomplete
    #[error("cf CLI session unavailable ({path}): {reason}")]
    Session { path: PathBuf, reason: String },

    /// An endpoint URL could not be assembled from the API base
    #[error("Invalid API endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

impl AuditError {
    /// Shorthand for a failed name lookup
    pub fn lookup(kind: &'static str, name: impl Into<String>) -> Self {
        AuditError::Lookup {
            kind,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
