//! Error types for the launch gate
//!
//! Every probe failure is absorbed into a `Locked` decision; these types
//! exist so the failure can be logged precisely, never so it can be shown.

use std::path::PathBuf;

use thiserror::Error;

use crate::decision::GateDecision;

/// Why a probe did not unlock the gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Malformed endpoint '{endpoint}': {reason}")]
    MalformedEndpoint { endpoint: String, reason: String },

    /// Connection, DNS, TLS, timeout, or body-read failure.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("No HTTP response received")]
    NoResponse,

    /// Any status that is neither 200 nor a redirect.
    #[error("Server responded with status {status}")]
    ServerError { status: u16 },

    #[error("Empty content with status {status}")]
    EmptyContent { status: u16 },
}

impl GateError {
    /// The decision this failure resolves to. Always `Locked`.
    pub fn decision(&self) -> GateDecision {
        GateDecision::Locked
    }

    /// Short machine-readable tag used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::MalformedEndpoint { .. } => "malformed_endpoint",
            GateError::TransportFailure(_) => "transport_failure",
            GateError::NoResponse => "no_response",
            GateError::ServerError { .. } => "server_error",
            GateError::EmptyContent { .. } => "empty_content",
        }
    }
}

/// Launch-state persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("No gate endpoint configured (set `endpoint` or DAILYWELL_GATE_ENDPOINT)")]
    MissingEndpoint,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_gate_error_locks() {
        let errors = [
            GateError::MalformedEndpoint {
                endpoint: "not a url".into(),
                reason: "relative URL without a base".into(),
            },
            GateError::TransportFailure("connection refused".into()),
            GateError::NoResponse,
            GateError::ServerError { status: 500 },
            GateError::EmptyContent { status: 200 },
        ];
        for error in errors {
            assert_eq!(error.decision(), GateDecision::Locked, "{error}");
        }
    }

    #[test]
    fn display_includes_status() {
        let msg = GateError::ServerError { status: 403 }.to_string();
        assert!(msg.contains("403"));
        assert_eq!(GateError::EmptyContent { status: 200 }.kind(), "empty_content");
    }
}
