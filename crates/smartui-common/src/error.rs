//! Error types for the SmartUI fusion core
//!
//! Provides a unified error type and the domain-specific variants raised at
//! the ingestion boundary, inside strategy engines and inside pattern detectors.
//! Engine and detector errors never escape the fusion engine or the analyzer;
//! they are mapped to zero-confidence outcomes there.

use thiserror::Error;

/// Result type alias using SmartUiError
pub type Result<T> = std::result::Result<T, SmartUiError>;

/// Unified error type for SmartUI operations
#[derive(Debug, Error)]
pub enum SmartUiError {
    // Ingestion errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // Strategy engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // Pattern detector errors
    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Malformed interaction rejected at the ingestion boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown modality: {0}")]
    UnknownModality(String),

    #[error("Invalid duration: {0} (must be finite and >= 0)")]
    InvalidDuration(f64),

    #[error("Session {session_id} belongs to user {owner}, not {user_id}")]
    SessionOwnership {
        session_id: String,
        owner: String,
        user_id: String,
    },
}

/// Strategy engine failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{strategy} engine failed: {reason}")]
    Failed { strategy: String, reason: String },

    #[error("{strategy} engine timed out after {elapsed_ms}ms")]
    Timeout { strategy: String, elapsed_ms: u64 },

    #[error("{strategy} engine panicked")]
    Panicked { strategy: String },

    #[error("Unsupported input for {strategy} engine: {input}")]
    UnsupportedInput { strategy: String, input: String },
}

/// Pattern detector failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("{detector} detector received invalid data: {reason}")]
    InvalidData { detector: String, reason: String },

    #[error("{detector} detector failed: {reason}")]
    Failed { detector: String, reason: String },
}

impl From<serde_json::Error> for SmartUiError {
    fn from(err: serde_json::Error) -> Self {
        SmartUiError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SmartUiError {
    fn from(err: std::io::Error) -> Self {
        SmartUiError::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for SmartUiError {
    fn from(err: anyhow::Error) -> Self {
        SmartUiError::Internal(err.to_string())
    }
}
