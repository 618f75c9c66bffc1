//! Core domain types

pub mod context;
pub mod decision;
pub mod insight;
pub mod interaction;
pub mod profile;

/// Free-form JSON object used for context, UI state and parameters
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
