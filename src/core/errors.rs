//! Error types for schema fetching, configuration and per-operation outcomes

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::client::ClientError;

/// Failures that abort a run before any operation is planned
#[derive(Debug, Error)]
pub enum SchemaFetchError {
    #[error("HTTP error: {0}")]
    Transport(#[from] ClientError),

    #[error("GraphQL errors: {0}")]
    GraphQL(Value),

    #[error("Malformed introspection response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema fetch failed: {0}")]
    SchemaFetch(#[from] SchemaFetchError),

    #[error("Client setup failed: {0}")]
    Client(#[from] ClientError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

pub const MUTATION_SKIPPED_MESSAGE: &str = "Mutation skipped - not executed for safety";

/// Why a single operation did not succeed
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum RecordError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("GraphQL errors: {}", join_messages(.0))]
    GraphQL(Vec<Value>),

    #[error("{}", MUTATION_SKIPPED_MESSAGE)]
    MutationSkipped,
}

impl RecordError {
    /// Build a GraphQL error record from the `errors` member of a response
    pub fn from_errors(errors: &Value) -> Self {
        match errors {
            Value::Array(items) => RecordError::GraphQL(items.clone()),
            other => RecordError::GraphQL(vec![other.clone()]),
        }
    }
}

fn join_messages(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|error| {
            match error
                .as_str()
                .or_else(|| error.get("message").and_then(Value::as_str))
            {
                Some(message) => message.to_string(),
                None => error.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
