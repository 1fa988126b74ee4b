//! Proving backend integration
//!
//! REST client for the Voice Judge proving server: audio upload, input
//! storage, witness and proof generation, proof verification, plus the
//! account endpoints (credits, model-name check, health).

pub mod client;
pub mod types;

use thiserror::Error;

pub use client::BackendClient;
pub use types::{AudioFile, Credits, Endpoint, ProveResponse, UserBalance};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {endpoint} response: {reason}")]
    Parse { endpoint: Endpoint, reason: String },

    /// The backend answered with its error envelope
    #[error("{message}")]
    Remote { endpoint: Endpoint, message: String },

    #[error("{endpoint} response is missing `{field}`")]
    MissingField {
        endpoint: Endpoint,
        field: &'static str,
    },
}

impl BackendError {
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            BackendError::Client(_) | BackendError::InvalidRequest(_) => None,
            BackendError::Transport { endpoint, .. }
            | BackendError::Status { endpoint, .. }
            | BackendError::Parse { endpoint, .. }
            | BackendError::Remote { endpoint, .. }
            | BackendError::MissingField { endpoint, .. } => Some(*endpoint),
        }
    }
}
