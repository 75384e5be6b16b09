//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Simulator error: {0}")]
    Sim(#[from] wui_sim::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GET {path} returned {got}, expected {expected}")]
    UnexpectedStatus {
        path: String,
        expected: u16,
        got: u16,
    },

    #[error("GET {path} returned content type {got:?}, expected application/json")]
    UnexpectedContentType { path: String, got: Option<String> },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),
}

pub type E2eResult<T> = Result<T, E2eError>;
