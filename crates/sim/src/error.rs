//! Error types for simulator control

use thiserror::Error;

/// Result type alias using the simulator Error
pub type Result<T> = std::result::Result<T, Error>;

/// Simulator control error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("QMP error: {0}")]
    Qmp(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Failed to spawn simulator: {0}")]
    Spawn(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Simulator binary not found at expected path")]
    SimulatorNotFound,

    #[error("Timed out after {seconds}s waiting for {what}")]
    Timeout { what: String, seconds: u64 },
}
