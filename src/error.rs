//! # Error Types
//!
//! Custom error types for the antenna driver using `thiserror`.

use thiserror::Error;

/// Main error type for the antenna driver
#[derive(Debug, Error)]
pub enum AntsError {
    /// Requested microcontroller is neither 0 (primary) nor 1 (secondary)
    #[error("Invalid microcontroller selector {0} (must be 0 or 1)")]
    InvalidSelector(u8),

    /// Antenna index outside 1..=4
    #[error("Invalid antenna index {0} (must be 1-4)")]
    InvalidAntennaIndex(u8),

    /// Bus transaction failure, propagated as reported by the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),
}

/// Result type alias for the antenna driver
pub type Result<T> = std::result::Result<T, AntsError>;
