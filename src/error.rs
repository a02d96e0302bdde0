//! # Error Types
//!
//! Custom error types for Trainer Sim using `thiserror`.

use thiserror::Error;

/// Main error type for Trainer Sim
#[derive(Debug, Error)]
pub enum TrainerSimError {
    /// A capability of the BLE host stack failed (advertise, notify, register)
    #[error("BLE host error: {0}")]
    Host(String),

    /// The host could not allocate a buffer for an outgoing notification
    #[error("Notification buffer exhausted")]
    BufferExhausted,

    /// Malformed frames or a mismatch with the registered attribute table
    #[error("GATT protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Trainer Sim
pub type Result<T> = std::result::Result<T, TrainerSimError>;
