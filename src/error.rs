//! # Error Types
//!
//! Custom error types for GDL90 Bridge using `thiserror`.
//!
//! The GDL-90 encoder itself never fails: out-of-range inputs are clamped.
//! These errors cover the layers around it (decoding, configuration, transport).

use thiserror::Error;

/// Main error type for GDL90 Bridge
#[derive(Debug, Error)]
pub enum Gdl90BridgeError {
    /// GDL-90 frame or payload could not be decoded
    #[error("GDL-90 protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Configuration write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Target address could not be resolved
    #[error("Invalid target address: {0}")]
    InvalidTarget(String),

    /// Datagram transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Logging could not be set up
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for GDL90 Bridge
pub type Result<T> = std::result::Result<T, Gdl90BridgeError>;
