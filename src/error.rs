//! # Error Types
//!
//! This module defines error types used throughout the bluepos library.
//!
//! There are two families:
//!
//! - [`ConnectionError`] is the *status* taxonomy. It never propagates as a
//!   `Result` out of a connection operation; it is published in
//!   [`ConnectionStatus::last_error`](crate::status::ConnectionStatus) and its
//!   `Display` text is the message shown to the user.
//! - [`BlueposError`] and [`JobError`] are ordinary `Result` errors for the
//!   job builder, encoder, transports and CLI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::MAX_IMAGE_BYTES;

/// Main error type for bluepos operations
#[derive(Debug, Error)]
pub enum BlueposError {
    /// Transport-level errors (connection, I/O)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Print job rejected by the builder
    #[error("Invalid print job: {0}")]
    Job(#[from] JobError),

    /// Image decoding or rasterization error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid job description file
    #[error("Invalid job file: {0}")]
    JobSpec(#[from] serde_json::Error),

    /// An operation failed; the message is the one shown to the user
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// The manager refused an operation in its current phase
    #[error("Operation rejected: {0}")]
    Rejected(String),

    /// Invalid command line or profile configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure kinds surfaced through the connection status.
///
/// None of these are fatal: each one is recovered by a user action
/// (enable the radio, grant permission, retry).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionError {
    #[error("Enable bluetooth on device and click retry")]
    BluetoothDisabled,

    #[error("Switch on location access and click retry")]
    BluetoothPermission,

    #[error("Bluetooth is not supported on this device")]
    BluetoothNotSupported,

    #[error("No printer found")]
    PrinterNotFound,

    #[error("Could not connect to the printer")]
    ConnectionFailed,

    #[error("Error while printing")]
    PrintError,
}

/// Errors returned synchronously by the print-job builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Image bytes are empty or larger than [`MAX_IMAGE_BYTES`].
    #[error("image segment {index} has {len} bytes (expected 1..={max})", max = MAX_IMAGE_BYTES)]
    InvalidImageData { index: usize, len: usize },

    #[error("print job has no segments")]
    Empty,
}

/// Error reported by a [`PrinterTransport`](crate::transport::PrinterTransport).
///
/// `kind` is what the manager publishes; `detail` only goes to the log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct TransportError {
    pub kind: ConnectionError,
    pub detail: String,
}

impl TransportError {
    pub fn new(kind: ConnectionError, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<TransportError> for BlueposError {
    fn from(err: TransportError) -> Self {
        BlueposError::Transport(err.to_string())
    }
}
