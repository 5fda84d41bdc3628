//! Session error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Backend enumeration failed; the existing catalog is left untouched.
    #[error("Device scan failed: {0}")]
    Scan(String),

    /// A send was attempted with no device selected.
    #[error("No device selected")]
    SelectionMissing,

    /// Command text was empty or whitespace-only.
    #[error("No command entered")]
    NoCommand,

    /// A command token did not parse as a hex byte.
    #[error("Invalid hex token '{token}'")]
    InvalidHex { token: String },

    /// Backend listener-start failed; the send was aborted before any write.
    #[error("Failed to start listener: {0}")]
    ListenerStart(String),

    /// Backend write/read failed.
    #[error("Command dispatch failed: {0}")]
    Dispatch(String),

    /// A dispatch is already outstanding for this controller.
    #[error("A command is already in flight")]
    DispatchBusy,

    /// The backend channel is closed.
    #[error("Backend channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
