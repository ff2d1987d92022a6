//! Types for ticker streaming

use thiserror::Error;

/// Errors that can occur during streaming
#[derive(Debug, Error)]
pub enum StreamError {
    /// HTTP/connection error (establishment or mid-stream)
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Server refused the stream
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A frame could not be decoded into an event
    #[error("Decode error: {0}")]
    Decode(String),
}

impl StreamError {
    /// Whether this error ends the stream
    ///
    /// Decode errors are local to one frame; everything else is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }
}

/// Result type for streaming operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;
