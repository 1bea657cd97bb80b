//! Error types for the TSDB client.

use std::io;
use thiserror::Error;

/// Result type alias for TSDB client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for TSDB client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or certificate validation failure.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// The peer closed the connection before the expected number of bytes arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// The server responded with a non-zero status code on a command boundary.
    ///
    /// Surfaced to the caller without closing the session: the connection is
    /// still on a command boundary and can be reused.
    #[error("status error: {0}")]
    Status(i32),

    /// A received token, length, or framing byte did not match what the
    /// protocol expects. Fatal for the session: the connection is closed and
    /// the next operation reconnects.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A `path` given to the push queue was not `database/measurement/series`.
    #[error("invalid path {path:?}: expected database/measurement/series")]
    InvalidPath { path: String },

    /// A point count requested from the packer exceeds the server-advertised
    /// maximum for the current chunk.
    #[error("{n} points exceeds the maximum of {max} for this chunk")]
    ChunkTooLarge { n: usize, max: usize },
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether this failure should close the connection on the way out of
    /// `Client`. Status errors leave the session on a command boundary;
    /// everything else means the transport state is no longer trustworthy.
    pub fn closes_connection(&self) -> bool {
        !matches!(self, Error::Status(_))
    }
}
