use thiserror::Error;

use crate::http::ParseError;
use crate::websocket::FrameError;

/// Failures while driving a single connection.
///
/// None of these ever reach another client: the affected connection is
/// abandoned and, for admitted voters, dropped from the session.
#[derive(Debug, Error)]
pub enum Error {
    /// The socket failed mid-write. Already logged where it was detected.
    #[error("communication failure")]
    Comm,
    #[error("connection closed by peer")]
    Closed,
    #[error("timed out waiting for the peer")]
    Timeout,
    #[error("WebSocket upgrade rejected: {0}")]
    Upgrade(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
