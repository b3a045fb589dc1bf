//! Socket read/write helpers shared by the HTTP and WebSocket paths.
//!
//! Requests are small and bursty, so a request is read by accumulating
//! whatever arrives until the socket goes quiet. There is no framing by
//! `Content-Length`; a body that stalls for longer than [`READ_DELAY`] is
//! cut short. That trade-off only holds for this application's traffic.

use std::io::ErrorKind;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

pub const READ_CAPACITY: usize = 8000;
pub const READ_DELAY: Duration = Duration::from_millis(20);

/// Read one request's worth of bytes.
///
/// Waits for the socket to become readable, then keeps reading with a short
/// pause between reads until no more data is currently available. Returns
/// `Ok(None)` when the peer closed the connection.
pub async fn read_request(stream: &TcpStream) -> Result<Option<Vec<u8>>> {
    let mut buffer = vec![0u8; READ_CAPACITY];
    let mut filled = 0;

    loop {
        if filled == 0 {
            stream.readable().await?;
        }

        match stream.try_read(&mut buffer[filled..]) {
            Ok(0) => {
                debug!("Socket closed by peer");
                return Ok(None);
            }
            Ok(read) => {
                filled += read;
                if filled == buffer.len() {
                    warn!("Request filled the {READ_CAPACITY} byte read buffer");
                    break;
                }
                tokio::time::sleep(READ_DELAY).await;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if filled > 0 {
                    break;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    buffer.truncate(filled);
    Ok(Some(buffer))
}

/// Write every byte or fail.
///
/// Failures are logged here; callers get [`Error::Comm`] and should treat
/// the connection as unusable without logging again.
pub async fn write_all<W>(writer: &mut W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        warn!("Error writing to the socket: {e}");
        return Err(Error::Comm);
    }

    Ok(())
}
