use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::connection;
use crate::error::{Error, Result};

pub mod frame;

pub use frame::{apply_mask, Frame, FrameError, OpCode, MAX_PAYLOAD_LENGTH};

pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";
pub const SEC_WEBSOCKET_ACCEPT: &str = "Sec-WebSocket-Accept";

/// RFC 6455 magic value appended to the client key.
const ACCEPT_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Payload of the liveness ping; the pong must echo it.
pub const KEEP_ALIVE: &[u8] = b"Keep alive";

pub const PONG_TIMEOUT: Duration = Duration::from_millis(500);

/// A pong is a short masked control frame.
const PONG_BUFFER: usize = 100;

/// Compute `Sec-WebSocket-Accept` for a client's `Sec-WebSocket-Key`.
///
/// SHA-1 is mandated by the protocol here. This is not a security feature.
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(ACCEPT_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Send a PING and wait up to [`PONG_TIMEOUT`] for the matching PONG.
pub async fn check_liveness<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ping = Frame::ping(KEEP_ALIVE)?;
    connection::write_all(stream, ping.as_bytes()).await?;

    let mut buffer = [0u8; PONG_BUFFER];
    let read = match tokio::time::timeout(PONG_TIMEOUT, stream.read(&mut buffer)).await {
        Ok(Ok(0)) => return Err(Error::Closed),
        Ok(Ok(read)) => read,
        Ok(Err(e)) => {
            warn!("Error reading pong: {e}");
            return Err(Error::Comm);
        }
        Err(_) => return Err(Error::Timeout),
    };

    let pong = Frame::decode(&buffer[..read])?;
    if pong.opcode() != OpCode::Pong || pong.payload() != KEEP_ALIVE {
        debug!(
            "Unexpected ping response: {:?} {:?}",
            pong.opcode(),
            String::from_utf8_lossy(pong.payload())
        );
        return Err(Error::Upgrade("ping response did not match".to_owned()));
    }

    Ok(())
}
