//! Response serialization.
//!
//! Three modes: head only, small body with `Content-Length`, and streamed
//! body with `Transfer-Encoding: chunked`. Callers never pass either of
//! those two headers; this module adds them.

use std::fmt::Write as _;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use super::CRLF;
use crate::connection;
use crate::error::{Error, Result};

/// Bodies up to this size go out inline; larger ones are chunked.
pub const CHUNK_LENGTH: usize = 2048;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    SwitchingProtocols,
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl Status {
    pub fn line(&self) -> &'static str {
        match self {
            Status::SwitchingProtocols => "HTTP/1.1 101 Switching Protocols",
            Status::Ok => "HTTP/1.1 200 OK",
            Status::BadRequest => "HTTP/1.1 400 Bad Request",
            Status::NotFound => "HTTP/1.1 404 Not Found",
            Status::InternalError => "HTTP/1.1 500 Internal Error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub name: &'static str,
    pub value: String,
}

impl Header {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Header {
            name,
            value: value.into(),
        }
    }
}

fn assemble_head(status: Status, headers: &[Header], extra: Option<Header>) -> String {
    let mut head = String::with_capacity(256);
    head.push_str(status.line());
    head.push_str(CRLF);

    for header in headers.iter().chain(extra.as_ref()) {
        let _ = write!(head, "{}: {}{CRLF}", header.name, header.value);
    }

    head.push_str(CRLF);
    head
}

/// Status line and headers only, no `Content-Length`.
pub async fn write_head<W>(writer: &mut W, status: Status, headers: &[Header]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let head = assemble_head(status, headers, None);
    connection::write_all(writer, head.as_bytes()).await
}

/// Write a complete response around an in-memory body.
///
/// Empty bodies send the head alone; bodies above [`CHUNK_LENGTH`] are
/// handed to [`write_stream`].
pub async fn write_body<W>(
    writer: &mut W,
    status: Status,
    headers: &[Header],
    body: &[u8],
) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if body.is_empty() {
        return write_head(writer, status, headers).await;
    }

    if body.len() > CHUNK_LENGTH {
        return write_stream(writer, status, headers, body).await;
    }

    let head = assemble_head(
        status,
        headers,
        Some(Header::new("Content-Length", body.len().to_string())),
    );
    let mut bytes = Vec::with_capacity(head.len() + body.len());
    bytes.extend_from_slice(head.as_bytes());
    bytes.extend_from_slice(body);

    connection::write_all(writer, &bytes).await
}

/// Write a response whose body is read from `body` in chunks.
pub async fn write_stream<W, R>(
    writer: &mut W,
    status: Status,
    headers: &[Header],
    mut body: R,
) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
    R: AsyncRead + Unpin,
{
    let head = assemble_head(
        status,
        headers,
        Some(Header::new("Transfer-Encoding", "chunked")),
    );
    connection::write_all(writer, head.as_bytes()).await?;

    let mut chunk = vec![0u8; CHUNK_LENGTH];
    // hex length, two CRLFs, and the chunk itself
    let mut framed = Vec::with_capacity(CHUNK_LENGTH + 8);

    loop {
        let read = body.read(&mut chunk).await.map_err(Error::Io)?;
        if read == 0 {
            break;
        }

        framed.clear();
        framed.extend_from_slice(format!("{read:x}{CRLF}").as_bytes());
        framed.extend_from_slice(&chunk[..read]);
        framed.extend_from_slice(CRLF.as_bytes());

        connection::write_all(writer, &framed).await?;
    }

    connection::write_all(writer, format!("0{CRLF}{CRLF}").as_bytes()).await
}
