//! Minimal HTTP/1.1 request parsing and response writing.

pub mod request;
pub mod response;

pub use request::{Method, ParseError, Request};
pub use response::{write_body, write_head, write_stream, Header, Status, CHUNK_LENGTH};

pub const CRLF: &str = "\r\n";
