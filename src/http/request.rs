use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const HEAD_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("the request is empty")]
    Empty,
    #[error("could not find the end of the head")]
    MissingHeadEnd,
    #[error("invalid request start line: {0}")]
    StartLine(String),
    #[error("unknown request method: {0}")]
    UnknownMethod(String),
    #[error("invalid header: {0}")]
    Header(String),
    #[error("error decoding path step: {0}")]
    PathStep(String),
    #[error("request is not valid UTF-8 text")]
    NotUtf8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Method::Connect),
            "DELETE" => Ok(Method::Delete),
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "PATCH" => Ok(Method::Patch),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "TRACE" => Ok(Method::Trace),
            other => Err(ParseError::UnknownMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Connect => "CONNECT",
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Trace => "TRACE",
        };
        f.write_str(name)
    }
}

/// One parsed HTTP request.
///
/// The input must hold the complete request: UTF-8 text, a text body if
/// any, no trailers.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    path_steps: Vec<String>,
    version: String,
    headers: HashMap<String, String>,
    body: Option<String>,
}

impl Request {
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.is_empty() {
            return Err(ParseError::Empty);
        }

        let head_end = bytes
            .windows(HEAD_END.len())
            .position(|window| window == HEAD_END)
            .ok_or(ParseError::MissingHeadEnd)?;

        let head = std::str::from_utf8(&bytes[..head_end]).map_err(|_| ParseError::NotUtf8)?;
        let mut lines = head.split("\r\n");

        // Method Path Version
        let start_line = lines.next().unwrap_or_default();
        let pieces: Vec<&str> = start_line.split(' ').collect();
        let &[method, raw_path, version] = pieces.as_slice() else {
            return Err(ParseError::StartLine(start_line.to_owned()));
        };

        let method = method.parse()?;
        let path_steps = parse_path(raw_path)?;
        let path = format!("/{}", path_steps.join("/"));

        let mut headers = HashMap::new();
        for line in lines {
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| ParseError::Header(line.to_owned()))?;
            headers.insert(key.to_owned(), value.to_owned());
        }

        let body_bytes = &bytes[head_end + HEAD_END.len()..];
        let body = if body_bytes.is_empty() {
            None
        } else {
            Some(
                String::from_utf8(body_bytes.to_vec()).map_err(|_| ParseError::NotUtf8)?,
            )
        };

        Ok(Request {
            method,
            path,
            path_steps,
            version: version.to_owned(),
            headers,
            body,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The decoded path, steps rejoined with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The decoded, non-empty path steps.
    pub fn path_steps(&self) -> &[String] {
        &self.path_steps
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Look up a header ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

fn parse_path(raw_path: &str) -> Result<Vec<String>, ParseError> {
    let without_query = raw_path.split(['?', '#']).next().unwrap_or_default();

    without_query
        .split('/')
        .filter(|step| !step.is_empty())
        .map(|step| {
            urlencoding::decode(step)
                .map(|decoded| decoded.into_owned())
                .map_err(|_| ParseError::PathStep(step.to_owned()))
        })
        .collect()
}
