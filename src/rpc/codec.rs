// src/rpc/codec.rs

//! HTTP response decoding
//!
//! Splits a raw response into status line, header block and body, reassembles
//! chunked bodies and decodes the payload as JSON.

use crate::error::{Error, Result};
use std::collections::HashMap;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// A decoded RPC response
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    status_code: String,
    headers: HashMap<String, String>,
    body: serde_json::Value,
}

impl QueryResult {
    /// Numeric status code as it appeared on the status line
    pub fn status_code(&self) -> &str {
        &self.status_code
    }

    /// Headers keyed exactly as received
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Look up one header (case-sensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Decoded JSON body
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Consume the result, keeping only the body
    pub fn into_body(self) -> serde_json::Value {
        self.body
    }

    /// True for 2xx status codes
    pub fn is_success(&self) -> bool {
        self.status_code.starts_with('2')
    }
}

/// Parse a raw HTTP response
///
/// Fails with `MalformedResponse` when the status line or header block cannot
/// be split, and with `InvalidPayload` when the body is not JSON.
pub fn parse(raw: &[u8]) -> Result<QueryResult> {
    let status_end = find(raw, CRLF)
        .ok_or_else(|| Error::MalformedResponse("missing status line terminator".to_string()))?;
    let status_line = decode_text(&raw[..status_end], "status line")?;
    let rest = &raw[status_end + CRLF.len()..];

    // A header block with no blank line after it means the body is empty
    let (header_block, body) = if let Some(body) = rest.strip_prefix(CRLF) {
        (&rest[..0], body)
    } else {
        match find(rest, HEADER_END) {
            Some(pos) => (&rest[..pos], &rest[pos + HEADER_END.len()..]),
            None => (rest.strip_suffix(CRLF).unwrap_or(rest), &rest[rest.len()..]),
        }
    };
    let headers = parse_headers(&decode_text(header_block, "header block")?)?;

    let body = if headers.get("Transfer-Encoding").map(String::as_str) == Some("chunked") {
        dechunk(body)?
    } else {
        body.to_vec()
    };

    let status_code = status_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::MalformedResponse(format!("no status code in '{}'", status_line)))?
        .to_string();

    let body = serde_json::from_slice(&body).map_err(|source| Error::InvalidPayload {
        text: String::from_utf8_lossy(&body).into_owned(),
        source,
    })?;

    Ok(QueryResult {
        status_code,
        headers,
        body,
    })
}

/// Parse an RFC 822 style header block into a map
fn parse_headers(block: &str) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();

    for line in block.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| Error::MalformedResponse(format!("invalid header line '{}'", line)))?;
        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(headers)
}

/// Reassemble a chunked transfer-encoded body
///
/// Each chunk is a hexadecimal length line followed by the payload and a line
/// break; a zero length ends the body. Running out of input before the zero
/// chunk ends the body as well.
pub fn dechunk(mut data: &[u8]) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(data.len());

    while !data.is_empty() {
        let line_end = find(data, CRLF).unwrap_or(data.len());
        let size_line = decode_text(&data[..line_end], "chunk size")?;
        let size_field = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_field, 16).map_err(|e| {
            Error::MalformedResponse(format!("invalid chunk size '{}': {}", size_line, e))
        })?;
        if size == 0 {
            break;
        }

        data = data.get(line_end + CRLF.len()..).unwrap_or_default();
        let chunk = data.get(..size).ok_or_else(|| {
            Error::MalformedResponse(format!(
                "chunk of {} bytes truncated at {} bytes",
                size,
                data.len()
            ))
        })?;
        body.extend_from_slice(chunk);

        data = &data[size..];
        data = data.strip_prefix(CRLF).unwrap_or(data);
    }

    Ok(body)
}

fn decode_text<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::MalformedResponse(format!("{} is not valid UTF-8: {}", what, e)))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
