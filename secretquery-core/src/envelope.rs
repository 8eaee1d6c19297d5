//! API Gateway proxy response envelope

use serde::Serialize;
use std::collections::BTreeMap;
use std::io;

pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Response shape expected by the API Gateway Lambda proxy integration
///
/// Headers are kept in a `BTreeMap` so the serialized form is stable across
/// invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    status_code: u16,
    headers: BTreeMap<String, String>,
    body: String,
}

impl ResponseEnvelope {
    /// Build a 200 response whose body is `message` encoded as a JSON string
    ///
    /// Non-ASCII characters are written as `\uXXXX` escapes (UTF-16 code
    /// units), so the body is plain ASCII.
    pub fn ok(message: &str) -> Result<Self, serde_json::Error> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), CONTENT_TYPE.to_string());

        Ok(Self {
            status_code: 200,
            headers,
            body: to_ascii_json(message)?,
        })
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Serialize `value` as JSON with every non-ASCII character escaped
fn to_ascii_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

/// Compact formatter that escapes characters outside ASCII
struct AsciiFormatter;

impl serde_json::ser::Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&bytes[start..index])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&bytes[start..])
    }
}
