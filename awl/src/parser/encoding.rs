use std::fmt;

use serde::Deserialize;

use crate::parser::error::{ErrorKind, ParseError};

/// Character encoding of AWL source files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Encoding {
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO 8859-1, the encoding of sources exported by the vendor tooling.
    #[default]
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
    #[serde(rename = "ascii")]
    Ascii,
}

impl Encoding {
    pub fn from_name(name: &str) -> Option<Encoding> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Some(Encoding::Latin1),
            "ascii" | "us-ascii" => Some(Encoding::Ascii),
            _ => None,
        }
    }

    /// Decode raw source bytes.
    pub fn decode(self, raw: &[u8]) -> Result<String, ParseError> {
        match self {
            Encoding::Utf8 => match std::str::from_utf8(raw) {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(self.error(raw, e.valid_up_to())),
            },
            Encoding::Latin1 => Ok(raw.iter().map(|&b| char::from(b)).collect()),
            Encoding::Ascii => match raw.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(self.error(raw, pos)),
                None => Ok(raw.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }

    fn error(self, raw: &[u8], pos: usize) -> ParseError {
        let line = raw[..pos].iter().filter(|&&b| b == b'\n').count() + 1;
        ParseError::new(
            ErrorKind::Encoding,
            format!("source is not valid {} (byte {:#04x} at offset {})", self, raw[pos], pos),
        )
        .at_line(line)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "Latin-1",
            Encoding::Ascii => "ASCII",
        })
    }
}
