use std::fmt;
use std::str::FromStr;

use super::ClipboardError;

/// Clipboard payload format
///
/// Text payloads are UTF-8 bytes, image payloads are PNG-encoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Text,
    Image,
}

impl Format {
    /// Short lowercase name, also used for thread names
    pub fn name(&self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Image => "image",
        }
    }

    /// MIME type of the payload encoding
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Text => "text/plain;charset=utf-8",
            Format::Image => "image/png",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ClipboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "string" | "plain" | "text/plain" => Ok(Format::Text),
            "image" | "png" | "image/png" => Ok(Format::Image),
            other => Err(ClipboardError::unsupported(other)),
        }
    }
}
