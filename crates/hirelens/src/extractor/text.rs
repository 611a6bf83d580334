use std::borrow::Cow;

use crate::error::ExtractionError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text encodings tried, in configured order, for plain-text resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl TextEncoding {
    /// Accepts the usual spellings (`utf-8`, `UTF8`, `iso-8859-1`, `cp1252`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "utf8" => Some(TextEncoding::Utf8),
            "latin1" | "iso88591" | "l1" => Some(TextEncoding::Latin1),
            "windows1252" | "cp1252" => Some(TextEncoding::Windows1252),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Decodes the whole input or returns `None`.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(str::to_string)
            }
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Windows1252 => decode_cp1252(bytes),
        }
    }
}

/// Bytes windows-1252 leaves unassigned. `encoding_rs` follows WHATWG and
/// maps them to C1 controls instead of failing.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

fn decode_cp1252(bytes: &[u8]) -> Option<String> {
    if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
        return None;
    }
    encoding_rs::WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

pub(super) fn extract(bytes: &[u8], encodings: &[TextEncoding]) -> Result<String, ExtractionError> {
    for encoding in encodings {
        if let Some(text) = encoding.decode(bytes) {
            log::debug!("Decoded plain-text resume as {}", encoding.name());
            return Ok(text);
        }
    }

    Err(ExtractionError::UndecodableText {
        tried: encodings
            .iter()
            .map(TextEncoding::name)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
