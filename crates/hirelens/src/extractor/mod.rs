//! Resume text extraction.
//!
//! [`Extractor::extract`] dispatches once on [`FileKind`] to one handler per
//! container format. Every handler returns raw text; blank output is turned
//! into [`ExtractionError::EmptyDocument`] here so the rule holds for all
//! formats alike.

mod docx;
mod pdf;
mod text;

pub use text::TextEncoding;

use crate::config::ExtractionConfig;
use crate::error::{ConfigError, ExtractionError};
use crate::model::FileKind;

pub struct Extractor {
    encodings: Vec<TextEncoding>,
}

impl Extractor {
    pub fn new(encodings: Vec<TextEncoding>) -> Self {
        Self { encodings }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        let encodings = config
            .encodings
            .iter()
            .map(|name| {
                TextEncoding::parse(name).ok_or_else(|| ConfigError::UnknownEncoding(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(encodings))
    }

    pub fn encodings(&self) -> &[TextEncoding] {
        &self.encodings
    }

    /// Turns resume bytes into plain text.
    pub fn extract(&self, bytes: &[u8], kind: FileKind) -> Result<String, ExtractionError> {
        let _span = tracing::info_span!("extractor", kind = %kind, bytes = bytes.len()).entered();

        let text = match kind {
            FileKind::Pdf => pdf::extract(bytes)?,
            FileKind::PlainText => text::extract(bytes, &self.encodings)?,
            FileKind::DocFamily => docx::extract(bytes)?,
        };

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        log::debug!("Extracted {} chars from {} document", text.len(), kind);
        Ok(text)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(vec![
            TextEncoding::Utf8,
            TextEncoding::Latin1,
            TextEncoding::Windows1252,
        ])
    }
}
