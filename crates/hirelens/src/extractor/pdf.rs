use lopdf::Document;

use crate::error::ExtractionError;
use crate::model::FileKind;

/// Extracts each page's text in page order. Pages lopdf cannot decode are
/// skipped; a scan-only PDF therefore ends up blank.
pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::ParseFailure {
        kind: FileKind::Pdf,
        cause: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => {
                let text = text.trim_end();
                if !text.trim().is_empty() {
                    pages.push(text.to_string());
                }
            }
            Err(e) => log::debug!("Skipping unreadable PDF page {}: {}", page_num, e),
        }
    }

    Ok(pages.join("\n"))
}
