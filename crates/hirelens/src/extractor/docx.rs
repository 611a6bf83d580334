use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractionError;
use crate::model::FileKind;

fn failure(cause: impl Into<String>) -> ExtractionError {
    ExtractionError::ParseFailure {
        kind: FileKind::DocFamily,
        cause: cause.into(),
    }
}

/// Reads `word/document.xml` out of an OOXML container. Legacy binary
/// `.doc` files are not zip archives and fail here.
pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| failure(format!("not an OOXML document: {}", e)))?;

    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| failure(format!("missing word/document.xml: {}", e)))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| failure(format!("failed to read document.xml: {}", e)))?;

    parse_document_xml(&xml)
}

/// Collects `<w:t>` runs per `<w:p>` paragraph, dropping empty paragraphs.
fn parse_document_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => current.clear(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push(' '),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let decoded = e.unescape().unwrap_or_default();
                current.push_str(&decoded);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(failure(format!("XML parsing error: {}", e))),
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
