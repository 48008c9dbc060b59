/*!
 * Paragraph extraction from uploaded documents.
 *
 * DOCX payloads are read from their `word/document.xml` part; anything else
 * must be UTF-8 text split on line breaks. Paragraphs are trimmed, empty ones
 * are dropped, and the survivors are numbered in document order.
 */

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};

use crate::errors::DocumentError;

/// ZIP local file header signature
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Main document part inside a DOCX container
const DOCUMENT_PART: &str = "word/document.xml";

/// One indexed segment of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Position in the document, the only ordering key
    pub index: usize,
    /// Non-empty trimmed text
    pub text: String,
}

impl Paragraph {
    /// Create a paragraph
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Number a list of raw texts, dropping blank ones
pub fn paragraphs_from_texts<I, S>(texts: I) -> Vec<Paragraph>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .filter_map(|t| {
            let trimmed = t.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .enumerate()
        .map(|(index, text)| Paragraph { index, text })
        .collect()
}

/// Extract paragraphs from raw document bytes
pub fn extract_paragraphs(bytes: &[u8]) -> Result<Vec<Paragraph>, DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }

    if bytes.starts_with(ZIP_SIGNATURE) {
        let xml = read_document_part(bytes)?;
        let texts = docx_paragraph_texts(&xml)?;
        return Ok(paragraphs_from_texts(texts));
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|e| DocumentError::InvalidEncoding(e.to_string()))?;
    Ok(paragraphs_from_texts(text.lines()))
}

fn read_document_part(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocumentError::InvalidArchive(e.to_string()))?;

    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| DocumentError::MissingBody(format!("{}: {}", DOCUMENT_PART, e)))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| DocumentError::InvalidArchive(e.to_string()))?;
    Ok(xml)
}

/// Elements whose content never belongs to a body paragraph's own text:
/// tables, text boxes and the fallback copy of alternate content
fn is_skipped_container(name: &[u8]) -> bool {
    matches!(name, b"w:tbl" | b"w:txbxContent" | b"mc:Fallback")
}

/// Collect the text of every body-level `w:p` element.
/// Paragraphs nested inside tables or text boxes are skipped.
pub fn docx_paragraph_texts(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut texts = Vec::new();
    let mut skip_depth = 0usize;
    let mut paragraph_depth = 0usize;
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| DocumentError::InvalidXml(format!("at position {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                name if is_skipped_container(name) => skip_depth += 1,
                _ if skip_depth > 0 => {}
                b"w:p" => {
                    if paragraph_depth == 0 {
                        current = Some(String::new());
                    }
                    paragraph_depth += 1;
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                name if is_skipped_container(name) => skip_depth = skip_depth.saturating_sub(1),
                _ if skip_depth > 0 => {}
                b"w:p" => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 {
                        if let Some(text) = current.take() {
                            texts.push(text);
                        }
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) if skip_depth == 0 => {
                if let Some(text) = current.as_mut() {
                    match e.name().as_ref() {
                        b"w:tab" => text.push('\t'),
                        b"w:br" | b"w:cr" => text.push('\n'),
                        // <w:p/> is an empty paragraph; nothing to keep
                        _ => {}
                    }
                }
            }
            Event::Text(t) if in_text && skip_depth == 0 => {
                if let Some(text) = current.as_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| DocumentError::InvalidXml(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(texts)
}
