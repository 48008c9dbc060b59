/*!
 * Tests for paragraph extraction
 */

use doctran::errors::DocumentError;
use doctran::extract_paragraphs;

use crate::common::build_docx;

#[test]
fn test_extractParagraphs_withDocx_shouldKeepDocumentOrder() {
    let docx = build_docx(&["First", "   ", "Second &amp; third", "Fourth"]).unwrap();

    let paragraphs = extract_paragraphs(&docx).unwrap();

    let texts: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["First", "Second & third", "Fourth"]);
    let indices: Vec<usize> = paragraphs.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_extractParagraphs_withCrlfText_shouldTrimLines() {
    let paragraphs = extract_paragraphs("  Hello world \r\n\r\nSecond line\r\n".as_bytes()).unwrap();
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[0].text, "Hello world");
    assert_eq!(paragraphs[1].text, "Second line");
}

#[test]
fn test_extractParagraphs_withOnlyBlankLines_shouldReturnNoParagraphs() {
    let paragraphs = extract_paragraphs(b"\n \n\t\n").unwrap();
    assert!(paragraphs.is_empty());
}

#[test]
fn test_extractParagraphs_withZipSignatureOnly_shouldReportArchive() {
    let result = extract_paragraphs(b"PK\x03\x04garbage");
    assert!(matches!(result, Err(DocumentError::InvalidArchive(_))));
}
