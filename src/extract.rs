//! Text extraction for uploaded files (PDF, DOCX, raw text).
//!
//! The pipeline only needs the contract "given bytes and a kind, produce
//! plain text or fail"; the [`TextExtractor`] trait is that seam, and
//! [`BuiltinExtractor`] is the default implementation. Extraction failures
//! are typed ([`ExtractError`]) and are converted into placeholder documents
//! by the ingestion pipeline, never propagated past it.

use std::io::Read;

use thiserror::Error;

use crate::models::DocumentKind;

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// The text-extraction capability the pipeline dispatches to.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Default extractor: `pdf-extract` for PDF, `zip` + `quick-xml` for DOCX,
/// lossy UTF-8 for everything else.
#[derive(Debug, Default)]
pub struct BuiltinExtractor;

impl TextExtractor for BuiltinExtractor {
    fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
        match kind {
            DocumentKind::Pdf => extract_pdf(bytes),
            DocumentKind::Docx => extract_docx(bytes),
            DocumentKind::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut doc_xml = Vec::new();
    let mut found = false;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        if entry.name() == "word/document.xml" {
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| ExtractError::Docx(e.to_string()))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(ExtractError::Docx(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
            found = true;
            break;
        }
    }
    if !found {
        return Err(ExtractError::Docx(
            "word/document.xml not found".to_string(),
        ));
    }
    extract_w_t_elements(&doc_xml)
}

/// Concatenate the text runs (`w:t` elements) of a WordprocessingML body.
fn extract_w_t_elements(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal docx (ZIP) containing word/document.xml with the given phrase.
    fn minimal_docx(phrase: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
                phrase
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = BuiltinExtractor
            .extract(DocumentKind::Pdf, b"not a pdf")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let err = BuiltinExtractor
            .extract(DocumentKind::Docx, b"not a zip")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn docx_without_document_xml_returns_error() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("altro.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = BuiltinExtractor
            .extract(DocumentKind::Docx, &buf)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn docx_text_runs_are_extracted() {
        let bytes = minimal_docx("Ferie: 20 giorni");
        let text = BuiltinExtractor.extract(DocumentKind::Docx, &bytes).unwrap();
        assert_eq!(text, "Ferie: 20 giorni");
    }

    #[test]
    fn raw_text_passes_through_lossily() {
        let text = BuiltinExtractor
            .extract(DocumentKind::Text, b"Ferie: 20 giorni")
            .unwrap();
        assert_eq!(text, "Ferie: 20 giorni");

        // Invalid UTF-8 degrades to replacement characters instead of failing.
        let text = BuiltinExtractor
            .extract(DocumentKind::Text, &[0x63, 0xff, 0x61, 0x6f])
            .unwrap();
        assert!(text.contains('\u{FFFD}'));
    }
}
