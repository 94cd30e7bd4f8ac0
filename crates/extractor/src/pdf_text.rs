use crate::error::Result;
use lopdf::Document;
use std::path::Path;

/// Extract the text of every page, in page order, one `\n` after each page.
///
/// Pages without extractable text contribute nothing. There is no OCR, so an
/// image-only document yields an empty string.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes)?;
    extract_document_text(&document)
}

/// Same as [`extract_text`], reading the document from disk.
pub fn extract_text_from_file(path: impl AsRef<Path>) -> Result<String> {
    let bytes = std::fs::read(path.as_ref())?;
    extract_text(&bytes)
}

fn extract_document_text(document: &Document) -> Result<String> {
    let mut text = String::new();
    for (page_number, _) in document.get_pages() {
        let page_text = match document.extract_text(&[page_number]) {
            Ok(page_text) => page_text,
            Err(err) => {
                log::debug!("page {page_number}: no extractable text ({err})");
                continue;
            }
        };
        let page_text = page_text.trim_end_matches(['\n', '\r']);
        if page_text.is_empty() {
            continue;
        }
        text.push_str(page_text);
        text.push('\n');
    }
    Ok(text)
}
