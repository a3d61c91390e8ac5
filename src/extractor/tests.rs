use super::*;
use tempfile::TempDir;

#[test]
fn missing_file_is_extraction_error() {
    let result = extract_text("/nonexistent/paper.pdf");

    assert!(matches!(result, Err(DocChatError::Extraction(_))));
}

#[test]
fn non_pdf_input_is_extraction_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("not-a-pdf.pdf");
    std::fs::write(&path, b"plain text, no PDF header").expect("write file");

    let result = extract_text(&path);

    assert!(matches!(result, Err(DocChatError::Extraction(_))));
}

#[test]
fn document_id_from_simple_name() {
    assert_eq!(document_id("/tmp/research-paper.pdf"), "research-paper");
}

#[test]
fn document_id_sanitizes_special_characters() {
    assert_eq!(
        document_id("/tmp/my paper (v2).pdf"),
        "my_paper__v2_"
    );
}

#[test]
fn document_id_without_extension() {
    assert_eq!(document_id("notes"), "notes");
}

#[test]
fn document_id_fallback_for_empty_stem() {
    assert_eq!(document_id(""), "document");
}
