#[cfg(test)]
mod tests;

use std::path::Path;
use tracing::debug;

use crate::{DocChatError, Result};

/// Extract the full plain text of a PDF document.
///
/// The whole document is flattened into one string; page structure is not
/// preserved. Corrupted or non-PDF input fails with
/// [`DocChatError::Extraction`].
#[inline]
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DocChatError::Extraction(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let text = pdf_extract::extract_text(path).map_err(|e| {
        DocChatError::Extraction(format!("{}: {}", path.display(), e))
    })?;

    debug!(
        "Extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );

    Ok(text)
}

/// Derive a stable document identifier from the file name.
///
/// The identifier namespaces chunk ids in the vector store, so re-ingesting
/// the same file overwrites its previous chunks instead of colliding with
/// chunks from other documents. Characters outside `[A-Za-z0-9_-]` are
/// mapped to `_` to keep the id safe for use in store filter predicates.
#[inline]
pub fn document_id<P: AsRef<Path>>(path: P) -> String {
    let stem = path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}
