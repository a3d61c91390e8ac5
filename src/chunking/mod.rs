
use tracing::debug;

/// A fixed-size piece of a document's extracted text, ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text
    pub content: String,
    /// Position of this chunk within the document
    pub chunk_index: usize,
}

/// Split text into consecutive non-overlapping windows of at most
/// `chunk_size` characters; the last chunk may be shorter.
///
/// Windows are measured in Unicode scalar values so a multi-byte character
/// is never split. Concatenating the returned chunks in order reproduces
/// the input exactly; empty input yields no chunks.
#[inline]
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<Chunk> {
    assert!(chunk_size > 0, "chunk_size must be positive");

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for ch in text.chars() {
        current.push(ch);
        current_len += 1;

        if current_len == chunk_size {
            chunks.push(Chunk {
                content: std::mem::take(&mut current),
                chunk_index: chunks.len(),
            });
            current_len = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            content: current,
            chunk_index: chunks.len(),
        });
    }

    debug!(
        "Chunked {} characters into {} chunks of up to {} characters",
        text.chars().count(),
        chunks.len(),
        chunk_size
    );

    chunks
}
