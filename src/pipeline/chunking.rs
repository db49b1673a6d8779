//! Fixed-window chunking.
//!
//! Chunking is the mechanism that keeps every inference call within the
//! backend's input budget. Windows are measured in characters (Unicode scalar
//! values), contiguous and non-overlapping, so concatenating the chunks of a
//! document in index order reproduces the input exactly. The split is
//! deterministic: identical text and size always yield identical sequences.

use super::types::{Chunk, ChunkingError};

/// Split text into ordered windows of at most `chunk_size` characters.
///
/// The last window may be shorter. Empty text yields an empty sequence.
pub(crate) fn chunk_text(text: &str, chunk_size: usize) -> Result<Vec<Chunk>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let mut chunks = Vec::new();
    let mut window = String::new();
    let mut filled = 0;

    for ch in text.chars() {
        window.push(ch);
        filled += 1;
        if filled == chunk_size {
            chunks.push(Chunk {
                index: chunks.len(),
                text: std::mem::take(&mut window),
            });
            filled = 0;
        }
    }

    if !window.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            text: window,
        });
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|chunk| chunk.text.as_str()).collect()
    }

    #[test]
    fn splits_into_fixed_windows() {
        let chunks = chunk_text("0123456789", 4).expect("chunks");
        assert_eq!(texts(&chunks), vec!["0123", "4567", "89"]);
        assert_eq!(
            chunks.iter().map(|chunk| chunk.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn concatenation_reproduces_input() {
        let input = "The quick brown fox jumps over the lazy dog. \
                     Pack my box with five dozen liquor jugs.";
        for size in [1, 3, 7, 16, 512] {
            let chunks = chunk_text(input, size).expect("chunks");
            let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
            assert_eq!(rebuilt, input);
            for chunk in &chunks[..chunks.len().saturating_sub(1)] {
                assert_eq!(chunk.text.chars().count(), size);
            }
        }
    }

    #[test]
    fn windows_count_characters_not_bytes() {
        let chunks = chunk_text("héllo wörld", 3).expect("chunks");
        let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(rebuilt, "héllo wörld");
        assert_eq!(chunks[0].text, "hél");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 8).expect("chunks").is_empty());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let first = chunk_text("deterministic input", 5).expect("chunks");
        let second = chunk_text("deterministic input", 5).expect("chunks");
        assert_eq!(first, second);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            chunk_text("anything", 0),
            Err(ChunkingError::InvalidChunkSize)
        ));
    }
}
