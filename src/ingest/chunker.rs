//! Text chunking for ingestion.
//!
//! Splits documents into overlapping character chunks, preferring sentence
//! boundaries near the chunk end.

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
        }
    }

    /// Split text into overlapping chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let chars: Vec<char> = text.chars().collect();
        let total_chars = chars.len();

        if total_chars == 0 {
            return chunks;
        }

        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut start = 0;

        while start < total_chars {
            let end = (start + self.chunk_size).min(total_chars);
            let chunk_text: String = chars[start..end].iter().collect();

            // Only trim to a sentence boundary when more text follows.
            let final_text = if end < total_chars {
                find_sentence_boundary(&chunk_text)
            } else {
                chunk_text
            };

            let trimmed = final_text.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            start += step;
        }

        chunks
    }
}

/// Find a good sentence boundary within the last 20% of the chunk.
fn find_sentence_boundary(text: &str) -> String {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let search_start = text
        .char_indices()
        .nth(text.chars().count() * 80 / 100)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let search_text = &text[search_start..];

    for ending in sentence_endings.iter() {
        if let Some(pos) = search_text.rfind(ending) {
            let cut_pos = search_start + pos + ending.len();
            return text[..cut_pos].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = TextChunker::new(1000, 100);
        let chunks = chunker.split("One small note.");
        assert_eq!(chunks, vec!["One small note."]);
    }

    #[test]
    fn long_text_is_split_with_overlap() {
        let chunker = TextChunker::new(100, 20);
        let text = "This is a test sentence. ".repeat(20);
        let chunks = chunker.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn prefers_sentence_boundaries_for_interior_chunks() {
        let chunker = TextChunker::new(60, 10);
        let text = "First sentence here. Second sentence follows. Third one is last and quite long.";
        let chunks = chunker.split(text);

        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = TextChunker::new(100, 10);
        assert!(chunker.split("").is_empty());
    }

    #[test]
    fn overlap_larger_than_chunk_still_advances() {
        let chunker = TextChunker::new(10, 50);
        let chunks = chunker.split(&"abcdefghij".repeat(5));
        // Step clamps to 1, so the walk terminates.
        assert!(!chunks.is_empty());
    }
}
