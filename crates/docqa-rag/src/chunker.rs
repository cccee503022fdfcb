//! Splitting text into overlapping, boundary-aware chunks

use docqa_core::{Error, IndexingConfig, Result};

/// Break points in order of preference. Within a group the latest match wins.
const SEPARATOR_GROUPS: &[&[&str]] = &[
    &["\n\n"],
    &["\n"],
    &[". ", "? ", "! "],
    &[" "],
];

/// Splits text into chunks of at most `chunk_size` chars where each chunk
/// starts with the last `chunk_overlap` chars of the one before it.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidInput("chunk size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &IndexingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        if chars.is_empty() {
            return chunks;
        }

        let mut start = 0;
        loop {
            if chars.len() - start <= self.chunk_size {
                chunks.push(chars[start..].iter().collect());
                break;
            }

            // The cut must leave more than `overlap` chars in this chunk so
            // the next start moves forward.
            let earliest = start + self.chunk_overlap + 1;
            let latest = start + self.chunk_size;
            let end = find_cut(&chars, earliest, latest);

            chunks.push(chars[start..end].iter().collect());
            start = end - self.chunk_overlap;
        }

        chunks
    }
}

/// Pick the cut position in `earliest..=latest`, just after a separator if
/// one is available, otherwise a hard cut at `latest`.
fn find_cut(chars: &[char], earliest: usize, latest: usize) -> usize {
    for group in SEPARATOR_GROUPS {
        for end in (earliest..=latest).rev() {
            if group.iter().any(|sep| ends_with_at(chars, end, sep)) {
                return end;
            }
        }
    }
    latest
}

fn ends_with_at(chars: &[char], end: usize, separator: &str) -> bool {
    let len = separator.chars().count();
    end >= len && chars[end - len..end].iter().copied().eq(separator.chars())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random text with a mix of separators
    fn sample_text(seed: u64, len: usize) -> String {
        const PIECES: &[&str] = &[
            "law", "court", "section", "appeal", "¶", "नियम", " ", " ", " ", ". ", "\n", "\n\n", "? ",
            "jurisdiction", "x",
        ];
        let mut state = seed;
        let mut text = String::new();
        while text.chars().count() < len {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            text.push_str(PIECES[(state >> 33) as usize % PIECES.len()]);
        }
        text
    }

    fn assert_chunk_invariants(text: &str, size: usize, overlap: usize) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let chunks = chunker.split(text);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= size, "chunk longer than {}: {:?}", size, chunk);
        }

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert!(next.len() > overlap);
            assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
        }

        // Removing the overlaps gives back the input.
        let mut rebuilt: String = chunks.first().cloned().unwrap_or_default();
        for chunk in chunks.iter().skip(1) {
            rebuilt.extend(chunk.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_invariants_hold_across_inputs() {
        for seed in 0..40 {
            let text = sample_text(seed, 200 + (seed as usize * 97) % 3000);
            assert_chunk_invariants(&text, 500, 100);
            assert_chunk_invariants(&text, 64, 16);
            assert_chunk_invariants(&text, 10, 0);
            assert_chunk_invariants(&text, 7, 6);
        }
    }

    #[test]
    fn test_empty_and_short_text() {
        let chunker = TextChunker::new(500, 100).unwrap();
        assert!(chunker.split("").is_empty());
        assert_eq!(chunker.split("short"), vec!["short".to_string()]);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let chunker = TextChunker::new(30, 5).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph follows on.";
        let chunks = chunker.split(text);
        assert_eq!(chunks[0], "First paragraph here.\n\n");
        assert!(chunks[1].starts_with("re.\n\n"));
    }

    #[test]
    fn test_prefers_sentence_over_word() {
        let chunker = TextChunker::new(24, 0).unwrap();
        let chunks = chunker.split("One two. Three four five six");
        assert_eq!(chunks[0], "One two. ");
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let chunks = chunker.split("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_multibyte_characters() {
        let chunker = TextChunker::new(3, 1).unwrap();
        let chunks = chunker.split("धारा४३८");
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 3);
        }
        assert_chunk_invariants("धारा४३८", 3, 1);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(100, 150).is_err());
        assert!(TextChunker::from_config(&IndexingConfig::default()).is_ok());
    }
}
