// Text chunking module
// Splits raw document text into overlapping chunks at sentence-ish boundaries

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RagError, Result};

/// Characters treated as chunk boundary candidates
const BOUNDARY_CHARS: [char; 4] = ['.', '\n', '?', '!'];

/// Chunks with a trimmed length at or below this are dropped as too small to
/// be useful retrieval context
const MIN_CHUNK_CHARS: usize = 50;

/// Configuration for text chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Target maximum characters per chunk
    pub chunk_size: usize,
    /// Characters of overlap carried into the next chunk
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Splits text into overlapping chunks, preferring to cut after `.`, `\n`,
/// `?` or `!` when such a boundary falls in the second half of the window.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker, validating that the configuration can terminate.
    ///
    /// `chunk_overlap` must be strictly less than `chunk_size`, otherwise the
    /// scan position could never advance.
    #[inline]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    #[inline]
    pub fn from_config(config: &ChunkerConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into overlapping chunks.
    ///
    /// Empty or whitespace-only input produces no chunks. Chunks are trimmed,
    /// and trimmed chunks of 50 characters or fewer are discarded while the
    /// scan still advances past them. Offsets are measured in characters, so
    /// multi-byte input never splits a code point.
    #[inline]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < total {
            // The nominal end may run past the text; it still drives the
            // advance so the tail is not rescanned.
            let mut end = start + self.chunk_size;

            // Snap to the rightmost boundary character, but only when it
            // falls past the midpoint of the window; otherwise accept a
            // mid-sentence cut.
            if end < total {
                if let Some(break_point) = rightmost_boundary(&chars[start..end]) {
                    if break_point as f64 > self.chunk_size as f64 * 0.5 {
                        end = start + break_point + 1;
                    }
                }
            }

            let chunk: String = chars[start..end.min(total)].iter().collect();
            let trimmed = chunk.trim();
            if trimmed.chars().count() > MIN_CHUNK_CHARS {
                chunks.push(trimmed.to_string());
            }

            // The boundary snap can land inside the overlap region; the
            // scan position must still move forward.
            start = end.saturating_sub(self.chunk_overlap).max(start + 1);
        }

        debug!(
            "Chunked {} chars into {} chunks (size {}, overlap {})",
            total,
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }
}

/// Index of the rightmost boundary character within the window, if any
fn rightmost_boundary(window: &[char]) -> Option<usize> {
    window.iter().rposition(|c| BOUNDARY_CHARS.contains(c))
}
