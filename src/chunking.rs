//! Pure text splitting for the semantic index.
//!
//! [`split`] cuts text into overlapping windows, preferring to end each slice
//! at a sentence or paragraph boundary found in the back half of the window.
//! The function is deterministic: re-running it over unchanged text yields
//! identical drafts, which is what makes re-indexing idempotent.

/// Boundary markers tried in order when looking for a natural cut point.
const SENTENCE_BREAKS: [&str; 5] = [". ", ".\n", "! ", "? ", "\n\n"];

/// Window size and overlap for [`split`].
#[derive(Clone, Copy, Debug)]
pub struct ChunkingOptions {
    /// Target slice size in bytes.
    pub chunk_size: usize,
    /// Bytes shared between consecutive slices.
    pub chunk_overlap: usize,
}

impl ChunkingOptions {
    pub const DEFAULT_CHUNK_SIZE: usize = 800;
    pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

    /// Build options with an explicit window and overlap. The overlap is
    /// clamped below the window size so the cursor always advances.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE, Self::DEFAULT_CHUNK_OVERLAP)
    }
}

/// A slice of source text slated for embedding.
///
/// Offsets are byte offsets into the original text. `content` is the trimmed
/// slice; the offsets describe the untrimmed window so that expanded ranges
/// cover the whole input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkDraft {
    /// Zero-based position of this draft within the material.
    pub index: usize,
    pub char_start: usize,
    pub char_end: usize,
    pub content: String,
}

/// Split `text` into overlapping drafts.
///
/// Empty or whitespace-only text yields no drafts; text shorter than the
/// window yields exactly one. Every draft satisfies `char_end > char_start`,
/// and consecutive windows overlap by `chunk_overlap` bytes so no input is
/// lost between slices.
pub fn split(text: &str, options: &ChunkingOptions) -> Vec<ChunkDraft> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut drafts = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + options.chunk_size).min(text.len()));

        if end < text.len() {
            // Prefer a natural boundary in the back half of the window.
            let window = &text[start..end];
            for separator in SENTENCE_BREAKS {
                if let Some(position) = window.rfind(separator) {
                    if position > options.chunk_size / 2 {
                        end = start + position + separator.len();
                        break;
                    }
                }
            }
        }

        let content = text[start..end].trim();
        if !content.is_empty() {
            drafts.push(ChunkDraft {
                index,
                char_start: start,
                char_end: end,
                content: content.to_string(),
            });
            index += 1;
        }

        if end >= text.len() {
            break;
        }
        let next = floor_char_boundary(text, end.saturating_sub(options.chunk_overlap));
        start = if next > start { next } else { end };
    }

    drafts
}

/// Largest char boundary at or below `index`.
pub(crate) fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
