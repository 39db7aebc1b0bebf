//! Hybrid Document Chunker
//!
//! Page-then-sentence chunking: each page is split into sentence-aware
//! units, units are packed into chunks up to the target size, and
//! consecutive chunks share a tail of units as overlap. Chunks are
//! contiguous ranges of the page text, so concatenating them in order with
//! the overlapping prefixes removed reproduces the page exactly.

use serde::{Deserialize, Serialize};

/// Separator preference for sentence-aware splitting, strongest first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target chunk size in characters.
    pub target_size: usize,
    /// Overlap carried between consecutive chunks, in characters.
    pub overlap: usize,
    /// A trailing chunk adding fewer than this many non-whitespace
    /// characters beyond its overlap is merged into its predecessor.
    pub min_tail_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_size: 1024,
            overlap: 200,
            min_tail_chars: 50,
        }
    }
}

/// One chunk of a single page, with its character span within that page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageChunk {
    pub text: String,
    /// 1-based page the chunk came from.
    pub page_number: u32,
    /// Document-wide position, assigned monotonically from `base_index`.
    pub chunk_index: usize,
    pub char_start: usize,
    pub char_end: usize,
}

pub struct HybridChunker {
    config: ChunkerConfig,
}

impl HybridChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ChunkerConfig::default())
    }

    /// Chunk the ordered pages of one file. `base_index` continues the
    /// document-wide chunk numbering across files.
    pub fn chunk_pages(&self, pages: &[String], base_index: usize) -> Vec<PageChunk> {
        let mut chunks = Vec::new();
        let mut index = base_index;

        for (page_idx, page) in pages.iter().enumerate() {
            let page_number = (page_idx + 1) as u32;
            for (text, start, end) in self.split_page(page) {
                chunks.push(PageChunk {
                    text,
                    page_number,
                    chunk_index: index,
                    char_start: start,
                    char_end: end,
                });
                index += 1;
            }
        }

        chunks
    }

    /// Split one page into chunk spans.
    fn split_page(&self, text: &str) -> Vec<(String, usize, usize)> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if text.len() <= self.config.target_size {
            return vec![(text.to_string(), 0, text.len())];
        }

        let mut units = Vec::new();
        split_units(text, 0, &SEPARATORS, self.config.target_size, &mut units);
        self.assemble(text, &units)
    }

    /// Pack contiguous units into chunks, stepping back over trailing units
    /// at each boundary to form the overlap.
    fn assemble(&self, text: &str, units: &[(usize, usize)]) -> Vec<(String, usize, usize)> {
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;

        while i < units.len() {
            let start = units[i].0;
            let mut j = i;
            let mut end = units[i].1;
            while j + 1 < units.len() && units[j + 1].1 - start <= self.config.target_size {
                j += 1;
                end = units[j].1;
            }
            spans.push((start, end));

            if j + 1 >= units.len() {
                break;
            }

            // The next chunk re-includes trailing units of this one while
            // the re-included span stays within the overlap budget. `k`
            // never falls back to `i`, so the walk always advances.
            let mut k = j + 1;
            while k > i + 1 && end - units[k - 1].0 <= self.config.overlap {
                k -= 1;
            }
            i = k;
        }

        // A final chunk that adds almost nothing beyond its overlap is
        // folded back into its predecessor.
        if spans.len() >= 2 {
            let (_, last_end) = spans[spans.len() - 1];
            let (_, prev_end) = spans[spans.len() - 2];
            let tail = &text[prev_end..last_end];
            let tail_chars = tail.chars().filter(|c| !c.is_whitespace()).count();
            if tail_chars < self.config.min_tail_chars {
                spans.pop();
                if let Some(prev) = spans.last_mut() {
                    prev.1 = last_end;
                }
            }
        }

        spans
            .into_iter()
            .map(|(s, e)| (text[s..e].to_string(), s, e))
            .collect()
    }
}

impl Default for HybridChunker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Split `text` into units no larger than `target`, preferring the
/// strongest separator that produces compliant pieces. Separators stay
/// attached to the piece on their left, so units tile the input exactly.
fn split_units(
    text: &str,
    base: usize,
    separators: &[&str],
    target: usize,
    out: &mut Vec<(usize, usize)>,
) {
    if text.is_empty() {
        return;
    }
    if text.len() <= target {
        out.push((base, base + text.len()));
        return;
    }
    let Some((sep, rest)) = separators.split_first() else {
        hard_split(text, base, target, out);
        return;
    };

    let mut cursor = 0;
    let mut found = false;
    while let Some(pos) = text[cursor..].find(sep) {
        found = true;
        let piece_end = cursor + pos + sep.len();
        emit_piece(text, cursor, piece_end, base, rest, target, out);
        cursor = piece_end;
        if cursor >= text.len() {
            break;
        }
    }

    if !found {
        split_units(text, base, rest, target, out);
        return;
    }
    if cursor < text.len() {
        emit_piece(text, cursor, text.len(), base, rest, target, out);
    }
}

fn emit_piece(
    text: &str,
    start: usize,
    end: usize,
    base: usize,
    rest: &[&str],
    target: usize,
    out: &mut Vec<(usize, usize)>,
) {
    let piece = &text[start..end];
    if piece.len() > target {
        split_units(piece, base + start, rest, target, out);
    } else if !piece.is_empty() {
        out.push((base + start, base + end));
    }
}

/// Last resort for a separator-free run longer than the target: split at
/// character boundaries as close to the target as possible.
fn hard_split(text: &str, base: usize, target: usize, out: &mut Vec<(usize, usize)>) {
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + target.max(1)).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            let step = text[start..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
            end = start + step;
        }
        out.push((base + start, base + end));
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(target: usize, overlap: usize, min_tail: usize) -> ChunkerConfig {
        ChunkerConfig {
            target_size: target,
            overlap,
            min_tail_chars: min_tail,
        }
    }

    fn sentence_text(count: usize) -> String {
        (1..=count)
            .map(|i| format!("Sentence number {i} talks about a different study topic entirely. "))
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    // ------------------------------------------------------------------
    // Basic shape
    // ------------------------------------------------------------------

    #[test]
    fn test_short_page_is_single_chunk() {
        let chunker = HybridChunker::with_defaults();
        let chunks = chunker.chunk_pages(&["A short page of notes.".to_string()], 0);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A short page of notes.");
        assert_eq!(chunks[0].page_number, 1);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_empty_and_whitespace_pages_produce_nothing() {
        let chunker = HybridChunker::with_defaults();
        let pages = vec![String::new(), "   \n\n  ".to_string()];
        assert!(chunker.chunk_pages(&pages, 0).is_empty());
    }

    #[test]
    fn test_long_page_produces_multiple_bounded_chunks() {
        let chunker = HybridChunker::new(config(200, 60, 20));
        let text = sentence_text(20);
        let chunks = chunker.chunk_pages(&[text], 0);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.text.len() <= 200,
                "chunk exceeds target: {} chars",
                chunk.text.len()
            );
            assert!(!chunk.text.trim().is_empty());
        }
    }

    #[test]
    fn test_chunk_indices_are_monotonic_across_pages() {
        let chunker = HybridChunker::new(config(200, 60, 20));
        let pages = vec![sentence_text(10), sentence_text(10)];
        let chunks = chunker.chunk_pages(&pages, 5);

        for (offset, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, 5 + offset);
        }
        assert!(chunks.iter().any(|c| c.page_number == 1));
        assert!(chunks.iter().any(|c| c.page_number == 2));
    }

    #[test]
    fn test_page_numbers_match_origin() {
        let chunker = HybridChunker::with_defaults();
        let pages = vec![
            "Page one talks about cells and their membranes in detail.".to_string(),
            "Page two talks about mitochondria and energy production.".to_string(),
        ];
        let chunks = chunker.chunk_pages(&pages, 0);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page_number, 1);
        assert_eq!(chunks[1].page_number, 2);
    }

    // ------------------------------------------------------------------
    // Overlap behavior
    // ------------------------------------------------------------------

    #[test]
    fn test_consecutive_chunks_overlap_within_budget() {
        let chunker = HybridChunker::new(config(250, 100, 20));
        let chunks = chunker.chunk_pages(&[sentence_text(30)], 0);

        assert!(chunks.len() > 2);
        let mut saw_overlap = false;
        for pair in chunks.windows(2) {
            assert!(pair[1].char_start <= pair[0].char_end, "chunks must be contiguous");
            let shared = pair[0].char_end.saturating_sub(pair[1].char_start);
            assert!(shared <= 100, "overlap {shared} exceeds budget");
            if shared > 0 {
                saw_overlap = true;
            }
        }
        assert!(saw_overlap, "expected at least one overlapping boundary");
    }

    #[test]
    fn test_zero_overlap_chunks_tile_exactly() {
        let chunker = HybridChunker::new(config(200, 0, 20));
        let chunks = chunker.chunk_pages(&[sentence_text(20)], 0);

        for pair in chunks.windows(2) {
            assert_eq!(pair[1].char_start, pair[0].char_end);
        }
    }

    // ------------------------------------------------------------------
    // Reconstruction
    // ------------------------------------------------------------------

    fn reconstruct(page: &str, chunks: &[PageChunk]) -> String {
        let mut out = String::new();
        let mut covered = 0usize;
        for chunk in chunks {
            out.push_str(&page[covered.max(chunk.char_start)..chunk.char_end]);
            covered = chunk.char_end;
        }
        out
    }

    #[test]
    fn test_reconstruction_with_overlap_removed() {
        let chunker = HybridChunker::new(config(220, 80, 20));
        let page = sentence_text(25);
        let chunks = chunker.chunk_pages(&[page.clone()], 0);

        assert_eq!(reconstruct(&page, &chunks), page);
    }

    #[test]
    fn test_reconstruction_of_paragraph_text() {
        let chunker = HybridChunker::new(config(180, 50, 20));
        let page = (1..=12)
            .map(|i| format!("Paragraph {i} carries its own topic and a couple of sentences. It ends cleanly."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunker.chunk_pages(&[page.clone()], 0);

        assert_eq!(reconstruct(&page, &chunks), page);
    }

    // ------------------------------------------------------------------
    // Tail merging and hard splits
    // ------------------------------------------------------------------

    #[test]
    fn test_tiny_tail_merges_into_predecessor() {
        // Enough text for several chunks, then a final fragment small
        // enough to be folded back.
        let chunker = HybridChunker::new(config(200, 60, 50));
        let page = format!("{} Tiny tail.", sentence_text(12));
        let chunks = chunker.chunk_pages(&[page.clone()], 0);

        let last = chunks.last().unwrap();
        assert!(last.text.contains("Tiny tail."));
        assert_eq!(reconstruct(&page, &chunks), page);
    }

    #[test]
    fn test_unbroken_run_is_hard_split() {
        let chunker = HybridChunker::new(config(100, 0, 10));
        let page = "x".repeat(950);
        let chunks = chunker.chunk_pages(&[page.clone()], 0);

        assert!(chunks.len() >= 9);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 100);
        }
        assert_eq!(reconstruct(&page, &chunks), page);
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let chunker = HybridChunker::new(config(64, 16, 8));
        let page = "Überraschung für die Prüfung. ".repeat(20);
        let chunks = chunker.chunk_pages(&[page.clone()], 0);

        assert!(!chunks.is_empty());
        assert_eq!(reconstruct(&page, &chunks), page);
    }

    // ------------------------------------------------------------------
    // Property tests
    // ------------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_page(
            sentences in proptest::collection::vec("[a-zA-Z ]{10,60}", 1..40),
            target in 80usize..400,
            overlap in 0usize..80,
        ) {
            let page = sentences.join(". ");
            let chunker = HybridChunker::new(config(target, overlap, 20));
            let chunks = chunker.chunk_pages(&[page.clone()], 0);

            if page.trim().is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert_eq!(reconstruct(&page, &chunks), page);
            }
        }

        #[test]
        fn prop_indices_sequential_and_sizes_bounded(
            sentences in proptest::collection::vec("[a-z ]{20,80}", 1..30),
            target in 100usize..300,
        ) {
            let page = sentences.join(". ");
            // Tail merging off: with it, the merged final chunk may
            // legitimately exceed the target.
            let chunker = HybridChunker::new(config(target, 40, 0));
            let chunks = chunker.chunk_pages(&[page], 0);

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.chunk_index, i);
                prop_assert!(chunk.text.len() <= target);
            }
        }
    }
}
