//! Heading-driven chunker.
//!
//! Lines accumulate into a buffer across pages. A detected heading flushes the
//! buffer as a chunk once it holds more than `flush_threshold_chars`
//! characters; shorter buffers are carried into the new heading's chunk.

use crate::policy::PipelinePolicyV1;
use crate::types::{Chunk, PageText, SectionType, ROOT_SECTION_PATH};

use super::anchors::{generate_anchors, PageMark};
use super::patterns::{heading_path, SectionPatternSet};

/// Local state of one chunking pass.
struct ChunkAccumulator<'a> {
    policy: &'a PipelinePolicyV1,
    patterns: &'a SectionPatternSet,
    buffer: String,
    buffer_chars: usize,
    marks: Vec<PageMark>,
    page_start: u32,
    last_page: u32,
    section_path: String,
    section_type: Option<SectionType>,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkAccumulator<'a> {
    fn new(policy: &'a PipelinePolicyV1, patterns: &'a SectionPatternSet) -> Self {
        Self {
            policy,
            patterns,
            buffer: String::new(),
            buffer_chars: 0,
            marks: Vec::new(),
            page_start: 0,
            last_page: 0,
            section_path: ROOT_SECTION_PATH.to_string(),
            section_type: None,
            chunks: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str, page: u32) {
        if let Some(rule) = self.patterns.detect(line) {
            if self.buffer_chars > self.policy.flush_threshold_chars {
                self.flush();
            }
            self.section_path = heading_path(line, self.policy.max_anchor_chars);
            self.section_type = Some(rule.section_type);
        }

        if self.buffer.is_empty() {
            self.page_start = page;
        }
        if self.marks.last().map(|m| m.page) != Some(page) {
            self.marks.push(PageMark {
                offset: self.buffer.len(),
                page,
            });
        }
        self.buffer.push_str(line);
        self.buffer.push('\n');
        self.buffer_chars += line.chars().count() + 1;
        self.last_page = page;
    }

    fn flush(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        let marks = std::mem::take(&mut self.marks);
        self.buffer_chars = 0;

        let text = buffer.trim_end();
        if text.trim().is_empty() {
            return;
        }

        let anchors = generate_anchors(text, &marks, self.page_start, self.patterns, self.policy);
        let mut pages: Vec<u32> = marks.iter().map(|m| m.page).collect();
        pages.sort_unstable();
        pages.dedup();
        let chunk = Chunk {
            index: self.chunks.len(),
            text: text.to_string(),
            page_start: self.page_start,
            page_end: self.last_page,
            pages,
            anchors,
            section_path: self.section_path.clone(),
            hash: self.policy.hash_algorithm.hash(text),
            char_count: text.chars().count(),
            section_type: self.section_type,
        };

        tracing::trace!(
            target: "truth_layer::ingest",
            index = chunk.index,
            section_path = %chunk.section_path,
            char_count = chunk.char_count,
            anchors = chunk.anchors.len(),
            "chunk flushed"
        );
        self.chunks.push(chunk);
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Split pages into chunks at detected section headings.
///
/// Zero pages (or only blank text) give zero chunks. Text with no headings
/// gives one chunk under [`ROOT_SECTION_PATH`] with no section type.
pub fn chunk_pages(
    pages: &[PageText],
    patterns: &SectionPatternSet,
    policy: &PipelinePolicyV1,
) -> Vec<Chunk> {
    let mut acc = ChunkAccumulator::new(policy, patterns);
    for page in pages {
        for line in page.text.lines() {
            acc.push_line(line, page.page_number);
        }
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(pages: &[PageText]) -> Vec<Chunk> {
        chunk_pages(pages, SectionPatternSet::standard(), &PipelinePolicyV1::default())
    }

    fn filler(n: usize) -> String {
        "The insured must give prompt notice of any occurrence. ".repeat(n)
    }

    #[test]
    fn test_zero_pages_zero_chunks() {
        assert!(chunk(&[]).is_empty());
    }

    #[test]
    fn test_blank_pages_zero_chunks() {
        assert!(chunk(&[PageText::new(1, "   \n\n ")]).is_empty());
    }

    #[test]
    fn test_no_headings_single_untyped_chunk() {
        let pages = vec![PageText::new(1, filler(3)), PageText::new(2, filler(3))];
        let chunks = chunk(&pages);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_type, None);
        assert_eq!(chunks[0].section_path, ROOT_SECTION_PATH);
        assert_eq!(chunks[0].page_start, 1);
        assert_eq!(chunks[0].page_end, 2);
    }

    #[test]
    fn test_heading_flushes_long_buffer() {
        let text = format!("DECLARATIONS\n{}\nEXCLUSIONS\n{}", filler(3), filler(3));
        let chunks = chunk(&[PageText::new(1, text)]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section_type, Some(SectionType::Declarations));
        assert_eq!(chunks[1].section_type, Some(SectionType::Exclusion));
        assert!(chunks[1].text.starts_with("EXCLUSIONS"));
    }

    #[test]
    fn test_short_buffer_carried_into_next_heading() {
        let text = format!("DECLARATIONS\nshort\nEXCLUSIONS\n{}", filler(3));
        let chunks = chunk(&[PageText::new(1, text)]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_path, "EXCLUSIONS");
        assert!(chunks[0].text.starts_with("DECLARATIONS"));
    }

    #[test]
    fn test_indices_contiguous_and_hash_matches_text() {
        let text = format!(
            "DECLARATIONS\n{}\nDEFINITIONS\n{}\nCONDITIONS\n{}",
            filler(3),
            filler(3),
            filler(3)
        );
        let chunks = chunk(&[PageText::new(1, text)]);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.hash, crate::hashing::djb2_hex(&c.text));
            assert_eq!(c.char_count, c.text.chars().count());
        }
    }

    #[test]
    fn test_chunk_restarts_at_heading_page() {
        let pages = vec![
            PageText::new(1, format!("DECLARATIONS\n{}", filler(3))),
            PageText::new(2, format!("EXCLUSIONS\n{}", filler(3))),
        ];
        let chunks = chunk(&pages);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].page_start, chunks[0].page_end), (1, 1));
        assert_eq!((chunks[1].page_start, chunks[1].page_end), (2, 2));
        assert_eq!(chunks[1].anchors[0].page, 2);
    }
}
