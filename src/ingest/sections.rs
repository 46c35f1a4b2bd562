//! Section builder.
//!
//! Merging is adjacent-only: a chunk extends the previous section when both
//! share `(path, type)`. A heading that recurs after a different section
//! starts a new section with the same path.

use std::collections::BTreeSet;

use crate::hashing::truncate_chars;
use crate::policy::PipelinePolicyV1;
use crate::types::{Chunk, Section, ROOT_SECTION_PATH, ROOT_SECTION_TITLE};

/// Whitespace-collapsed summary of `texts`, cut at a word boundary.
///
/// Appends `…` when the text did not fit in `max_chars`.
pub fn summarize<'a>(texts: impl IntoIterator<Item = &'a str>, max_chars: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for word in texts.into_iter().flat_map(str::split_whitespace) {
        let len = word.chars().count();
        let needed = if out.is_empty() { len } else { len + 1 };
        if used + needed > max_chars {
            if out.is_empty() {
                out.push_str(truncate_chars(word, max_chars));
            }
            out.push('…');
            return out;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }

    out
}

fn section_title(path: &str) -> String {
    if path == ROOT_SECTION_PATH {
        ROOT_SECTION_TITLE.to_string()
    } else {
        path.to_string()
    }
}

/// Aggregate chunks into sections in emission order.
pub fn build_sections(chunks: &[Chunk], policy: &PipelinePolicyV1) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut pages: BTreeSet<u32> = BTreeSet::new();
    let mut first_member = 0usize;

    for (pos, chunk) in chunks.iter().enumerate() {
        let section_type = chunk.effective_type();
        let extends_previous = sections
            .last()
            .map(|s| s.path == chunk.section_path && s.section_type == section_type)
            .unwrap_or(false);

        if !extends_previous {
            pages.clear();
            first_member = pos;
            sections.push(Section {
                title: section_title(&chunk.section_path),
                section_type,
                anchors: Vec::new(),
                page_refs: Vec::new(),
                summary: String::new(),
                order: sections.len(),
                path: chunk.section_path.clone(),
                chunk_ids: Vec::new(),
            });
        }

        pages.insert(chunk.page_start);
        pages.insert(chunk.page_end);
        pages.extend(chunk.pages.iter().copied());

        if let Some(section) = sections.last_mut() {
            section.anchors.extend(chunk.anchors.iter().cloned());
            section.chunk_ids.push(chunk.chunk_id());
            section.page_refs = pages.iter().copied().collect();
            section.summary = summarize(
                chunks[first_member..=pos].iter().map(|c| c.text.as_str()),
                policy.summary_chars,
            );
        }
    }

    sections
}
