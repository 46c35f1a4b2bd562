//! Anchor generation.
//!
//! Anchors are the load-bearing identity of the truth layer: citations point
//! at them and re-ingestion must reproduce them. Generation therefore depends
//! on nothing but the chunk text, its page marks and the policy.

use crate::hashing::{slugify, truncate_chars, HashAlgorithm};
use crate::policy::PipelinePolicyV1;
use crate::types::ContentAnchor;

use super::patterns::SectionPatternSet;

/// Page boundary inside a chunk: lines at or after `offset` were read from `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMark {
    /// Byte offset into the chunk text.
    pub offset: usize,
    /// Page number.
    pub page: u32,
}

impl ContentAnchor {
    /// Build an anchor whose identity derives from `text`.
    pub fn from_text(
        text: &str,
        page: u32,
        offset: usize,
        max_chars: usize,
        algorithm: HashAlgorithm,
    ) -> Self {
        let anchor_text = truncate_chars(text.trim(), max_chars).to_string();
        Self {
            hash: algorithm.hash(&anchor_text),
            slug: slugify(&anchor_text),
            anchor_text,
            page,
            offset,
        }
    }
}

/// Whether an all-uppercase line of `len` characters qualifies as a heading.
fn is_caps_heading(trimmed: &str, policy: &PipelinePolicyV1) -> bool {
    let len = trimmed.chars().count();
    len >= policy.min_heading_chars
        && len < policy.max_anchor_chars
        && trimmed.chars().any(char::is_alphabetic)
        && !trimmed.chars().any(char::is_lowercase)
}

/// Page for the line starting at `offset`.
fn page_at(marks: &[PageMark], offset: usize, default_page: u32) -> u32 {
    marks
        .iter()
        .take_while(|m| m.offset <= offset)
        .last()
        .map(|m| m.page)
        .unwrap_or(default_page)
}

/// Generate anchors for a chunk's text.
///
/// A line qualifies when it matches a section pattern, or when it is an
/// all-uppercase line of `min_heading_chars..max_anchor_chars` characters
/// containing at least one letter. Offsets advance by line length + 1.
pub fn generate_anchors(
    text: &str,
    marks: &[PageMark],
    default_page: u32,
    patterns: &SectionPatternSet,
    policy: &PipelinePolicyV1,
) -> Vec<ContentAnchor> {
    let mut anchors = Vec::new();
    let mut offset = 0usize;

    for line in text.split('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty()
            && (patterns.detect(line).is_some() || is_caps_heading(trimmed, policy))
        {
            anchors.push(ContentAnchor::from_text(
                trimmed,
                page_at(marks, offset, default_page),
                offset,
                policy.max_anchor_chars,
                policy.hash_algorithm,
            ));
        }
        offset += line.len() + 1;
    }

    anchors
}
