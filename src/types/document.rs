//! Document structure types: pages, anchors, chunks and sections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Section path used for text that precedes the first detected heading.
pub const ROOT_SECTION_PATH: &str = "root";

/// Title given to the section built from [`ROOT_SECTION_PATH`] chunks.
pub const ROOT_SECTION_TITLE: &str = "Document";

/// Extracted text of one page, as delivered by the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    /// 1-based page number.
    pub page_number: u32,
    /// Raw extracted text.
    pub text: String,
    /// Character count reported by the extractor.
    pub char_count: usize,
}

impl PageText {
    /// Create a page, computing `char_count` from the text.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        Self {
            page_number,
            text,
            char_count,
        }
    }
}

/// Closed set of section classifications.
///
/// Ordered by declaration; `General` is the catch-all for headings that
/// carry no contractual meaning of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// Declarations page (named insured, policy period, premiums).
    Declarations,
    /// Insuring agreement.
    InsuringAgreement,
    /// A coverage part (Coverage A, Coverage B, ...).
    Coverage,
    /// Exclusions.
    Exclusion,
    /// Conditions.
    Condition,
    /// Definitions.
    Definition,
    /// Limits of insurance / liability.
    Limits,
    /// Deductibles.
    Deductibles,
    /// Endorsement text.
    Endorsement,
    /// Schedules.
    Schedule,
    /// Any other heading.
    General,
}

impl SectionType {
    /// All section types in declaration order.
    pub const ALL: [SectionType; 11] = [
        Self::Declarations,
        Self::InsuringAgreement,
        Self::Coverage,
        Self::Exclusion,
        Self::Condition,
        Self::Definition,
        Self::Limits,
        Self::Deductibles,
        Self::Endorsement,
        Self::Schedule,
        Self::General,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declarations => "declarations",
            Self::InsuringAgreement => "insuring_agreement",
            Self::Coverage => "coverage",
            Self::Exclusion => "exclusion",
            Self::Condition => "condition",
            Self::Definition => "definition",
            Self::Limits => "limits",
            Self::Deductibles => "deductibles",
            Self::Endorsement => "endorsement",
            Self::Schedule => "schedule",
            Self::General => "general",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Declarations => "Declarations",
            Self::InsuringAgreement => "Insuring Agreement",
            Self::Coverage => "Coverage",
            Self::Exclusion => "Exclusion",
            Self::Condition => "Condition",
            Self::Definition => "Definition",
            Self::Limits => "Limits",
            Self::Deductibles => "Deductibles",
            Self::Endorsement => "Endorsement",
            Self::Schedule => "Schedule",
            Self::General => "General",
        }
    }

    /// Whether this type counts as detected structure for quality scoring.
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::General)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that is not the wire name of any [`SectionType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown section type: {0}")]
pub struct UnknownSectionType(pub String);

impl FromStr for SectionType {
    type Err = UnknownSectionType;

    /// Parse a wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSectionType(s.to_string()))
    }
}

/// Stable pointer to a heading-like line inside a chunk.
///
/// `hash` and `slug` are pure functions of `anchor_text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnchor {
    /// Hash of `anchor_text`.
    pub hash: String,
    /// URL-safe slug of `anchor_text`.
    pub slug: String,
    /// Trimmed heading line, at most 120 characters.
    pub anchor_text: String,
    /// Page the heading line was read from.
    pub page: u32,
    /// Byte offset of the line start within the chunk text.
    pub offset: usize,
}

/// A contiguous run of text between two flushed section boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// 0-based sequential index within one ingestion run.
    pub index: usize,
    /// Raw chunk text.
    pub text: String,
    /// First page contributing text.
    pub page_start: u32,
    /// Last page contributing text.
    pub page_end: u32,
    /// Every page contributing text, ascending.
    #[serde(default)]
    pub pages: Vec<u32>,
    /// Heading anchors found in the text, in line order.
    pub anchors: Vec<ContentAnchor>,
    /// Heading path the chunk belongs to.
    pub section_path: String,
    /// Hash of `text`.
    pub hash: String,
    /// Number of characters in `text`.
    pub char_count: usize,
    /// Detected section type; `None` when no heading preceded the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
}

impl Chunk {
    /// Synthetic chunk id referenced from [`Section::chunk_ids`].
    pub fn chunk_id(&self) -> String {
        chunk_id(self.index)
    }

    /// Section type, defaulting to `General`.
    pub fn effective_type(&self) -> SectionType {
        self.section_type.unwrap_or(SectionType::General)
    }
}

/// Synthetic id for the chunk at `index`.
pub fn chunk_id(index: usize) -> String {
    format!("chunk-{}", index)
}

/// Parse a synthetic chunk id back to its index.
pub fn parse_chunk_id(id: &str) -> Option<usize> {
    id.strip_prefix("chunk-")?.parse().ok()
}

/// One or more adjacent chunks sharing a heading path and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Display title.
    pub title: String,
    /// Section classification.
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// Anchors of all member chunks, in order.
    pub anchors: Vec<ContentAnchor>,
    /// Sorted, de-duplicated pages covered.
    pub page_refs: Vec<u32>,
    /// Whitespace-collapsed prefix of the section text.
    pub summary: String,
    /// 0-based sequential order.
    pub order: usize,
    /// Heading path (match key for redlining).
    pub path: String,
    /// Synthetic ids of member chunks.
    pub chunk_ids: Vec<String>,
}

impl Section {
    /// Indices of member chunks, skipping malformed ids.
    pub fn chunk_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunk_ids.iter().filter_map(|id| parse_chunk_id(id))
    }
}
