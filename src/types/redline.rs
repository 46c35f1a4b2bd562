//! Redline types: section/chunk diffs, relation records and impact candidates.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::document::{Chunk, Section, SectionType};

/// Outcome of matching one entity across two editions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Present on both sides with identical content.
    Unchanged,
    /// Present on both sides with different content.
    Modified,
    /// Only in the right (newer) edition.
    Added,
    /// Only in the left (older) edition.
    Removed,
}

impl DiffStatus {
    /// Whether the entity changed in any way.
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Modified => write!(f, "modified"),
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// Severity of a change for downstream impact.
///
/// Ordered `Low < Medium < High` so the document severity is a `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactSeverity {
    /// Cosmetic or administrative.
    Low,
    /// Changes how coverage is applied.
    Medium,
    /// Changes what is covered.
    High,
}

impl ImpactSeverity {
    /// Severity of a change to a section of the given type.
    pub fn for_section_type(section_type: SectionType) -> Self {
        match section_type {
            SectionType::Coverage
            | SectionType::Exclusion
            | SectionType::InsuringAgreement
            | SectionType::Limits => Self::High,
            SectionType::Condition | SectionType::Definition | SectionType::Deductibles => {
                Self::Medium
            }
            SectionType::Declarations
            | SectionType::Endorsement
            | SectionType::Schedule
            | SectionType::General => Self::Low,
        }
    }
}

impl fmt::Display for ImpactSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A pair of chunk hashes at one ordinal position of a modified section.
///
/// A missing position on the shorter side is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashPair {
    /// Left-edition hash.
    pub left: String,
    /// Right-edition hash.
    pub right: String,
}

/// Diff of one section path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDiff {
    /// Section path.
    pub match_key: String,
    /// Diff outcome.
    pub status: DiffStatus,
    /// Left-edition section.
    pub left_section: Option<Section>,
    /// Right-edition section.
    pub right_section: Option<Section>,
    /// Differing chunk hashes (only for `Modified`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_chunk_hashes: Vec<HashPair>,
    /// Impact severity of this change (absent when unchanged).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ImpactSeverity>,
}

impl SectionDiff {
    /// Type of whichever side is present, preferring the right edition.
    pub fn section_type(&self) -> SectionType {
        self.right_section
            .as_ref()
            .or(self.left_section.as_ref())
            .map(|s| s.section_type)
            .unwrap_or(SectionType::General)
    }
}

/// Diff of one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDiff {
    /// `sectionPath::index` of the chunk the match was keyed on.
    pub match_key: String,
    /// Diff outcome.
    pub status: DiffStatus,
    /// Left-edition chunk.
    pub left_chunk: Option<Chunk>,
    /// Right-edition chunk.
    pub right_chunk: Option<Chunk>,
}

/// Build a chunk match key.
pub fn chunk_match_key(section_path: &str, index: usize) -> String {
    format!("{}::{}", section_path, index)
}

/// Record linking a form to a product (and optionally a coverage and state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormUse {
    /// Record id.
    pub id: String,
    /// Product using the form.
    pub product_id: String,
    /// Product display name.
    pub product_name: String,
    /// Coverage the form attaches to.
    #[serde(default)]
    pub coverage_id: Option<String>,
    /// Coverage display name.
    #[serde(default)]
    pub coverage_name: Option<String>,
    /// State (jurisdiction) code.
    #[serde(default)]
    pub state: Option<String>,
}

/// Record linking a form section to a clause (and optionally a rule).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseLink {
    /// Record id.
    pub id: String,
    /// Linked clause.
    pub clause_id: String,
    /// Clause display name.
    pub clause_name: String,
    /// Rule that references the clause.
    #[serde(default)]
    pub rule_id: Option<String>,
    /// Rule display name.
    #[serde(default)]
    pub rule_name: Option<String>,
    /// Section path the link is pinned to; `None` means the whole form.
    #[serde(default)]
    pub section_path: Option<String>,
}

/// Kind of downstream entity an impact candidate points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTargetType {
    /// Product.
    Product,
    /// Coverage.
    Coverage,
    /// Rating/underwriting rule.
    Rule,
    /// State filing.
    State,
    /// Clause library entry.
    Clause,
}

impl fmt::Display for ImpactTargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Coverage => write!(f, "coverage"),
            Self::Rule => write!(f, "rule"),
            Self::State => write!(f, "state"),
            Self::Clause => write!(f, "clause"),
        }
    }
}

/// A downstream entity potentially affected by the redline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactCandidate {
    /// Entity kind.
    pub target_type: ImpactTargetType,
    /// Entity id.
    pub target_id: String,
    /// Entity display label.
    pub target_label: String,
    /// Why the entity is affected.
    pub reason: String,
    /// Changed section paths behind this candidate.
    pub affected_section_keys: Vec<String>,
    /// Impact severity.
    pub severity: ImpactSeverity,
}

/// Aggregate counts over a redline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedlineStats {
    /// Number of section diffs.
    pub total_sections: usize,
    /// Unchanged sections.
    pub unchanged_sections: usize,
    /// Modified sections.
    pub modified_sections: usize,
    /// Added sections.
    pub added_sections: usize,
    /// Removed sections.
    pub removed_sections: usize,
    /// Number of chunk diffs.
    pub total_chunks: usize,
    /// Unchanged chunks.
    pub unchanged_chunks: usize,
    /// Modified chunks.
    pub modified_chunks: usize,
    /// Added chunks.
    pub added_chunks: usize,
    /// Removed chunks.
    pub removed_chunks: usize,
    /// Number of impact candidates.
    pub impact_candidates: usize,
    /// Impact candidates with high severity.
    pub high_severity_impacts: usize,
}

impl RedlineStats {
    /// Whether any section changed.
    pub fn has_changes(&self) -> bool {
        self.modified_sections + self.added_sections + self.removed_sections > 0
    }
}
