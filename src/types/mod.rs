//! Core types for the truth layer.

pub mod document;
pub mod warning;
pub mod redline;
pub mod grounding;

pub use document::{
    chunk_id, parse_chunk_id, Chunk, ContentAnchor, PageText, Section, SectionType,
    UnknownSectionType, ROOT_SECTION_PATH, ROOT_SECTION_TITLE,
};
pub use warning::{Warning, WarningSeverity, WarningType};
pub use redline::{
    chunk_match_key, ChunkDiff, ClauseLink, DiffStatus, FormUse, HashPair, ImpactCandidate,
    ImpactSeverity, ImpactTargetType, RedlineStats, SectionDiff,
};
pub use grounding::{
    CitedConclusion, ClauseAnchorCitation, ClauseGroundedFields, Confidence, ConclusionType,
    DecisionGate, Determination, ExistingCitation, GateStatus, OpenQuestion, QuestionCategory,
    Relevance, SourceDocument, StructuredFields,
};
