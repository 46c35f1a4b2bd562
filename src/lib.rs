//! # contract-truth-layer
//!
//! Deterministic ingestion, redlining and citation grounding for contract
//! and insurance-form text.
//!
//! The truth layer answers one question:
//!
//! > Which exact passage of which edition of which form supports this statement?
//!
//! ## Core Contract
//!
//! 1. Turn extracted page text into chunks, sections and content anchors whose
//!    identity is a pure function of the text
//! 2. Compare two editions section by section and chunk by chunk, and derive
//!    the downstream entities the change may affect
//! 3. Ground an existing coverage analysis in anchor-level citations, open
//!    questions and decision gates
//!
//! ## Architecture
//!
//! ```text
//! pages → IngestionEngine → chunks/sections/anchors ─┬→ RedlineEngine → diffs + impact
//!              ↓                                      └→ GroundingEngine → conclusions
//!      PipelinePolicyV1 (params_hash)                                      + questions + gates
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same text + same policy → identical chunk hashes, anchors and fingerprint
//! - No clocks, randomness or I/O inside the engines
//! - Keyed inputs use `BTreeMap` so canonical hashes are order-stable

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod canonical;
pub mod hashing;
pub mod error;
pub mod ingest;
pub mod redline;
pub mod grounding;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    Chunk, ContentAnchor, PageText, Section, SectionType, Warning, WarningSeverity, WarningType,
};
pub use types::{
    ChunkDiff, ClauseLink, DiffStatus, FormUse, ImpactCandidate, ImpactSeverity,
    ImpactTargetType, RedlineStats, SectionDiff,
};
pub use types::{
    CitedConclusion, ClauseAnchorCitation, ClauseGroundedFields, Confidence, ConclusionType,
    DecisionGate, Determination, ExistingCitation, GateStatus, OpenQuestion, QuestionCategory,
    Relevance, SourceDocument, StructuredFields,
};
pub use policy::{PipelinePolicyV1, PolicyError};
pub use error::TruthLayerError;
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use hashing::HashAlgorithm;
pub use ingest::{
    ingest, CacheConfig, CacheStats, IngestionCache, IngestionEngine, IngestionInput,
    IngestionResult,
};
pub use redline::{compute_redline, RedlineEngine, RedlineInput, RedlineResult};
pub use grounding::{
    compare_analyses, ground_analysis, next_version, resolve_question, AnalysisComparison,
    GroundingEngine, GroundingInput, GroundingResult,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState, PolicyRegistry, PolicyRef};

/// Schema version for all truth layer types.
/// Increment on breaking changes to any schema type.
pub const TRUTH_LAYER_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "pipeline_policy_v1";
