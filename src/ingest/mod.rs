//! Ingestion engine.
//!
//! Turns per-page text into chunks, sections, warnings and a quality score.
//!
//! ```text
//! pages ─┬─> detect_warnings ───────────────────────────┐
//!        └─> chunk_pages ─> build_sections ─> structure  ├─> score_quality
//!                 │              │            warning ───┘
//!                 └─> anchors    └─> IngestionResult
//! ```

pub mod anchors;
pub mod cache;
pub mod chunker;
pub mod patterns;
pub mod quality;
pub mod sections;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::policy::{PipelinePolicyV1, PolicyError};
use crate::types::{Chunk, PageText, Section, Warning};

pub use anchors::{generate_anchors, PageMark};
pub use cache::{CacheConfig, CacheStats, CachedIngestion, IngestionCache};
pub use chunker::chunk_pages;
pub use patterns::{heading_path, SectionPattern, SectionPatternSet};
pub use quality::{detect_warnings, score_quality, structure_warning, EXTRACTION_FAILURE_MARKER};
pub use sections::{build_sections, summarize};

/// Input of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionInput {
    /// Extracted pages in reading order.
    pub pages: Vec<PageText>,
    /// Form id.
    pub form_id: String,
    /// Form version (edition) id.
    pub form_version_id: String,
}

/// Output of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResult {
    /// Form id.
    pub form_id: String,
    /// Form version id.
    pub form_version_id: String,
    /// Chunks in emission order.
    pub chunks: Vec<Chunk>,
    /// Sections in order.
    pub sections: Vec<Section>,
    /// Extraction warnings.
    pub warnings: Vec<Warning>,
    /// Quality score, 0–100.
    pub quality_score: u8,
    /// Number of input pages.
    pub total_pages: usize,
    /// Total characters reported by the extractor.
    pub total_characters: usize,
    /// Hash of the policy that produced this result.
    pub policy_params_hash: String,
    /// Fingerprint of chunks, sections, warnings and score.
    pub fingerprint: String,
}

/// Deterministic ingestion engine.
#[derive(Debug, Clone)]
pub struct IngestionEngine {
    policy: PipelinePolicyV1,
    patterns: &'static SectionPatternSet,
}

impl IngestionEngine {
    /// Create an engine with a validated policy.
    pub fn new(policy: PipelinePolicyV1) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            policy,
            patterns: SectionPatternSet::standard(),
        })
    }

    /// Get the policy.
    pub fn policy(&self) -> &PipelinePolicyV1 {
        &self.policy
    }

    /// Chunk pages without building sections.
    pub fn chunk(&self, pages: &[PageText]) -> Vec<Chunk> {
        chunk_pages(pages, self.patterns, &self.policy)
    }

    /// Run the full ingestion pipeline.
    pub fn ingest(&self, input: &IngestionInput) -> IngestionResult {
        let mut warnings = detect_warnings(&input.pages);
        let chunks = self.chunk(&input.pages);
        let sections = build_sections(&chunks, &self.policy);

        if !input.pages.is_empty() {
            warnings.extend(structure_warning(&sections));
        }

        let quality_score = score_quality(&input.pages, &chunks, &sections, &warnings);
        let fingerprint = canonical_hash_hex(&(&chunks, &sections, &warnings, quality_score));

        tracing::debug!(
            target: "truth_layer::ingest",
            form_version_id = %input.form_version_id,
            pages = input.pages.len(),
            chunks = chunks.len(),
            sections = sections.len(),
            warnings = warnings.len(),
            quality_score,
            "ingestion complete"
        );

        IngestionResult {
            form_id: input.form_id.clone(),
            form_version_id: input.form_version_id.clone(),
            total_pages: input.pages.len(),
            total_characters: quality::total_characters(&input.pages),
            chunks,
            sections,
            warnings,
            quality_score,
            policy_params_hash: self.policy.params_hash(),
            fingerprint,
        }
    }
}

impl Default for IngestionEngine {
    fn default() -> Self {
        Self {
            policy: PipelinePolicyV1::default(),
            patterns: SectionPatternSet::standard(),
        }
    }
}

/// Ingest with the default policy.
pub fn ingest(input: &IngestionInput) -> IngestionResult {
    IngestionEngine::default().ingest(input)
}
