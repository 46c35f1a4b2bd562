//! Redline engine.
//!
//! Compares the ingested sections and chunks of two editions of one form and
//! derives the downstream entities the change may affect.

pub mod chunks;
pub mod impact;
pub mod sections;
pub mod stats;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::policy::{PipelinePolicyV1, PolicyError};
use crate::types::{
    Chunk, ChunkDiff, ClauseLink, FormUse, ImpactCandidate, RedlineStats, Section, SectionDiff,
};

pub use chunks::diff_chunks;
pub use impact::{compute_impact, document_severity};
pub use sections::diff_sections;
pub use stats::compute_stats;

/// Two editions of a form plus the records that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedlineInput {
    /// Form id.
    pub form_id: String,
    /// Form number, e.g. `CG 00 01`.
    pub form_number: String,
    /// Form title.
    pub form_title: String,
    /// Older edition id.
    pub left_version_id: String,
    /// Older edition date.
    #[serde(default)]
    pub left_edition_date: Option<String>,
    /// Newer edition id.
    pub right_version_id: String,
    /// Newer edition date.
    #[serde(default)]
    pub right_edition_date: Option<String>,
    /// Sections of the older edition.
    #[serde(default)]
    pub left_sections: Vec<Section>,
    /// Sections of the newer edition.
    #[serde(default)]
    pub right_sections: Vec<Section>,
    /// Chunks of the older edition.
    #[serde(default)]
    pub left_chunks: Vec<Chunk>,
    /// Chunks of the newer edition.
    #[serde(default)]
    pub right_chunks: Vec<Chunk>,
    /// Products/coverages/states using the form.
    #[serde(default)]
    pub form_uses: Vec<FormUse>,
    /// Clauses linked to the form.
    #[serde(default)]
    pub clause_links: Vec<ClauseLink>,
}

impl RedlineInput {
    /// Display label for the form, e.g. `CG 00 01 (Commercial General Liability)`.
    pub fn form_label(&self) -> String {
        match (self.form_number.is_empty(), self.form_title.is_empty()) {
            (false, false) => format!("{} ({})", self.form_number, self.form_title),
            (false, true) => self.form_number.clone(),
            (true, false) => self.form_title.clone(),
            (true, true) => self.form_id.clone(),
        }
    }
}

/// Output of one redline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedlineResult {
    /// Section diffs: left order, then added sections.
    pub section_diffs: Vec<SectionDiff>,
    /// Chunk diffs: left order, then added chunks.
    pub chunk_diffs: Vec<ChunkDiff>,
    /// Potentially affected downstream entities.
    pub impact_candidates: Vec<ImpactCandidate>,
    /// Aggregate counts.
    pub stats: RedlineStats,
    /// Hash of the policy that produced this result.
    pub policy_params_hash: String,
    /// Fingerprint of diffs, candidates and stats.
    pub fingerprint: String,
}

/// Deterministic redline engine.
#[derive(Debug, Clone, Default)]
pub struct RedlineEngine {
    policy: PipelinePolicyV1,
}

impl RedlineEngine {
    /// Create an engine with a validated policy.
    pub fn new(policy: PipelinePolicyV1) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Get the policy.
    pub fn policy(&self) -> &PipelinePolicyV1 {
        &self.policy
    }

    /// Diff two editions.
    pub fn compute(&self, input: &RedlineInput) -> RedlineResult {
        let section_diffs = diff_sections(
            &input.left_sections,
            &input.right_sections,
            &input.left_chunks,
            &input.right_chunks,
        );
        let chunk_diffs = diff_chunks(&input.left_chunks, &input.right_chunks);
        let impact_candidates = compute_impact(
            &section_diffs,
            &input.form_uses,
            &input.clause_links,
            &input.form_label(),
        );
        let stats = compute_stats(&section_diffs, &chunk_diffs, &impact_candidates);
        let fingerprint =
            canonical_hash_hex(&(&section_diffs, &chunk_diffs, &impact_candidates, &stats));

        tracing::debug!(
            target: "truth_layer::redline",
            form_id = %input.form_id,
            left_version_id = %input.left_version_id,
            right_version_id = %input.right_version_id,
            modified_sections = stats.modified_sections,
            added_sections = stats.added_sections,
            removed_sections = stats.removed_sections,
            impact_candidates = stats.impact_candidates,
            "redline complete"
        );

        RedlineResult {
            section_diffs,
            chunk_diffs,
            impact_candidates,
            stats,
            policy_params_hash: self.policy.params_hash(),
            fingerprint,
        }
    }
}

/// Redline with the default policy.
pub fn compute_redline(input: &RedlineInput) -> RedlineResult {
    RedlineEngine::default().compute(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ingest, IngestionInput};
    use crate::types::{DiffStatus, PageText};

    fn edition(version: &str, text: &str) -> (Vec<Section>, Vec<Chunk>) {
        let result = ingest(&IngestionInput {
            pages: vec![PageText::new(1, text)],
            form_id: "form-1".into(),
            form_version_id: version.into(),
        });
        (result.sections, result.chunks)
    }

    fn input(left: &str, right: &str) -> RedlineInput {
        let (left_sections, left_chunks) = edition("fv-1", left);
        let (right_sections, right_chunks) = edition("fv-2", right);
        RedlineInput {
            form_id: "form-1".into(),
            form_number: "CG 00 01".into(),
            form_title: "Commercial General Liability".into(),
            left_version_id: "fv-1".into(),
            left_edition_date: Some("2019-04".into()),
            right_version_id: "fv-2".into(),
            right_edition_date: Some("2024-01".into()),
            left_sections,
            right_sections,
            left_chunks,
            right_chunks,
            form_uses: vec![],
            clause_links: vec![],
        }
    }

    const TEXT: &str = "DECLARATIONS\nThe named insured and mailing address are shown in the schedule attached to this policy form.\nEXCLUSIONS\nThis insurance does not apply to expected or intended injury caused by the insured party.";

    #[test]
    fn test_identical_editions_unchanged() {
        let result = compute_redline(&input(TEXT, TEXT));
        assert!(result
            .section_diffs
            .iter()
            .all(|d| d.status == DiffStatus::Unchanged));
        assert!(result.impact_candidates.is_empty());
        assert!(!result.stats.has_changes());
    }

    #[test]
    fn test_form_label_fallbacks() {
        let mut redline = input("", "");
        assert_eq!(redline.form_label(), "CG 00 01 (Commercial General Liability)");
        redline.form_title.clear();
        assert_eq!(redline.form_label(), "CG 00 01");
        redline.form_number.clear();
        assert_eq!(redline.form_label(), "form-1");
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let changed = TEXT.replace("intended", "deliberate");
        let a = compute_redline(&input(TEXT, &changed));
        let b = compute_redline(&input(TEXT, &changed));
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, compute_redline(&input(TEXT, TEXT)).fingerprint);
    }
}
