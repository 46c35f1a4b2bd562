//! Clause grounding engine.
//!
//! Upgrades a free-text coverage analysis into conclusions backed by anchor
//! citations, a list of open questions and a chain of decision gates.

pub mod citations;
pub mod compare;
pub mod conclusions;
pub mod gates;
pub mod questions;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use crate::policy::{PipelinePolicyV1, PolicyError};
use crate::types::{
    Chunk, ClauseGroundedFields, ExistingCitation, Section, SourceDocument, StructuredFields,
};

pub use citations::{significant_words, CitationMatcher};
pub use compare::{
    compare_analyses, AnalysisComparison, ChangeCounts, ChangeKind, ComparisonSummary,
    ConclusionChange, QuestionChange,
};
pub use conclusions::build_conclusions;
pub use gates::build_decision_gates;
pub use questions::detect_open_questions;

/// Version of a first analysis.
pub const INITIAL_ANALYSIS_VERSION: u32 = 1;

/// An existing analysis plus the ingested forms it was written against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingInput {
    /// Structured fields of the analysis.
    pub structured_fields: StructuredFields,
    /// Legacy citations attached to the analysis.
    #[serde(default)]
    pub existing_citations: Vec<ExistingCitation>,
    /// Sections keyed by form version id.
    #[serde(default)]
    pub sections_by_form_version: BTreeMap<String, Vec<Section>>,
    /// Chunks keyed by form version id.
    #[serde(default)]
    pub chunks_by_form_version: BTreeMap<String, Vec<Chunk>>,
    /// Source forms, in search order.
    #[serde(default)]
    pub sources: Vec<SourceDocument>,
    /// Narrative of the analysis.
    #[serde(default)]
    pub output_markdown: String,
    /// Version to stamp on the output (defaults to 1).
    #[serde(default)]
    pub analysis_version: Option<u32>,
    /// Analysis this one supersedes.
    #[serde(default)]
    pub prior_analysis_id: Option<String>,
}

/// Grounded fields plus their fingerprint, as returned over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingResult {
    /// Grounded fields.
    #[serde(flatten)]
    pub fields: ClauseGroundedFields,
    /// Fingerprint of the grounded fields.
    pub fingerprint: String,
}

impl From<ClauseGroundedFields> for GroundingResult {
    fn from(fields: ClauseGroundedFields) -> Self {
        let fingerprint = canonical_hash_hex(&fields);
        Self { fields, fingerprint }
    }
}

/// Deterministic grounding engine.
#[derive(Debug, Clone, Default)]
pub struct GroundingEngine {
    policy: PipelinePolicyV1,
}

impl GroundingEngine {
    /// Create an engine with a validated policy.
    pub fn new(policy: PipelinePolicyV1) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Get the policy.
    pub fn policy(&self) -> &PipelinePolicyV1 {
        &self.policy
    }

    /// Ground an analysis.
    pub fn ground(&self, input: &GroundingInput) -> ClauseGroundedFields {
        let matcher = CitationMatcher::new(
            &input.sources,
            &input.sections_by_form_version,
            &input.chunks_by_form_version,
            &self.policy,
        );
        let fields = &input.structured_fields;
        let conclusions = build_conclusions(fields, &matcher, &input.existing_citations);
        let open_questions = detect_open_questions(fields, &input.output_markdown, &input.sources);
        let decision_gates = build_decision_gates(fields.determination, open_questions.len());

        tracing::debug!(
            target: "truth_layer::grounding",
            determination = %fields.determination,
            sources = input.sources.len(),
            conclusions = conclusions.len(),
            citations = conclusions.iter().map(|c| c.citations.len()).sum::<usize>(),
            open_questions = open_questions.len(),
            decision_gates = decision_gates.len(),
            "grounding complete"
        );

        ClauseGroundedFields {
            conclusions,
            open_questions,
            decision_gates,
            analysis_version: input.analysis_version.unwrap_or(INITIAL_ANALYSIS_VERSION),
            prior_analysis_id: input.prior_analysis_id.clone(),
        }
    }
}

/// Ground with the default policy.
pub fn ground_analysis(input: &GroundingInput) -> ClauseGroundedFields {
    GroundingEngine::default().ground(input)
}

/// Version number for the analysis that supersedes `prior`.
pub fn next_version(prior: &ClauseGroundedFields) -> u32 {
    prior.analysis_version.saturating_add(1)
}

/// Mark the question `id` resolved. Returns whether it was found.
pub fn resolve_question(fields: &mut ClauseGroundedFields, id: &str, resolution: impl Into<String>) -> bool {
    match fields.open_questions.iter_mut().find(|q| q.id == id) {
        Some(question) => {
            question.resolved = true;
            question.resolution = Some(resolution.into());
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Determination;

    fn input(determination: Determination) -> GroundingInput {
        GroundingInput {
            structured_fields: StructuredFields {
                determination,
                applicable_coverages: vec![],
                relevant_exclusions: vec![],
                conditions_limitations: vec![],
                recommendations: vec!["Confirm the date of loss".into()],
            },
            existing_citations: vec![],
            sections_by_form_version: BTreeMap::new(),
            chunks_by_form_version: BTreeMap::new(),
            sources: vec![],
            output_markdown: String::new(),
            analysis_version: None,
            prior_analysis_id: None,
        }
    }

    #[test]
    fn test_defaults_to_first_version() {
        let fields = ground_analysis(&input(Determination::Covered));
        assert_eq!(fields.analysis_version, INITIAL_ANALYSIS_VERSION);
        assert_eq!(next_version(&fields), 2);
    }

    #[test]
    fn test_gates_follow_questions() {
        let fields = ground_analysis(&input(Determination::Covered));
        assert_eq!(fields.open_questions.len(), 1);
        let ids: Vec<_> = fields.decision_gates.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["initial-review", "open-questions", "final-determination"]);
    }

    #[test]
    fn test_resolve_question() {
        let mut fields = ground_analysis(&input(Determination::Covered));
        assert!(resolve_question(&mut fields, "oq-1", "Loss occurred 2024-03-02"));
        assert!(!resolve_question(&mut fields, "oq-9", "n/a"));
        assert_eq!(fields.unresolved_questions(), 0);
        assert_eq!(fields.open_questions[0].resolution.as_deref(), Some("Loss occurred 2024-03-02"));
    }

    #[test]
    fn test_result_fingerprint_flattens() {
        let result = GroundingResult::from(ground_analysis(&input(Determination::NotCovered)));
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("decisionGates").is_some());
        assert_eq!(json["fingerprint"].as_str().map(str::len), Some(16));
    }
}
