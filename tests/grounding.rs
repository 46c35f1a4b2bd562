//! Grounding integration tests.
//!
//! A three-page liability form is ingested once and an analysis written
//! against it is grounded, re-grounded and compared.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use contract_truth_layer::grounding::{ChangeKind, GroundingResult, INITIAL_ANALYSIS_VERSION};
use contract_truth_layer::hashing::djb2_hex;
use contract_truth_layer::{
    compare_analyses, ground_analysis, ingest, next_version, resolve_question, ConclusionType,
    Confidence, Determination, ExistingCitation, GateStatus, GroundingEngine, GroundingInput,
    IngestionInput, PageText, PipelinePolicyV1, QuestionCategory, Relevance, SectionType,
    SourceDocument, StructuredFields,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

const FORM_VERSION: &str = "fv-cg0001-0413";
const FORM_LABEL: &str = "CG 00 01 04 13";

const COVERAGE_STATEMENT: &str = "Coverage A bodily injury liability applies to the fall";
const EXCLUSION_STATEMENT: &str = "The exclusions for expected or intended injury do not apply";
const CONDITION_STATEMENT: &str = "The insured must give notice of an occurrence as soon as practicable";

fn form_pages() -> Vec<PageText> {
    vec![
        PageText::new(
            1,
            format!(
                "COVERAGE A BODILY INJURY LIABILITY\n{}",
                "We will pay those sums that the insured becomes legally obligated to pay as damages. ".repeat(3)
            ),
        ),
        PageText::new(
            2,
            format!(
                "EXCLUSIONS\nEXPECTED OR INTENDED INJURY\n{}\nPOLLUTION\n{}",
                "Bodily injury expected or intended from the standpoint of the insured. ".repeat(2),
                "Bodily injury arising out of the discharge of pollutants. ".repeat(2)
            ),
        ),
        PageText::new(
            3,
            format!(
                "SECTION IV – CONDITIONS\nDUTIES IN THE EVENT OF OCCURRENCE\n{}",
                "You must see to it that we are notified as soon as practicable of an occurrence. ".repeat(2)
            ),
        ),
    ]
}

fn structured_fields(determination: Determination) -> StructuredFields {
    StructuredFields {
        determination,
        applicable_coverages: vec![COVERAGE_STATEMENT.to_string()],
        relevant_exclusions: vec![EXCLUSION_STATEMENT.to_string(), "   ".to_string()],
        conditions_limitations: vec![CONDITION_STATEMENT.to_string()],
        recommendations: vec![
            "Verify whether the insured gave timely notice.".to_string(),
            "Pay the undisputed amount".to_string(),
        ],
    }
}

const NARRATIVE: &str = "## Analysis\n\
    It is unclear whether the pollutant was released suddenly.\n\
    The endorsements were not provided.\n\
    Coverage varies by state.";

fn grounding_input(determination: Determination) -> GroundingInput {
    let edition = ingest(&IngestionInput {
        pages: form_pages(),
        form_id: "form-cg0001".to_string(),
        form_version_id: FORM_VERSION.to_string(),
    });
    GroundingInput {
        structured_fields: structured_fields(determination),
        existing_citations: vec![ExistingCitation {
            form_version_id: FORM_VERSION.to_string(),
            form_label: None,
            section_path: Some("SECTION IV – CONDITIONS".to_string()),
            page: 3,
            excerpt: "DUTIES IN THE EVENT OF OCCURRENCE\nYou must see to it that we are notified as soon as practicable.".to_string(),
        }],
        sections_by_form_version: BTreeMap::from([(FORM_VERSION.to_string(), edition.sections)]),
        chunks_by_form_version: BTreeMap::from([(FORM_VERSION.to_string(), edition.chunks)]),
        sources: vec![SourceDocument {
            form_version_id: FORM_VERSION.to_string(),
            form_label: FORM_LABEL.to_string(),
        }],
        output_markdown: NARRATIVE.to_string(),
        analysis_version: None,
        prior_analysis_id: None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conclusions and Citations
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_conclusions_follow_structured_fields() {
    let fields = ground_analysis(&grounding_input(Determination::PartiallyCovered));

    let conclusions: Vec<_> = fields
        .conclusions
        .iter()
        .map(|c| (c.id.as_str(), c.order, c.conclusion_type, c.confidence))
        .collect();
    assert_eq!(
        conclusions,
        vec![
            ("conc-1", 1, ConclusionType::CoverageGrant, Confidence::Medium),
            ("conc-2", 2, ConclusionType::ExclusionApplies, Confidence::Medium),
            ("conc-3", 3, ConclusionType::ConditionMet, Confidence::Medium),
        ]
    );
}

#[test]
fn test_citations_are_complete() {
    let fields = ground_analysis(&grounding_input(Determination::PartiallyCovered));

    let citations: Vec<_> = fields.conclusions.iter().flat_map(|c| c.citations.iter()).collect();
    assert!(!citations.is_empty());
    for citation in citations {
        assert!(!citation.form_version_id.is_empty());
        assert!(!citation.section_path.is_empty());
        assert!(!citation.anchor_hash.is_empty());
        assert!(citation.page >= 1);
        assert_eq!(citation.form_label, FORM_LABEL);
    }
}

#[test]
fn test_coverage_citation_is_direct() {
    let fields = ground_analysis(&grounding_input(Determination::Covered));

    let citations = &fields.conclusions[0].citations;
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0].relevance, Relevance::Direct);
    assert_eq!(citations[0].section_type, SectionType::Coverage);
    assert_eq!(citations[0].anchor_text, "COVERAGE A BODILY INJURY LIABILITY");
    assert_eq!(citations[0].page, 1);
}

#[test]
fn test_exclusion_citations_ranked_and_whitelisted() {
    let fields = ground_analysis(&grounding_input(Determination::PartiallyCovered));

    let citations = &fields.conclusions[1].citations;
    let ranked: Vec<_> = citations
        .iter()
        .map(|c| (c.anchor_text.as_str(), c.relevance))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("EXPECTED OR INTENDED INJURY", Relevance::Direct),
            ("EXCLUSIONS", Relevance::Contextual),
        ]
    );
    assert!(citations.iter().all(|c| c.section_type == SectionType::Exclusion));
    assert!(citations.iter().all(|c| c.page == 2));
    assert!(citations[0].excerpt.starts_with("EXPECTED OR INTENDED INJURY"));
}

#[test]
fn test_unmatched_condition_falls_back_to_existing_citation() {
    let fields = ground_analysis(&grounding_input(Determination::PartiallyCovered));

    let citations = &fields.conclusions[2].citations;
    assert_eq!(citations.len(), 1);
    let citation = &citations[0];
    assert_eq!(citation.relevance, Relevance::Contextual);
    assert_eq!(citation.anchor_hash, djb2_hex("DUTIES IN THE EVENT OF OCCURRENCE"));
    assert_eq!(citation.section_type, SectionType::Condition);
    assert_eq!(citation.section_path, "SECTION IV – CONDITIONS");
    assert_eq!(citation.page, 3);
}

#[test]
fn test_not_covered_adds_no_coverage_conclusion() {
    let mut input = grounding_input(Determination::NotCovered);
    input.structured_fields.applicable_coverages.clear();
    let fields = ground_analysis(&input);

    let last = fields.conclusions.last().unwrap();
    assert_eq!(last.conclusion_type, ConclusionType::NoCoverage);
    assert_eq!(last.order, fields.conclusions.len());
    assert_eq!(last.confidence, Confidence::High);
}

#[test]
fn test_max_citations_policy() {
    let mut policy = PipelinePolicyV1::default();
    policy.max_citations = 1;
    let engine = GroundingEngine::new(policy).unwrap();
    let fields = engine.ground(&grounding_input(Determination::PartiallyCovered));

    assert!(fields.conclusions.iter().all(|c| c.citations.len() <= 1));
    assert_eq!(fields.conclusions[1].citations[0].relevance, Relevance::Direct);
}

// ─────────────────────────────────────────────────────────────────────────────
// Open Questions and Gates
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_open_questions_in_detection_order() {
    let fields = ground_analysis(&grounding_input(Determination::PartiallyCovered));

    let questions: Vec<_> = fields
        .open_questions
        .iter()
        .map(|q| (q.id.as_str(), q.category))
        .collect();
    assert_eq!(
        questions,
        vec![
            ("oq-1", QuestionCategory::Verification),
            ("oq-2", QuestionCategory::Uncertainty),
            ("oq-3", QuestionCategory::EndorsementUnknown),
            ("oq-4", QuestionCategory::JurisdictionSpecific),
            ("oq-5", QuestionCategory::MissingForms),
        ]
    );
    assert_eq!(
        fields.open_questions[0].question,
        "Has this been completed: Verify whether the insured gave timely notice?"
    );
    assert!(fields.open_questions[4].question.contains(FORM_LABEL));
    assert!(fields.open_questions.iter().all(|q| !q.resolved));
}

#[test]
fn test_gate_chain_for_partial_coverage() {
    let fields = ground_analysis(&grounding_input(Determination::PartiallyCovered));

    let gates: Vec<_> = fields
        .decision_gates
        .iter()
        .map(|g| (g.order, g.id.as_str(), g.required_role.as_str(), g.depends_on.as_deref()))
        .collect();
    assert_eq!(
        gates,
        vec![
            (1, "initial-review", "adjuster", None),
            (2, "open-questions", "adjuster", Some("initial-review")),
            (3, "supervisor-review", "supervisor", Some("open-questions")),
            (4, "final-determination", "adjuster", Some("supervisor-review")),
        ]
    );
    assert!(fields.decision_gates.iter().all(|g| g.status == GateStatus::Pending));
}

#[test]
fn test_record_gate_decision() {
    let mut fields = ground_analysis(&grounding_input(Determination::Covered));
    let at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap();

    let gate = fields.gate_mut("initial-review").unwrap();
    gate.record_decision(GateStatus::Approved, "adjuster-7", at, Some("Citations checked".into()));

    let gate = &fields.decision_gates[0];
    assert_eq!(gate.status, GateStatus::Approved);
    assert_eq!(gate.decided_by.as_deref(), Some("adjuster-7"));
    assert_eq!(gate.decided_at, Some(at));
    assert!(fields.gate_mut("no-such-gate").is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Versioning and Comparison
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_regrounding_is_deterministic() {
    let input = grounding_input(Determination::PartiallyCovered);
    let a = GroundingResult::from(ground_analysis(&input));
    let b = GroundingResult::from(ground_analysis(&input));

    assert_eq!(a, b);
    assert_eq!(a.fields.analysis_version, INITIAL_ANALYSIS_VERSION);
}

#[test]
fn test_resolve_then_compare() {
    let input = grounding_input(Determination::PartiallyCovered);
    let prior = ground_analysis(&input);

    let mut next = input.clone();
    next.analysis_version = Some(next_version(&prior));
    next.prior_analysis_id = Some("analysis-1".to_string());
    let mut current = ground_analysis(&next);
    assert!(resolve_question(&mut current, "oq-1", "Notice was given on day two"));
    assert!(!resolve_question(&mut current, "oq-99", "n/a"));
    assert_eq!(current.unresolved_questions(), 4);

    let comparison = compare_analyses(&prior, &current);
    assert_eq!((comparison.prior_version, comparison.current_version), (1, 2));
    assert_eq!(comparison.summary.conclusions.unchanged, 3);
    assert_eq!(comparison.summary.questions.changed, 1);
    assert_eq!(comparison.summary.newly_resolved, 1);
    assert_eq!(comparison.questions[0].kind, ChangeKind::Changed);
    assert!(comparison.questions[0].newly_resolved);
}

#[test]
fn test_compare_after_determination_change() {
    let prior = ground_analysis(&grounding_input(Determination::PartiallyCovered));
    let mut input = grounding_input(Determination::NotCovered);
    input.structured_fields.applicable_coverages.clear();
    let current = ground_analysis(&input);

    let comparison = compare_analyses(&prior, &current);
    let kinds: Vec<_> = comparison
        .conclusions
        .iter()
        .map(|c| (c.statement.as_str(), c.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (EXCLUSION_STATEMENT, ChangeKind::Changed),
            (CONDITION_STATEMENT, ChangeKind::Changed),
            (
                "No coverage applies to this loss under the analyzed forms.",
                ChangeKind::Added
            ),
            (COVERAGE_STATEMENT, ChangeKind::Removed),
        ]
    );
    assert_eq!(comparison.conclusions[0].prior_confidence, Some(Confidence::Medium));
    assert_eq!(comparison.conclusions[0].current_confidence, Some(Confidence::High));
}

#[test]
fn test_grounding_result_wire_shape() {
    let result = GroundingResult::from(ground_analysis(&grounding_input(Determination::Covered)));
    let json = serde_json::to_value(&result).unwrap();

    assert!(json.get("conclusions").is_some());
    assert!(json.get("openQuestions").is_some());
    assert!(json.get("decisionGates").is_some());
    assert_eq!(json["analysisVersion"], 1);
    assert_eq!(json["conclusions"][0]["type"], "coverage_grant");
    assert_eq!(json["fingerprint"].as_str().map(str::len), Some(16));

    let back: GroundingResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}
