//! Analysis-layer types: citations, conclusions, open questions and decision gates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::document::SectionType;

/// Overall coverage determination of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Determination {
    /// The loss is covered.
    Covered,
    /// The loss is not covered.
    NotCovered,
    /// Some elements are covered.
    PartiallyCovered,
    /// Not enough information to decide.
    InsufficientInformation,
}

impl Determination {
    /// Confidence assigned to conclusions under this determination.
    pub fn confidence(&self) -> Confidence {
        match self {
            Self::Covered | Self::NotCovered => Confidence::High,
            Self::PartiallyCovered => Confidence::Medium,
            Self::InsufficientInformation => Confidence::Low,
        }
    }

    /// Whether the determination needs supervisor sign-off.
    pub fn requires_supervisor(&self) -> bool {
        matches!(self, Self::NotCovered | Self::PartiallyCovered)
    }
}

impl fmt::Display for Determination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Covered => write!(f, "covered"),
            Self::NotCovered => write!(f, "not_covered"),
            Self::PartiallyCovered => write!(f, "partially_covered"),
            Self::InsufficientInformation => write!(f, "insufficient_information"),
        }
    }
}

/// Free-text structured fields of an existing analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFields {
    /// Coverage determination.
    pub determination: Determination,
    /// Coverages that apply, one statement each.
    #[serde(default)]
    pub applicable_coverages: Vec<String>,
    /// Exclusions that apply.
    #[serde(default)]
    pub relevant_exclusions: Vec<String>,
    /// Conditions and limitations.
    #[serde(default)]
    pub conditions_limitations: Vec<String>,
    /// Recommended next steps.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Legacy page-level citation attached to an analysis before grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingCitation {
    /// Form version cited.
    pub form_version_id: String,
    /// Form display label.
    #[serde(default)]
    pub form_label: Option<String>,
    /// Section path, if known.
    #[serde(default)]
    pub section_path: Option<String>,
    /// Page number.
    pub page: u32,
    /// Quoted text.
    pub excerpt: String,
}

/// A source document analyzed by the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    /// Form version id (key into the section/chunk maps).
    pub form_version_id: String,
    /// Display label, e.g. form number and edition.
    pub form_label: String,
}

/// Citation quality tier, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    /// The anchor itself matches the statement.
    Direct,
    /// The section title matches the statement strongly.
    Supporting,
    /// Weak match.
    Contextual,
}

impl Relevance {
    /// Sort rank; lower ranks sort first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Direct => 0,
            Self::Supporting => 1,
            Self::Contextual => 2,
        }
    }
}

/// Citation of a precise anchor in an ingested form version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseAnchorCitation {
    /// Cited form version.
    pub form_version_id: String,
    /// Display label of the form.
    pub form_label: String,
    /// Section path containing the anchor.
    pub section_path: String,
    /// Type of the containing section.
    pub section_type: SectionType,
    /// Anchor hash.
    pub anchor_hash: String,
    /// Anchor slug.
    pub anchor_slug: String,
    /// Anchor text.
    pub anchor_text: String,
    /// Page of the anchor (>= 1).
    pub page: u32,
    /// Text following the anchor.
    pub excerpt: String,
    /// Citation quality.
    pub relevance: Relevance,
}

/// Kind of grounded conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionType {
    /// A coverage grant applies.
    CoverageGrant,
    /// An exclusion applies.
    ExclusionApplies,
    /// A limitation applies.
    LimitationApplies,
    /// A condition is met.
    ConditionMet,
    /// No coverage was identified.
    NoCoverage,
}

/// Confidence of a conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// High.
    High,
    /// Medium.
    Medium,
    /// Low.
    Low,
}

/// A conclusion of the analysis with its supporting citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitedConclusion {
    /// Sequential id (`conc-N`).
    pub id: String,
    /// Conclusion kind.
    #[serde(rename = "type")]
    pub conclusion_type: ConclusionType,
    /// Statement text, as written in the analysis.
    pub statement: String,
    /// Templated reasoning.
    pub reasoning: String,
    /// Supporting citations, best first.
    pub citations: Vec<ClauseAnchorCitation>,
    /// Confidence.
    pub confidence: Confidence,
    /// 1-based order.
    pub order: usize,
}

/// Origin of an open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    /// The determination itself is insufficient information.
    InsufficientInformation,
    /// A recommendation asks for verification.
    Verification,
    /// The narrative expresses uncertainty.
    Uncertainty,
    /// An endorsement was not available for review.
    EndorsementUnknown,
    /// Outcome depends on state law.
    JurisdictionSpecific,
    /// Only one form was analyzed.
    MissingForms,
}

/// A question that blocks a final determination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenQuestion {
    /// Sequential id (`oq-N`).
    pub id: String,
    /// Question text.
    pub question: String,
    /// Origin of the question.
    pub category: QuestionCategory,
    /// Text that triggered the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    /// Whether the question has been answered.
    pub resolved: bool,
    /// Answer, once resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// Status of a decision gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// Awaiting a decision.
    Pending,
    /// Passed.
    Approved,
    /// Failed.
    Rejected,
    /// Bypassed.
    Skipped,
}

impl GateStatus {
    /// Whether a decision has been recorded.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Ordered workflow checkpoint of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionGate {
    /// Stable gate id (`initial-review`, ...).
    pub id: String,
    /// Display label.
    pub label: String,
    /// Gate description.
    pub description: String,
    /// 1-based order.
    pub order: usize,
    /// Current status.
    pub status: GateStatus,
    /// Role expected to decide the gate.
    pub required_role: String,
    /// Id of the gate that must be decided first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    /// Who decided the gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    /// When the gate was decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Decision notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DecisionGate {
    /// Record an externally made decision on this gate.
    ///
    /// The timestamp is supplied by the caller; the gate never reads a clock.
    pub fn record_decision(
        &mut self,
        status: GateStatus,
        decided_by: impl Into<String>,
        decided_at: DateTime<Utc>,
        notes: Option<String>,
    ) {
        self.status = status;
        self.decided_by = Some(decided_by.into());
        self.decided_at = Some(decided_at);
        self.notes = notes;
    }
}

/// Clause-grounded output of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseGroundedFields {
    /// Grounded conclusions.
    pub conclusions: Vec<CitedConclusion>,
    /// Open questions.
    pub open_questions: Vec<OpenQuestion>,
    /// Decision gates, in order.
    pub decision_gates: Vec<DecisionGate>,
    /// Analysis version (starts at 1).
    pub analysis_version: u32,
    /// Analysis this one supersedes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_analysis_id: Option<String>,
}

impl ClauseGroundedFields {
    /// Look up a gate by id.
    pub fn gate_mut(&mut self, id: &str) -> Option<&mut DecisionGate> {
        self.decision_gates.iter_mut().find(|g| g.id == id)
    }

    /// Number of unresolved questions.
    pub fn unresolved_questions(&self) -> usize {
        self.open_questions.iter().filter(|q| !q.resolved).count()
    }
}
