//! Cited conclusions.

use crate::types::{
    CitedConclusion, ConclusionType, Determination, ExistingCitation, SectionType,
    StructuredFields,
};

use super::citations::CitationMatcher;

/// Section types searched for coverage statements.
pub const COVERAGE_SECTIONS: &[SectionType] = &[SectionType::Coverage, SectionType::InsuringAgreement];
/// Section types searched for exclusion statements.
pub const EXCLUSION_SECTIONS: &[SectionType] = &[SectionType::Exclusion];
/// Section types searched for condition and limitation statements.
pub const CONDITION_SECTIONS: &[SectionType] = &[
    SectionType::Condition,
    SectionType::Limits,
    SectionType::Deductibles,
];

/// Statement of the synthetic conclusion added when nothing is covered.
pub const NO_COVERAGE_STATEMENT: &str = "No coverage applies to this loss under the analyzed forms.";

impl ConclusionType {
    /// Type of a conditions/limitations item.
    pub fn for_condition(statement: &str) -> Self {
        if statement.to_lowercase().contains("limit") {
            Self::LimitationApplies
        } else {
            Self::ConditionMet
        }
    }

    /// Section types whose text can support a conclusion of this type.
    /// `None` means every section.
    pub fn citation_whitelist(&self) -> Option<&'static [SectionType]> {
        match self {
            Self::CoverageGrant => Some(COVERAGE_SECTIONS),
            Self::ExclusionApplies => Some(EXCLUSION_SECTIONS),
            Self::LimitationApplies | Self::ConditionMet => Some(CONDITION_SECTIONS),
            Self::NoCoverage => None,
        }
    }

    fn reasoning(&self, statement: &str, determination: Determination) -> String {
        match self {
            Self::CoverageGrant => format!(
                "The cited insuring provisions grant coverage for: {} (determination: {}).",
                statement, determination
            ),
            Self::ExclusionApplies => format!(
                "The cited exclusion removes coverage for: {} (determination: {}).",
                statement, determination
            ),
            Self::LimitationApplies => format!(
                "The cited limits or deductible provisions restrict recovery: {}.",
                statement
            ),
            Self::ConditionMet => format!(
                "Coverage depends on the cited policy condition: {}.",
                statement
            ),
            Self::NoCoverage => format!(
                "No insuring agreement in the analyzed forms was identified as applicable (determination: {}).",
                determination
            ),
        }
    }
}

/// Build one conclusion per structured item, in the order coverages,
/// exclusions, conditions/limitations.
///
/// Statements are trimmed. An item that is empty or whitespace-only yields no
/// conclusion and takes no id or order, so ids stay contiguous (`conc-1`,
/// `conc-2`, ...) over the items that remain. A `not_covered` determination
/// with an empty coverage list appends a final `no_coverage` conclusion.
pub fn build_conclusions(
    fields: &StructuredFields,
    matcher: &CitationMatcher<'_>,
    existing: &[ExistingCitation],
) -> Vec<CitedConclusion> {
    let items = fields
        .applicable_coverages
        .iter()
        .map(|s| (s.as_str(), ConclusionType::CoverageGrant))
        .chain(
            fields
                .relevant_exclusions
                .iter()
                .map(|s| (s.as_str(), ConclusionType::ExclusionApplies)),
        )
        .chain(
            fields
                .conditions_limitations
                .iter()
                .map(|s| (s.as_str(), ConclusionType::for_condition(s))),
        )
        .map(|(s, t)| (s.trim(), t))
        .filter(|(s, _)| !s.is_empty());

    let synthetic = (fields.determination == Determination::NotCovered
        && fields.applicable_coverages.is_empty())
    .then_some((NO_COVERAGE_STATEMENT, ConclusionType::NoCoverage));

    let confidence = fields.determination.confidence();
    items
        .chain(synthetic)
        .enumerate()
        .map(|(i, (statement, conclusion_type))| {
            let order = i + 1;
            CitedConclusion {
                id: format!("conc-{}", order),
                conclusion_type,
                statement: statement.to_string(),
                reasoning: conclusion_type.reasoning(statement, fields.determination),
                citations: matcher.cite(statement, conclusion_type.citation_whitelist(), existing),
                confidence,
                order,
            }
        })
        .collect()
}
