//! Section-pattern detection.
//!
//! Headings are recognized by an ordered rule list. The **first** rule that
//! matches a line decides its section type. Each rule also carries a
//! `priority`, which is recorded for consumers but never consulted when
//! several rules could match the same line.

use regex_lite::Regex;
use std::sync::OnceLock;

use crate::hashing::{collapse_whitespace, truncate_chars};
use crate::types::SectionType;

/// Optional `SECTION <n> –` prefix shared by keyword rules.
const SECTION_PREFIX: &str = r"^\s*(?:SECTION\s+[IVX0-9]+\s*[-–—:.]?\s*)?";

/// Rule table: (keyword pattern, section type, priority).
const RULES: &[(&str, SectionType, u8)] = &[
    (r"(?:COMMON\s+POLICY\s+)?DECLARATIONS?\b", SectionType::Declarations, 100),
    (r"INSURING\s+AGREEMENTS?\b", SectionType::InsuringAgreement, 95),
    (r"COVERAGES?(?:\s+[A-Z0-9]{1,2}\b|\s*[-–—:.]|\s*$)", SectionType::Coverage, 90),
    (r"EXCLUSIONS?\b", SectionType::Exclusion, 90),
    (r"(?:[A-Z]+\s+){0,4}CONDITIONS?\b", SectionType::Condition, 80),
    (r"DEFINITIONS?\b", SectionType::Definition, 80),
    (r"LIMITS?\s+OF\s+(?:INSURANCE|LIABILITY)\b", SectionType::Limits, 85),
    (r"DEDUCTIBLES?\b", SectionType::Deductibles, 70),
    (r"(?:THIS\s+)?ENDORSEMENT\b", SectionType::Endorsement, 60),
    (r"SCHEDULE\b", SectionType::Schedule, 50),
];

/// Generic `SECTION <n>` heading without a recognized keyword.
const GENERIC_SECTION_RULE: &str = r"^\s*SECTION\s+[IVX0-9]+\b";

/// One heading rule.
#[derive(Debug)]
pub struct SectionPattern {
    regex: Regex,
    /// Section type assigned to matching lines.
    pub section_type: SectionType,
    /// Recorded priority (not used for tie-breaking).
    pub priority: u8,
}

impl SectionPattern {
    /// Compile a rule.
    pub fn new(pattern: &str, section_type: SectionType, priority: u8) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            section_type,
            priority,
        })
    }

    /// Whether the rule matches `line`.
    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Ordered heading rules.
#[derive(Debug)]
pub struct SectionPatternSet {
    rules: Vec<SectionPattern>,
}

impl SectionPatternSet {
    /// Build a set from explicit rules, keeping their order.
    pub fn new(rules: Vec<SectionPattern>) -> Self {
        Self { rules }
    }

    /// Compile the standard insurance-form rules.
    pub fn compile_standard() -> Result<Self, regex_lite::Error> {
        let mut rules = RULES
            .iter()
            .map(|(keyword, section_type, priority)| {
                SectionPattern::new(&format!("{}{}", SECTION_PREFIX, keyword), *section_type, *priority)
            })
            .collect::<Result<Vec<_>, _>>()?;
        rules.push(SectionPattern::new(GENERIC_SECTION_RULE, SectionType::General, 10)?);
        Ok(Self::new(rules))
    }

    /// Shared standard rule set, compiled once per process.
    pub fn standard() -> &'static SectionPatternSet {
        static STANDARD: OnceLock<SectionPatternSet> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Self::compile_standard().expect("standard section patterns are valid")
        })
    }

    /// First rule matching `line`, in list order.
    pub fn detect(&self, line: &str) -> Option<&SectionPattern> {
        self.rules.iter().find(|rule| rule.matches(line))
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[SectionPattern] {
        &self.rules
    }
}

/// Section path for a heading line: trimmed, whitespace collapsed, capped.
pub fn heading_path(line: &str, max_chars: usize) -> String {
    let collapsed = collapse_whitespace(line);
    truncate_chars(&collapsed, max_chars).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(line: &str) -> Option<SectionType> {
        SectionPatternSet::standard().detect(line).map(|r| r.section_type)
    }

    #[test]
    fn test_standard_rules_compile() {
        let set = SectionPatternSet::compile_standard().unwrap();
        assert_eq!(set.rules().len(), RULES.len() + 1);
    }

    #[test]
    fn test_keyword_headings() {
        assert_eq!(detect("DECLARATIONS"), Some(SectionType::Declarations));
        assert_eq!(detect("COMMON POLICY DECLARATIONS"), Some(SectionType::Declarations));
        assert_eq!(detect("INSURING AGREEMENT"), Some(SectionType::InsuringAgreement));
        assert_eq!(detect("COVERAGE A – BODILY INJURY AND PROPERTY DAMAGE"), Some(SectionType::Coverage));
        assert_eq!(detect("EXCLUSIONS"), Some(SectionType::Exclusion));
        assert_eq!(detect("COMMERCIAL GENERAL LIABILITY CONDITIONS"), Some(SectionType::Condition));
        assert_eq!(detect("DEFINITIONS"), Some(SectionType::Definition));
        assert_eq!(detect("LIMITS OF INSURANCE"), Some(SectionType::Limits));
        assert_eq!(detect("DEDUCTIBLES"), Some(SectionType::Deductibles));
        assert_eq!(detect("THIS ENDORSEMENT CHANGES THE POLICY."), Some(SectionType::Endorsement));
        assert_eq!(detect("SCHEDULE"), Some(SectionType::Schedule));
    }

    #[test]
    fn test_section_prefix() {
        assert_eq!(detect("SECTION I – COVERAGES"), Some(SectionType::Coverage));
        assert_eq!(detect("SECTION IV - CONDITIONS"), Some(SectionType::Condition));
        assert_eq!(detect("SECTION V"), Some(SectionType::General));
    }

    #[test]
    fn test_body_text_is_not_a_heading() {
        assert_eq!(detect("We will pay those sums that the insured becomes obligated"), None);
        assert_eq!(detect("Exclusions apply as described below."), None);
        assert_eq!(detect("COVERAGE FORM"), None);
        assert_eq!(detect(""), None);
    }

    #[test]
    fn test_first_match_wins_over_priority() {
        // Matches both the exclusion rule and the condition rule; exclusion is listed first.
        let line = "EXCLUSIONS AND CONDITIONS";
        assert_eq!(detect(line), Some(SectionType::Exclusion));

        let reordered = SectionPatternSet::new(vec![
            SectionPattern::new(r"^EXCLUSIONS", SectionType::Exclusion, 1).unwrap(),
            SectionPattern::new(r"CONDITIONS", SectionType::Condition, 200).unwrap(),
        ]);
        assert_eq!(
            reordered.detect(line).map(|r| r.section_type),
            Some(SectionType::Exclusion)
        );
    }

    #[test]
    fn test_heading_path() {
        assert_eq!(heading_path("  SECTION I  –   COVERAGES ", 120), "SECTION I – COVERAGES");
        assert_eq!(heading_path("ABCDEF", 3), "ABC");
    }
}
