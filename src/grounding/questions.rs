//! Open-question detection.
//!
//! Questions are raised, in this order, from:
//! 1. an `insufficient_information` determination
//! 2. recommendations asking to verify, confirm or obtain something
//! 3. uncertainty in the narrative
//! 4. endorsements described as unavailable
//! 5. discussion of state variance
//! 6. a single analyzed source form

use regex_lite::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::types::{Determination, OpenQuestion, QuestionCategory, SourceDocument, StructuredFields};

struct Markers {
    verification: Regex,
    uncertainty: Regex,
    endorsement: Regex,
    unavailable: Regex,
    jurisdiction: Regex,
}

fn markers() -> &'static Markers {
    static MARKERS: OnceLock<Markers> = OnceLock::new();
    MARKERS.get_or_init(|| Markers {
        verification: Regex::new(r"(?i)verif|confirm|obtain|review additional|check whether")
            .expect("verification pattern is valid"),
        uncertainty: Regex::new(
            r"(?i)\b(?:cannot (?:be )?determined?|unable to determine|insufficient information|unclear whether|if the insured)\b",
        )
        .expect("uncertainty pattern is valid"),
        endorsement: Regex::new(r"(?i)\bendorsements?\b").expect("endorsement pattern is valid"),
        unavailable: Regex::new(
            r"(?i)\b(?:not (?:been )?(?:available|provided|included|reviewed|attached)|unavailable|unknown|missing)\b",
        )
        .expect("unavailable pattern is valid"),
        jurisdiction: Regex::new(
            r"(?i)\b(?:jurisdictions?|state[- ]specific|state laws?|varies by state|vary by state|depending on the state|state variations?)\b",
        )
        .expect("jurisdiction pattern is valid"),
    })
}

const INSUFFICIENT_QUESTION: &str =
    "What additional information is needed to reach a coverage determination?";
const ENDORSEMENT_QUESTION: &str =
    "Which endorsements are attached to the policy, and do any of them change this determination?";
const JURISDICTION_QUESTION: &str =
    "Which state's law governs the policy, and does it change this determination?";

/// Sentences of a markdown narrative, with list and heading markers removed.
fn sentences(markdown: &str) -> impl Iterator<Item = &str> {
    markdown
        .split(|c: char| matches!(c, '.' | '?' | '!' | '\n'))
        .map(|s| s.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '#' | '*' | '-' | '>')))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Questions in detection order, de-duplicated by text.
#[derive(Default)]
struct QuestionList {
    seen: BTreeSet<String>,
    questions: Vec<OpenQuestion>,
}

impl QuestionList {
    fn push(&mut self, question: String, category: QuestionCategory, source_text: Option<&str>) {
        if !self.seen.insert(question.clone()) {
            return;
        }
        self.questions.push(OpenQuestion {
            id: format!("oq-{}", self.questions.len() + 1),
            question,
            category,
            source_text: source_text.map(str::to_string),
            resolved: false,
            resolution: None,
        });
    }
}

/// Detect the open questions of an analysis.
pub fn detect_open_questions(
    fields: &StructuredFields,
    output_markdown: &str,
    sources: &[SourceDocument],
) -> Vec<OpenQuestion> {
    let markers = markers();
    let mut list = QuestionList::default();

    if fields.determination == Determination::InsufficientInformation {
        list.push(
            INSUFFICIENT_QUESTION.to_string(),
            QuestionCategory::InsufficientInformation,
            None,
        );
    }

    for recommendation in &fields.recommendations {
        let recommendation = recommendation.trim();
        if markers.verification.is_match(recommendation) {
            let text = recommendation.trim_end_matches(['.', '!', '?']);
            list.push(
                format!("Has this been completed: {}?", text),
                QuestionCategory::Verification,
                Some(recommendation),
            );
        }
    }

    for sentence in sentences(output_markdown) {
        if markers.uncertainty.is_match(sentence) {
            list.push(
                format!("Can this be resolved: {}?", sentence),
                QuestionCategory::Uncertainty,
                Some(sentence),
            );
        }
        if markers.endorsement.is_match(sentence) && markers.unavailable.is_match(sentence) {
            list.push(
                ENDORSEMENT_QUESTION.to_string(),
                QuestionCategory::EndorsementUnknown,
                Some(sentence),
            );
        }
        if markers.jurisdiction.is_match(sentence) {
            list.push(
                JURISDICTION_QUESTION.to_string(),
                QuestionCategory::JurisdictionSpecific,
                Some(sentence),
            );
        }
    }

    if let [only] = sources {
        list.push(
            format!(
                "Are there other forms or endorsements on the policy that should be reviewed alongside {}?",
                only.form_label
            ),
            QuestionCategory::MissingForms,
            None,
        );
    }

    list.questions
}
