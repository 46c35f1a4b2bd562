//! Comparison of two versions of a grounded analysis.
//!
//! Conclusions are keyed by statement and questions by question text. Items
//! are listed in current order, followed by prior-only removals.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{CitedConclusion, ClauseGroundedFields, Confidence, ConclusionType, OpenQuestion};

/// How an item differs between two analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Only in the current analysis.
    Added,
    /// Only in the prior analysis.
    Removed,
    /// In both, with a material difference.
    Changed,
    /// In both, identical in the compared fields.
    Unchanged,
}

/// Conclusion-level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConclusionChange {
    /// Conclusion statement (the match key).
    pub statement: String,
    /// Change kind.
    pub kind: ChangeKind,
    /// Type in the prior analysis.
    pub prior_type: Option<ConclusionType>,
    /// Type in the current analysis.
    pub current_type: Option<ConclusionType>,
    /// Confidence in the prior analysis.
    pub prior_confidence: Option<Confidence>,
    /// Confidence in the current analysis.
    pub current_confidence: Option<Confidence>,
}

/// Question-level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionChange {
    /// Question text (the match key).
    pub question: String,
    /// Change kind.
    pub kind: ChangeKind,
    /// Whether the question went from unresolved to resolved.
    pub newly_resolved: bool,
}

/// Counts per change kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    /// Added items.
    pub added: usize,
    /// Removed items.
    pub removed: usize,
    /// Changed items.
    pub changed: usize,
    /// Unchanged items.
    pub unchanged: usize,
}

impl ChangeCounts {
    fn tally(kinds: impl Iterator<Item = ChangeKind>) -> Self {
        kinds.fold(Self::default(), |mut counts, kind| {
            match kind {
                ChangeKind::Added => counts.added += 1,
                ChangeKind::Removed => counts.removed += 1,
                ChangeKind::Changed => counts.changed += 1,
                ChangeKind::Unchanged => counts.unchanged += 1,
            }
            counts
        })
    }
}

/// Summary of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    /// Conclusion counts.
    pub conclusions: ChangeCounts,
    /// Question counts.
    pub questions: ChangeCounts,
    /// Questions resolved since the prior analysis.
    pub newly_resolved: usize,
}

/// Result of comparing two analyses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisComparison {
    /// Prior analysis version.
    pub prior_version: u32,
    /// Current analysis version.
    pub current_version: u32,
    /// Conclusion changes.
    pub conclusions: Vec<ConclusionChange>,
    /// Question changes.
    pub questions: Vec<QuestionChange>,
    /// Summary counts.
    pub summary: ComparisonSummary,
}

fn compare_conclusions(prior: &[CitedConclusion], current: &[CitedConclusion]) -> Vec<ConclusionChange> {
    let mut prior_by_statement: BTreeMap<&str, &CitedConclusion> = BTreeMap::new();
    for c in prior {
        prior_by_statement.entry(c.statement.as_str()).or_insert(c);
    }
    let mut changes = Vec::with_capacity(prior.len().max(current.len()));
    let mut seen = BTreeSet::new();

    for c in current {
        if !seen.insert(c.statement.as_str()) {
            continue;
        }
        let before = prior_by_statement.get(c.statement.as_str()).copied();
        let kind = match before {
            None => ChangeKind::Added,
            Some(p) if p.conclusion_type != c.conclusion_type || p.confidence != c.confidence => {
                ChangeKind::Changed
            }
            Some(_) => ChangeKind::Unchanged,
        };
        changes.push(ConclusionChange {
            statement: c.statement.clone(),
            kind,
            prior_type: before.map(|p| p.conclusion_type),
            current_type: Some(c.conclusion_type),
            prior_confidence: before.map(|p| p.confidence),
            current_confidence: Some(c.confidence),
        });
    }

    for p in prior {
        if seen.insert(p.statement.as_str()) {
            changes.push(ConclusionChange {
                statement: p.statement.clone(),
                kind: ChangeKind::Removed,
                prior_type: Some(p.conclusion_type),
                current_type: None,
                prior_confidence: Some(p.confidence),
                current_confidence: None,
            });
        }
    }
    changes
}

fn compare_questions(prior: &[OpenQuestion], current: &[OpenQuestion]) -> Vec<QuestionChange> {
    let mut prior_by_text: BTreeMap<&str, &OpenQuestion> = BTreeMap::new();
    for q in prior {
        prior_by_text.entry(q.question.as_str()).or_insert(q);
    }
    let mut changes = Vec::with_capacity(prior.len().max(current.len()));
    let mut seen = BTreeSet::new();

    for q in current {
        if !seen.insert(q.question.as_str()) {
            continue;
        }
        let (kind, newly_resolved) = match prior_by_text.get(q.question.as_str()) {
            None => (ChangeKind::Added, false),
            Some(p) if p.resolved != q.resolved => (ChangeKind::Changed, !p.resolved && q.resolved),
            Some(_) => (ChangeKind::Unchanged, false),
        };
        changes.push(QuestionChange {
            question: q.question.clone(),
            kind,
            newly_resolved,
        });
    }

    for p in prior {
        if seen.insert(p.question.as_str()) {
            changes.push(QuestionChange {
                question: p.question.clone(),
                kind: ChangeKind::Removed,
                newly_resolved: false,
            });
        }
    }
    changes
}

/// Compare a prior and a current grounded analysis.
pub fn compare_analyses(prior: &ClauseGroundedFields, current: &ClauseGroundedFields) -> AnalysisComparison {
    let conclusions = compare_conclusions(&prior.conclusions, &current.conclusions);
    let questions = compare_questions(&prior.open_questions, &current.open_questions);
    let summary = ComparisonSummary {
        conclusions: ChangeCounts::tally(conclusions.iter().map(|c| c.kind)),
        questions: ChangeCounts::tally(questions.iter().map(|q| q.kind)),
        newly_resolved: questions.iter().filter(|q| q.newly_resolved).count(),
    };

    AnalysisComparison {
        prior_version: prior.analysis_version,
        current_version: current.analysis_version,
        conclusions,
        questions,
        summary,
    }
}
