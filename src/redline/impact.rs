//! Impact analysis.
//!
//! Maps changed sections onto the products, coverages, states, rules and
//! clauses that reference the form.
//!
//! | Source      | Candidate | Severity          |
//! |-------------|-----------|-------------------|
//! | form use    | product   | document severity |
//! | form use    | coverage  | document severity |
//! | form use    | state     | low               |
//! | clause link | rule      | medium            |
//! | clause link | clause    | medium            |
//!
//! The document severity is the highest severity among changed sections.

use std::collections::BTreeSet;

use crate::types::{
    ClauseLink, FormUse, ImpactCandidate, ImpactSeverity, ImpactTargetType, SectionDiff,
};

/// Accumulates candidates, keeping the first per `(target_type, target_id)`.
#[derive(Default)]
struct CandidateSet {
    seen: BTreeSet<(ImpactTargetType, String)>,
    candidates: Vec<ImpactCandidate>,
}

impl CandidateSet {
    fn push(&mut self, candidate: ImpactCandidate) {
        let key = (candidate.target_type, candidate.target_id.clone());
        if self.seen.insert(key) {
            self.candidates.push(candidate);
        }
    }
}

/// Highest per-section severity over the changed sections.
pub fn document_severity(section_diffs: &[SectionDiff]) -> Option<ImpactSeverity> {
    section_diffs
        .iter()
        .filter(|d| d.status.is_change())
        .map(|d| {
            d.severity
                .unwrap_or_else(|| ImpactSeverity::for_section_type(d.section_type()))
        })
        .max()
}

/// Derive impact candidates from a set of section diffs.
///
/// Returns an empty list when every section is unchanged. `form_label` names
/// the form in candidate reasons.
pub fn compute_impact(
    section_diffs: &[SectionDiff],
    form_uses: &[FormUse],
    clause_links: &[ClauseLink],
    form_label: &str,
) -> Vec<ImpactCandidate> {
    let Some(severity) = document_severity(section_diffs) else {
        return Vec::new();
    };
    let changed: Vec<String> = section_diffs
        .iter()
        .filter(|d| d.status.is_change())
        .map(|d| d.match_key.clone())
        .collect();
    let mut set = CandidateSet::default();

    for form_use in form_uses {
        set.push(ImpactCandidate {
            target_type: ImpactTargetType::Product,
            target_id: form_use.product_id.clone(),
            target_label: form_use.product_name.clone(),
            reason: format!(
                "{} is used by product {} and has {} changed section(s)",
                form_label,
                form_use.product_name,
                changed.len()
            ),
            affected_section_keys: changed.clone(),
            severity,
        });

        if let Some(coverage_id) = &form_use.coverage_id {
            let label = form_use
                .coverage_name
                .clone()
                .unwrap_or_else(|| coverage_id.clone());
            set.push(ImpactCandidate {
                target_type: ImpactTargetType::Coverage,
                target_id: coverage_id.clone(),
                reason: format!("{} is attached to coverage {}", form_label, label),
                target_label: label,
                affected_section_keys: changed.clone(),
                severity,
            });
        }

        if let Some(state) = &form_use.state {
            set.push(ImpactCandidate {
                target_type: ImpactTargetType::State,
                target_id: state.clone(),
                target_label: state.clone(),
                reason: format!("{} is filed in {} and may need a refiling", form_label, state),
                affected_section_keys: changed.clone(),
                severity: ImpactSeverity::Low,
            });
        }
    }

    for link in clause_links {
        let affected = match &link.section_path {
            Some(path) if changed.contains(path) => vec![path.clone()],
            Some(_) => continue,
            None => changed.clone(),
        };

        if let Some(rule_id) = &link.rule_id {
            let label = link.rule_name.clone().unwrap_or_else(|| rule_id.clone());
            set.push(ImpactCandidate {
                target_type: ImpactTargetType::Rule,
                target_id: rule_id.clone(),
                reason: format!("Rule {} references clause {}", label, link.clause_name),
                target_label: label,
                affected_section_keys: affected.clone(),
                severity: ImpactSeverity::Medium,
            });
        }

        set.push(ImpactCandidate {
            target_type: ImpactTargetType::Clause,
            target_id: link.clause_id.clone(),
            target_label: link.clause_name.clone(),
            reason: format!("Clause {} is linked to changed text in {}", link.clause_name, form_label),
            affected_section_keys: affected,
            severity: ImpactSeverity::Medium,
        });
    }

    set.candidates
}
