//! Decision gates.
//!
//! ```text
//! initial-review ─> [open-questions] ─> [supervisor-review] ─> final-determination
//! ```
//!
//! `open-questions` exists only when questions were raised and
//! `supervisor-review` only for `not_covered`/`partially_covered`.

use crate::types::{DecisionGate, Determination, GateStatus};

/// Gate id of the first review.
pub const INITIAL_REVIEW: &str = "initial-review";
/// Gate id for resolving open questions.
pub const OPEN_QUESTIONS: &str = "open-questions";
/// Gate id for supervisor sign-off.
pub const SUPERVISOR_REVIEW: &str = "supervisor-review";
/// Gate id of the final determination.
pub const FINAL_DETERMINATION: &str = "final-determination";

/// Build the pending gate chain for an analysis.
pub fn build_decision_gates(determination: Determination, open_questions: usize) -> Vec<DecisionGate> {
    let plan = [
        Some((
            INITIAL_REVIEW,
            "Initial Review",
            "Review the grounded conclusions and their citations.",
            "adjuster",
        )),
        (open_questions > 0).then_some((
            OPEN_QUESTIONS,
            "Resolve Open Questions",
            "Answer or dismiss every open question raised by the analysis.",
            "adjuster",
        )),
        determination.requires_supervisor().then_some((
            SUPERVISOR_REVIEW,
            "Supervisor Review",
            "A supervisor confirms the denial or partial coverage position.",
            "supervisor",
        )),
        Some((
            FINAL_DETERMINATION,
            "Final Determination",
            "Record the final coverage determination.",
            "adjuster",
        )),
    ];

    let mut gates: Vec<DecisionGate> = Vec::with_capacity(plan.len());
    for (id, label, description, role) in plan.into_iter().flatten() {
        let depends_on = gates.last().map(|g| g.id.clone());
        gates.push(DecisionGate {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            order: gates.len() + 1,
            status: GateStatus::Pending,
            required_role: role.to_string(),
            depends_on,
            decided_by: None,
            decided_at: None,
            notes: None,
        });
    }
    gates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(gates: &[DecisionGate]) -> Vec<&str> {
        gates.iter().map(|g| g.id.as_str()).collect()
    }

    #[test]
    fn test_covered_without_questions() {
        let gates = build_decision_gates(Determination::Covered, 0);
        assert_eq!(ids(&gates), vec![INITIAL_REVIEW, FINAL_DETERMINATION]);
        assert_eq!(gates[1].depends_on.as_deref(), Some(INITIAL_REVIEW));
        assert!(gates.iter().all(|g| g.status == GateStatus::Pending));
    }

    #[test]
    fn test_full_chain() {
        let gates = build_decision_gates(Determination::PartiallyCovered, 2);
        assert_eq!(
            ids(&gates),
            vec![INITIAL_REVIEW, OPEN_QUESTIONS, SUPERVISOR_REVIEW, FINAL_DETERMINATION]
        );
        let orders: Vec<_> = gates.iter().map(|g| g.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
        assert_eq!(gates[0].depends_on, None);
        assert_eq!(gates[3].depends_on.as_deref(), Some(SUPERVISOR_REVIEW));
        assert_eq!(gates[2].required_role, "supervisor");
    }

    #[test]
    fn test_not_covered_needs_supervisor() {
        let gates = build_decision_gates(Determination::NotCovered, 0);
        assert_eq!(ids(&gates), vec![INITIAL_REVIEW, SUPERVISOR_REVIEW, FINAL_DETERMINATION]);
    }
}
