//! Redline aggregate counts.

use crate::types::{ChunkDiff, DiffStatus, ImpactCandidate, ImpactSeverity, RedlineStats, SectionDiff};

#[derive(Default)]
struct StatusCounts {
    unchanged: usize,
    modified: usize,
    added: usize,
    removed: usize,
}

impl StatusCounts {
    fn tally(statuses: impl Iterator<Item = DiffStatus>) -> Self {
        statuses.fold(Self::default(), |mut counts, status| {
            match status {
                DiffStatus::Unchanged => counts.unchanged += 1,
                DiffStatus::Modified => counts.modified += 1,
                DiffStatus::Added => counts.added += 1,
                DiffStatus::Removed => counts.removed += 1,
            }
            counts
        })
    }
}

/// Count diffs by status and impact candidates by severity.
pub fn compute_stats(
    section_diffs: &[SectionDiff],
    chunk_diffs: &[ChunkDiff],
    impact_candidates: &[ImpactCandidate],
) -> RedlineStats {
    let sections = StatusCounts::tally(section_diffs.iter().map(|d| d.status));
    let chunks = StatusCounts::tally(chunk_diffs.iter().map(|d| d.status));

    RedlineStats {
        total_sections: section_diffs.len(),
        unchanged_sections: sections.unchanged,
        modified_sections: sections.modified,
        added_sections: sections.added,
        removed_sections: sections.removed,
        total_chunks: chunk_diffs.len(),
        unchanged_chunks: chunks.unchanged,
        modified_chunks: chunks.modified,
        added_chunks: chunks.added,
        removed_chunks: chunks.removed,
        impact_candidates: impact_candidates.len(),
        high_severity_impacts: impact_candidates
            .iter()
            .filter(|c| c.severity == ImpactSeverity::High)
            .count(),
    }
}
