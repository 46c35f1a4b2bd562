//! Section differ.
//!
//! Sections match by exact path. The right edition is indexed by path, so for
//! a path that occurs more than once on the right only the last occurrence is
//! matched. Earlier occurrences of a matched path produce no diff entry.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Chunk, DiffStatus, HashPair, ImpactSeverity, Section, SectionDiff};

/// Ordered hashes of the chunks filed under `path`.
fn path_hashes<'a>(chunks: &'a [Chunk], path: &str) -> Vec<&'a str> {
    chunks
        .iter()
        .filter(|c| c.section_path == path)
        .map(|c| c.hash.as_str())
        .collect()
}

/// Pairs at every ordinal where the two hash lists differ.
fn differing_pairs(left: &[&str], right: &[&str]) -> Vec<HashPair> {
    (0..left.len().max(right.len()))
        .filter_map(|i| {
            let l = left.get(i).copied().unwrap_or("");
            let r = right.get(i).copied().unwrap_or("");
            (l != r).then(|| HashPair {
                left: l.to_string(),
                right: r.to_string(),
            })
        })
        .collect()
}

/// Diff the sections of two editions.
///
/// Output order: one entry per left section (in left order), then the
/// unmatched right sections (in right order).
pub fn diff_sections(
    left_sections: &[Section],
    right_sections: &[Section],
    left_chunks: &[Chunk],
    right_chunks: &[Chunk],
) -> Vec<SectionDiff> {
    let right_by_path: BTreeMap<&str, &Section> = right_sections
        .iter()
        .map(|s| (s.path.as_str(), s))
        .collect();
    let mut matched: BTreeSet<&str> = BTreeSet::new();
    let mut diffs = Vec::with_capacity(left_sections.len() + right_sections.len());

    for left in left_sections {
        match right_by_path.get(left.path.as_str()) {
            Some(right) => {
                matched.insert(left.path.as_str());
                let left_hashes = path_hashes(left_chunks, &left.path);
                let right_hashes = path_hashes(right_chunks, &left.path);
                let changed = differing_pairs(&left_hashes, &right_hashes);
                let status = if changed.is_empty() {
                    DiffStatus::Unchanged
                } else {
                    DiffStatus::Modified
                };
                diffs.push(SectionDiff {
                    match_key: left.path.clone(),
                    status,
                    severity: status
                        .is_change()
                        .then(|| ImpactSeverity::for_section_type(right.section_type)),
                    left_section: Some(left.clone()),
                    right_section: Some((*right).clone()),
                    changed_chunk_hashes: changed,
                });
            }
            None => diffs.push(SectionDiff {
                match_key: left.path.clone(),
                status: DiffStatus::Removed,
                severity: Some(ImpactSeverity::for_section_type(left.section_type)),
                left_section: Some(left.clone()),
                right_section: None,
                changed_chunk_hashes: Vec::new(),
            }),
        }
    }

    for right in right_sections {
        if !matched.contains(right.path.as_str()) {
            diffs.push(SectionDiff {
                match_key: right.path.clone(),
                status: DiffStatus::Added,
                severity: Some(ImpactSeverity::for_section_type(right.section_type)),
                left_section: None,
                right_section: Some(right.clone()),
                changed_chunk_hashes: Vec::new(),
            });
        }
    }

    diffs
}
