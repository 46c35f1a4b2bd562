//! Chunk differ.
//!
//! Chunks match on `(section_path, index)` first. When the exact key is
//! missing, the chunk's ordinal among same-path chunks on the left is used to
//! pick the chunk at the same ordinal on the right, which tolerates
//! renumbering caused by inserted or deleted sections elsewhere.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{chunk_match_key, Chunk, ChunkDiff, DiffStatus};

/// Positions of chunks grouped by section path, in emission order.
fn group_by_path(chunks: &[Chunk]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (pos, chunk) in chunks.iter().enumerate() {
        groups.entry(chunk.section_path.as_str()).or_default().push(pos);
    }
    groups
}

/// Diff the chunks of two editions.
///
/// Output order: one entry per left chunk, then unmatched right chunks.
pub fn diff_chunks(left_chunks: &[Chunk], right_chunks: &[Chunk]) -> Vec<ChunkDiff> {
    let right_by_key: BTreeMap<(&str, usize), usize> = right_chunks
        .iter()
        .enumerate()
        .map(|(pos, c)| ((c.section_path.as_str(), c.index), pos))
        .collect();
    let left_groups = group_by_path(left_chunks);
    let right_groups = group_by_path(right_chunks);
    let mut matched_right: BTreeSet<usize> = BTreeSet::new();
    let mut diffs = Vec::with_capacity(left_chunks.len() + right_chunks.len());

    for (left_pos, left) in left_chunks.iter().enumerate() {
        let path = left.section_path.as_str();
        let exact = right_by_key
            .get(&(path, left.index))
            .copied()
            .filter(|pos| !matched_right.contains(pos));
        let positional = || {
            let ordinal = left_groups.get(path)?.iter().position(|&p| p == left_pos)?;
            right_groups
                .get(path)?
                .get(ordinal)
                .copied()
                .filter(|pos| !matched_right.contains(pos))
        };

        let match_key = chunk_match_key(path, left.index);
        match exact.or_else(positional) {
            Some(right_pos) => {
                matched_right.insert(right_pos);
                let right = &right_chunks[right_pos];
                let status = if left.hash == right.hash {
                    DiffStatus::Unchanged
                } else {
                    DiffStatus::Modified
                };
                diffs.push(ChunkDiff {
                    match_key,
                    status,
                    left_chunk: Some(left.clone()),
                    right_chunk: Some(right.clone()),
                });
            }
            None => diffs.push(ChunkDiff {
                match_key,
                status: DiffStatus::Removed,
                left_chunk: Some(left.clone()),
                right_chunk: None,
            }),
        }
    }

    for (right_pos, right) in right_chunks.iter().enumerate() {
        if !matched_right.contains(&right_pos) {
            diffs.push(ChunkDiff {
                match_key: chunk_match_key(&right.section_path, right.index),
                status: DiffStatus::Added,
                left_chunk: None,
                right_chunk: Some(right.clone()),
            });
        }
    }

    diffs
}
