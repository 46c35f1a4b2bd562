//! Citation matching.
//!
//! Scores sections and anchors of the analyzed form versions against a
//! free-text statement using significant-word overlap.
//!
//! ```text
//! sectionScore = |title words ∩ statement|     (skip section when 0)
//! anchorScore  = |anchor words ∩ statement|
//!
//! include   anchorScore > 0 or sectionScore ≥ 2
//! direct    anchorScore ≥ 2
//! supporting sectionScore ≥ 2
//! contextual otherwise
//! ```
//!
//! A word is significant when it has more than three characters. Containment
//! is tested against the lower-cased statement.

use std::collections::{BTreeMap, BTreeSet};

use crate::hashing::slice_bytes;
use crate::policy::PipelinePolicyV1;
use crate::types::{
    Chunk, ClauseAnchorCitation, ContentAnchor, ExistingCitation, Relevance, Section,
    SectionType, SourceDocument, ROOT_SECTION_PATH,
};

const MIN_WORD_CHARS: usize = 4;

/// Distinct lower-cased words of more than three characters.
pub fn significant_words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Number of significant words of `text` contained in `statement_lc`.
fn overlap(text: &str, statement_lc: &str) -> usize {
    significant_words(text)
        .iter()
        .filter(|w| statement_lc.contains(w.as_str()))
        .count()
}

fn relevance(anchor_score: usize, section_score: usize) -> Relevance {
    if anchor_score >= 2 {
        Relevance::Direct
    } else if section_score >= 2 {
        Relevance::Supporting
    } else {
        Relevance::Contextual
    }
}

/// Ingested material of one source form version.
struct SourceIndex<'a> {
    source: &'a SourceDocument,
    sections: &'a [Section],
    chunks: BTreeMap<usize, &'a Chunk>,
}

/// Matches statements against the sections and anchors of a set of sources.
pub struct CitationMatcher<'a> {
    sources: Vec<SourceIndex<'a>>,
    policy: &'a PipelinePolicyV1,
}

impl<'a> CitationMatcher<'a> {
    /// Index the sources. Sources without ingested sections are kept but
    /// never produce citations.
    pub fn new(
        sources: &'a [SourceDocument],
        sections_by_form_version: &'a BTreeMap<String, Vec<Section>>,
        chunks_by_form_version: &'a BTreeMap<String, Vec<Chunk>>,
        policy: &'a PipelinePolicyV1,
    ) -> Self {
        let sources = sources
            .iter()
            .map(|source| SourceIndex {
                source,
                sections: sections_by_form_version
                    .get(&source.form_version_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
                chunks: chunks_by_form_version
                    .get(&source.form_version_id)
                    .map(|chunks| chunks.iter().map(|c| (c.index, c)).collect())
                    .unwrap_or_default(),
            })
            .collect();
        Self { sources, policy }
    }

    /// Label of a form version, if it is one of the sources.
    fn label_of(&self, form_version_id: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.source.form_version_id == form_version_id)
            .map(|s| s.source.form_label.as_str())
    }

    /// Type of the section at `path` in a form version, if known.
    fn section_type_of(&self, form_version_id: &str, path: &str) -> Option<SectionType> {
        self.sources
            .iter()
            .filter(|s| s.source.form_version_id == form_version_id)
            .flat_map(|s| s.sections.iter())
            .find(|s| s.path == path)
            .map(|s| s.section_type)
    }

    /// Find citations for `statement`.
    ///
    /// `whitelist` restricts the section types searched; `None` searches all.
    pub fn find(&self, statement: &str, whitelist: Option<&[SectionType]>) -> Vec<ClauseAnchorCitation> {
        let statement_lc = statement.to_lowercase();
        let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
        let mut citations = Vec::new();

        for index in &self.sources {
            let form_version_id = index.source.form_version_id.as_str();
            for section in index.sections {
                if whitelist.is_some_and(|types| !types.contains(&section.section_type)) {
                    continue;
                }
                let section_score = overlap(&section.title, &statement_lc);
                if section_score == 0 {
                    continue;
                }

                for chunk in section.chunk_indices().filter_map(|i| index.chunks.get(&i)) {
                    for anchor in &chunk.anchors {
                        let anchor_score = overlap(&anchor.anchor_text, &statement_lc);
                        if anchor_score == 0 && section_score < 2 {
                            continue;
                        }
                        if !seen.insert((form_version_id, anchor.hash.as_str())) {
                            continue;
                        }
                        let excerpt = slice_bytes(&chunk.text, anchor.offset, self.policy.excerpt_chars)
                            .trim()
                            .to_string();
                        citations.push(ClauseAnchorCitation {
                            form_version_id: form_version_id.to_string(),
                            form_label: index.source.form_label.clone(),
                            section_path: section.path.clone(),
                            section_type: section.section_type,
                            anchor_hash: anchor.hash.clone(),
                            anchor_slug: anchor.slug.clone(),
                            anchor_text: anchor.anchor_text.clone(),
                            page: anchor.page.max(1),
                            excerpt,
                            relevance: relevance(anchor_score, section_score),
                        });
                    }
                }
            }
        }

        citations.sort_by_key(|c| c.relevance.rank());
        citations.truncate(self.policy.max_citations);
        citations
    }

    /// Convert legacy citations sharing a significant word with `statement`
    /// into contextual anchor citations.
    pub fn from_existing(&self, statement: &str, existing: &[ExistingCitation]) -> Vec<ClauseAnchorCitation> {
        let statement_lc = statement.to_lowercase();
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        let mut citations = Vec::new();

        for legacy in existing {
            if overlap(&legacy.excerpt, &statement_lc) == 0 {
                continue;
            }
            let first_line = legacy
                .excerpt
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or_default();
            let page = legacy.page.max(1);
            let anchor = ContentAnchor::from_text(
                first_line,
                page,
                0,
                self.policy.max_anchor_chars,
                self.policy.hash_algorithm,
            );
            if !seen.insert((legacy.form_version_id.clone(), anchor.hash.clone())) {
                continue;
            }

            let section_path = legacy
                .section_path
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| ROOT_SECTION_PATH.to_string());
            let form_label = legacy
                .form_label
                .clone()
                .or_else(|| self.label_of(&legacy.form_version_id).map(str::to_string))
                .unwrap_or_else(|| legacy.form_version_id.clone());

            citations.push(ClauseAnchorCitation {
                section_type: self
                    .section_type_of(&legacy.form_version_id, &section_path)
                    .unwrap_or(SectionType::General),
                form_version_id: legacy.form_version_id.clone(),
                form_label,
                section_path,
                anchor_hash: anchor.hash,
                anchor_slug: anchor.slug,
                anchor_text: anchor.anchor_text,
                page,
                excerpt: slice_bytes(&legacy.excerpt, 0, self.policy.excerpt_chars)
                    .trim()
                    .to_string(),
                relevance: Relevance::Contextual,
            });
        }

        citations.truncate(self.policy.max_citations);
        citations
    }

    /// Matched citations, falling back to legacy citations when none match.
    pub fn cite(
        &self,
        statement: &str,
        whitelist: Option<&[SectionType]>,
        existing: &[ExistingCitation],
    ) -> Vec<ClauseAnchorCitation> {
        let citations = self.find(statement, whitelist);
        if citations.is_empty() {
            self.from_existing(statement, existing)
        } else {
            citations
        }
    }
}
