//! Extraction warnings and the quality score.
//!
//! ## Score
//!
//! ```text
//! 100
//!   - 15 / 8 / 2     per error / warning / info
//!   - 25 / 15 / 5    average chars per page below 100 / 200 / 400
//!   - 10             chunks exist but no structured section
//!   + 5              three or more structured section types
//!   - 20 / 10        total chars below 500 / 2000
//!   - 50             zero pages
//! clamped to [0, 100]
//! ```

use regex_lite::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::types::{Chunk, PageText, Section, Warning, WarningSeverity, WarningType};

/// Marker the extraction service writes into pages it failed to read.
pub const EXTRACTION_FAILURE_MARKER: &str = "[TEXT EXTRACTION FAILED]";

const SHORT_DOCUMENT_CHARS: usize = 500;
const LOW_DENSITY_CHARS: usize = 50;
const OCR_MIN_CHARS: usize = 20;
const OCR_CLEAN_RATIO: f64 = 0.6;
const MAX_CONTROL_CHARS: usize = 5;
const MAX_MOJIBAKE_RUNS: usize = 2;

fn mojibake() -> &'static Regex {
    static MOJIBAKE: OnceLock<Regex> = OnceLock::new();
    MOJIBAKE.get_or_init(|| {
        Regex::new(r"Ã[\x{80}-\x{BF}]|â€.|Â[\x{80}-\x{BF}\s]|\x{FFFD}")
            .expect("mojibake pattern is valid")
    })
}

/// Share of alphanumeric and whitespace characters in `text`.
fn clean_ratio(text: &str) -> f64 {
    let (clean, total) = text.chars().fold((0usize, 0usize), |(clean, total), c| {
        let is_clean = c.is_alphanumeric() || c.is_whitespace();
        (clean + usize::from(is_clean), total + 1)
    });
    if total == 0 {
        1.0
    } else {
        clean as f64 / total as f64
    }
}

fn control_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count()
}

/// Total characters across pages, as reported by the extractor.
pub fn total_characters(pages: &[PageText]) -> usize {
    pages.iter().map(|p| p.char_count).sum()
}

/// Detect page- and document-level extraction problems.
pub fn detect_warnings(pages: &[PageText]) -> Vec<Warning> {
    if pages.is_empty() {
        return vec![Warning::new(
            WarningType::ShortDocument,
            WarningSeverity::Error,
            "Document has no pages",
        )];
    }

    let mut warnings = Vec::new();
    let total = total_characters(pages);
    if total < SHORT_DOCUMENT_CHARS {
        warnings.push(Warning::new(
            WarningType::ShortDocument,
            WarningSeverity::Warning,
            format!("Document contains only {} characters", total),
        ));
    }

    let mut failed_pages = Vec::new();
    for page in pages {
        if page.char_count < LOW_DENSITY_CHARS {
            warnings.push(
                Warning::new(
                    WarningType::LowTextDensity,
                    WarningSeverity::Warning,
                    format!("Page {} contains only {} characters", page.page_number, page.char_count),
                )
                .on_page(page.page_number),
            );
        }

        if page.text.chars().count() >= OCR_MIN_CHARS && clean_ratio(&page.text) < OCR_CLEAN_RATIO {
            warnings.push(
                Warning::new(
                    WarningType::OcrArtifacts,
                    WarningSeverity::Warning,
                    format!("Page {} has a high share of non-text characters", page.page_number),
                )
                .on_page(page.page_number),
            );
        }

        let controls = control_chars(&page.text);
        let mojibake_runs = mojibake().find_iter(&page.text).count();
        if controls > MAX_CONTROL_CHARS || mojibake_runs > MAX_MOJIBAKE_RUNS {
            warnings.push(
                Warning::new(
                    WarningType::EncodingIssue,
                    WarningSeverity::Warning,
                    format!(
                        "Page {} has {} control characters and {} garbled sequences",
                        page.page_number, controls, mojibake_runs
                    ),
                )
                .on_page(page.page_number),
            );
        }

        if page.text.contains(EXTRACTION_FAILURE_MARKER) {
            failed_pages.push(page.page_number);
        }
    }

    if !failed_pages.is_empty() {
        let list = failed_pages
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        warnings.push(Warning::new(
            WarningType::Truncated,
            WarningSeverity::Error,
            format!("Text extraction failed on page(s) {}", list),
        ));
    }

    warnings
}

/// Info warning when no section carries a structured type.
pub fn structure_warning(sections: &[Section]) -> Option<Warning> {
    if sections.iter().any(|s| s.section_type.is_structured()) {
        None
    } else {
        Some(Warning::new(
            WarningType::NoStructureDetected,
            WarningSeverity::Info,
            "No recognizable section headings were detected",
        ))
    }
}

/// Compute the 0–100 quality score.
pub fn score_quality(
    pages: &[PageText],
    chunks: &[Chunk],
    sections: &[Section],
    warnings: &[Warning],
) -> u8 {
    let mut score: i32 = 100;

    score -= warnings.iter().map(|w| w.severity.score_penalty()).sum::<i32>();

    let total = total_characters(pages);
    if !pages.is_empty() {
        let average = total / pages.len();
        score -= match average {
            a if a < 100 => 25,
            a if a < 200 => 15,
            a if a < 400 => 5,
            _ => 0,
        };
    }

    let structured: BTreeSet<_> = sections
        .iter()
        .map(|s| s.section_type)
        .filter(|t| t.is_structured())
        .collect();
    if !chunks.is_empty() && structured.is_empty() {
        score -= 10;
    }
    if structured.len() >= 3 {
        score += 5;
    }

    score -= match total {
        t if t < 500 => 20,
        t if t < 2000 => 10,
        _ => 0,
    };

    if pages.is_empty() {
        score -= 50;
    }

    score.clamp(0, 100) as u8
}
