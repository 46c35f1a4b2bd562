//! Extraction quality warnings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an extraction warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Informational.
    Info,
    /// Degraded extraction.
    Warning,
    /// Extraction failed or is unusable.
    Error,
}

impl WarningSeverity {
    /// Points subtracted from the quality score per warning.
    pub fn score_penalty(&self) -> i32 {
        match self {
            Self::Info => 2,
            Self::Warning => 8,
            Self::Error => 15,
        }
    }
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Kind of extraction problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningType {
    /// Document is empty or very short.
    ShortDocument,
    /// A page carries almost no text.
    LowTextDensity,
    /// Page text looks like OCR noise.
    OcrArtifacts,
    /// Control characters or mojibake.
    EncodingIssue,
    /// The extractor reported a failure for some pages.
    Truncated,
    /// No structured headings were detected.
    NoStructureDetected,
}

/// A single extraction warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    /// Warning kind.
    #[serde(rename = "type")]
    pub warning_type: WarningType,
    /// Human-readable message.
    pub message: String,
    /// Page the warning refers to, if page-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_ref: Option<u32>,
    /// Severity.
    pub severity: WarningSeverity,
}

impl Warning {
    /// Document-level warning.
    pub fn new(warning_type: WarningType, severity: WarningSeverity, message: impl Into<String>) -> Self {
        Self {
            warning_type,
            message: message.into(),
            page_ref: None,
            severity,
        }
    }

    /// Attach a page reference.
    pub fn on_page(mut self, page: u32) -> Self {
        self.page_ref = Some(page);
        self
    }
}
