//! PipelinePolicy v1: thresholds and caps shared by every engine.
//!
//! The policy is part of a result's identity. Two runs over the same input
//! only produce identical output when their `params_hash` values match, so
//! every result is stamped with the hash of the policy that produced it.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::hashing::HashAlgorithm;
use crate::DEFAULT_POLICY_VERSION;

/// Errors from policy validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// A parameter that must be positive was zero.
    #[error("Policy parameter `{0}` must be greater than zero")]
    ZeroParameter(&'static str),
    /// Anchor cap is smaller than the uppercase-heading minimum.
    #[error("max_anchor_chars ({0}) must be at least {1}")]
    AnchorCapTooSmall(usize, usize),
}

/// Pipeline policy version 1.
///
/// ## Parameters
///
/// - `flush_threshold_chars`: buffer length above which a new heading flushes a chunk
/// - `max_anchor_chars`: cap on anchor text and section paths
/// - `min_heading_chars`: shortest uppercase line treated as a heading
/// - `excerpt_chars`: citation excerpt length in bytes
/// - `max_citations`: citations kept per conclusion
/// - `summary_chars`: section summary length
/// - `hash_algorithm`: chunk and anchor hash function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePolicyV1 {
    /// Policy version identifier.
    pub version: String,
    /// Flush a chunk when a heading arrives and the buffer exceeds this length.
    pub flush_threshold_chars: usize,
    /// Maximum anchor text length in characters.
    pub max_anchor_chars: usize,
    /// Minimum length of an all-uppercase heading line.
    pub min_heading_chars: usize,
    /// Citation excerpt length in bytes.
    pub excerpt_chars: usize,
    /// Maximum citations per conclusion.
    pub max_citations: usize,
    /// Section summary length in characters.
    pub summary_chars: usize,
    /// Hash function for chunks and anchors.
    pub hash_algorithm: HashAlgorithm,
}

impl PipelinePolicyV1 {
    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Hash of the policy parameters (xxh64 of canonical JSON).
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let positive = [
            ("flush_threshold_chars", self.flush_threshold_chars),
            ("max_anchor_chars", self.max_anchor_chars),
            ("min_heading_chars", self.min_heading_chars),
            ("excerpt_chars", self.excerpt_chars),
            ("max_citations", self.max_citations),
            ("summary_chars", self.summary_chars),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(PolicyError::ZeroParameter(name));
        }
        if self.max_anchor_chars <= self.min_heading_chars {
            return Err(PolicyError::AnchorCapTooSmall(
                self.max_anchor_chars,
                self.min_heading_chars + 1,
            ));
        }
        Ok(())
    }

    /// Same policy with a different hash algorithm.
    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }
}

impl Default for PipelinePolicyV1 {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            flush_threshold_chars: 100,
            max_anchor_chars: 120,
            min_heading_chars: 5,
            excerpt_chars: 300,
            max_citations: 5,
            summary_chars: 200,
            hash_algorithm: HashAlgorithm::Djb2,
        }
    }
}
