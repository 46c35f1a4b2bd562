//! Content hashing and slug derivation.
//!
//! Every identity in the truth layer (chunk hashes, anchor hashes, anchor slugs)
//! is a pure function of text. This module is the only place those functions
//! are defined.
//!
//! ## Hash Algorithms
//!
//! | Algorithm | Width | Output | Use |
//! |-----------|-------|--------|-----|
//! | `Djb2` | 32 bit | 8 hex chars | Default. Change detection only |
//! | `Sha256` | 256 bit | 64 hex chars | Long-lived external citation ids |
//!
//! `Djb2` is not collision-resistant. Two different chunks may share a hash,
//! in which case a redline reports them as unchanged.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Seed value for the djb2 rolling hash.
const DJB2_SEED: u32 = 5381;

/// Maximum slug length in characters.
pub const MAX_SLUG_CHARS: usize = 64;

/// Slug used when the source text contains no alphanumeric characters.
const EMPTY_SLUG: &str = "section";

/// Hash algorithm used for chunk and anchor identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// 32-bit djb2 rolling hash.
    #[default]
    Djb2,
    /// SHA-256, hex encoded.
    Sha256,
}

impl HashAlgorithm {
    /// Hash `text` with this algorithm.
    pub fn hash(&self, text: &str) -> String {
        match self {
            Self::Djb2 => djb2_hex(text),
            Self::Sha256 => sha256_hex(text),
        }
    }

    /// Length of the hex digest this algorithm produces.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Djb2 => 8,
            Self::Sha256 => 64,
        }
    }
}

/// Compute the raw djb2 hash (`h * 33 + byte`, wrapping) of a string.
pub fn djb2(text: &str) -> u32 {
    text.bytes()
        .fold(DJB2_SEED, |h, b| h.wrapping_mul(33).wrapping_add(u32::from(b)))
}

/// djb2 hash rendered as 8 lowercase hex characters.
pub fn djb2_hex(text: &str) -> String {
    format!("{:08x}", djb2(text))
}

/// SHA-256 of the UTF-8 bytes of `text`, lowercase hex.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive a URL-safe slug.
///
/// Lowercases, replaces every run of non-alphanumeric characters with a single
/// `-`, strips leading/trailing dashes and caps the result at
/// [`MAX_SLUG_CHARS`]. Non-ASCII letters are dropped.
///
/// ```rust
/// use contract_truth_layer::hashing::slugify;
///
/// assert_eq!(slugify("COVERAGE A – BODILY INJURY"), "coverage-a-bodily-injury");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_CHARS));
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
            if slug.len() >= MAX_SLUG_CHARS {
                break;
            }
        } else {
            pending_dash = true;
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Take at most `max_chars` characters from the start of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Slice `text[start..start + len]` by byte offsets, clamped to the string
/// bounds and moved inward to the nearest char boundaries.
pub fn slice_bytes(text: &str, start: usize, len: usize) -> &str {
    let mut begin = start.min(text.len());
    while begin < text.len() && !text.is_char_boundary(begin) {
        begin += 1;
    }
    let mut end = begin.saturating_add(len).min(text.len());
    while end > begin && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[begin..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_djb2_known_values() {
        assert_eq!(djb2(""), 5381);
        // 5381 * 33 + 'a'(97)
        assert_eq!(djb2("a"), 177_670);
        assert_eq!(djb2_hex(""), "00001505");
    }

    #[test]
    fn test_djb2_determinism() {
        let text = "SECTION I – COVERAGES";
        assert_eq!(djb2_hex(text), djb2_hex(text));
        assert_ne!(djb2_hex(text), djb2_hex("SECTION II – COVERAGES"));
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex("Hello World"),
            "a591a6d40bf420404a011733cfb7b190d62c65bf0bcda32b57b277d9ad9f146e"
        );
    }

    #[test]
    fn test_algorithm_digest_len() {
        for algorithm in [HashAlgorithm::Djb2, HashAlgorithm::Sha256] {
            assert_eq!(algorithm.hash("EXCLUSIONS").len(), algorithm.digest_len());
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("DECLARATIONS"), "declarations");
        assert_eq!(slugify("  SECTION II -- LIABILITY  "), "section-ii-liability");
        assert_eq!(slugify("---"), "section");
        assert_eq!(slugify("Ünïcode Heading"), "n-code-heading");
    }

    #[test]
    fn test_slugify_caps_length() {
        let long = "WORD ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_CHARS);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_slice_bytes_clamps_to_boundaries() {
        let text = "aé b";
        // byte 2 is inside 'é'
        assert_eq!(slice_bytes(text, 2, 10), " b");
        assert_eq!(slice_bytes(text, 0, 2), "a");
        assert_eq!(slice_bytes(text, 50, 10), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  A \n\t B  "), "A B");
    }
}
