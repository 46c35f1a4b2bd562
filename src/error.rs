//! Errors raised around the pure engines.
//!
//! The engines themselves never fail on well-typed input. Errors come from
//! configuring them (policies) or decoding their inputs.

use crate::policy::PolicyError;

/// Error type for truth layer operations outside the pure engines.
#[derive(Debug, thiserror::Error)]
pub enum TruthLayerError {
    /// Invalid policy parameters.
    #[error("Invalid policy: {0}")]
    Policy(#[from] PolicyError),
    /// Input could not be decoded.
    #[error("Invalid input: {0}")]
    Decode(#[from] serde_json::Error),
    /// A policy reference did not resolve.
    #[error("Policy not found: {policy_id}@{params_hash}")]
    PolicyNotFound {
        /// Policy identifier.
        policy_id: String,
        /// Requested parameter hash.
        params_hash: String,
    },
}

impl TruthLayerError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Policy(_) => "INVALID_POLICY",
            Self::Decode(_) => "INVALID_INPUT",
            Self::PolicyNotFound { .. } => "POLICY_NOT_FOUND",
        }
    }
}
