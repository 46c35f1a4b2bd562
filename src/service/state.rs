//! Service state management.
//!
//! Contains the PolicyRegistry, per-policy ingestion caches and shared
//! service state.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::canonical::canonical_hash_hex;
use crate::error::TruthLayerError;
use crate::ingest::{CacheConfig, IngestionCache, IngestionEngine};
use crate::policy::{PipelinePolicyV1, PolicyError};

/// Reference to a registered policy by hash.
///
/// This enables hash-stable policy references across requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRef {
    /// Policy type identifier (e.g., "pipeline_policy_v1")
    pub policy_id: String,
    /// xxHash64 of canonical policy JSON
    pub params_hash: String,
}

impl PolicyRef {
    /// Create a policy reference from a PipelinePolicyV1.
    pub fn from_policy(policy: &PipelinePolicyV1) -> Self {
        Self {
            policy_id: policy.policy_id().to_string(),
            params_hash: policy.params_hash(),
        }
    }

    /// Create a reference with explicit values.
    pub fn new(policy_id: impl Into<String>, params_hash: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            params_hash: params_hash.into(),
        }
    }
}

/// Registry of immutable, validated policies with stable hashes.
///
/// The registry itself has a fingerprint that changes when policies change.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: BTreeMap<PolicyRef, PipelinePolicyV1>,
    registry_fingerprint: String,
}

impl PolicyRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        let mut registry = Self {
            policies: BTreeMap::new(),
            registry_fingerprint: String::new(),
        };
        registry.update_fingerprint();
        registry
    }

    /// Create a registry with the default policy pre-registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let default = PipelinePolicyV1::default();
        registry
            .policies
            .insert(PolicyRef::from_policy(&default), default);
        registry.update_fingerprint();
        registry
    }

    /// Validate and register a policy, returning its reference.
    ///
    /// If the policy already exists (same hash), returns the existing reference.
    pub fn register(&mut self, policy: PipelinePolicyV1) -> Result<PolicyRef, PolicyError> {
        policy.validate()?;
        let policy_ref = PolicyRef::from_policy(&policy);
        if !self.policies.contains_key(&policy_ref) {
            self.policies.insert(policy_ref.clone(), policy);
            self.update_fingerprint();
        }
        Ok(policy_ref)
    }

    /// Resolve a policy reference to the actual policy.
    pub fn resolve(&self, policy_ref: &PolicyRef) -> Option<&PipelinePolicyV1> {
        self.policies.get(policy_ref)
    }

    /// Get all registered policy references.
    pub fn list(&self) -> Vec<PolicyRef> {
        self.policies.keys().cloned().collect()
    }

    /// Get the registry fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.registry_fingerprint
    }

    /// Get the number of registered policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    fn update_fingerprint(&mut self) {
        let refs: Vec<_> = self.policies.keys().collect();
        self.registry_fingerprint = canonical_hash_hex(&refs);
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shared service state.
///
/// Contains the policy registry and one ingestion cache per policy in use.
#[derive(Clone)]
pub struct ServiceState {
    /// Registry of available policies.
    pub policy_registry: Arc<RwLock<PolicyRegistry>>,
    caches: Arc<RwLock<BTreeMap<PolicyRef, Arc<IngestionCache>>>>,
    cache_config: CacheConfig,
}

impl ServiceState {
    /// Create state with the default registry.
    pub fn new(cache_config: CacheConfig) -> Self {
        Self::with_registry(PolicyRegistry::with_defaults(), cache_config)
    }

    /// Create state with a custom policy registry.
    pub fn with_registry(registry: PolicyRegistry, cache_config: CacheConfig) -> Self {
        Self {
            policy_registry: Arc::new(RwLock::new(registry)),
            caches: Arc::new(RwLock::new(BTreeMap::new())),
            cache_config,
        }
    }

    /// Create state from environment variables.
    ///
    /// Reads `INGEST_CACHE_ENTRIES` (0 disables the cache).
    pub fn from_env() -> Self {
        let mut cache_config = CacheConfig::default();
        if let Some(entries) = std::env::var("INGEST_CACHE_ENTRIES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            cache_config.max_entries = entries;
            cache_config.enabled = entries > 0;
        }
        Self::new(cache_config)
    }

    /// Resolve an optional policy reference; `None` selects the default policy.
    pub fn resolve_policy(
        &self,
        policy_ref: Option<&PolicyRef>,
    ) -> Result<(PipelinePolicyV1, PolicyRef), TruthLayerError> {
        match policy_ref {
            Some(pref) => {
                let registry = self.policy_registry.read();
                let policy = registry
                    .resolve(pref)
                    .cloned()
                    .ok_or_else(|| TruthLayerError::PolicyNotFound {
                        policy_id: pref.policy_id.clone(),
                        params_hash: pref.params_hash.clone(),
                    })?;
                Ok((policy, pref.clone()))
            }
            None => {
                let policy = PipelinePolicyV1::default();
                let pref = PolicyRef::from_policy(&policy);
                Ok((policy, pref))
            }
        }
    }

    /// Ingestion cache for a policy, created on first use.
    pub fn ingestion_cache(
        &self,
        policy: PipelinePolicyV1,
        policy_ref: &PolicyRef,
    ) -> Result<Arc<IngestionCache>, TruthLayerError> {
        if let Some(cache) = self.caches.read().get(policy_ref) {
            return Ok(Arc::clone(cache));
        }
        let engine = IngestionEngine::new(policy)?;
        let mut caches = self.caches.write();
        let cache = caches
            .entry(policy_ref.clone())
            .or_insert_with(|| Arc::new(IngestionCache::new(engine, self.cache_config.clone())));
        Ok(Arc::clone(cache))
    }

    /// Number of policies with a live ingestion cache.
    pub fn cache_count(&self) -> usize {
        self.caches.read().len()
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
