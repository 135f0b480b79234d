//! Process-wide cache of types already proven immutable.
//!
//! The cache is a keyed set of qualified type names, insert-only between
//! generation bindings. It breaks type-graph cycles (a type already
//! proven is never re-walked) and makes repeat validation O(1).
//! Concurrent walks may race benignly: both walk, both insert, and the
//! duplicate insert is idempotent.
//!
//! Proofs are only as durable as the schema they were made against, so
//! the cache can be bound to a schema generation: rebinding to a
//! different fingerprint clears previous proofs. Proofs recorded before
//! the first binding are kept.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::schema::SchemaFingerprint;

#[derive(Debug, Default)]
pub struct ValidationCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: Option<SchemaFingerprint>,
    proven: BTreeSet<String>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance, lazily initialized.
    pub fn shared() -> &'static ValidationCache {
        static SHARED: OnceLock<ValidationCache> = OnceLock::new();
        SHARED.get_or_init(ValidationCache::new)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.state.read().proven.contains(type_name)
    }

    /// Record a proof. Returns whether the entry is new.
    pub fn insert(&self, type_name: &str) -> bool {
        self.state.write().proven.insert(type_name.to_string())
    }

    /// Tie cached proofs to a schema generation. Rebinding to a changed
    /// fingerprint clears previous proofs; returns whether it did.
    pub fn bind_generation(&self, fingerprint: &SchemaFingerprint) -> bool {
        let mut state = self.state.write();
        let stale = state
            .generation
            .as_ref()
            .is_some_and(|current| current != fingerprint);
        if stale {
            state.proven.clear();
        }
        state.generation = Some(fingerprint.clone());
        stale
    }

    pub fn generation(&self) -> Option<SchemaFingerprint> {
        self.state.read().generation.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().proven.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().proven.is_empty()
    }

    /// Sorted copy of the proven set, for reports and tests.
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.state.read().proven.clone()
    }
}
