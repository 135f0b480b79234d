//! The explicit schema registry.
//!
//! Replaces ambient type discovery with a caller-maintained collection:
//! descriptors registered in code or loaded from JSON, validation
//! families ("these types are validated together"), and the
//! known-immutable / known-mutable override tables. The registry is
//! read-only collaborator input during a walk; population happens up
//! front.
//!
//! A registry has a canonical content fingerprint (SHA-256 over its
//! canonical JSON bytes). The fingerprint tags cache generations, so
//! proofs made against one registry never leak into a reloaded one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::descriptor::{Described, TypeDescriptor};

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// SHA-256 over the registry's canonical JSON bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaFingerprint(pub [u8; 32]);

impl SchemaFingerprint {
    pub fn compute(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in &self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Registry misuse, distinct from mutability violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type `{0}` is already registered with a different shape")]
    ConflictingType(String),
    #[error("family root `{0}` is not registered")]
    UnknownFamilyRoot(String),
    #[error("family member `{member}` under root `{root}` is not registered")]
    UnknownFamilyMember { root: String, member: String },
    #[error("canonical schema serialization failed: {0}")]
    Canonicalization(String),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The caller-maintained registry of everything a walk may need to
/// resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSet {
    types: BTreeMap<String, TypeDescriptor>,
    families: BTreeMap<String, BTreeSet<String>>,
    trusted: BTreeSet<String>,
    denied: BTreeSet<String>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a linked type's descriptor table.
    pub fn register<T: Described>(&mut self) -> Result<(), SchemaError> {
        self.insert(T::descriptor().clone())
    }

    /// Register a descriptor by value. Re-inserting an identical
    /// descriptor is idempotent; a differing one under the same name is
    /// a conflict.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Result<(), SchemaError> {
        match self.types.get(&descriptor.type_name) {
            Some(existing) if *existing == descriptor => Ok(()),
            Some(_) => Err(SchemaError::ConflictingType(descriptor.type_name)),
            None => {
                self.types.insert(descriptor.type_name.clone(), descriptor);
                Ok(())
            }
        }
    }

    pub fn resolve(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // -- families --

    /// Record that `member` is validated together with `root`. Both must
    /// already be registered.
    pub fn add_family_member(
        &mut self,
        root: &str,
        member: &str,
    ) -> Result<(), SchemaError> {
        if !self.contains(root) {
            return Err(SchemaError::UnknownFamilyRoot(root.to_string()));
        }
        if !self.contains(member) {
            return Err(SchemaError::UnknownFamilyMember {
                root: root.to_string(),
                member: member.to_string(),
            });
        }
        self.families
            .entry(root.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    pub fn family_members(&self, root: &str) -> Option<&BTreeSet<String>> {
        self.families.get(root)
    }

    pub fn family_roots(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    // -- overrides --

    /// Add a name to the known-immutable override table.
    pub fn trust(&mut self, type_name: impl Into<String>) {
        self.trusted.insert(type_name.into());
    }

    /// Add a name to the known-mutable override table.
    pub fn deny(&mut self, type_name: impl Into<String>) {
        self.denied.insert(type_name.into());
    }

    pub fn is_trusted(&self, type_name: &str) -> bool {
        self.trusted.contains(type_name)
    }

    pub fn is_denied(&self, type_name: &str) -> bool {
        self.denied.contains(type_name)
    }

    // -- fingerprint --

    /// Canonical content fingerprint. Deterministic across processes:
    /// all collections are ordered, so equal registries serialize to
    /// equal bytes.
    pub fn fingerprint(&self) -> Result<SchemaFingerprint, SchemaError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|error| SchemaError::Canonicalization(error.to_string()))?;
        Ok(SchemaFingerprint::compute(&bytes))
    }
}
