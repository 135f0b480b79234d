#![forbid(unsafe_code)]

//! Structural immutability verification for described type graphs.
//!
//! A type is structurally immutable when every reachable field is a
//! fixed slot holding a primitive, an intrinsically immutable value, an
//! unmodifiable container view of immutable elements, or another
//! structurally immutable type. [`GraphValidator`] proves or refutes
//! that property, either from descriptor tables alone (schema mode) or
//! against a constructed value through its [`Witness`] (instance mode).
//! Proven type names land in a process-wide [`ValidationCache`] so each
//! type pays for its walk once.

pub mod cache;
pub mod classify;
pub mod container;
pub mod descriptor;
pub mod schema;
pub mod validator;
pub mod violation;
pub mod witness;

use std::sync::OnceLock;

pub use cache::ValidationCache;
pub use classify::{
    classify, IntrinsicKind, PrimitiveKind, TypeClassification, INTRINSIC_WHITELIST,
};
pub use container::ContainerShape;
pub use descriptor::{
    Described, ElementSlot, FieldBinding, FieldDescriptor, FieldMutability, FieldType, MappingRepr,
    SequenceRepr, TypeDescriptor,
};
pub use schema::{SchemaError, SchemaFingerprint, SchemaSet};
pub use validator::{
    GraphValidator, ValidationContext, ValidationEvent, Verdict, WalkMode, WalkReport,
};
pub use violation::{MutabilityViolation, ViolationFrame};
pub use witness::{FieldProbe, HolderProbe, Witness};

/// Validate a constructed value against the process-wide cache.
///
/// Runs instance mode with an empty registry: every named reference is
/// proven through witness probes rather than descriptor lookup. Callers
/// that registered descriptors, overrides, or families should build a
/// [`GraphValidator`] over their own [`SchemaSet`] instead.
pub fn verify_instance(value: &dyn Witness) -> Result<(), MutabilityViolation> {
    static EMPTY_SCHEMA: OnceLock<SchemaSet> = OnceLock::new();
    let schema = EMPTY_SCHEMA.get_or_init(SchemaSet::new);
    GraphValidator::new(schema, ValidationCache::shared()).validate_instance(value)
}
