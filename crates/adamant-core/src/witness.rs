//! Instance-side self-description: runtime probes of current field
//! values.
//!
//! Schema-mode works from descriptor tables alone; instance-mode needs
//! the actual constructed value. A [`Witness`] reports, per field, what
//! the field currently holds: the runtime container representation, the
//! current atomic-holder content, optional presence, or a nested
//! described instance to recurse into. Probes are the witness's honest
//! self-report; generated implementations keep them in lockstep with the
//! descriptor table.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::{MappingRepr, SequenceRepr, TypeDescriptor};

/// Object-safe runtime hook for instance-mode validation.
pub trait Witness {
    /// The static descriptor table for this value's type.
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Probe the named field's current value.
    ///
    /// Unknown field names return [`FieldProbe::Unknown`]; that is
    /// descriptor drift and validation reports it as such.
    fn probe(&self, field: &str) -> FieldProbe<'_>;
}

/// What a field currently holds.
pub enum FieldProbe<'a> {
    /// Primitive or intrinsic value. Nothing to walk.
    Settled,
    /// Optional field currently holding no value.
    Absent,
    /// Sequence/set value with its observed runtime representation.
    /// Element probes are required when the declared element type is
    /// not terminal; for terminal elements they may be omitted.
    Sequence {
        repr: SequenceRepr,
        elements: Vec<FieldProbe<'a>>,
    },
    /// Mapping value with key/value probes per entry.
    Mapping {
        repr: MappingRepr,
        entries: Vec<(FieldProbe<'a>, FieldProbe<'a>)>,
    },
    /// Atomic holder with its current content.
    Holder(HolderProbe),
    /// Nested described instance.
    Nested(&'a dyn Witness),
    /// A value whose type carries no witness and no other proof path.
    Opaque { type_name: String },
    /// The witness does not know this field.
    Unknown,
}

/// Current content of an atomic holder slot.
pub enum HolderProbe {
    /// Scalar or intrinsic content. Nothing to walk.
    Settled,
    /// The slot currently holds nothing.
    Empty,
    /// Currently held shared content, cloned out of the slot.
    Held(Arc<dyn Witness>),
}

impl<'a> FieldProbe<'a> {
    pub fn nested<W: Witness>(value: &'a W) -> Self {
        FieldProbe::Nested(value)
    }

    /// `Absent` for `None`, `Nested` otherwise.
    pub fn from_option<W: Witness>(value: Option<&'a W>) -> Self {
        match value {
            Some(value) => FieldProbe::Nested(value),
            None => FieldProbe::Absent,
        }
    }

    /// A frozen sequence of nested witnesses.
    pub fn frozen_witnesses<W: Witness>(items: &'a [W]) -> Self {
        FieldProbe::Sequence {
            repr: SequenceRepr::Frozen,
            elements: items
                .iter()
                .map(|item| FieldProbe::Nested(item as &dyn Witness))
                .collect(),
        }
    }

    /// A sequence of terminal elements; no per-element probes needed.
    pub fn settled_sequence(repr: SequenceRepr) -> Self {
        FieldProbe::Sequence {
            repr,
            elements: Vec::new(),
        }
    }

    pub fn opaque(type_name: impl Into<String>) -> Self {
        FieldProbe::Opaque {
            type_name: type_name.into(),
        }
    }

    /// Variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldProbe::Settled => "settled",
            FieldProbe::Absent => "absent",
            FieldProbe::Sequence { .. } => "sequence",
            FieldProbe::Mapping { .. } => "mapping",
            FieldProbe::Holder(_) => "holder",
            FieldProbe::Nested(_) => "nested",
            FieldProbe::Opaque { .. } => "opaque",
            FieldProbe::Unknown => "unknown",
        }
    }
}

impl fmt::Debug for FieldProbe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProbe::Sequence { repr, elements } => f
                .debug_struct("Sequence")
                .field("repr", repr)
                .field("elements", &elements.len())
                .finish(),
            FieldProbe::Mapping { repr, entries } => f
                .debug_struct("Mapping")
                .field("repr", repr)
                .field("entries", &entries.len())
                .finish(),
            FieldProbe::Nested(value) => f
                .debug_tuple("Nested")
                .field(&value.descriptor().type_name)
                .finish(),
            FieldProbe::Opaque { type_name } => {
                f.debug_struct("Opaque").field("type_name", type_name).finish()
            }
            other => f.write_str(other.kind_name()),
        }
    }
}

impl fmt::Debug for HolderProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolderProbe::Settled => f.write_str("Settled"),
            HolderProbe::Empty => f.write_str("Empty"),
            HolderProbe::Held(value) => f
                .debug_tuple("Held")
                .field(&value.descriptor().type_name)
                .finish(),
        }
    }
}

/// Stable identity of a witness for walk-stack cycle detection.
///
/// The pair is (value address, descriptor address). The descriptor part
/// matters: a nested witness stored inline as its parent's first field
/// shares the parent's address, and only the type distinguishes them.
pub(crate) fn witness_identity(value: &dyn Witness) -> (usize, usize) {
    let data = value as *const dyn Witness as *const () as usize;
    let descriptor = std::ptr::from_ref(value.descriptor()) as usize;
    (data, descriptor)
}
