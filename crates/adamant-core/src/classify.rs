//! Type classification: the six-way taxonomy and the intrinsic whitelist.
//!
//! Classification is pure. It looks at a declared field type (and, for
//! named types, the registered descriptor) and returns where that type
//! falls in the taxonomy. It never walks fields; recursion is the
//! [`GraphValidator`](crate::validator::GraphValidator)'s job.
//!
//! The intrinsic whitelist is data, not behavior: it enumerates the
//! standard-library and ecosystem value types that are trusted to be
//! immutable without inspection. Existing validated schemas depend on
//! this exact member set, so additions are a compatibility event.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::FieldType;
use crate::schema::SchemaSet;

// ---------------------------------------------------------------------------
// Primitive scalars
// ---------------------------------------------------------------------------

/// Scalar machine types. Always immutable as values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl PrimitiveKind {
    /// All primitive scalars, in declaration order.
    pub const ALL: [PrimitiveKind; 16] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::I8,
        PrimitiveKind::I16,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::I128,
        PrimitiveKind::Isize,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
        PrimitiveKind::U128,
        PrimitiveKind::Usize,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::I128 => "i128",
            PrimitiveKind::Isize => "isize",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::U128 => "u128",
            PrimitiveKind::Usize => "usize",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Intrinsic whitelist
// ---------------------------------------------------------------------------

/// Intrinsically immutable value types: the fixed interoperability
/// whitelist.
///
/// Each entry names a family of standard value types whose instances
/// carry no mutation API reachable through the validated surface. Scalar
/// numerics live in [`PrimitiveKind`] instead; optional wrappers are
/// represented structurally as [`FieldType::Optional`], so an optional
/// over any whitelisted payload validates identically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IntrinsicKind {
    /// UTF-8 text: `String`, `&'static str`, `Arc<str>`.
    Text,
    /// Monotonic instant: `std::time::Instant`.
    Instant,
    /// Wall-clock timestamp: `std::time::SystemTime`.
    SystemTime,
    /// Span of time: `std::time::Duration`, `chrono::TimeDelta`.
    Duration,
    /// Calendar date without timezone: `chrono::NaiveDate`.
    NaiveDate,
    /// Time of day without timezone: `chrono::NaiveTime`.
    NaiveTime,
    /// Date and time without timezone: `chrono::NaiveDateTime`.
    NaiveDateTime,
    /// Timezone-aware timestamp: `chrono::DateTime<Utc>`.
    DateTimeUtc,
    /// Fixed-offset timestamp: `chrono::DateTime<FixedOffset>`.
    DateTimeFixedOffset,
    /// Unique identifier: `uuid::Uuid`.
    Uuid,
    /// Filesystem path: `PathBuf`, `&'static Path`.
    FilesystemPath,
    /// Arbitrary-precision integer.
    BigInt,
    /// Arbitrary-precision decimal.
    BigDecimal,
}

/// The whitelist as a table. Order is stable and part of the contract.
pub const INTRINSIC_WHITELIST: [IntrinsicKind; 13] = [
    IntrinsicKind::Text,
    IntrinsicKind::Instant,
    IntrinsicKind::SystemTime,
    IntrinsicKind::Duration,
    IntrinsicKind::NaiveDate,
    IntrinsicKind::NaiveTime,
    IntrinsicKind::NaiveDateTime,
    IntrinsicKind::DateTimeUtc,
    IntrinsicKind::DateTimeFixedOffset,
    IntrinsicKind::Uuid,
    IntrinsicKind::FilesystemPath,
    IntrinsicKind::BigInt,
    IntrinsicKind::BigDecimal,
];

impl IntrinsicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntrinsicKind::Text => "text",
            IntrinsicKind::Instant => "instant",
            IntrinsicKind::SystemTime => "system_time",
            IntrinsicKind::Duration => "duration",
            IntrinsicKind::NaiveDate => "naive_date",
            IntrinsicKind::NaiveTime => "naive_time",
            IntrinsicKind::NaiveDateTime => "naive_date_time",
            IntrinsicKind::DateTimeUtc => "date_time_utc",
            IntrinsicKind::DateTimeFixedOffset => "date_time_fixed_offset",
            IntrinsicKind::Uuid => "uuid",
            IntrinsicKind::FilesystemPath => "filesystem_path",
            IntrinsicKind::BigInt => "big_int",
            IntrinsicKind::BigDecimal => "big_decimal",
        }
    }
}

impl fmt::Display for IntrinsicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification taxonomy
// ---------------------------------------------------------------------------

/// Where a declared type falls in the immutability taxonomy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TypeClassification {
    /// Scalar machine type. Terminal success.
    Primitive,
    /// Member of the intrinsic whitelist. Terminal success.
    IntrinsicallyImmutable,
    /// A named type whose descriptor carries the immutability
    /// declaration. Still walked unless already cached.
    AnnotatedImmutable,
    /// A container representation that admits no mutation API.
    ImmutableContainerView,
    /// A single-slot reference cell. Held content is checked; the swap
    /// operation itself is out of scope.
    AtomicHolder,
    /// Everything else: unmarked named types, mutable containers,
    /// unresolvable references. Requires recursion or fails.
    OpaqueCandidate,
}

impl TypeClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeClassification::Primitive => "primitive",
            TypeClassification::IntrinsicallyImmutable => "intrinsically_immutable",
            TypeClassification::AnnotatedImmutable => "annotated_immutable",
            TypeClassification::ImmutableContainerView => "immutable_container_view",
            TypeClassification::AtomicHolder => "atomic_holder",
            TypeClassification::OpaqueCandidate => "opaque_candidate",
        }
    }

    /// Terminal classifications need no recursion to prove.
    pub fn is_terminal_success(&self) -> bool {
        matches!(
            self,
            TypeClassification::Primitive | TypeClassification::IntrinsicallyImmutable
        )
    }
}

impl fmt::Display for TypeClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a declared field type against the registered schemas.
///
/// Normalizes through optional and pointer wrappers: `Optional<T>`,
/// `Shared<T>` and `Owned<T>` classify as their payload does. Named
/// types resolve against `schema`; a resolvable descriptor carrying the
/// immutability declaration classifies as `AnnotatedImmutable`, anything
/// unresolvable or undeclared as `OpaqueCandidate`.
pub fn classify(field_type: &FieldType, schema: &SchemaSet) -> TypeClassification {
    match field_type {
        FieldType::Primitive(_) => TypeClassification::Primitive,
        FieldType::Intrinsic(_) => TypeClassification::IntrinsicallyImmutable,
        FieldType::Optional(inner) | FieldType::Shared(inner) | FieldType::Owned(inner) => {
            classify(inner, schema)
        }
        FieldType::FixedArray(_) => TypeClassification::ImmutableContainerView,
        FieldType::Sequence { repr, .. } => {
            if repr.is_unmodifiable_view() {
                TypeClassification::ImmutableContainerView
            } else {
                TypeClassification::OpaqueCandidate
            }
        }
        FieldType::Mapping { repr, .. } => {
            if repr.is_unmodifiable_view() {
                TypeClassification::ImmutableContainerView
            } else {
                TypeClassification::OpaqueCandidate
            }
        }
        FieldType::AtomicHolder { .. } => TypeClassification::AtomicHolder,
        FieldType::Named(name) => match schema.resolve(name) {
            Some(descriptor) if descriptor.declared_immutable => {
                TypeClassification::AnnotatedImmutable
            }
            _ => TypeClassification::OpaqueCandidate,
        },
    }
}
