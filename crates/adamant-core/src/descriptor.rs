//! Self-description tables: the compile-time replacement for runtime
//! field introspection.
//!
//! Every validated type exposes a [`TypeDescriptor`]: its stable
//! qualified name, its immutability declaration, and an ordered table of
//! [`FieldDescriptor`]s. Descriptors are plain serializable data, so a
//! schema graph can equally be linked in code (via [`Described`]) or
//! loaded from JSON and validated without any Rust type in scope.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::{IntrinsicKind, PrimitiveKind};

// ---------------------------------------------------------------------------
// Container representations
// ---------------------------------------------------------------------------

/// Declared (or observed) runtime representation of a sequence or set.
///
/// Only `Frozen` is a genuinely unmodifiable view. `BoxedSlice` cannot
/// grow but still exposes element writes through an exclusive owner, so
/// it does not qualify.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SequenceRepr {
    /// `Vec<T>`, `VecDeque<T>`, hash/tree sets. Mutable.
    Growable,
    /// `Box<[T]>`. Fixed length, element-writable.
    BoxedSlice,
    /// `Arc<[T]>`, `&'static [T]`, `Arc`-shared sets. No mutation API.
    Frozen,
}

impl SequenceRepr {
    pub fn is_unmodifiable_view(&self) -> bool {
        matches!(self, SequenceRepr::Frozen)
    }

    /// Human label used in violation messages.
    pub fn label(&self) -> &'static str {
        match self {
            SequenceRepr::Growable => "growable sequence",
            SequenceRepr::BoxedSlice => "boxed slice",
            SequenceRepr::Frozen => "frozen sequence",
        }
    }
}

/// Declared (or observed) runtime representation of a mapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MappingRepr {
    /// `HashMap`, `BTreeMap` held directly. Mutable.
    Growable,
    /// `Arc`-shared map. No mutation API.
    Frozen,
}

impl MappingRepr {
    pub fn is_unmodifiable_view(&self) -> bool {
        matches!(self, MappingRepr::Frozen)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MappingRepr::Growable => "growable mapping",
            MappingRepr::Frozen => "frozen mapping",
        }
    }
}

// ---------------------------------------------------------------------------
// Element slots
// ---------------------------------------------------------------------------

/// The element (or key, value, content) position of a container type.
///
/// `Erased` models a declaration that carries no reifiable element type,
/// such as a type-erased payload. In schema-mode an erased slot cannot
/// be proven and is reported as its own violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementSlot {
    Typed(Box<FieldType>),
    Erased,
}

impl ElementSlot {
    pub fn typed(field_type: FieldType) -> Self {
        ElementSlot::Typed(Box::new(field_type))
    }

    pub fn as_type(&self) -> Option<&FieldType> {
        match self {
            ElementSlot::Typed(field_type) => Some(field_type),
            ElementSlot::Erased => None,
        }
    }

    pub fn is_erased(&self) -> bool {
        matches!(self, ElementSlot::Erased)
    }

    fn display_name(&self) -> String {
        match self {
            ElementSlot::Typed(field_type) => field_type.display_name(),
            ElementSlot::Erased => "?".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

/// Schema-level shape of a declared field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Scalar machine type.
    Primitive(PrimitiveKind),
    /// Member of the intrinsic whitelist.
    Intrinsic(IntrinsicKind),
    /// Optional wrapper; immutable iff the payload is.
    Optional(Box<FieldType>),
    /// Shared pointer (`Arc`, `Rc`); recurses into the pointee.
    Shared(Box<FieldType>),
    /// Owned indirection (`Box`); recurses into the pointee.
    Owned(Box<FieldType>),
    /// Inline fixed-length array; recurses into the element.
    FixedArray(Box<FieldType>),
    /// Sequence or set container.
    Sequence {
        repr: SequenceRepr,
        element: ElementSlot,
    },
    /// Mapping container.
    Mapping {
        repr: MappingRepr,
        key: ElementSlot,
        value: ElementSlot,
    },
    /// Single-slot reference cell. Only held content is checked; the
    /// swap operation is out of scope.
    AtomicHolder { content: ElementSlot },
    /// Reference to another described type, resolved by qualified name.
    Named(String),
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        FieldType::Named(name.into())
    }

    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    pub fn shared(inner: FieldType) -> Self {
        FieldType::Shared(Box::new(inner))
    }

    pub fn owned(inner: FieldType) -> Self {
        FieldType::Owned(Box::new(inner))
    }

    pub fn sequence(repr: SequenceRepr, element: ElementSlot) -> Self {
        FieldType::Sequence { repr, element }
    }

    pub fn mapping(repr: MappingRepr, key: ElementSlot, value: ElementSlot) -> Self {
        FieldType::Mapping { repr, key, value }
    }

    pub fn atomic_holder(content: ElementSlot) -> Self {
        FieldType::AtomicHolder { content }
    }

    /// Strip optional and pointer wrappers down to the underlying type.
    pub fn normalized(&self) -> &FieldType {
        match self {
            FieldType::Optional(inner) | FieldType::Shared(inner) | FieldType::Owned(inner) => {
                inner.normalized()
            }
            other => other,
        }
    }

    /// Qualified name of the underlying named type, if any.
    pub fn named_core(&self) -> Option<&str> {
        match self.normalized() {
            FieldType::Named(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Human-readable shape name used in violation messages.
    pub fn display_name(&self) -> String {
        match self {
            FieldType::Primitive(kind) => kind.as_str().to_string(),
            FieldType::Intrinsic(kind) => kind.as_str().to_string(),
            FieldType::Optional(inner) => format!("optional<{}>", inner.display_name()),
            FieldType::Shared(inner) => format!("shared<{}>", inner.display_name()),
            FieldType::Owned(inner) => format!("owned<{}>", inner.display_name()),
            FieldType::FixedArray(element) => format!("array<{}>", element.display_name()),
            FieldType::Sequence { repr, element } => {
                format!("{}<{}>", repr.label(), element.display_name())
            }
            FieldType::Mapping { repr, key, value } => format!(
                "{}<{}, {}>",
                repr.label(),
                key.display_name(),
                value.display_name(),
            ),
            FieldType::AtomicHolder { content } => {
                format!("atomic holder<{}>", content.display_name())
            }
            FieldType::Named(name) => name.clone(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Field descriptors
// ---------------------------------------------------------------------------

/// Whether a field belongs to each instance or to the type itself.
/// Type-level bindings are outside the instance graph and skipped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldBinding {
    PerInstance,
    Shared,
}

/// Declared mutability of the field slot itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldMutability {
    /// Set once during construction, never reassigned.
    Fixed,
    /// Reassignable after construction (interior-mutable cells, public
    /// writable slots). Always a violation.
    Reassignable,
}

/// One field of a described type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub binding: FieldBinding,
    pub mutability: FieldMutability,
    /// Field-level escape hatch: trust this field unconditionally.
    pub exempt: bool,
    pub field_type: FieldType,
}

impl FieldDescriptor {
    /// A per-instance, fixed, non-exempt field.
    pub fn fixed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            binding: FieldBinding::PerInstance,
            mutability: FieldMutability::Fixed,
            exempt: false,
            field_type,
        }
    }

    /// A field whose slot can be reassigned after construction.
    pub fn reassignable(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            mutability: FieldMutability::Reassignable,
            ..Self::fixed(name, field_type)
        }
    }

    /// Mark the field exempt from validation.
    pub fn exempted(mut self) -> Self {
        self.exempt = true;
        self
    }

    /// Bind the field to the type rather than to instances.
    pub fn shared_binding(mut self) -> Self {
        self.binding = FieldBinding::Shared;
        self
    }
}

// ---------------------------------------------------------------------------
// Type descriptors
// ---------------------------------------------------------------------------

/// A validated type's full self-description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Stable qualified name, e.g. `fleet::Car`. Doubles as the cache
    /// key and the link target for [`FieldType::Named`].
    pub type_name: String,
    /// Carries the immutability declaration: the type opted in and is
    /// validated at its own construction.
    pub declared_immutable: bool,
    /// Type-level escape hatch: trust any instance unconditionally.
    pub exempt: bool,
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            declared_immutable: false,
            exempt: false,
            fields: Vec::new(),
        }
    }

    /// A descriptor carrying the immutability declaration.
    pub fn immutable(type_name: impl Into<String>) -> Self {
        Self {
            declared_immutable: true,
            ..Self::new(type_name)
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Mark the whole type exempt from validation.
    pub fn exempted(mut self) -> Self {
        self.exempt = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

// ---------------------------------------------------------------------------
// Schema-side self-description hook
// ---------------------------------------------------------------------------

/// Implemented by types that expose a static descriptor table, usually
/// behind a `OnceLock`:
///
/// ```
/// use std::sync::OnceLock;
/// use adamant_core::classify::IntrinsicKind;
/// use adamant_core::descriptor::{Described, FieldDescriptor, FieldType, TypeDescriptor};
///
/// struct Badge {
///     label: String,
/// }
///
/// impl Described for Badge {
///     fn descriptor() -> &'static TypeDescriptor {
///         static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
///         DESCRIPTOR.get_or_init(|| {
///             TypeDescriptor::immutable("demo::Badge").with_field(FieldDescriptor::fixed(
///                 "label",
///                 FieldType::Intrinsic(IntrinsicKind::Text),
///             ))
///         })
///     }
/// }
/// ```
pub trait Described {
    fn descriptor() -> &'static TypeDescriptor;
}
