//! Container shape recognition.
//!
//! The inspector recognizes the three container shapes the walk treats
//! specially (sequence/set views, mapping views, atomic holders, plus
//! inline arrays) and exposes their element slots for the caller to
//! recurse into. It never recurses itself, and it is the single place
//! that decides whether a representation counts as a genuinely
//! unmodifiable view rather than a merely-unmutated mutable container.

use crate::descriptor::{ElementSlot, FieldType, MappingRepr, SequenceRepr};

/// A recognized container shape, borrowing its element slots from the
/// declared field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerShape<'a> {
    Sequence {
        repr: SequenceRepr,
        element: &'a ElementSlot,
    },
    Mapping {
        repr: MappingRepr,
        key: &'a ElementSlot,
        value: &'a ElementSlot,
    },
    /// Inline fixed-length array. Always a view; never erased.
    InlineArray { element: &'a FieldType },
    AtomicHolder { content: &'a ElementSlot },
}

impl ContainerShape<'_> {
    /// Shape label used in violation messages.
    pub fn label(&self) -> &'static str {
        match self {
            ContainerShape::Sequence { repr, .. } => repr.label(),
            ContainerShape::Mapping { repr, .. } => repr.label(),
            ContainerShape::InlineArray { .. } => "inline array",
            ContainerShape::AtomicHolder { .. } => "atomic holder",
        }
    }

    /// Whether the declared representation admits no mutation API.
    /// Inline arrays and holders have no view/non-view distinction.
    pub fn is_unmodifiable_view(&self) -> bool {
        match self {
            ContainerShape::Sequence { repr, .. } => repr.is_unmodifiable_view(),
            ContainerShape::Mapping { repr, .. } => repr.is_unmodifiable_view(),
            ContainerShape::InlineArray { .. } | ContainerShape::AtomicHolder { .. } => true,
        }
    }

    /// First slot declared without reifiable type information, if any.
    pub fn first_erased_slot(&self) -> Option<&'static str> {
        match self {
            ContainerShape::Sequence { element, .. } => element.is_erased().then_some("element"),
            ContainerShape::Mapping { key, value, .. } => {
                if key.is_erased() {
                    Some("key")
                } else {
                    value.is_erased().then_some("value")
                }
            }
            ContainerShape::InlineArray { .. } => None,
            ContainerShape::AtomicHolder { content } => content.is_erased().then_some("content"),
        }
    }
}

/// Recognize a container shape in a declared field type.
///
/// Looks through optional and pointer wrappers first: an optional frozen
/// sequence is still a frozen sequence as far as shape goes. Returns
/// `None` for non-container types.
pub fn inspect(field_type: &FieldType) -> Option<ContainerShape<'_>> {
    match field_type.normalized() {
        FieldType::Sequence { repr, element } => Some(ContainerShape::Sequence {
            repr: *repr,
            element,
        }),
        FieldType::Mapping { repr, key, value } => Some(ContainerShape::Mapping {
            repr: *repr,
            key,
            value,
        }),
        FieldType::FixedArray(element) => Some(ContainerShape::InlineArray { element }),
        FieldType::AtomicHolder { content } => Some(ContainerShape::AtomicHolder { content }),
        _ => None,
    }
}
