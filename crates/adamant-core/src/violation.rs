//! The violation taxonomy: stable error codes, nested cause chains, and
//! rendering.
//!
//! Codes are append-only. Existing codes never change meaning and are
//! never reused; consumers key alerting and suppression rules off them.

use std::fmt;

use serde::{Deserialize, Serialize};

const COMPONENT: &str = "violation_report";

/// A proof failure somewhere in the walked graph.
///
/// Wrapping variants (`Nested`, `MutableContainerElement`) carry the
/// (type, field) context of one recursion level plus the inner cause;
/// unwinding them yields the [`ViolationFrame`] chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutabilityViolation {
    /// A field slot that can be reassigned after construction.
    ReassignableField { type_name: String, field: String },
    /// A field (or the root target when `field` is absent) whose type
    /// fails every immutability proof path.
    UnclassifiableFieldType {
        type_name: String,
        field: Option<String>,
        declared: String,
    },
    /// A container-typed field holding something other than a genuinely
    /// unmodifiable view.
    MutableContainerValue {
        type_name: String,
        field: String,
        repr: String,
    },
    /// A valid container view holding an element that failed validation.
    MutableContainerElement {
        type_name: String,
        field: String,
        container: String,
        element: String,
        cause: Box<MutabilityViolation>,
    },
    /// A container declared without reifiable element type information.
    MissingGenericTypeInformation {
        type_name: String,
        field: String,
        container: String,
    },
    /// One recursion level of context around an inner violation.
    NestedViolation {
        type_name: String,
        field: String,
        cause: Box<MutabilityViolation>,
    },
    /// A field whose type is registered in the known-mutable overrides.
    DeniedFieldType {
        type_name: String,
        field: String,
        denied: String,
    },
    /// The instance walk re-entered a value still being walked.
    CyclicInstanceGraph { type_name: String },
    /// The witness could not report the field (descriptor drift).
    UninspectableField {
        type_name: String,
        field: String,
        detail: String,
    },
}

impl MutabilityViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ReassignableField { .. } => "AD-STRUCT-0001",
            Self::UnclassifiableFieldType { .. } => "AD-STRUCT-0002",
            Self::MutableContainerValue { .. } => "AD-STRUCT-0003",
            Self::MutableContainerElement { .. } => "AD-STRUCT-0004",
            Self::MissingGenericTypeInformation { .. } => "AD-STRUCT-0005",
            Self::NestedViolation { .. } => "AD-STRUCT-0006",
            Self::DeniedFieldType { .. } => "AD-STRUCT-0007",
            Self::CyclicInstanceGraph { .. } => "AD-STRUCT-0008",
            Self::UninspectableField { .. } => "AD-STRUCT-0009",
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::ReassignableField { .. } => "reassignable_field",
            Self::UnclassifiableFieldType { .. } => "unclassifiable_field_type",
            Self::MutableContainerValue { .. } => "mutable_container_value",
            Self::MutableContainerElement { .. } => "mutable_container_element",
            Self::MissingGenericTypeInformation { .. } => "missing_generic_type_information",
            Self::NestedViolation { .. } => "nested_violation",
            Self::DeniedFieldType { .. } => "denied_field_type",
            Self::CyclicInstanceGraph { .. } => "cyclic_instance_graph",
            Self::UninspectableField { .. } => "uninspectable_field",
        }
    }

    /// The type whose walk produced this node.
    pub fn type_name(&self) -> &str {
        match self {
            Self::ReassignableField { type_name, .. }
            | Self::UnclassifiableFieldType { type_name, .. }
            | Self::MutableContainerValue { type_name, .. }
            | Self::MutableContainerElement { type_name, .. }
            | Self::MissingGenericTypeInformation { type_name, .. }
            | Self::NestedViolation { type_name, .. }
            | Self::DeniedFieldType { type_name, .. }
            | Self::CyclicInstanceGraph { type_name }
            | Self::UninspectableField { type_name, .. } => type_name,
        }
    }

    /// The field this node blames, when it blames one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ReassignableField { field, .. }
            | Self::MutableContainerValue { field, .. }
            | Self::MutableContainerElement { field, .. }
            | Self::MissingGenericTypeInformation { field, .. }
            | Self::NestedViolation { field, .. }
            | Self::DeniedFieldType { field, .. }
            | Self::UninspectableField { field, .. } => Some(field),
            Self::UnclassifiableFieldType { field, .. } => field.as_deref(),
            Self::CyclicInstanceGraph { .. } => None,
        }
    }

    /// The wrapped inner violation, for wrapping variants.
    pub fn cause(&self) -> Option<&MutabilityViolation> {
        match self {
            Self::MutableContainerElement { cause, .. } | Self::NestedViolation { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }

    /// Follow causes to the innermost violation.
    pub fn root_cause(&self) -> &MutabilityViolation {
        match self.cause() {
            Some(cause) => cause.root_cause(),
            None => self,
        }
    }

    /// Wrap with one recursion level of (type, field) context.
    pub fn nested_in(self, type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NestedViolation {
            type_name: type_name.into(),
            field: field.into(),
            cause: Box::new(self),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::ReassignableField { type_name, field } => {
                format!("field `{field}` in type `{type_name}` is declared reassignable")
            }
            Self::UnclassifiableFieldType {
                type_name,
                field: Some(field),
                declared,
            } => format!(
                "field `{field}` in type `{type_name}` has type `{declared}` which cannot be proven immutable"
            ),
            Self::UnclassifiableFieldType {
                type_name,
                field: None,
                ..
            } => format!(
                "type `{type_name}` has no registered descriptor and cannot be proven immutable"
            ),
            Self::MutableContainerValue {
                type_name,
                field,
                repr,
            } => format!(
                "field `{field}` in type `{type_name}` holds a {repr}, not an unmodifiable view"
            ),
            Self::MutableContainerElement {
                type_name,
                field,
                container,
                element,
                ..
            } if container == "atomic holder" => format!(
                "field `{field}` in type `{type_name}` is an atomic holder whose current content of type `{element}` is mutable"
            ),
            Self::MutableContainerElement {
                type_name,
                field,
                container,
                element,
                ..
            } => format!(
                "field `{field}` in type `{type_name}` is a {container} holding a mutable element of type `{element}`"
            ),
            Self::MissingGenericTypeInformation {
                type_name,
                field,
                container,
            } => format!(
                "field `{field}` in type `{type_name}` declares a {container} with no reifiable element type"
            ),
            Self::NestedViolation {
                type_name, field, ..
            } => format!("field `{field}` in type `{type_name}` contains a mutability violation"),
            Self::DeniedFieldType {
                type_name,
                field,
                denied,
            } => format!(
                "field `{field}` in type `{type_name}` has type `{denied}` which is registered as known-mutable"
            ),
            Self::CyclicInstanceGraph { type_name } => format!(
                "validation re-entered type `{type_name}` while it was still being walked; the instance graph is cyclic"
            ),
            Self::UninspectableField {
                type_name,
                field,
                detail,
            } => format!("field `{field}` in type `{type_name}` could not be inspected: {detail}"),
        }
    }

    pub fn structured_message(&self, trace_id: &str) -> String {
        format!(
            "trace_id={trace_id} component={COMPONENT} error_code={} kind={} type_name={} message={}",
            self.error_code(),
            self.kind_name(),
            self.type_name(),
            self.message()
        )
    }

    /// The (type, field) chain from the violating leaf outward.
    pub fn frames(&self) -> Vec<ViolationFrame> {
        let mut frames = Vec::new();
        self.collect_frames(&mut frames);
        frames
    }

    fn collect_frames(&self, out: &mut Vec<ViolationFrame>) {
        if let Some(cause) = self.cause() {
            cause.collect_frames(out);
        }
        out.push(ViolationFrame {
            type_name: self.type_name().to_string(),
            field: self.field().map(str::to_string),
            error_code: self.error_code().to_string(),
            message: self.message(),
        });
    }

    /// Multi-line rendering from the outermost context to the root
    /// cause.
    pub fn render_chain(&self) -> String {
        let mut lines = vec![format!("[{}] {}", self.error_code(), self.message())];
        let mut next = self.cause();
        while let Some(violation) = next {
            lines.push(format!(
                "  caused by [{}] {}",
                violation.error_code(),
                violation.message()
            ));
            next = violation.cause();
        }
        lines.join("\n")
    }
}

impl fmt::Display for MutabilityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "structural immutability violation [{}]: {}",
            self.error_code(),
            self.message()
        )
    }
}

impl std::error::Error for MutabilityViolation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// One level of the violation chain, innermost (leaf) first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationFrame {
    pub type_name: String,
    pub field: Option<String>,
    pub error_code: String,
    pub message: String,
}
