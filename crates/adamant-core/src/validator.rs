//! The graph walker: proves structural immutability field by field.
//!
//! Two modes share one step order. Schema-mode walks descriptor tables
//! resolved through the registry; instance-mode walks a constructed
//! value through its witness probes. Per field:
//!
//! 1. type-bound (shared) fields are skipped;
//! 2. exempt fields and exempt/trusted field types are skipped;
//! 3. the slot itself must be fixed, not reassignable;
//! 4. terminal classifications (primitive, intrinsic) succeed;
//! 5. container shapes must be genuinely unmodifiable views, with every
//!    element recursively proven;
//! 6. opaque candidates recurse into the registered descriptor
//!    (schema-mode) or the probed value (instance-mode), with the cache
//!    and the walk stack breaking cycles;
//! 7. anything left is unclassifiable.
//!
//! The first violation aborts the walk and is wrapped with the
//! (type, field) context of each level it crosses on the way out.
//!
//! Instance-mode additionally tracks which proofs relied on
//! runtime-only evidence (erased element probes, current holder
//! content, currently-absent values). Such proofs hold for the walked
//! instance but are not recorded in the cache, because a structurally
//! different instance of the same type could still be mutable.

use serde::{Deserialize, Serialize};

use crate::cache::ValidationCache;
use crate::classify::classify;
use crate::container::{self, ContainerShape};
use crate::descriptor::{
    Described, ElementSlot, FieldBinding, FieldDescriptor, FieldMutability, FieldType,
    TypeDescriptor,
};
use crate::schema::{SchemaError, SchemaSet};
use crate::violation::MutabilityViolation;
use crate::witness::{witness_identity, FieldProbe, HolderProbe, Witness};

pub const COMPONENT: &str = "graph_validator";

// ---------------------------------------------------------------------------
// Context, events, reports
// ---------------------------------------------------------------------------

/// Caller-supplied observability context for report-producing walks.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub trace_id: &'a str,
}

impl<'a> ValidationContext<'a> {
    pub fn new(trace_id: &'a str) -> Self {
        Self { trace_id }
    }
}

impl Default for ValidationContext<'static> {
    fn default() -> Self {
        Self {
            trace_id: "trace-unset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkMode {
    Schema,
    Instance,
}

impl WalkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkMode::Schema => "schema",
            WalkMode::Instance => "instance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Immutable,
    Rejected,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Immutable => "immutable",
            Verdict::Rejected => "rejected",
        }
    }
}

/// One structured log record. Deterministic; no clocks, no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvent {
    pub trace_id: String,
    pub component: String,
    pub event: String,
    pub mode: String,
    pub type_name: String,
    pub field: Option<String>,
    pub outcome: String,
    pub error_code: Option<String>,
}

/// Outcome of one report-producing walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkReport {
    pub trace_id: String,
    pub mode: String,
    pub root: String,
    pub verdict: Verdict,
    pub types_walked: u64,
    pub fields_checked: u64,
    pub cache_hits: u64,
    pub violation: Option<MutabilityViolation>,
    pub events: Vec<ValidationEvent>,
}

impl WalkReport {
    pub fn is_immutable(&self) -> bool {
        self.verdict == Verdict::Immutable
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Drives walks against one schema registry and one cache.
///
/// Both collaborators are borrowed: the registry is read-only during
/// walks, and the cache is shared freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct GraphValidator<'a> {
    schema: &'a SchemaSet,
    cache: &'a ValidationCache,
}

impl<'a> GraphValidator<'a> {
    pub fn new(schema: &'a SchemaSet, cache: &'a ValidationCache) -> Self {
        Self { schema, cache }
    }

    /// Tie the cache to this registry's content fingerprint. Call after
    /// building or reloading the registry; proofs made against a
    /// different registry generation are dropped.
    pub fn bind_cache(&self) -> Result<bool, SchemaError> {
        Ok(self.cache.bind_generation(&self.schema.fingerprint()?))
    }

    /// Schema-mode walk of a registered type.
    pub fn validate_type(&self, type_name: &str) -> Result<(), MutabilityViolation> {
        let mut walk = Walk::new(self, WalkMode::Schema, "trace-unset", false);
        walk.schema_root(type_name)
    }

    pub fn validate_type_with_report(
        &self,
        type_name: &str,
        ctx: &ValidationContext<'_>,
    ) -> WalkReport {
        let mut walk = Walk::new(self, WalkMode::Schema, ctx.trace_id, true);
        walk.record("walk_started", type_name, None, "started", None);
        let outcome = walk.schema_root(type_name);
        walk.finish(type_name, outcome)
    }

    /// Schema-mode walk of a linked type, registered or not. Nested
    /// named references still resolve through the registry.
    pub fn validate_described<T: Described>(&self) -> Result<(), MutabilityViolation> {
        let mut walk = Walk::new(self, WalkMode::Schema, "trace-unset", false);
        walk.walk_descriptor(T::descriptor())
    }

    /// Instance-mode walk of a constructed value.
    pub fn validate_instance(&self, value: &dyn Witness) -> Result<(), MutabilityViolation> {
        let mut walk = Walk::new(self, WalkMode::Instance, "trace-unset", false);
        walk.instance_walk(value).map(|_| ())
    }

    pub fn validate_instance_with_report(
        &self,
        value: &dyn Witness,
        ctx: &ValidationContext<'_>,
    ) -> WalkReport {
        let root = value.descriptor().type_name.clone();
        let mut walk = Walk::new(self, WalkMode::Instance, ctx.trace_id, true);
        walk.record("walk_started", &root, None, "started", None);
        let outcome = walk.instance_walk(value).map(|_| ());
        walk.finish(&root, outcome)
    }

    /// Validate a family root together with its registered members.
    pub fn validate_family(&self, root: &str) -> Result<(), MutabilityViolation> {
        let mut walk = Walk::new(self, WalkMode::Schema, "trace-unset", false);
        walk.family_walk(root)
    }

    pub fn validate_family_with_report(
        &self,
        root: &str,
        ctx: &ValidationContext<'_>,
    ) -> WalkReport {
        let mut walk = Walk::new(self, WalkMode::Schema, ctx.trace_id, true);
        walk.record("walk_started", root, None, "started", None);
        let outcome = walk.family_walk(root);
        walk.finish(root, outcome)
    }
}

// ---------------------------------------------------------------------------
// Walk state
// ---------------------------------------------------------------------------

/// A proof failure plus whether it came out of a recursive walk (and so
/// still needs this level's context wrapped around it).
struct TypeProofError {
    violation: MutabilityViolation,
    recursed: bool,
}

impl TypeProofError {
    fn leaf(violation: MutabilityViolation) -> Self {
        Self {
            violation,
            recursed: false,
        }
    }

    fn recursed(violation: MutabilityViolation) -> Self {
        Self {
            violation,
            recursed: true,
        }
    }
}

struct Walk<'w> {
    schema: &'w SchemaSet,
    cache: &'w ValidationCache,
    mode: WalkMode,
    trace_id: &'w str,
    recording: bool,
    events: Vec<ValidationEvent>,
    types_walked: u64,
    fields_checked: u64,
    cache_hits: u64,
    /// Schema-mode in-progress types; membership breaks type cycles.
    type_stack: Vec<String>,
    /// Instance-mode in-progress witnesses; a revisit is a true cycle.
    instance_stack: Vec<(usize, usize)>,
}

impl<'w> Walk<'w> {
    fn new(
        validator: &GraphValidator<'w>,
        mode: WalkMode,
        trace_id: &'w str,
        recording: bool,
    ) -> Self {
        Self {
            schema: validator.schema,
            cache: validator.cache,
            mode,
            trace_id,
            recording,
            events: Vec::new(),
            types_walked: 0,
            fields_checked: 0,
            cache_hits: 0,
            type_stack: Vec::new(),
            instance_stack: Vec::new(),
        }
    }

    fn record(
        &mut self,
        event: &str,
        type_name: &str,
        field: Option<&str>,
        outcome: &str,
        error_code: Option<&str>,
    ) {
        if !self.recording {
            return;
        }
        self.events.push(ValidationEvent {
            trace_id: self.trace_id.to_string(),
            component: COMPONENT.to_string(),
            event: event.to_string(),
            mode: self.mode.as_str().to_string(),
            type_name: type_name.to_string(),
            field: field.map(str::to_string),
            outcome: outcome.to_string(),
            error_code: error_code.map(str::to_string),
        });
    }

    /// Run a speculative sub-proof without polluting the event stream
    /// or the report counters. Cache entries made by the sub-proof are
    /// kept: a quiet schema proof is still a complete proof.
    fn quietly<T>(&mut self, probe: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.recording;
        let types_walked = self.types_walked;
        let fields_checked = self.fields_checked;
        let cache_hits = self.cache_hits;
        self.recording = false;
        let out = probe(self);
        self.recording = previous;
        self.types_walked = types_walked;
        self.fields_checked = fields_checked;
        self.cache_hits = cache_hits;
        out
    }

    fn finish(mut self, root: &str, outcome: Result<(), MutabilityViolation>) -> WalkReport {
        let (verdict, violation) = match outcome {
            Ok(()) => (Verdict::Immutable, None),
            Err(violation) => (Verdict::Rejected, Some(violation)),
        };
        self.record(
            "walk_completed",
            root,
            None,
            verdict.as_str(),
            violation.as_ref().map(|v| v.error_code()),
        );
        WalkReport {
            trace_id: self.trace_id.to_string(),
            mode: self.mode.as_str().to_string(),
            root: root.to_string(),
            verdict,
            types_walked: self.types_walked,
            fields_checked: self.fields_checked,
            cache_hits: self.cache_hits,
            violation,
            events: self.events,
        }
    }

    // -- schema mode --

    fn schema_root(&mut self, type_name: &str) -> Result<(), MutabilityViolation> {
        let schema = self.schema;
        match schema.resolve(type_name) {
            Some(descriptor) => self.walk_descriptor(descriptor),
            None => Err(MutabilityViolation::UnclassifiableFieldType {
                type_name: type_name.to_string(),
                field: None,
                declared: type_name.to_string(),
            }),
        }
    }

    fn family_walk(&mut self, root: &str) -> Result<(), MutabilityViolation> {
        self.schema_root(root)?;
        if let Some(members) = self.schema.family_members(root) {
            for member in members {
                self.schema_root(member)?;
            }
        }
        Ok(())
    }

    fn walk_descriptor(&mut self, descriptor: &TypeDescriptor) -> Result<(), MutabilityViolation> {
        let type_name = descriptor.type_name.as_str();
        // A type-level exemption trusts every instance unconditionally;
        // the type is never itself validated, and never cached as a
        // proof.
        if descriptor.exempt {
            self.record("type_exempt", type_name, None, "exempt", None);
            return Ok(());
        }
        if self.cache.contains(type_name) {
            self.cache_hits += 1;
            self.record("cache_hit", type_name, None, "hit", None);
            return Ok(());
        }
        // A type currently on the walk stack is mid-proof; treating the
        // back-reference as success is what terminates type cycles.
        if self.type_stack.iter().any(|entry| entry == type_name) {
            return Ok(());
        }

        self.type_stack.push(type_name.to_string());
        self.types_walked += 1;
        let walked = self.walk_fields_schema(descriptor);
        self.type_stack.pop();
        walked?;

        self.cache.insert(type_name);
        self.record("type_proven", type_name, None, "proven", None);
        Ok(())
    }

    fn walk_fields_schema(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<(), MutabilityViolation> {
        let owner = descriptor.type_name.as_str();
        for field in &descriptor.fields {
            if self.skip_field(owner, field) {
                continue;
            }
            self.fields_checked += 1;

            if let Err(violation) = self.check_field_schema(owner, field) {
                self.record(
                    "field_checked",
                    owner,
                    Some(&field.name),
                    "violation",
                    Some(violation.error_code()),
                );
                return Err(violation);
            }
            self.record("field_checked", owner, Some(&field.name), "ok", None);
        }
        Ok(())
    }

    fn check_field_schema(
        &mut self,
        owner: &str,
        field: &FieldDescriptor,
    ) -> Result<(), MutabilityViolation> {
        self.check_slot_mutability(owner, field)?;
        match self.prove_type_schema(owner, &field.name, &field.field_type) {
            Ok(()) => Ok(()),
            Err(TypeProofError {
                violation,
                recursed: true,
            }) => Err(violation.nested_in(owner, field.name.clone())),
            Err(TypeProofError { violation, .. }) => Err(violation),
        }
    }

    /// Steps 4-7 for one declared type, also used for container element
    /// positions. Leaf failures already carry (owner, field) context;
    /// recursive failures are raw and tagged for the caller to wrap.
    fn prove_type_schema(
        &mut self,
        owner: &str,
        field: &str,
        declared: &FieldType,
    ) -> Result<(), TypeProofError> {
        if classify(declared, self.schema).is_terminal_success() {
            return Ok(());
        }

        if let Some(name) = declared.named_core() {
            if self.type_is_exempt_name(name) {
                return Ok(());
            }
            if self.schema.is_denied(name) {
                return Err(TypeProofError::leaf(
                    MutabilityViolation::DeniedFieldType {
                        type_name: owner.to_string(),
                        field: field.to_string(),
                        denied: name.to_string(),
                    },
                ));
            }
        }

        if let Some(shape) = container::inspect(declared) {
            return self
                .prove_container_schema(owner, field, shape)
                .map_err(TypeProofError::leaf);
        }

        if let Some(name) = declared.named_core() {
            let schema = self.schema;
            return match schema.resolve(name) {
                Some(descriptor) => self
                    .walk_descriptor(descriptor)
                    .map_err(TypeProofError::recursed),
                None => Err(TypeProofError::leaf(
                    MutabilityViolation::UnclassifiableFieldType {
                        type_name: owner.to_string(),
                        field: Some(field.to_string()),
                        declared: name.to_string(),
                    },
                )),
            };
        }

        Err(TypeProofError::leaf(
            MutabilityViolation::UnclassifiableFieldType {
                type_name: owner.to_string(),
                field: Some(field.to_string()),
                declared: declared.display_name(),
            },
        ))
    }

    fn prove_container_schema(
        &mut self,
        owner: &str,
        field: &str,
        shape: ContainerShape<'_>,
    ) -> Result<(), MutabilityViolation> {
        if !shape.is_unmodifiable_view() {
            return Err(MutabilityViolation::MutableContainerValue {
                type_name: owner.to_string(),
                field: field.to_string(),
                repr: shape.label().to_string(),
            });
        }
        if shape.first_erased_slot().is_some() {
            return Err(MutabilityViolation::MissingGenericTypeInformation {
                type_name: owner.to_string(),
                field: field.to_string(),
                container: shape.label().to_string(),
            });
        }

        match shape {
            ContainerShape::Sequence { element, .. } => {
                self.prove_slot_schema(owner, field, shape.label(), element)
            }
            ContainerShape::Mapping { key, value, .. } => {
                self.prove_slot_schema(owner, field, shape.label(), key)?;
                self.prove_slot_schema(owner, field, shape.label(), value)
            }
            ContainerShape::InlineArray { element } => {
                self.prove_element_schema(owner, field, "inline array", element)
            }
            ContainerShape::AtomicHolder { content } => {
                self.prove_slot_schema(owner, field, shape.label(), content)
            }
        }
    }

    fn prove_slot_schema(
        &mut self,
        owner: &str,
        field: &str,
        container: &str,
        slot: &ElementSlot,
    ) -> Result<(), MutabilityViolation> {
        match slot.as_type() {
            Some(element_type) => self.prove_element_schema(owner, field, container, element_type),
            // Erased slots were already rejected above.
            None => Ok(()),
        }
    }

    fn prove_element_schema(
        &mut self,
        owner: &str,
        field: &str,
        container: &str,
        element_type: &FieldType,
    ) -> Result<(), MutabilityViolation> {
        self.prove_type_schema(owner, field, element_type)
            .map_err(|proof| MutabilityViolation::MutableContainerElement {
                type_name: owner.to_string(),
                field: field.to_string(),
                container: container.to_string(),
                element: element_type.display_name(),
                cause: Box::new(proof.violation),
            })
    }

    // -- instance mode --

    /// Walk a constructed value. `Ok(true)` means the proof was
    /// schema-grade (no runtime-only evidence) and the type was cached.
    fn instance_walk(&mut self, value: &dyn Witness) -> Result<bool, MutabilityViolation> {
        let descriptor = value.descriptor();
        let type_name = descriptor.type_name.as_str();

        if descriptor.exempt {
            self.record("type_exempt", type_name, None, "exempt", None);
            return Ok(true);
        }
        if self.cache.contains(type_name) {
            self.cache_hits += 1;
            self.record("cache_hit", type_name, None, "hit", None);
            return Ok(true);
        }

        let identity = witness_identity(value);
        if self.instance_stack.contains(&identity) {
            return Err(MutabilityViolation::CyclicInstanceGraph {
                type_name: type_name.to_string(),
            });
        }

        self.instance_stack.push(identity);
        self.types_walked += 1;
        let walked = self.walk_fields_instance(value, descriptor);
        self.instance_stack.pop();
        let schema_grade = walked?;

        if schema_grade {
            self.cache.insert(type_name);
            self.record("type_proven", type_name, None, "proven", None);
        }
        Ok(schema_grade)
    }

    fn walk_fields_instance(
        &mut self,
        value: &dyn Witness,
        descriptor: &TypeDescriptor,
    ) -> Result<bool, MutabilityViolation> {
        let owner = descriptor.type_name.as_str();
        let mut schema_grade = true;

        for field in &descriptor.fields {
            if self.skip_field(owner, field) {
                continue;
            }
            self.fields_checked += 1;
            if let Err(violation) = self.check_slot_mutability(owner, field) {
                self.record(
                    "field_checked",
                    owner,
                    Some(&field.name),
                    "violation",
                    Some(violation.error_code()),
                );
                return Err(violation);
            }

            if classify(&field.field_type, self.schema).is_terminal_success() {
                self.record("field_checked", owner, Some(&field.name), "ok", None);
                continue;
            }

            let probe = value.probe(&field.name);
            let proof = match self.prove_probe(owner, &field.name, probe, Some(&field.field_type)) {
                Ok(grade) => grade,
                Err(TypeProofError {
                    violation,
                    recursed,
                }) => {
                    let violation = if recursed {
                        violation.nested_in(owner, field.name.clone())
                    } else {
                        violation
                    };
                    self.record(
                        "field_checked",
                        owner,
                        Some(&field.name),
                        "violation",
                        Some(violation.error_code()),
                    );
                    return Err(violation);
                }
            };
            schema_grade &= proof;
            self.record("field_checked", owner, Some(&field.name), "ok", None);
        }
        Ok(schema_grade)
    }

    /// Prove one probed value. `declared` carries the schema-side type
    /// of the slot when it is known (field positions and typed element
    /// slots); `None` means runtime-only evidence.
    fn prove_probe(
        &mut self,
        owner: &str,
        field: &str,
        probe: FieldProbe<'_>,
        declared: Option<&FieldType>,
    ) -> Result<bool, TypeProofError> {
        match probe {
            // The witness claims terminal content. Hold it to the
            // declaration: a settled claim cannot override a declared
            // type the schema itself would reject.
            FieldProbe::Settled => match declared {
                Some(declared_type) => self
                    .quietly(|walk| walk.prove_type_schema(owner, field, declared_type))
                    .map(|()| true),
                None => Ok(false),
            },
            FieldProbe::Absent => Ok(self.declared_is_schema_provable(owner, field, declared)),
            FieldProbe::Sequence { repr, elements } => {
                if !repr.is_unmodifiable_view() {
                    return Err(TypeProofError::leaf(
                        MutabilityViolation::MutableContainerValue {
                            type_name: owner.to_string(),
                            field: field.to_string(),
                            repr: repr.label().to_string(),
                        },
                    ));
                }
                let slot = declared_sequence_slot(declared);
                let mut grade = self.slot_is_schema_provable(owner, field, slot);
                for element in elements {
                    let element_declared = slot.and_then(ElementSlot::as_type);
                    grade &= self.prove_element_probe(
                        owner,
                        field,
                        repr.label(),
                        element,
                        element_declared,
                    )?;
                }
                Ok(grade)
            }
            FieldProbe::Mapping { repr, entries } => {
                if !repr.is_unmodifiable_view() {
                    return Err(TypeProofError::leaf(
                        MutabilityViolation::MutableContainerValue {
                            type_name: owner.to_string(),
                            field: field.to_string(),
                            repr: repr.label().to_string(),
                        },
                    ));
                }
                let (key_slot, value_slot) = declared_mapping_slots(declared);
                let mut grade = self.slot_is_schema_provable(owner, field, key_slot)
                    && self.slot_is_schema_provable(owner, field, value_slot);
                for (key, value) in entries {
                    grade &= self.prove_element_probe(
                        owner,
                        field,
                        repr.label(),
                        key,
                        key_slot.and_then(ElementSlot::as_type),
                    )?;
                    grade &= self.prove_element_probe(
                        owner,
                        field,
                        repr.label(),
                        value,
                        value_slot.and_then(ElementSlot::as_type),
                    )?;
                }
                Ok(grade)
            }
            FieldProbe::Holder(holder) => {
                let content_slot = declared_holder_slot(declared);
                match holder {
                    HolderProbe::Settled | HolderProbe::Empty => {
                        Ok(self.slot_is_schema_provable(owner, field, content_slot))
                    }
                    HolderProbe::Held(content) => {
                        let grade = self.prove_element_probe(
                            owner,
                            field,
                            "atomic holder",
                            FieldProbe::Nested(&*content),
                            content_slot.and_then(ElementSlot::as_type),
                        )?;
                        Ok(grade && self.slot_is_schema_provable(owner, field, content_slot))
                    }
                }
            }
            FieldProbe::Nested(child) => {
                let child_descriptor = child.descriptor();
                let child_name = child_descriptor.type_name.as_str();
                if child_descriptor.exempt || self.type_is_exempt_name(child_name) {
                    return Ok(true);
                }
                if self.schema.is_denied(child_name) {
                    return Err(TypeProofError::leaf(
                        MutabilityViolation::DeniedFieldType {
                            type_name: owner.to_string(),
                            field: field.to_string(),
                            denied: child_name.to_string(),
                        },
                    ));
                }
                self.instance_walk(child).map_err(TypeProofError::recursed)
            }
            FieldProbe::Opaque { type_name } => Err(TypeProofError::leaf(
                MutabilityViolation::UnclassifiableFieldType {
                    type_name: owner.to_string(),
                    field: Some(field.to_string()),
                    declared: type_name,
                },
            )),
            FieldProbe::Unknown => Err(TypeProofError::leaf(
                MutabilityViolation::UninspectableField {
                    type_name: owner.to_string(),
                    field: field.to_string(),
                    detail: "witness does not expose the field".to_string(),
                },
            )),
        }
    }

    fn prove_element_probe(
        &mut self,
        owner: &str,
        field: &str,
        container: &str,
        probe: FieldProbe<'_>,
        declared: Option<&FieldType>,
    ) -> Result<bool, TypeProofError> {
        let element = match (&probe, declared) {
            (FieldProbe::Nested(child), _) => child.descriptor().type_name.clone(),
            (_, Some(declared_type)) => declared_type.display_name(),
            (probe, None) => probe.kind_name().to_string(),
        };
        self.prove_probe(owner, field, probe, declared)
            .map_err(|proof| {
                TypeProofError::leaf(MutabilityViolation::MutableContainerElement {
                    type_name: owner.to_string(),
                    field: field.to_string(),
                    container: container.to_string(),
                    element,
                    cause: Box::new(proof.violation),
                })
            })
    }

    // -- shared steps --

    /// Steps 1-2: shared bindings and exemptions.
    fn skip_field(&mut self, owner: &str, field: &FieldDescriptor) -> bool {
        if field.binding == FieldBinding::Shared {
            self.record(
                "field_checked",
                owner,
                Some(&field.name),
                "skipped_shared",
                None,
            );
            return true;
        }
        if field.exempt || self.type_is_exempt(&field.field_type) {
            self.record(
                "field_checked",
                owner,
                Some(&field.name),
                "skipped_exempt",
                None,
            );
            return true;
        }
        false
    }

    /// Step 3: the slot itself must not be reassignable.
    fn check_slot_mutability(
        &self,
        owner: &str,
        field: &FieldDescriptor,
    ) -> Result<(), MutabilityViolation> {
        if field.mutability == FieldMutability::Reassignable {
            return Err(MutabilityViolation::ReassignableField {
                type_name: owner.to_string(),
                field: field.name.clone(),
            });
        }
        Ok(())
    }

    fn type_is_exempt(&self, field_type: &FieldType) -> bool {
        field_type
            .named_core()
            .is_some_and(|name| self.type_is_exempt_name(name))
    }

    fn type_is_exempt_name(&self, name: &str) -> bool {
        self.schema.is_trusted(name)
            || self
                .schema
                .resolve(name)
                .is_some_and(|descriptor| descriptor.exempt)
    }

    /// Whether a proof of the declared type would succeed from the
    /// schema alone, without the instance in hand. Used to decide if an
    /// instance-mode pass may be recorded in the cache.
    fn declared_is_schema_provable(
        &mut self,
        owner: &str,
        field: &str,
        declared: Option<&FieldType>,
    ) -> bool {
        match declared {
            Some(declared_type) => self
                .quietly(|walk| walk.prove_type_schema(owner, field, declared_type))
                .is_ok(),
            None => false,
        }
    }

    fn slot_is_schema_provable(
        &mut self,
        owner: &str,
        field: &str,
        slot: Option<&ElementSlot>,
    ) -> bool {
        match slot.and_then(ElementSlot::as_type) {
            Some(element_type) => self
                .quietly(|walk| walk.prove_type_schema(owner, field, element_type))
                .is_ok(),
            None => false,
        }
    }
}

fn declared_sequence_slot(declared: Option<&FieldType>) -> Option<&ElementSlot> {
    match declared.map(FieldType::normalized) {
        Some(FieldType::Sequence { element, .. }) => Some(element),
        _ => None,
    }
}

fn declared_mapping_slots(
    declared: Option<&FieldType>,
) -> (Option<&ElementSlot>, Option<&ElementSlot>) {
    match declared.map(FieldType::normalized) {
        Some(FieldType::Mapping { key, value, .. }) => (Some(key), Some(value)),
        _ => (None, None),
    }
}

fn declared_holder_slot(declared: Option<&FieldType>) -> Option<&ElementSlot> {
    match declared.map(FieldType::normalized) {
        Some(FieldType::AtomicHolder { content }) => Some(content),
        _ => None,
    }
}
