//! Instance-mode walks over constructed values and their witnesses.

use std::sync::{Arc, OnceLock};

use adamant_core::{
    Described, ElementSlot, FieldDescriptor, FieldProbe, FieldType, GraphValidator, HolderProbe,
    IntrinsicKind, MappingRepr, PrimitiveKind, SchemaSet, SequenceRepr, TypeDescriptor,
    ValidationCache, ValidationContext, Witness,
};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

fn text() -> FieldType {
    FieldType::Intrinsic(IntrinsicKind::Text)
}

// ---------------------------------------------------------------------------
// Fixtures: a published shop catalog
// ---------------------------------------------------------------------------

struct PriceTag {
    amount_minor: i64,
    currency: String,
}

impl Described for PriceTag {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::PriceTag")
                .with_field(FieldDescriptor::fixed(
                    "amount_minor",
                    FieldType::Primitive(PrimitiveKind::I64),
                ))
                .with_field(FieldDescriptor::fixed("currency", text()))
        })
    }
}

impl Witness for PriceTag {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <PriceTag as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "amount_minor" | "currency" => FieldProbe::Settled,
            _ => FieldProbe::Unknown,
        }
    }
}

struct CatalogEntry {
    id: Uuid,
    title: String,
    first_listed: NaiveDate,
    price: PriceTag,
    aliases: Arc<[String]>,
}

impl Described for CatalogEntry {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::CatalogEntry")
                .with_field(FieldDescriptor::fixed(
                    "id",
                    FieldType::Intrinsic(IntrinsicKind::Uuid),
                ))
                .with_field(FieldDescriptor::fixed("title", text()))
                .with_field(FieldDescriptor::fixed(
                    "first_listed",
                    FieldType::Intrinsic(IntrinsicKind::NaiveDate),
                ))
                .with_field(FieldDescriptor::fixed(
                    "price",
                    FieldType::named("shop::PriceTag"),
                ))
                .with_field(FieldDescriptor::fixed(
                    "aliases",
                    FieldType::sequence(SequenceRepr::Frozen, ElementSlot::typed(text())),
                ))
        })
    }
}

impl Witness for CatalogEntry {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <CatalogEntry as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "id" | "title" | "first_listed" => FieldProbe::Settled,
            "price" => FieldProbe::nested(&self.price),
            "aliases" => FieldProbe::Sequence {
                repr: SequenceRepr::Frozen,
                elements: self.aliases.iter().map(|_| FieldProbe::Settled).collect(),
            },
            _ => FieldProbe::Unknown,
        }
    }
}

struct Catalog {
    generated_at: DateTime<Utc>,
    entries: Arc<[CatalogEntry]>,
}

impl Described for Catalog {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::Catalog")
                .with_field(FieldDescriptor::fixed(
                    "generated_at",
                    FieldType::Intrinsic(IntrinsicKind::DateTimeUtc),
                ))
                .with_field(FieldDescriptor::fixed(
                    "entries",
                    FieldType::sequence(
                        SequenceRepr::Frozen,
                        ElementSlot::typed(FieldType::named("shop::CatalogEntry")),
                    ),
                ))
        })
    }
}

impl Witness for Catalog {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Catalog as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "generated_at" => FieldProbe::Settled,
            "entries" => FieldProbe::frozen_witnesses(&self.entries),
            _ => FieldProbe::Unknown,
        }
    }
}

fn sample_catalog() -> Catalog {
    let first_listed = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
    let entries = vec![
        CatalogEntry {
            id: Uuid::new_v4(),
            title: "brass hinge".to_string(),
            first_listed,
            price: PriceTag {
                amount_minor: 450,
                currency: "EUR".to_string(),
            },
            aliases: Arc::from(vec!["hinge".to_string()]),
        },
        CatalogEntry {
            id: Uuid::new_v4(),
            title: "oak shelf".to_string(),
            first_listed,
            price: PriceTag {
                amount_minor: 12_900,
                currency: "EUR".to_string(),
            },
            aliases: Arc::from(Vec::<String>::new()),
        },
    ];
    Catalog {
        generated_at: Utc::now(),
        entries: Arc::from(entries),
    }
}

fn shop_schema() -> SchemaSet {
    let mut schema = SchemaSet::new();
    schema.register::<PriceTag>().expect("price tag");
    schema.register::<CatalogEntry>().expect("catalog entry");
    schema.register::<Catalog>().expect("catalog");
    schema
}

// ---------------------------------------------------------------------------
// Fixtures: mutable counterexamples
// ---------------------------------------------------------------------------

struct ScratchPad {
    notes: Vec<String>,
}

impl Described for ScratchPad {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::new("shop::ScratchPad").with_field(FieldDescriptor::fixed(
                "notes",
                FieldType::sequence(SequenceRepr::Growable, ElementSlot::typed(text())),
            ))
        })
    }
}

impl Witness for ScratchPad {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <ScratchPad as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "notes" => FieldProbe::Sequence {
                repr: SequenceRepr::Growable,
                elements: self.notes.iter().map(|_| FieldProbe::Settled).collect(),
            },
            _ => FieldProbe::Unknown,
        }
    }
}

struct Showcase {
    featured: Arc<[ScratchPad]>,
}

impl Described for Showcase {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::Showcase").with_field(FieldDescriptor::fixed(
                "featured",
                FieldType::sequence(
                    SequenceRepr::Frozen,
                    ElementSlot::typed(FieldType::named("shop::ScratchPad")),
                ),
            ))
        })
    }
}

impl Witness for Showcase {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Showcase as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "featured" => FieldProbe::frozen_witnesses(&self.featured),
            _ => FieldProbe::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Plain walks
// ---------------------------------------------------------------------------

#[test]
fn catalog_fixture_holds_plausible_data() {
    let catalog = sample_catalog();
    assert!(catalog.generated_at <= Utc::now());
    assert_eq!(catalog.entries.len(), 2);
    let hinge = &catalog.entries[0];
    assert_ne!(hinge.id, catalog.entries[1].id);
    assert_eq!(hinge.title, "brass hinge");
    assert_eq!(hinge.first_listed.to_string(), "2024-11-03");
    assert_eq!(hinge.price.currency, "EUR");
    assert!(hinge.price.amount_minor > 0);
    assert_eq!(hinge.aliases.len(), 1);
}

#[test]
fn immutable_catalog_instance_passes_and_is_cached() {
    let schema = shop_schema();
    let cache = ValidationCache::new();
    let validator = GraphValidator::new(&schema, &cache);
    let catalog = sample_catalog();

    validator.validate_instance(&catalog).expect("immutable");

    // Every slot was schema-provable, so the proofs are type-level.
    assert!(cache.contains("shop::Catalog"));
    assert!(cache.contains("shop::CatalogEntry"));
    assert!(cache.contains("shop::PriceTag"));

    // A second instance of the same types is a pure cache hit.
    let ctx = ValidationContext::new("trace-second-instance");
    let report = validator.validate_instance_with_report(&sample_catalog(), &ctx);
    assert!(report.is_immutable());
    assert_eq!(report.fields_checked, 0);
    assert_eq!(report.cache_hits, 1);
}

#[test]
fn growable_sequence_value_is_rejected() {
    let schema = shop_schema();
    let cache = ValidationCache::new();
    let pad = ScratchPad {
        notes: vec!["todo".to_string()],
    };

    let violation = GraphValidator::new(&schema, &cache)
        .validate_instance(&pad)
        .expect_err("growable");
    assert_eq!(violation.error_code(), "AD-STRUCT-0003");
    assert_eq!(violation.type_name(), "shop::ScratchPad");
    assert_eq!(violation.field(), Some("notes"));
}

#[test]
fn frozen_view_holding_mutable_elements_is_rejected_with_context() {
    let mut schema = shop_schema();
    schema.register::<ScratchPad>().expect("scratch pad");
    schema.register::<Showcase>().expect("showcase");
    let cache = ValidationCache::new();
    let showcase = Showcase {
        featured: Arc::from(vec![ScratchPad {
            notes: vec!["polish".to_string()],
        }]),
    };

    let violation = GraphValidator::new(&schema, &cache)
        .validate_instance(&showcase)
        .expect_err("mutable element");
    assert_eq!(violation.error_code(), "AD-STRUCT-0004");
    assert_eq!(violation.field(), Some("featured"));
    assert_eq!(violation.root_cause().error_code(), "AD-STRUCT-0003");

    let frames = violation.frames();
    assert_eq!(frames[0].type_name, "shop::ScratchPad");
    assert_eq!(frames[0].field.as_deref(), Some("notes"));
}

#[test]
fn empty_frozen_view_of_mutable_element_type_passes_but_is_not_cached() {
    let mut schema = shop_schema();
    schema.register::<ScratchPad>().expect("scratch pad");
    schema.register::<Showcase>().expect("showcase");
    let cache = ValidationCache::new();
    let validator = GraphValidator::new(&schema, &cache);

    let empty = Showcase {
        featured: Arc::from(Vec::<ScratchPad>::new()),
    };
    validator
        .validate_instance(&empty)
        .expect("nothing mutable is reachable right now");
    assert!(
        !cache.contains("shop::Showcase"),
        "an instance-only pass must not stand in for a type-level proof"
    );

    let full = Showcase {
        featured: Arc::from(vec![ScratchPad { notes: Vec::new() }]),
    };
    validator
        .validate_instance(&full)
        .expect_err("a populated showcase is still rejected");
}

// ---------------------------------------------------------------------------
// Optional and holder slots
// ---------------------------------------------------------------------------

struct Revision {
    draft_notes: Option<Vec<String>>,
}

impl Described for Revision {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::Revision").with_field(FieldDescriptor::fixed(
                "draft_notes",
                FieldType::optional(FieldType::sequence(
                    SequenceRepr::Growable,
                    ElementSlot::typed(text()),
                )),
            ))
        })
    }
}

impl Witness for Revision {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Revision as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "draft_notes" => match &self.draft_notes {
                None => FieldProbe::Absent,
                Some(notes) => FieldProbe::Sequence {
                    repr: SequenceRepr::Growable,
                    elements: notes.iter().map(|_| FieldProbe::Settled).collect(),
                },
            },
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn absent_mutable_typed_value_passes_without_caching() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();
    let validator = GraphValidator::new(&schema, &cache);

    let empty = Revision { draft_notes: None };
    validator.validate_instance(&empty).expect("nothing to walk");
    assert!(!cache.contains("shop::Revision"));

    let populated = Revision {
        draft_notes: Some(vec!["tighten copy".to_string()]),
    };
    let violation = validator
        .validate_instance(&populated)
        .expect_err("present value is walked");
    assert_eq!(violation.error_code(), "AD-STRUCT-0003");
}

struct Amendment {
    supersedes: Option<PriceTag>,
}

impl Described for Amendment {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::Amendment").with_field(FieldDescriptor::fixed(
                "supersedes",
                FieldType::optional(FieldType::named("shop::PriceTag")),
            ))
        })
    }
}

impl Witness for Amendment {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Amendment as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "supersedes" => FieldProbe::from_option(self.supersedes.as_ref()),
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn absent_named_value_grades_quietly_without_counter_noise() {
    let schema = shop_schema();
    let cache = ValidationCache::new();
    let validator = GraphValidator::new(&schema, &cache);

    let amendment = Amendment { supersedes: None };
    let ctx = ValidationContext::new("trace-absent-grade");
    let report = validator.validate_instance_with_report(&amendment, &ctx);
    assert!(report.is_immutable());

    // Grading the absent slot proves shop::PriceTag at type level on
    // the side. The report only accounts for the walk the caller asked
    // for: one type, one field, no cache traffic.
    assert_eq!(report.types_walked, 1);
    assert_eq!(report.fields_checked, 1);
    assert_eq!(report.cache_hits, 0);
    assert!(report
        .events
        .iter()
        .all(|event| event.type_name != "shop::PriceTag"));

    // The side proof is a real schema proof and stays cached.
    assert!(cache.contains("shop::PriceTag"));
    assert!(cache.contains("shop::Amendment"));
}

struct Settings {
    timeout_ms: u64,
}

impl Described for Settings {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("svc::Settings").with_field(FieldDescriptor::fixed(
                "timeout_ms",
                FieldType::Primitive(PrimitiveKind::U64),
            ))
        })
    }
}

impl Witness for Settings {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Settings as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "timeout_ms" => FieldProbe::Settled,
            _ => FieldProbe::Unknown,
        }
    }
}

struct Service {
    name: String,
    config: RwLock<Option<Arc<Settings>>>,
}

impl Described for Service {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("svc::Service")
                .with_field(FieldDescriptor::fixed("name", text()))
                .with_field(FieldDescriptor::fixed(
                    "config",
                    FieldType::atomic_holder(ElementSlot::typed(FieldType::named(
                        "svc::Settings",
                    ))),
                ))
        })
    }
}

impl Witness for Service {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Service as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "name" => FieldProbe::Settled,
            "config" => match self.config.read().clone() {
                Some(settings) => FieldProbe::Holder(HolderProbe::Held(settings)),
                None => FieldProbe::Holder(HolderProbe::Empty),
            },
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn atomic_holder_content_is_walked_when_present() {
    let mut schema = SchemaSet::new();
    schema.register::<Settings>().expect("settings");
    schema.register::<Service>().expect("service");
    let cache = ValidationCache::new();
    let validator = GraphValidator::new(&schema, &cache);

    let idle = Service {
        name: "search".to_string(),
        config: RwLock::new(None),
    };
    validator.validate_instance(&idle).expect("empty holder");

    let configured = Service {
        name: "search".to_string(),
        config: RwLock::new(Some(Arc::new(Settings { timeout_ms: 250 }))),
    };
    validator
        .validate_instance(&configured)
        .expect("held settings are immutable");
    assert!(cache.contains("svc::Service"));
    assert_eq!(
        configured.config.read().as_ref().map(|s| s.timeout_ms),
        Some(250),
    );
}

struct SharedState {
    snapshot: RwLock<Option<Arc<ScratchPad>>>,
}

impl Described for SharedState {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("svc::SharedState").with_field(FieldDescriptor::fixed(
                "snapshot",
                FieldType::atomic_holder(ElementSlot::typed(FieldType::named(
                    "shop::ScratchPad",
                ))),
            ))
        })
    }
}

impl Witness for SharedState {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <SharedState as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "snapshot" => match self.snapshot.read().clone() {
                Some(pad) => FieldProbe::Holder(HolderProbe::Held(pad)),
                None => FieldProbe::Holder(HolderProbe::Empty),
            },
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn atomic_holder_with_mutable_content_is_rejected_with_nested_cause() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();
    let state = SharedState {
        snapshot: RwLock::new(Some(Arc::new(ScratchPad {
            notes: vec!["volatile".to_string()],
        }))),
    };

    let violation = GraphValidator::new(&schema, &cache)
        .validate_instance(&state)
        .expect_err("held content is mutable");
    assert_eq!(violation.error_code(), "AD-STRUCT-0004");
    assert!(violation.message().contains("atomic holder"));
    assert_eq!(violation.root_cause().error_code(), "AD-STRUCT-0003");
    assert_eq!(violation.root_cause().type_name(), "shop::ScratchPad");
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

struct Node {
    label: String,
    next: RwLock<Option<Arc<Node>>>,
}

impl Described for Node {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("graph::Node")
                .with_field(FieldDescriptor::fixed("label", text()))
                .with_field(FieldDescriptor::fixed(
                    "next",
                    FieldType::atomic_holder(ElementSlot::typed(FieldType::named("graph::Node"))),
                ))
        })
    }
}

impl Witness for Node {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Node as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "label" => FieldProbe::Settled,
            "next" => match self.next.read().clone() {
                Some(node) => FieldProbe::Holder(HolderProbe::Held(node)),
                None => FieldProbe::Holder(HolderProbe::Empty),
            },
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn cyclic_instance_graph_is_detected_and_rejected() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();

    let a = Arc::new(Node {
        label: "a".to_string(),
        next: RwLock::new(None),
    });
    let b = Arc::new(Node {
        label: "b".to_string(),
        next: RwLock::new(Some(a.clone())),
    });
    *a.next.write() = Some(b.clone());
    assert_eq!(a.label, "a");

    let violation = GraphValidator::new(&schema, &cache)
        .validate_instance(&*a)
        .expect_err("cycle");
    assert_eq!(violation.root_cause().error_code(), "AD-STRUCT-0008");
    assert_eq!(violation.root_cause().type_name(), "graph::Node");
    assert!(!cache.contains("graph::Node"));
}

#[test]
fn acyclic_chain_of_the_same_type_passes() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();

    let tail = Arc::new(Node {
        label: "tail".to_string(),
        next: RwLock::new(None),
    });
    let head = Node {
        label: "head".to_string(),
        next: RwLock::new(Some(tail)),
    };

    GraphValidator::new(&schema, &cache)
        .validate_instance(&head)
        .expect("a chain is not a cycle");
}

// ---------------------------------------------------------------------------
// Witness drift and opacity
// ---------------------------------------------------------------------------

struct Gadget {
    handle_repr: String,
}

impl Described for Gadget {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::Gadget")
                .with_field(FieldDescriptor::fixed(
                    "handle",
                    FieldType::named("ffi::RawHandle"),
                ))
                .with_field(FieldDescriptor::fixed("legacy_marker", text()))
        })
    }
}

impl Witness for Gadget {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Gadget as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "handle" => FieldProbe::opaque(self.handle_repr.clone()),
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn opaque_probe_is_unclassifiable() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();
    let gadget = Gadget {
        handle_repr: "ffi::RawHandle".to_string(),
    };

    let violation = GraphValidator::new(&schema, &cache)
        .validate_instance(&gadget)
        .expect_err("opaque");
    assert_eq!(violation.error_code(), "AD-STRUCT-0002");
    assert_eq!(violation.field(), Some("handle"));
    assert!(violation.message().contains("ffi::RawHandle"));
}

struct DriftingWitness;

impl Described for DriftingWitness {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::Drifting").with_field(FieldDescriptor::fixed(
                "renamed_field",
                FieldType::named("shop::PriceTag"),
            ))
        })
    }
}

impl Witness for DriftingWitness {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <DriftingWitness as Described>::descriptor()
    }

    fn probe(&self, _field: &str) -> FieldProbe<'_> {
        FieldProbe::Unknown
    }
}

#[test]
fn unknown_probe_for_a_declared_field_is_uninspectable() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();

    let violation = GraphValidator::new(&schema, &cache)
        .validate_instance(&DriftingWitness)
        .expect_err("drift");
    assert_eq!(violation.error_code(), "AD-STRUCT-0009");
    assert_eq!(violation.field(), Some("renamed_field"));
    assert!(violation.message().contains("could not be inspected"));
}

// ---------------------------------------------------------------------------
// Exemptions in instance mode
// ---------------------------------------------------------------------------

struct DebugHook {
    buffer: Vec<u8>,
}

impl Described for DebugHook {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::new("shop::DebugHook")
                .exempted()
                .with_field(FieldDescriptor::fixed(
                    "buffer",
                    FieldType::sequence(
                        SequenceRepr::Growable,
                        ElementSlot::typed(FieldType::Primitive(PrimitiveKind::U8)),
                    ),
                ))
        })
    }
}

impl Witness for DebugHook {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <DebugHook as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "buffer" => FieldProbe::Sequence {
                repr: SequenceRepr::Growable,
                elements: self.buffer.iter().map(|_| FieldProbe::Settled).collect(),
            },
            _ => FieldProbe::Unknown,
        }
    }
}

struct Instrumented {
    hook: DebugHook,
    serial: String,
}

impl Described for Instrumented {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::Instrumented")
                .with_field(FieldDescriptor::fixed(
                    "hook",
                    FieldType::named("shop::DebugHook"),
                ))
                .with_field(FieldDescriptor::fixed("serial", text()))
        })
    }
}

impl Witness for Instrumented {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <Instrumented as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "hook" => FieldProbe::nested(&self.hook),
            "serial" => FieldProbe::Settled,
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn exempt_child_type_is_skipped_during_instance_walks() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();
    let instrumented = Instrumented {
        hook: DebugHook {
            buffer: vec![1, 2, 3],
        },
        serial: "SN-0042".to_string(),
    };

    let validator = GraphValidator::new(&schema, &cache);
    validator
        .validate_instance(&instrumented)
        .expect("exempt hook is not walked");

    // Handing the exempt value over directly is the same bargain: it is
    // trusted as-is, never inspected, never recorded as a proof.
    validator
        .validate_instance(&instrumented.hook)
        .expect("exempt root is trusted");
    assert!(!cache.contains("shop::DebugHook"));
}

// ---------------------------------------------------------------------------
// Mapping probes
// ---------------------------------------------------------------------------

struct LocalizedNotes {
    by_locale: Arc<std::collections::BTreeMap<String, ScratchPad>>,
}

impl Described for LocalizedNotes {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::immutable("shop::LocalizedNotes").with_field(FieldDescriptor::fixed(
                "by_locale",
                FieldType::mapping(
                    MappingRepr::Frozen,
                    ElementSlot::typed(text()),
                    ElementSlot::typed(FieldType::named("shop::ScratchPad")),
                ),
            ))
        })
    }
}

impl Witness for LocalizedNotes {
    fn descriptor(&self) -> &'static TypeDescriptor {
        <LocalizedNotes as Described>::descriptor()
    }

    fn probe(&self, field: &str) -> FieldProbe<'_> {
        match field {
            "by_locale" => FieldProbe::Mapping {
                repr: MappingRepr::Frozen,
                entries: self
                    .by_locale
                    .values()
                    .map(|pad| (FieldProbe::Settled, FieldProbe::nested(pad)))
                    .collect(),
            },
            _ => FieldProbe::Unknown,
        }
    }
}

#[test]
fn frozen_mapping_with_mutable_values_is_rejected() {
    let schema = SchemaSet::new();
    let cache = ValidationCache::new();
    let mut by_locale = std::collections::BTreeMap::new();
    by_locale.insert(
        "de".to_string(),
        ScratchPad {
            notes: vec!["Notizen".to_string()],
        },
    );
    let localized = LocalizedNotes {
        by_locale: Arc::new(by_locale),
    };

    let violation = GraphValidator::new(&schema, &cache)
        .validate_instance(&localized)
        .expect_err("mutable mapping values");
    assert_eq!(violation.error_code(), "AD-STRUCT-0004");
    assert_eq!(violation.field(), Some("by_locale"));
    assert_eq!(violation.root_cause().error_code(), "AD-STRUCT-0003");
}
