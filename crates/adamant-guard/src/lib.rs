#![forbid(unsafe_code)]

//! Construction interception and registry sweeps over `adamant-core`.
//!
//! The core proves structural immutability on demand; this crate puts
//! that proof on the construction path. [`Guarded`] runs instance-mode
//! validation before a value becomes reachable (including construction
//! by deserialization), and [`verify_registry`] is the startup sweep
//! that walks every registered type and family in schema-mode and
//! renders the verdicts as one report.

use std::fmt;
use std::fs;
use std::ops::Deref;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Serialize};

use adamant_core::{
    GraphValidator, MutabilityViolation, SchemaError, SchemaSet, ValidationCache,
    ValidationContext, ValidationEvent, Verdict, Witness,
};

pub const COMPONENT: &str = "adamant_guard";

/// Process exit code for a fully immutable registry.
pub const EXIT_IMMUTABLE: i32 = 0;
/// Process exit code when at least one target was rejected.
pub const EXIT_REJECTED: i32 = 21;

// ---------------------------------------------------------------------------
// Sweep errors
// ---------------------------------------------------------------------------

/// Sweep-surface failures that are not mutability verdicts.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("schema registry error: {0}")]
    Schema(#[from] SchemaError),
    #[error("schema input `{path}` could not be read: {detail}")]
    Input { path: String, detail: String },
    #[error("schema input `{path}` could not be decoded: {detail}")]
    Decode { path: String, detail: String },
}

/// Load a serialized [`SchemaSet`] from a JSON file.
pub fn load_schema(path: &str) -> Result<SchemaSet, SweepError> {
    let bytes = fs::read_to_string(path).map_err(|error| SweepError::Input {
        path: path.to_string(),
        detail: error.to_string(),
    })?;
    serde_json::from_str(&bytes).map_err(|error| SweepError::Decode {
        path: path.to_string(),
        detail: error.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Guarded construction
// ---------------------------------------------------------------------------

/// A value proven structurally immutable before it became reachable.
///
/// The constructor runs instance-mode validation; on violation the
/// value is dropped and the guard is never produced. Access is
/// read-only through [`Deref`]/[`Guarded::get`]; [`Guarded::into_inner`]
/// releases the value once the caller no longer needs the proof carried
/// by the wrapper type.
pub struct Guarded<T: Witness>(T);

impl<T: Witness> Guarded<T> {
    /// Validate against the process-wide cache with an empty registry.
    ///
    /// Every nested reference must be provable through witness probes.
    /// Callers with registered descriptors, overrides, or families
    /// should use [`Guarded::with_validator`].
    pub fn new(value: T) -> Result<Self, MutabilityViolation> {
        adamant_core::verify_instance(&value)?;
        Ok(Self(value))
    }

    /// Validate against a caller-built schema registry and cache.
    pub fn with_validator(
        validator: &GraphValidator<'_>,
        value: T,
    ) -> Result<Self, MutabilityViolation> {
        validator.validate_instance(&value)?;
        Ok(Self(value))
    }

    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Witness> Deref for Guarded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Witness> AsRef<T> for Guarded<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T: Witness + fmt::Debug> fmt::Debug for Guarded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guarded").field(&self.0).finish()
    }
}

impl<T: Witness + Clone> Clone for Guarded<T> {
    // The original proof covers the clone: a witness reports structure,
    // and a clone has the same structure.
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Witness + PartialEq> PartialEq for Guarded<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Witness + Serialize> Serialize for Guarded<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Construction by decoding is intercepted the same way as direct
/// construction: the payload is parsed, then validated, and a rejected
/// payload never surfaces as a decoded value.
impl<'de, T: Witness + DeserializeOwned> Deserialize<'de> for Guarded<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = T::deserialize(deserializer)?;
        Guarded::new(value)
            .map_err(|violation| de::Error::custom(violation.structured_message("trace-decode")))
    }
}

// ---------------------------------------------------------------------------
// Registry sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepTarget {
    Type,
    Family,
}

impl SweepTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepTarget::Type => "type",
            SweepTarget::Family => "family",
        }
    }
}

/// One swept target's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub target: String,
    pub kind: SweepTarget,
    pub verdict: Verdict,
    pub fields_checked: u64,
    pub cache_hits: u64,
    pub violation: Option<MutabilityViolation>,
}

/// Outcome of one full registry sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryReport {
    pub trace_id: String,
    pub schema_fingerprint: String,
    pub verdict: Verdict,
    pub types_total: u64,
    pub types_rejected: u64,
    pub families_total: u64,
    pub families_rejected: u64,
    pub fields_checked: u64,
    pub cache_hits: u64,
    pub entries: Vec<RegistryEntry>,
    pub events: Vec<ValidationEvent>,
}

impl RegistryReport {
    pub fn is_immutable(&self) -> bool {
        self.verdict == Verdict::Immutable
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_immutable() {
            EXIT_IMMUTABLE
        } else {
            EXIT_REJECTED
        }
    }

    pub fn rejected_entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.verdict == Verdict::Rejected)
    }
}

/// Walk every registered type and family in schema-mode.
///
/// The startup entry point: binds the cache to this registry's
/// fingerprint, sweeps each target with the sweep's trace id, and
/// aggregates the per-target reports. Targets after a rejection are
/// still swept; the report carries every verdict, not just the first
/// failure.
pub fn verify_registry(
    schema: &SchemaSet,
    cache: &ValidationCache,
    ctx: &ValidationContext<'_>,
) -> Result<RegistryReport, SweepError> {
    let fingerprint = schema.fingerprint()?;
    cache.bind_generation(&fingerprint);
    let validator = GraphValidator::new(schema, cache);

    let mut entries = Vec::new();
    let mut events = Vec::new();
    let mut fields_checked = 0u64;
    let mut cache_hits = 0u64;
    let mut types_rejected = 0u64;
    let mut families_rejected = 0u64;

    for type_name in schema.type_names() {
        let walk = validator.validate_type_with_report(type_name, ctx);
        if walk.verdict == Verdict::Rejected {
            types_rejected += 1;
        }
        fields_checked += walk.fields_checked;
        cache_hits += walk.cache_hits;
        entries.push(RegistryEntry {
            target: type_name.to_string(),
            kind: SweepTarget::Type,
            verdict: walk.verdict,
            fields_checked: walk.fields_checked,
            cache_hits: walk.cache_hits,
            violation: walk.violation,
        });
        events.extend(walk.events);
    }

    let mut families_total = 0u64;
    for root in schema.family_roots() {
        families_total += 1;
        let walk = validator.validate_family_with_report(root, ctx);
        if walk.verdict == Verdict::Rejected {
            families_rejected += 1;
        }
        fields_checked += walk.fields_checked;
        cache_hits += walk.cache_hits;
        entries.push(RegistryEntry {
            target: root.to_string(),
            kind: SweepTarget::Family,
            verdict: walk.verdict,
            fields_checked: walk.fields_checked,
            cache_hits: walk.cache_hits,
            violation: walk.violation,
        });
        events.extend(walk.events);
    }

    let verdict = if types_rejected == 0 && families_rejected == 0 {
        Verdict::Immutable
    } else {
        Verdict::Rejected
    };

    Ok(RegistryReport {
        trace_id: ctx.trace_id.to_string(),
        schema_fingerprint: fingerprint.to_string(),
        verdict,
        types_total: schema.len() as u64,
        types_rejected,
        families_total,
        families_rejected,
        fields_checked,
        cache_hits,
        entries,
        events,
    })
}

/// One-line key=value summary plus one line per rejected target.
pub fn render_registry_summary(report: &RegistryReport) -> String {
    let mut out = format!(
        "trace_id={} verdict={} types={} types_rejected={} families={} families_rejected={} \
         fields_checked={} cache_hits={} exit_code={}",
        report.trace_id,
        report.verdict.as_str(),
        report.types_total,
        report.types_rejected,
        report.families_total,
        report.families_rejected,
        report.fields_checked,
        report.cache_hits,
        report.exit_code(),
    );
    for entry in report.rejected_entries() {
        let code = entry
            .violation
            .as_ref()
            .map(MutabilityViolation::error_code)
            .unwrap_or("unknown");
        out.push_str(&format!(
            "\nrejected {}={} error_code={}",
            entry.kind.as_str(),
            entry.target,
            code,
        ));
        if let Some(violation) = &entry.violation {
            out.push_str(&format!("\n  {}", violation.render_chain()));
        }
    }
    out
}
