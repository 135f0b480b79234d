#![no_main]

use adamant_core::{GraphValidator, SchemaSet, ValidationCache, ValidationContext};
use libfuzzer_sys::fuzz_target;

// Feed arbitrary bytes through JSON schema ingestion and the schema
// walk. Any parseable registry must walk every type and family without
// panicking, and must survive re-walking against a warm cache.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(schema) = serde_json::from_str::<SchemaSet>(text) else {
        return;
    };

    let cache = ValidationCache::new();
    let validator = GraphValidator::new(&schema, &cache);
    let _ = validator.bind_cache();

    let ctx = ValidationContext::new("trace-fuzz");
    let type_names: Vec<String> = schema.type_names().map(str::to_string).collect();
    for type_name in &type_names {
        let _ = validator.validate_type(type_name);
        let report = validator.validate_type_with_report(type_name, &ctx);
        if let Some(violation) = &report.violation {
            let _ = violation.render_chain();
            let _ = violation.frames();
        }
    }

    let family_roots: Vec<String> = schema.family_roots().map(str::to_string).collect();
    for root in &family_roots {
        let _ = validator.validate_family(root);
    }

    // Warm-cache pass: proven types must stay proven.
    for type_name in &type_names {
        if cache.contains(type_name) {
            assert!(validator.validate_type(type_name).is_ok());
        }
    }

    if let Ok(json) = serde_json::to_string(&schema)
        && let Ok(decoded) = serde_json::from_str::<SchemaSet>(&json)
    {
        assert_eq!(schema.fingerprint().ok(), decoded.fingerprint().ok());
    }
});
