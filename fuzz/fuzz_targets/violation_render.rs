#![no_main]

use adamant_core::MutabilityViolation;
use libfuzzer_sys::fuzz_target;

// Violations arrive over the wire in sweep reports; arbitrary decoded
// chains must render and re-encode without panicking.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(violation) = serde_json::from_str::<MutabilityViolation>(text) else {
        return;
    };

    let _ = violation.message();
    let _ = violation.structured_message("trace-fuzz");
    let _ = violation.render_chain();
    let _ = violation.to_string();

    let frames = violation.frames();
    assert!(!frames.is_empty());
    assert_eq!(
        frames.first().map(|frame| frame.error_code.as_str()),
        Some(violation.root_cause().error_code()),
    );

    let json = serde_json::to_string(&violation).expect("violations always encode");
    let decoded: MutabilityViolation =
        serde_json::from_str(&json).expect("encoded violations decode");
    assert_eq!(violation, decoded);
});
