#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use xlint_lib::{parse_cert, Engine, Report};

static ENGINE: OnceLock<Engine> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    // Parsing and linting must never panic, regardless of input.
    if let Ok(cert) = parse_cert(data) {
        let engine = ENGINE.get_or_init(Engine::builtin);
        let diagnostics = engine.lint(&cert);

        let report = Report::new(&cert, diagnostics);
        let _ = report.display_text();
        let _ = report.to_json();
    }
});
