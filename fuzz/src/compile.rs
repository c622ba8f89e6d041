#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let engine = hotpage::Engine::new();
    if let Err(err) = engine.compile(data) {
        // Pretty printing must handle any span the compiler reports.
        let _ = format!("{err:#}");
    }
});
