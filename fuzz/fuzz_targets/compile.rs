#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 32 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let Ok(result) = pyts::compile(&src) else {
        return;
    };
    // Rendering must be pure.
    let rendered = result.render_diagnostics();
    assert_eq!(rendered, result.render_diagnostics());
});
