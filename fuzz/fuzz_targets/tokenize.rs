#![no_main]

use libfuzzer_sys::fuzz_target;
use pyts::TokenKind;

fuzz_target!(|data: &[u8]| {
    // Avoid pathological allocations in the harness itself; libFuzzer will still mutate below this.
    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let (tokens, _diagnostics) = pyts::tokenize(&src);
    let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
    let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
    assert_eq!(indents, dedents);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
});
