use std::cell::Cell;

thread_local! {
    static TRACE_OVERRIDE: Cell<Option<bool>> = const { Cell::new(None) };
}

pub fn trace_enabled() -> bool {
    TRACE_OVERRIDE.with(|cell| {
        cell.get()
            .unwrap_or_else(|| std::env::var("PYTS_TRACE").is_ok_and(|v| v == "1"))
    })
}

/// Forces tracing on/off for the current thread; `None` defers to `PYTS_TRACE` again.
pub fn set_trace_override(value: Option<bool>) {
    TRACE_OVERRIDE.with(|cell| cell.set(value));
}

pub(crate) fn trace(stage: &str, message: impl FnOnce() -> String) {
    if trace_enabled() {
        eprintln!("[PYTS_TRACE] {stage}: {}", message());
    }
}
