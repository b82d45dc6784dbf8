//! Query log records with a thread-local capture sink for deterministic tests.
//! Records go to the global logger on `siddon::query` and, when enabled, into
//! the current thread's sink.

use serde::Serialize;
use std::cell::RefCell;
use std::time::Duration;

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Guard that disables the thread-local sink on drop.
pub struct SinkGuard;
impl Drop for SinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Enable the thread-local sink for the current thread.
#[must_use]
pub fn enable_thread_sink() -> SinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    SinkGuard
}

pub fn write_str(msg: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(msg.to_owned());
        }
    });
}

/// Drain captured messages. Empty when the sink is disabled.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| s.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

pub fn snapshot() -> Vec<String> {
    TL_SINK.with(|s| s.borrow().as_ref().cloned().unwrap_or_default())
}

/// One line per terminal `exec`.
#[derive(Debug, Serialize)]
pub struct QueryRecord<'a> {
    pub op: &'a str,
    pub collection: &'a str,
    pub duration_ms: u128,
    pub count: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> QueryRecord<'a> {
    #[must_use]
    pub fn new(op: &'a str, collection: &'a str, elapsed: Duration) -> Self {
        Self { op, collection, duration_ms: elapsed.as_millis(), count: 0, ok: true, error: None }
    }

    #[must_use]
    pub const fn count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn failed(mut self, err: &impl std::fmt::Display) -> Self {
        self.ok = false;
        self.error = Some(err.to_string());
        self
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"op\":\"{}\"}}", self.op))
    }
}

/// Emit a query record as a JSON line and capture it in the thread-local sink if enabled.
#[macro_export]
macro_rules! qlog {
    ($record:expr) => {{
        let __line = $record.to_json();
        $crate::utils::devlog::write_str(&__line);
        log::log!(target: $crate::utils::logger::QUERY_TARGET, log::Level::Debug, "{}", __line);
    }};
}
