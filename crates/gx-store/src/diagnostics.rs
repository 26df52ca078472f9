use std::sync::Mutex;

/// Fire-and-forget receiver for non-fatal store diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "gx_store::capacity", "{message}");
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn warn(&self, _message: &str) {}
}

/// Keeps every message in memory, for tests and embedders that surface
/// diagnostics themselves.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
