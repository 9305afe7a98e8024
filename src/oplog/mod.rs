//! oplog
//!
//! Indentation-scoped diagnostic logging for nested sync operations.
//!
//! # Design
//!
//! An [`OperationLog`] is an explicit value carrying its own nesting depth and
//! a [`LogSink`] owned by the host application. There is no shared global
//! counter: each batch of sync operations owns its log, so independent
//! repositories can sync concurrently without interleaving their indentation.
//!
//! Messages are prefixed with `depth * 2` spaces before being dispatched to
//! the sink. [`OperationLog::scoped`] is the scoped-acquisition pattern:
//! depth is incremented on entry and restored on every exit path, including
//! early returns via `?`.
//!
//! # Example
//!
//! ```
//! use modsync::oplog::{MemorySink, OperationLog};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let mut log = OperationLog::new(sink.clone());
//!
//! log.debug("syncing module 'shop'");
//! log.scoped(|log| {
//!     log.debug("fetching");
//! });
//!
//! let lines = sink.lines();
//! assert_eq!(lines[0].1, "syncing module 'shop'");
//! assert_eq!(lines[1].1, "  fetching");
//! ```

use std::sync::{Arc, Mutex};

/// Severity of an emitted log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Step-by-step diagnostics.
    Debug,
    /// Expected but noteworthy conditions (pull on a tag checkout).
    Warn,
    /// Operation failures surfaced to the caller.
    Error,
}

/// Destination for formatted log lines.
///
/// The sink is owned by the host application; the engine only formats and
/// dispatches. The default sink forwards to `tracing`.
pub trait LogSink: Send + Sync {
    /// Record one already-indented message.
    fn log(&self, level: Level, message: &str);
}

/// Sink dispatching to the `tracing` ecosystem.
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
        }
    }
}

/// Sink collecting lines in memory, for tests and report capture.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded lines.
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().expect("sink lock poisoned").clone()
    }

    /// Snapshot of recorded lines at one level.
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        self.lines
            .lock()
            .expect("sink lock poisoned")
            .push((level, message.to_string()));
    }
}

/// Nesting-aware diagnostic logger.
#[derive(Clone)]
pub struct OperationLog {
    depth: usize,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for OperationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationLog")
            .field("depth", &self.depth)
            .finish()
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl OperationLog {
    /// Create a log at depth zero dispatching to the given sink.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { depth: 0, sink }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Increase nesting by one level.
    pub fn increment(&mut self) {
        self.depth += 1;
    }

    /// Decrease nesting by `count` levels; never goes below zero.
    pub fn decrement(&mut self, count: usize) {
        self.depth = self.depth.saturating_sub(count);
    }

    /// Run `body` one nesting level deeper, restoring depth on every exit path.
    pub fn scoped<T>(&mut self, body: impl FnOnce(&mut OperationLog) -> T) -> T {
        self.increment();
        let result = body(self);
        self.decrement(1);
        result
    }

    fn emit(&self, level: Level, message: &str) {
        let indented = format!("{}{}", " ".repeat(self.depth * 2), message);
        self.sink.log(level, &indented);
    }

    /// Emit a debug line at the current depth.
    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(Level::Debug, message.as_ref());
    }

    /// Emit a warning line at the current depth.
    pub fn warn(&self, message: impl AsRef<str>) {
        self.emit(Level::Warn, message.as_ref());
    }

    /// Emit an error line at the current depth.
    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Level::Error, message.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_log() -> (Arc<MemorySink>, OperationLog) {
        let sink = Arc::new(MemorySink::new());
        let log = OperationLog::new(sink.clone());
        (sink, log)
    }

    #[test]
    fn indentation_is_two_spaces_per_level() {
        let (sink, mut log) = memory_log();
        log.debug("top");
        log.increment();
        log.debug("nested");
        log.increment();
        log.error("deep");

        let lines = sink.lines();
        assert_eq!(lines[0].1, "top");
        assert_eq!(lines[1].1, "  nested");
        assert_eq!(lines[2], (Level::Error, "    deep".to_string()));
    }

    #[test]
    fn decrement_never_goes_below_zero() {
        let (_, mut log) = memory_log();
        log.decrement(5);
        assert_eq!(log.depth(), 0);
        log.increment();
        log.decrement(3);
        assert_eq!(log.depth(), 0);
    }

    #[test]
    fn scoped_restores_depth_on_success() {
        let (_, mut log) = memory_log();
        log.scoped(|log| {
            assert_eq!(log.depth(), 1);
        });
        assert_eq!(log.depth(), 0);
    }

    #[test]
    fn scoped_restores_depth_on_failure() {
        let (_, mut log) = memory_log();
        let result: Result<(), &str> = log.scoped(|log| {
            log.error("boom");
            Err("boom")
        });
        assert!(result.is_err());
        assert_eq!(log.depth(), 0);
    }

    #[test]
    fn scoped_nests() {
        let (sink, mut log) = memory_log();
        log.scoped(|log| {
            log.debug("one");
            log.scoped(|log| log.debug("two"));
        });
        let lines = sink.lines();
        assert_eq!(lines[0].1, "  one");
        assert_eq!(lines[1].1, "    two");
    }

    #[test]
    fn memory_sink_filters_by_level() {
        let (sink, log) = memory_log();
        log.debug("a");
        log.warn("b");
        log.error("c");
        assert_eq!(sink.lines_at(Level::Warn), vec!["b".to_string()]);
    }
}
