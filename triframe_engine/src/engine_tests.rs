//! Unit tests for engine.rs
//!
//! Tests the global logger slot, the severity threshold and the
//! engine_err!/engine_bail! macros.
//!
//! All tests are marked with #[serial] because they share the global logger.

use crate::triframe::{Engine, Error, Result};
use crate::triframe::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

/// Logger that captures entries for verification
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Entries emitted by these tests only (other tests may log concurrently)
fn ours(entries: &Arc<Mutex<Vec<LogEntry>>>) -> Vec<LogEntry> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.source == "triframe::test")
        .cloned()
        .collect()
}

fn restore_defaults() {
    Engine::reset_logger();
    Engine::set_log_threshold(LogSeverity::default_threshold());
}

// ============================================================================
// LOGGER SLOT
// ============================================================================

#[test]
#[serial]
fn test_custom_logger_receives_entries() {
    let entries = install_capture();
    Engine::set_log_threshold(LogSeverity::Trace);

    Engine::log(LogSeverity::Info, "triframe::test", "hello".to_string());

    let entries = ours(&entries);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "hello");
    assert!(entries[0].file.is_none());
    restore_defaults();
}

#[test]
#[serial]
fn test_log_detailed_carries_location() {
    let entries = install_capture();

    Engine::log_detailed(LogSeverity::Error, "triframe::test", "boom".to_string(), "x.rs", 9);

    let entries = ours(&entries);
    assert_eq!(entries[0].file, Some("x.rs"));
    assert_eq!(entries[0].line, Some(9));
    restore_defaults();
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    let entries = install_capture();
    Engine::reset_logger();

    Engine::log(LogSeverity::Warn, "triframe::test", "to stderr".to_string());

    assert!(ours(&entries).is_empty());
    restore_defaults();
}

// ============================================================================
// THRESHOLD
// ============================================================================

#[test]
#[serial]
fn test_threshold_filters_lower_severities() {
    let entries = install_capture();
    Engine::set_log_threshold(LogSeverity::Warn);

    Engine::log(LogSeverity::Trace, "triframe::test", "dropped".to_string());
    Engine::log(LogSeverity::Info, "triframe::test", "dropped".to_string());
    Engine::log(LogSeverity::Warn, "triframe::test", "kept".to_string());

    let entries = ours(&entries);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Warn);
    restore_defaults();
}

#[test]
#[serial]
fn test_errors_bypass_threshold() {
    Engine::set_log_threshold(LogSeverity::Error);
    assert!(Engine::is_enabled(LogSeverity::Error));
    assert!(!Engine::is_enabled(LogSeverity::Warn));
    restore_defaults();
}

// ============================================================================
// ERROR MACROS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = install_capture();

    let err = crate::engine_err!("triframe::test", "queue lost after {} frames", 3);

    assert!(matches!(err, Error::BackendError(ref msg) if msg == "queue lost after 3 frames"));
    let entries = ours(&entries);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].line.is_some());
    restore_defaults();
}

#[test]
#[serial]
fn test_engine_err_with_variant() {
    let _entries = install_capture();

    let err = crate::engine_err!(InvalidResource, "triframe::test", "slot {} empty", 0);

    assert!(matches!(err, Error::InvalidResource(ref msg) if msg == "slot 0 empty"));
    restore_defaults();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = install_capture();

    fn create(size: u32) -> Result<u32> {
        if size == 0 {
            crate::engine_bail!(InitializationFailed, "triframe::test", "zero-sized texture");
        }
        Ok(size)
    }

    assert_eq!(create(4).unwrap(), 4);
    assert!(matches!(create(0), Err(Error::InitializationFailed(_))));
    assert_eq!(ours(&entries).len(), 1);
    restore_defaults();
}
