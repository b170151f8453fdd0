//! Integration tests for the engine logging system
//!
//! Exercises the public logging API and the exported macros the way a
//! backend crate uses them. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use triframe_engine::triframe::{Engine, Error, Result};
use triframe_engine::triframe::log::{DefaultLogger, Logger, LogEntry, LogSeverity};
use triframe_engine::{engine_bail, engine_debug, engine_err, engine_info, engine_trace, engine_warn, engine_error};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn install() -> Arc<Mutex<Vec<LogEntry>>> {
        let entries = Arc::new(Mutex::new(Vec::new()));
        Engine::set_logger(Self { entries: entries.clone() });
        entries
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn reset() {
    Engine::reset_logger();
    Engine::set_log_threshold(LogSeverity::default_threshold());
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_macros_reach_custom_logger() {
    let entries = TestLogger::install();
    Engine::set_log_threshold(LogSeverity::Trace);

    engine_trace!("triframe::FrameLoop", "frame {}", 1);
    engine_debug!("triframe::FramebufferManager", "rebuilt at {}x{}", 800, 600);
    engine_info!("triframe::Application", "started");
    engine_warn!("triframe::vulkan", "present suboptimal");
    engine_error!("triframe::vulkan", "device lost");

    let captured = entries.lock().unwrap();
    let severities: Vec<LogSeverity> = captured.iter().map(|e| e.severity).collect();
    assert_eq!(
        severities,
        vec![LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error]
    );
    assert_eq!(captured[1].message, "rebuilt at 800x600");
    assert_eq!(captured[1].source, "triframe::FramebufferManager");
    assert!(captured[3].file.is_none());
    assert!(captured[4].file.unwrap().ends_with("logging_integration_tests.rs"));
    drop(captured);
    reset();
}

#[test]
#[serial]
fn test_integration_threshold_drops_detail_but_not_errors() {
    let entries = TestLogger::install();
    Engine::set_log_threshold(LogSeverity::Error);

    engine_trace!("test", "hidden");
    engine_info!("test", "hidden");
    engine_warn!("test", "hidden");
    engine_error!("test", "shown");

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "shown");
    drop(captured);
    reset();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let entries = TestLogger::install();
    engine_info!("test", "Message 1");

    Engine::reset_logger();
    engine_info!("test", "Message 2");

    assert_eq!(entries.lock().unwrap().len(), 1);
    reset();
}

#[test]
#[serial]
fn test_integration_err_and_bail_log_at_detection() {
    let entries = TestLogger::install();

    fn create_texture(width: u32) -> Result<u32> {
        if width == 0 {
            engine_bail!(InvalidResource, "triframe::test", "texture width is {}", width);
        }
        Ok(width)
    }

    let err = engine_err!("triframe::test", "queue submit failed");
    assert!(matches!(err, Error::BackendError(_)));
    assert!(matches!(create_texture(0), Err(Error::InvalidResource(ref m)) if m == "texture width is 0"));
    assert!(create_texture(16).is_ok());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert!(captured.iter().all(|e| e.severity == LogSeverity::Error && e.line.is_some()));
    drop(captured);
    reset();
}

#[test]
#[serial]
fn test_integration_logger_from_multiple_threads() {
    let entries = TestLogger::install();

    let handles: Vec<_> = (0..4)
        .map(|i| std::thread::spawn(move || engine_info!("test::thread", "worker {}", i)))
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(entries.lock().unwrap().len(), 4);
    reset();
}

#[test]
fn test_integration_default_logger_plain_format() {
    let entry = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: std::time::SystemTime::now(),
        source: "triframe::vulkan".to_string(),
        message: "swapchain suboptimal".to_string(),
        file: None,
        line: None,
    };
    let text = DefaultLogger::format_plain(&entry);
    assert!(text.contains("[WARN ] [triframe::vulkan] swapchain suboptimal"));
}
