//! Integration tests for the logging facade
//!
//! No GPU required. The logger is process-wide, so tests are serialized.
//!
//! Run with: cargo test --test logging_integration_tests

use immediate_gfx::igfx::cache::{ObjectCache, RenderPassDesc};
use immediate_gfx::igfx::log::{LogEntry, LogSeverity, Logger};
use immediate_gfx::igfx::resource::ImageFormat;
use immediate_gfx::igfx::{Engine, Error, Result};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST LOGGER
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    fn install() -> Arc<Mutex<Vec<LogEntry>>> {
        let entries = Arc::new(Mutex::new(Vec::new()));
        Engine::set_logger(CaptureLogger { entries: entries.clone() });
        entries
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
#[serial]
fn test_custom_logger_receives_entries() {
    let entries = CaptureLogger::install();

    Engine::log(LogSeverity::Info, "test::module", "first".to_string());
    Engine::log_detailed(LogSeverity::Error, "test::module", "second".to_string(), "file.rs", 7);

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, LogSeverity::Info);
        assert!(entries[0].file.is_none());
        assert_eq!(entries[1].file, Some("file.rs"));
        assert_eq!(entries[1].line, Some(7));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_err_macro_logs_and_builds_backend_error() {
    let entries = CaptureLogger::install();

    fn failing(code: i32) -> Result<()> {
        immediate_gfx::igfx_bail!("igfx::vulkan", "vkQueueSubmit failed: {}", code);
    }

    let err = failing(-4).unwrap_err();
    assert_eq!(err, Error::BackendError("vkQueueSubmit failed: -4".to_string()));

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, LogSeverity::Error);
        assert_eq!(entries[0].source, "igfx::vulkan");
        assert!(entries[0].line.is_some());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_cache_miss_is_logged_once() {
    let entries = CaptureLogger::install();

    let mut cache: ObjectCache<RenderPassDesc, u32> = ObjectCache::new("render pass");
    let desc = RenderPassDesc::for_targets(Some(ImageFormat::Rgba8), None);
    cache.find_or_create(&desc, |_| Ok(1)).unwrap();
    cache.find_or_create(&desc, |_| Ok(2)).unwrap();

    {
        let entries = entries.lock().unwrap();
        let misses: Vec<_> = entries
            .iter()
            .filter(|e| e.severity == LogSeverity::Debug && e.message.contains("cache miss"))
            .collect();
        assert_eq!(misses.len(), 1);
        assert!(misses[0].message.contains("render pass"));
    }

    Engine::reset_logger();
}
