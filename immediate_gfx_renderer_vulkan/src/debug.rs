/// Validation layer messages, forwarded into the igfx logger
///
/// Enabled by `Config::enable_validation` or the `vulkan-validation` feature.
/// Every message is logged under the `igfx::vulkan::validation` source at the
/// severity mapped by [`severity_of`] and counted in process-wide statistics.
/// The callback never aborts the Vulkan call that triggered it.

use ash::vk;
use colored::*;
use immediate_gfx::igfx::log::LogSeverity;
use immediate_gfx::igfx::Engine;
use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub(crate) const VALIDATION_SOURCE: &str = "igfx::vulkan::validation";

static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Occurrences per message text, for the duplicate count in the report
static MESSAGE_COUNTS: Mutex<Option<HashMap<String, u32>>> = Mutex::new(None);

/// Validation message counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn record(&self, severity: LogSeverity) {
        let counter = match severity {
            LogSeverity::Error => &self.errors,
            LogSeverity::Warn => &self.warnings,
            LogSeverity::Debug | LogSeverity::Info => &self.info,
            LogSeverity::Trace => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Logger severity for a validation message
///
/// ERROR → Error, WARNING → Warn, INFO → Debug, VERBOSE → Trace.
pub fn severity_of(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Debug
    } else {
        LogSeverity::Trace
    }
}

pub fn message_kind(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

pub(crate) fn format_message(kind: &str, message_id: &str, message: &str, occurrences: u32) -> String {
    if occurrences > 1 {
        format!("[{}] {} [x{}]: {}", kind, message_id, occurrences, message)
    } else {
        format!("[{}] {}: {}", kind, message_id, message)
    }
}

/// Count one message and return how often it has been seen
fn track_message(message: &str) -> u32 {
    match MESSAGE_COUNTS.lock() {
        Ok(mut guard) => {
            let counts = guard.get_or_insert_with(HashMap::new);
            let count = counts.entry(message.to_string()).or_insert(0);
            *count += 1;
            *count
        }
        Err(_) => 1,
    }
}

/// Handle a validation message already decoded to text
pub(crate) fn handle_message(
    severity_flags: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    message_id: &str,
    message: &str,
) {
    let severity = severity_of(severity_flags);
    VALIDATION_STATS.record(severity);
    let occurrences = track_message(message);
    Engine::log(
        severity,
        VALIDATION_SOURCE,
        format_message(message_kind(message_type), message_id, message, occurrences),
    );
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        std::borrow::Cow::Borrowed(fallback)
    } else {
        unsafe { CStr::from_ptr(ptr).to_string_lossy() }
    }
}

/// Debug messenger callback registered at instance creation
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let (message_id, message) = unsafe {
        let callback_data = &*p_callback_data;
        (
            c_str_or(callback_data.p_message_id_name, "Unknown"),
            c_str_or(callback_data.p_message, "No message"),
        )
    };

    handle_message(message_severity, message_type, &message_id, &message);
    vk::FALSE
}

pub fn validation_stats() -> ValidationStats {
    VALIDATION_STATS.snapshot()
}

pub fn reset_validation_stats() {
    VALIDATION_STATS.reset();
    if let Ok(mut guard) = MESSAGE_COUNTS.lock() {
        *guard = None;
    }
}

/// Print the validation counters to stdout
pub fn print_validation_stats_report() {
    let stats = validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());
    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }
    println!("  {} {}", "Total:".white().bold(), stats.total());

    let repeated = MESSAGE_COUNTS
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|counts| counts.values().filter(|&&c| c > 1).count()))
        .unwrap_or(0);
    if repeated > 0 {
        println!("\n  {} message(s) appeared multiple times", repeated);
    }

    println!("{}\n", "====================================".bright_blue().bold());
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
