/// Vulkan debug messenger - forwards validation layer messages to the engine logger
///
/// Only compiled with the `vulkan-validation` feature. Messages are logged
/// under the `triframe::vulkan::validation` source, counted per severity,
/// and repeated messages are tagged with their occurrence count. The counts
/// are reported once when the GPU context is destroyed.

use ash::vk;
use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use triframe_engine::triframe::log::LogSeverity;
use triframe_engine::triframe::{Engine, Result};
use triframe_engine::{engine_err, engine_info, engine_warn};

const VALIDATION_SOURCE: &str = "triframe::vulkan::validation";

/// Whether the callback still forwards messages
static FORWARDING: AtomicBool = AtomicBool::new(false);

/// Abort the process on the first validation error
static TERMINATE_ON_ERROR: AtomicBool = AtomicBool::new(false);

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Global message tracker for grouping identical messages
static MESSAGE_TRACKER: Mutex<Option<MessageTracker>> = Mutex::new(None);

/// Validation messages received since the messenger was created
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

/// Thread-safe validation statistics tracker
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

    fn increment(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) {
        let counter = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            &self.errors
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            &self.warnings
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            &self.info
        } else {
            &self.verbose
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
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

/// Counts occurrences of each distinct message
#[derive(Default)]
struct MessageTracker {
    messages: HashMap<String, u32>,
}

impl MessageTracker {
    fn track_message(&mut self, message: &str) -> u32 {
        let count = self.messages.entry(message.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Number of distinct messages seen more than once
    fn repeated(&self) -> usize {
        self.messages.values().filter(|&&count| count > 1).count()
    }
}

/// Engine severity for a validation message
///
/// Info and verbose chatter from the layers goes to Debug/Trace so it stays
/// out of the default output.
fn map_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Debug
    } else {
        LogSeverity::Trace
    }
}

fn message_kind(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Vulkan debug messenger callback
unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if !FORWARDING.load(Ordering::Acquire) || p_callback_data.is_null() {
        return vk::FALSE;
    }

    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    VALIDATION_STATS.increment(message_severity);
    let occurrence_count = match MESSAGE_TRACKER.lock() {
        Ok(mut tracker) => tracker.get_or_insert_with(MessageTracker::default).track_message(message),
        Err(_) => 1,
    };
    let repeat_indicator = if occurrence_count > 1 {
        format!(" [x{}]", occurrence_count)
    } else {
        String::new()
    };

    Engine::log(
        map_severity(message_severity),
        VALIDATION_SOURCE,
        format!("[{}]{} {}: {}", message_kind(message_type), repeat_indicator, message_id_name, message),
    );

    if TERMINATE_ON_ERROR.load(Ordering::Relaxed)
        && message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR)
    {
        Engine::log(
            LogSeverity::Error,
            VALIDATION_SOURCE,
            format!("Aborting on validation error {}", message_id_name),
        );
        std::process::abort();
    }

    vk::FALSE // Don't abort the Vulkan call
}

/// Create the messenger and start forwarding
///
/// Resets the statistics of any previous messenger.
pub(crate) fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    terminate_on_error: bool,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    VALIDATION_STATS.reset();
    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(MessageTracker::default());
    }
    TERMINATE_ON_ERROR.store(terminate_on_error, Ordering::Relaxed);

    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_callback));

    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
    let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
        .map_err(|e| engine_err!(InitializationFailed, "triframe::vulkan", "Failed to create debug messenger: {:?}", e))?;

    FORWARDING.store(true, Ordering::Release);
    engine_info!("triframe::vulkan", "Validation layers enabled (terminate on error: {})", terminate_on_error);
    Ok((debug_utils, messenger))
}

/// Current validation statistics
pub fn validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Stop forwarding and log the statistics report
pub(crate) fn shutdown_validation_reporting() {
    if !FORWARDING.swap(false, Ordering::AcqRel) {
        return;
    }

    let stats = validation_stats();
    if stats.total() == 0 {
        engine_info!("triframe::vulkan", "No validation messages");
        return;
    }

    let repeated = MESSAGE_TRACKER
        .lock()
        .ok()
        .and_then(|tracker| tracker.as_ref().map(MessageTracker::repeated))
        .unwrap_or(0);
    let report = format!(
        "Validation report: {} error(s), {} warning(s), {} info, {} verbose ({} total, {} repeated message(s))",
        stats.errors, stats.warnings, stats.info, stats.verbose, stats.total(), repeated
    );
    if stats.errors > 0 {
        engine_warn!("triframe::vulkan", "{}", report);
    } else {
        engine_info!("triframe::vulkan", "{}", report);
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
