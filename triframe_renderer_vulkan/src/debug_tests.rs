use super::*;

#[test]
fn test_severity_mapping() {
    assert_eq!(map_severity(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), LogSeverity::Error);
    assert_eq!(map_severity(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING), LogSeverity::Warn);
    assert_eq!(map_severity(vk::DebugUtilsMessageSeverityFlagsEXT::INFO), LogSeverity::Debug);
    assert_eq!(map_severity(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), LogSeverity::Trace);
}

#[test]
fn test_severity_mapping_prefers_highest_bit() {
    let flags = vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    assert_eq!(map_severity(flags), LogSeverity::Error);
}

#[test]
fn test_message_kind() {
    assert_eq!(message_kind(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION), "Validation");
    assert_eq!(message_kind(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE), "Performance");
    assert_eq!(message_kind(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL), "General");
    assert_eq!(
        message_kind(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE),
        "Validation"
    );
}

#[test]
fn test_stats_tracker_counts_per_severity() {
    let tracker = ValidationStatsTracker::new();
    tracker.increment(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
    tracker.increment(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
    tracker.increment(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING);
    tracker.increment(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE);

    let stats = tracker.get_stats();
    assert_eq!(stats, ValidationStats { errors: 2, warnings: 1, info: 0, verbose: 1 });
    assert_eq!(stats.total(), 4);

    tracker.reset();
    assert_eq!(tracker.get_stats(), ValidationStats::default());
}

#[test]
fn test_message_tracker_counts_repeats() {
    let mut tracker = MessageTracker::default();
    assert_eq!(tracker.track_message("layout mismatch"), 1);
    assert_eq!(tracker.track_message("layout mismatch"), 2);
    assert_eq!(tracker.track_message("missing barrier"), 1);
    assert_eq!(tracker.repeated(), 1);
}
