//! Logging infrastructure for rowbridge.
//!
//! rowbridge uses `tracing` for structured logging. All events use target
//! "rowbridge" and include an `event` field for filtering.
//!
//! ## Library Integration
//!
//! rowbridge never initializes a global subscriber. Applications configure
//! tracing via `tracing_subscriber` or similar.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - `component`: module/subsystem (e.g., "marshal", "scan")
//! - Use `%` for Display, `?` for Debug formatting
//! - Per-row events stay at `trace`; per-scan events at `debug` or above

/// Target for all rowbridge log events.
pub(crate) const ROWBRIDGE_TARGET: &str = "rowbridge";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     component = "scan",
///     event = "scan_opened",
///     columns = projection.len(),
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::ROWBRIDGE_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::ROWBRIDGE_TARGET, $($field)*)
    };
}

/// Macro for trace-level log events; used on per-row paths.
macro_rules! log_trace {
    ($($field:tt)*) => {
        ::tracing::trace!(target: $crate::observability::ROWBRIDGE_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::ROWBRIDGE_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_trace;
pub(crate) use log_warn;
