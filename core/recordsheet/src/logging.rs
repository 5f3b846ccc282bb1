//! FILENAME: core/recordsheet/src/logging.rs
// PURPOSE: Category-tagged logging over the `log` facade.
//
// Every line is emitted under the `recordsheet` target as `[CATEGORY] message`.
// The library never installs a logger; the host application chooses one.

/// Log target shared by every record sheet log line.
pub const TARGET: &str = "recordsheet";

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $crate::logging::TARGET, "[{}] {}", $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $crate::logging::TARGET, "[{}] {}", $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $crate::logging::TARGET, "[{}] {}", $cat, format_args!($($arg)*))
    };
}
