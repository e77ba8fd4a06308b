//! Shared logging utilities for consistent tracing across the workspace

use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Default filter directives for the workspace crates at the given level
pub fn filter_directives(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("integ_test={base_level},tester={base_level},cluster={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins over the computed directives when it is set.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for service-aware info logging
#[macro_export]
macro_rules! service_info {
    ($service:expr, $($arg:tt)*) => {
        tracing::info!(
            service = %$service,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for service-aware warning logging
#[macro_export]
macro_rules! service_warn {
    ($service:expr, $($arg:tt)*) => {
        tracing::warn!(
            service = %$service,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for service-aware error logging
#[macro_export]
macro_rules! service_error {
    ($service:expr, $($arg:tt)*) => {
        tracing::error!(
            service = %$service,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for service-aware debug logging
#[macro_export]
macro_rules! service_debug {
    ($service:expr, $($arg:tt)*) => {
        tracing::debug!(
            service = %$service,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(service: &dyn std::fmt::Display, details: &str) {
    info!(
        service = %service,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(service: &dyn std::fmt::Display, context: &str, error: &dyn std::fmt::Display) {
    error!(
        service = %service,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}
