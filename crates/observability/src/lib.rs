//! Tracing/logging setup shared by every binary in the workspace.

/// Initialize process-wide tracing with the default settings.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&tracing::LogSettings::default());
}

/// Subscriber configuration (filters, output format).
pub mod tracing;
