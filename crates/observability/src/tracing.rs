//! Tracing subscriber initialization.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the default filter directive.
pub const FILTER_ENV: &str = "RUST_LOG";

/// How the subscriber should filter and render events.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Directive used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
    /// JSON lines (default) or human-readable output.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: true,
        }
    }
}

impl LogSettings {
    pub fn pretty(mut self) -> Self {
        self.json = false;
        self
    }

    pub fn with_default_filter(mut self, directive: impl Into<String>) -> Self {
        self.default_filter = directive.into();
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init(&LogSettings::default());
        init(&LogSettings::default().pretty().with_default_filter("debug"));
    }
}
