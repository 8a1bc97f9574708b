//! Log setup for the server and CLI.
//!
//! Output goes to stderr with a short wall-clock timestamp. Levels come from
//! the `[logging]` section unless `RUST_LOG` is set.
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! "mdview::watcher" = "debug"
//! ```
//!
//! ```bash
//! RUST_LOG=mdview=debug mdview serve ./notes
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Filter directive string for a logging section, e.g. `warn,mdview::watcher=debug`.
pub fn directives(config: &LoggingConfig) -> String {
    let mut filter = config.default.clone();
    for (module, level) in &config.modules {
        filter.push_str(&format!(",{module}={level}"));
    }
    filter
}

/// Install the global subscriber.
///
/// Only the first call has an effect, so tests and the binary can both call it.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        // try_init: another subscriber may already be set (tests)
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

/// [`init_with_config`] with `default = "warn"`.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Info-level event tagged with the component that produced it.
///
/// ```ignore
/// log_event!("watcher", "monitoring", "{} documents", count);
/// log_event!("server", "shutdown");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-level counterpart of [`log_event!`].
///
/// ```ignore
/// debug_event!("broadcast", "pruned", "{}", id);
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_directives_default_only() {
        assert_eq!(directives(&LoggingConfig::default()), "warn");
    }

    #[test]
    fn test_directives_with_modules() {
        let mut modules = BTreeMap::new();
        modules.insert("mdview::watcher".to_string(), "debug".to_string());
        modules.insert("tower_http".to_string(), "info".to_string());
        let config = LoggingConfig {
            default: "error".to_string(),
            modules,
        };

        assert_eq!(
            directives(&config),
            "error,mdview::watcher=debug,tower_http=info"
        );
        EnvFilter::try_new(directives(&config)).unwrap();
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
    }
}
