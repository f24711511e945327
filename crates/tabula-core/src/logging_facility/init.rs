//! Subscriber installation

use std::sync::Once;

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output profile for [`init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable lines on stderr, debug level for Tabula crates
    Development,
    /// JSON lines, info level
    Production,
    /// No output; tests attach a capture layer instead
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directives(self) -> &'static str {
        match self {
            Profile::Development => "tabula_core=debug,tabula_store=debug,tabula_cli=debug",
            Profile::Production | Profile::Test => "tabula_core=info,tabula_store=info",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

static INSTALLED: Once = Once::new();

/// Install the global subscriber for `profile`.
///
/// The first call wins for the life of the process.
///
/// ```
/// use tabula_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INSTALLED.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(profile.filter());
        match profile {
            Profile::Development => builder.init(),
            Profile::Production => builder.json().init(),
            Profile::Test => tracing_subscriber::registry().init(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_is_more_verbose_than_production() {
        assert!(Profile::Development
            .default_directives()
            .contains("tabula_store=debug"));
        assert!(Profile::Production
            .default_directives()
            .contains("tabula_store=info"));
    }
}
