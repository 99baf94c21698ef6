//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Human-readable output for development
    #[default]
    Development,
    /// JSON structured output for production
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

impl Profile {
    fn default_filter(&self) -> &'static str {
        match self {
            Profile::Development => "livetree=debug",
            Profile::Production => "livetree=info",
            Profile::Test => "livetree=trace",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Safe to call more than once; only the first call installs a subscriber.
/// If the host application already installed a global subscriber the call
/// leaves it in place.
///
/// # Profiles
///
/// - **Development**: Human-readable logs with debug level
/// - **Production**: JSON structured logs with info level
/// - **Test**: No output; tests install the capture layer instead
///
/// # Example
///
/// ```
/// use livetree_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(profile.default_filter()));
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .finish()
                .try_init(),
            // Test capture is initialized separately via init_test_capture()
            Profile::Test => Ok(()),
        };
        if installed.is_err() {
            tracing::debug!(
                component = module_path!(),
                "global subscriber already installed"
            );
        }
    });
}
