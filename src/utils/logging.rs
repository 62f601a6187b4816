//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::Env;

/// Setup logging; `RUST_LOG` overrides `default_level` when set.
pub fn setup_logging(default_level: &str) {
    let env = Env::default().default_filter_or(default_level);
    // A second call (tests, embedding hosts) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).try_init();
}
