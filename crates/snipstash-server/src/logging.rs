//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! snipstash crates only. Events go to stderr.

use tracing_subscriber::EnvFilter;

/// Filter directives for `level`
pub fn directives(level: &str) -> String {
    format!("snipstash_core={},snipstash={}", level, level)
}

/// Initialize the global subscriber (ignored if already initialized)
pub fn init(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
