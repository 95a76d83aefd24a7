//! Tracing setup shared by the `papers` and `authors` binaries.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a `tracing-subscriber` formatter reading `RUST_LOG`, defaulting
/// to `info` for this crate. Safe to call more than once; only the first
/// call takes effect.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("corpusgraph=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}
