//! Structured logging bootstrap.
//!
//! Grounded on `weavegraph`'s `demo1.rs::init_tracing`/`init_miette`: an
//! `EnvFilter`-driven `tracing_subscriber` registry with an `ErrorLayer`
//! for span-aware error reports, plus `miette`'s panic hook for readable
//! diagnostics when something does panic.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the process-wide tracing subscriber.
///
/// Honors `RUST_LOG` if set; otherwise defaults to `info` for this crate
/// and `warn` for everything else. Call once, near the start of `main`.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,contentgate=info"))
        .expect("default filter directive is valid");

    let fmt_layer = fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

/// Install `miette`'s fancy panic hook for readable diagnostic reports.
pub fn init_diagnostics() {
    miette::set_panic_hook();
}
