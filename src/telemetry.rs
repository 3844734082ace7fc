//! Tracing subscriber setup for hosts and tests.
//!
//! The engine and backtracker emit `tracing` events; this module wires a
//! formatted subscriber with env-filter support so hosts can turn them on
//! with `RUST_LOG` (e.g. `RUST_LOG=oxbow=debug`). `.env` files are
//! honored before the filter is read.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the default subscriber: fmt layer, `RUST_LOG` filter, and an
/// error layer for span traces.
///
/// Safe to call more than once; later calls are no-ops if a global
/// subscriber is already set.
pub fn init() {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .with(ErrorLayer::default())
        .try_init()
        .ok();
}
