#![doc(test(attr(deny(warnings))))]

//! Recur Engine schedules recurring expenses and income and turns due occurrences into
//! transactions, catching up on periods missed while no host was running.
//!
//! Domain types live in `recur_domain`, services in `recur_core`, and the JSON adapters
//! in `recur_storage_json`; this crate wires them together behind [`RecurringManager`].

pub mod cli;
pub mod errors;
pub mod manager;
pub mod utils;

pub use errors::EngineError;
pub use manager::RecurringManager;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter.
pub fn init() {
    init_with_filter(utils::DEFAULT_LOG_FILTER);
}

/// Initializes global tracing once; later calls are ignored whatever their filter.
pub fn init_with_filter(directives: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directives);
        tracing::debug!("Recur Engine tracing initialized.");
    });
}
