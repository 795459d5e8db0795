#![doc(test(attr(deny(warnings))))]

//! Raccoon turns scanned receipts into spending views: time buckets,
//! category roll-ups, top stores and items, and budget comparisons.

pub mod app;
pub mod errors;
pub mod report;
pub mod utils;

pub use raccoon_config as config;
pub use raccoon_core as core;
pub use raccoon_domain as domain;
pub use raccoon_storage_json as storage;

/// Initializes global tracing; safe to call more than once.
pub fn init() {
    utils::init_tracing();
}
