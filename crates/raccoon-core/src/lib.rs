//! raccoon-core
//!
//! Aggregation services over receipt data: normalization, time bucketing,
//! category roll-ups, rankings and budget comparison.
//! Depends on raccoon-domain. No terminal I/O, no direct storage interactions.

pub mod budget_service;
pub mod bucket_service;
pub mod category_service;
pub mod dashboard_service;
pub mod error;
pub mod fuel_service;
pub mod location_service;
pub mod normalize_service;
pub mod price_service;
pub mod source;
pub mod summary_service;
pub mod time;

#[cfg(test)]
mod tests;

pub use budget_service::*;
pub use bucket_service::*;
pub use category_service::*;
pub use dashboard_service::*;
pub use error::CoreError;
pub use fuel_service::*;
pub use location_service::*;
pub use normalize_service::*;
pub use price_service::*;
pub use summary_service::*;
