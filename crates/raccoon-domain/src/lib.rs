//! raccoon-domain
//!
//! Pure data types for receipt spending analysis (transactions, line items,
//! buckets, budgets and report shapes). No I/O, no aggregation logic.

pub mod bucket;
pub mod budget;
pub mod category;
pub mod common;
pub mod profile;
pub mod report;
pub mod transaction;

pub use bucket::*;
pub use budget::*;
pub use category::*;
pub use common::*;
pub use profile::*;
pub use report::*;
pub use transaction::*;
