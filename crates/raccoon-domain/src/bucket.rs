//! Time buckets produced by the bucketer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{common::*, transaction::LineItem};

/// Grouping key of a bucket. Always year-qualified so equal display labels in
/// different years never merge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    /// `index` is the receipt's rank in `(date, id)` order, keeping same-day
    /// trips apart.
    Trip { date: NaiveDate, index: usize },
    Week { start: NaiveDate },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl BucketKey {
    pub fn granularity(&self) -> Granularity {
        match self {
            BucketKey::Trip { .. } => Granularity::Trip,
            BucketKey::Week { .. } => Granularity::Week,
            BucketKey::Month { .. } => Granularity::Month,
            BucketKey::Year { .. } => Granularity::Year,
        }
    }
}

/// A line item tagged with where it was bought, for drill-down views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketItem {
    pub transaction_id: String,
    pub merchant: String,
    pub item: LineItem,
}

/// Spend aggregated over one time window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bucket {
    pub key: BucketKey,
    pub label: String,
    pub start: NaiveDate,
    /// Epoch seconds of `start`; the only value buckets are ordered by.
    pub sort_key: i64,
    pub total_amount: Decimal,
    pub transaction_ids: Vec<String>,
    pub items: Vec<BucketItem>,
}

impl Bucket {
    pub fn new(key: BucketKey, label: String, start: NaiveDate) -> Self {
        Self {
            key,
            label,
            start,
            sort_key: epoch_seconds(start),
            total_amount: Decimal::ZERO,
            transaction_ids: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_ids.len()
    }

    pub fn line_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().map(|tagged| &tagged.item)
    }
}

impl Amounted for Bucket {
    fn amount(&self) -> Decimal {
        self.total_amount
    }
}

impl Displayable for Bucket {
    fn display_label(&self) -> String {
        self.label.clone()
    }
}

/// Per-bucket category sums for a multi-category overlay chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySeriesPoint {
    pub label: String,
    pub sort_key: i64,
    /// One entry per requested category, in request order, zero-filled.
    pub values: Vec<(String, Decimal)>,
}

impl CategorySeriesPoint {
    pub fn value(&self, category: &str) -> Decimal {
        self.values
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, value)| *value)
            .unwrap_or(Decimal::ZERO)
    }
}
