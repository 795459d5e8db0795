//! Plain report shapes handed to the presentation layer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryAmount {
    pub category: String,
    pub amount: Decimal,
}

/// Summed spend per category, in vocabulary order with the fallback last.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryBreakdown {
    pub entries: Vec<CategoryAmount>,
}

impl CategoryBreakdown {
    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.amount)
    }

    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn to_map(&self) -> BTreeMap<String, Decimal> {
        self.entries
            .iter()
            .map(|entry| (entry.category.clone(), entry.amount))
            .collect()
    }

    /// Share of the total per category, as a percentage.
    pub fn shares(&self) -> Vec<(String, Decimal)> {
        let total = self.total();
        self.entries
            .iter()
            .map(|entry| {
                let share = if total.is_zero() {
                    Decimal::ZERO
                } else {
                    (entry.amount / total * Decimal::ONE_HUNDRED).round_dp(2)
                };
                (entry.category.clone(), share)
            })
            .collect()
    }
}

/// One row of a top-N ranking (stores or items).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedEntry {
    pub name: String,
    pub amount: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// Global (not time-bucketed) totals.
pub struct SummaryStats {
    pub transaction_count: usize,
    pub total_spent: Decimal,
    pub undated_count: usize,
    pub flagged_count: usize,
    pub average_per_trip: Decimal,
    pub first_purchase: Option<NaiveDate>,
    pub last_purchase: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Highlight for one calendar day: the type label of its largest receipt.
pub struct CalendarDay {
    pub day: u32,
    pub dominant_label: String,
    pub largest_amount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationStats {
    pub name: String,
    pub address: String,
    pub visits: usize,
    pub average_unit_price: Decimal,
    pub last_visit: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FuelInsights {
    /// Sorted by visits, most visited first.
    pub stations: Vec<StationStats>,
    pub average_unit_price: Decimal,
    pub estimated_gallons: Decimal,
    pub estimated_miles: Decimal,
    pub last_fill: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub unit_price: Decimal,
    pub merchant: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Unit-price history of one item name, oldest first.
pub struct PriceSeries {
    pub item: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Change between the first and the last observed unit price.
    pub fn change(&self) -> Option<Decimal> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(last.unit_price - first.unit_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestockRow {
    pub name: String,
    pub price: Decimal,
    pub purchased_on: NaiveDate,
    pub days_since: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Spend at one street address.
pub struct LocationGroup {
    /// Lower-cased, trimmed address used as the grouping key.
    pub key: String,
    pub name: String,
    pub address: String,
    pub total: Decimal,
    pub visits: usize,
    pub coordinates: Option<Coordinates>,
}
