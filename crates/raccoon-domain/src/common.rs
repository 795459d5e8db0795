//! Shared traits, money helpers and time-granularity enums.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places money values are kept at.
pub const CURRENCY_DP: u32 = 2;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
const SECONDS_PER_DAY: i64 = 86_400;

/// Exposes a stable identifier for records read from the backend.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Supplies a common contract for retrieving monetary amounts.
pub trait Amounted {
    fn amount(&self) -> Decimal;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Rounds a money value to currency precision, midpoints away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Seconds since the Unix epoch at midnight UTC of `date`.
pub fn epoch_seconds(date: NaiveDate) -> i64 {
    (date.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE) * SECONDS_PER_DAY
}

/// Time-window size used when bucketing transactions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per purchase.
    Trip,
    Week,
    #[default]
    Month,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Trip,
        Granularity::Week,
        Granularity::Month,
        Granularity::Year,
    ];
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::Trip => "trip",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        };
        f.write_str(label)
    }
}

impl FromStr for Granularity {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trip" | "trips" | "daily" => Ok(Granularity::Trip),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            "year" | "yearly" => Ok(Granularity::Year),
            _ => Err(ParseKindError::new("granularity", value)),
        }
    }
}

/// First day of a calendar week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Truncates `date` to the first day of its week.
    pub fn start_of_week(self, date: NaiveDate) -> NaiveDate {
        let weekday = date.weekday();
        let offset = match self {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        };
        date - Duration::days(offset as i64)
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Sunday => f.write_str("sunday"),
            WeekStart::Monday => f.write_str("monday"),
        }
    }
}

impl FromStr for WeekStart {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            _ => Err(ParseKindError::new("week start", value)),
        }
    }
}

/// Narrows the transactions or line items a view is computed over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Keep only receipts with this type label; bucket totals follow.
    TypeLabel(String),
    /// Keep only line items with this tag; bucket totals are untouched.
    ItemCategory(String),
}

impl CategoryFilter {
    pub fn is_all(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raised when a textual enum value is not recognised.
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

impl ParseKindError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: `{}`", self.kind, self.value)
    }
}

impl std::error::Error for ParseKindError {}
