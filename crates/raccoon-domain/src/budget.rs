//! Budget limits, budget-vs-actual views and period comparisons.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::category::{CategoryVocabulary, TOTAL};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Half-open date range `[start, end)`.
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateWindowError> {
        if end <= start {
            return Err(DateWindowError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Window covering `first..=last`.
    pub fn inclusive(first: NaiveDate, last: NaiveDate) -> Result<Self, DateWindowError> {
        let end = last.succ_opt().ok_or(DateWindowError::InvalidRange)?;
        Self::new(first, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Last day inside the window.
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`DateWindow`] values.
pub enum DateWindowError {
    InvalidRange,
}

impl fmt::Display for DateWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateWindowError::InvalidRange => f.write_str("date window end must be after start"),
        }
    }
}

impl std::error::Error for DateWindowError {}

/// User-configured spending limits keyed by category name.
///
/// A missing entry means "no limit set", which is not the same as an explicit
/// zero limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct BudgetMap(BTreeMap<String, Decimal>);

impl BudgetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(&self, category: &str) -> Option<Decimal> {
        self.0.get(category).copied()
    }

    pub fn is_set(&self, category: &str) -> bool {
        self.0.contains_key(category)
    }

    /// Sum of explicitly set limits.
    pub fn total_limit(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.0.iter()
    }

    /// Returns a copy with `category` set to `limit`.
    pub fn with_limit(&self, category: impl Into<String>, limit: Decimal) -> Self {
        let mut next = self.0.clone();
        next.insert(category.into(), limit);
        Self(next)
    }

    /// Returns a copy with keys respelled the way `vocabulary` reports them.
    /// Unknown keys keep their trimmed spelling; later duplicates win.
    pub fn canonicalized(&self, vocabulary: &CategoryVocabulary) -> Self {
        self.0
            .iter()
            .map(|(category, limit)| {
                let name = vocabulary
                    .canonical(category)
                    .map(str::to_string)
                    .unwrap_or_else(|| category.trim().to_string());
                (name, *limit)
            })
            .collect()
    }

    /// Returns a copy without an entry for `category`.
    pub fn without(&self, category: &str) -> Self {
        let mut next = self.0.clone();
        next.remove(category);
        Self(next)
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for BudgetMap {
    fn from_iter<T: IntoIterator<Item = (S, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Spend measured against a limit for one category (or the total).
pub struct BudgetView {
    pub category: String,
    pub spent: Decimal,
    /// Zero when no limit is set; see `limit_set`.
    pub limit: Decimal,
    pub limit_set: bool,
    /// Within `[0, 100]`.
    pub percent_used: Decimal,
}

impl BudgetView {
    pub fn remaining(&self) -> Decimal {
        self.limit - self.spent
    }

    pub fn is_over(&self) -> bool {
        self.spent > self.limit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Budget-vs-actual views for every category plus the synthesized total.
pub struct BudgetReport {
    pub categories: Vec<BudgetView>,
    pub total: BudgetView,
}

impl BudgetReport {
    /// View for `selection`; `"Total"` selects the synthesized view.
    pub fn view(&self, selection: &str) -> Option<&BudgetView> {
        if selection == TOTAL {
            return Some(&self.total);
        }
        self.categories.iter().find(|view| view.category == selection)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Direction of this period's spend against the previous one.
pub enum SpendTrend {
    /// Spent more than last period.
    Overspending,
    /// Spent less than last period.
    OnTrack,
    Steady,
}

impl fmt::Display for SpendTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpendTrend::Overspending => "Overspending",
            SpendTrend::OnTrack => "On Track",
            SpendTrend::Steady => "Steady",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Month-to-date spend compared with the same stretch of the previous month.
pub struct MonthComparison {
    pub current_window: DateWindow,
    pub previous_window: DateWindow,
    pub current: Decimal,
    pub previous: Decimal,
    /// `current - previous`.
    pub difference: Decimal,
    pub trend: SpendTrend,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inclusive_window_contains_last_day() {
        let window = DateWindow::inclusive(date(2024, 3, 1), date(2024, 3, 15)).unwrap();
        assert!(window.contains(date(2024, 3, 15)));
        assert!(!window.contains(date(2024, 3, 16)));
        assert_eq!(window.last_day(), date(2024, 3, 15));
    }

    #[test]
    fn window_rejects_reversed_range() {
        let err = DateWindow::new(date(2024, 3, 2), date(2024, 3, 1)).unwrap_err();
        assert_eq!(err, DateWindowError::InvalidRange);
    }

    #[test]
    fn budget_map_updates_return_new_values() {
        let original = BudgetMap::new().with_limit("Groceries", Decimal::from(200));
        let updated = original.with_limit("Fuel", Decimal::from(80));
        assert_eq!(original.len(), 1);
        assert_eq!(updated.total_limit(), Decimal::from(280));
        assert!(updated.without("Fuel").limit("Fuel").is_none());
    }

    #[test]
    fn canonicalized_respells_known_keys() {
        let map: BudgetMap = [("grocery", Decimal::from(200)), ("Boats ", Decimal::from(3))]
            .into_iter()
            .collect();
        let fixed = map.canonicalized(&CategoryVocabulary::type_labels());
        assert_eq!(fixed.limit("Groceries"), Some(Decimal::from(200)));
        assert_eq!(fixed.limit("Boats"), Some(Decimal::from(3)));
        assert_eq!(fixed.len(), 2);
    }

    #[test]
    fn budget_map_reads_plain_json_numbers() {
        let map: BudgetMap = serde_json::from_str(r#"{"Groceries": 200, "Fuel": 45.5}"#).unwrap();
        assert_eq!(map.limit("Fuel"), Some(Decimal::new(455, 1)));
        assert!(map.limit("Health").is_none());
    }
}
