use chrono::{Datelike, Duration, NaiveDate};
use raccoon_domain::{
    round_money, BudgetMap, BudgetReport, BudgetView, CategoryBreakdown, CategoryVocabulary,
    DateWindow, MonthComparison, SpendTrend, Transaction, TOTAL,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::{bucket_service::month_start, category_service::CategoryService, CoreError};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Budget-vs-actual views and period comparisons.
pub struct BudgetService;

impl BudgetService {
    /// Share of `limit` consumed, capped to `[0, 100]`. A zero limit with any
    /// spend counts as fully used.
    pub fn percent_used(spent: Decimal, limit: Decimal) -> Decimal {
        if limit > Decimal::ZERO {
            // Overflow only happens for ratios far past the cap.
            let ratio = spent
                .checked_div(limit)
                .and_then(|ratio| ratio.checked_mul(HUNDRED))
                .unwrap_or(HUNDRED);
            round_money(ratio.clamp(Decimal::ZERO, HUNDRED))
        } else if spent > Decimal::ZERO {
            HUNDRED
        } else {
            Decimal::ZERO
        }
    }

    pub fn view(category: &str, spent: Decimal, budgets: &BudgetMap) -> BudgetView {
        let limit = budgets.limit(category);
        Self::build_view(category, spent, limit)
    }

    /// One view per category with spend or a limit, spend order first and
    /// then the remaining budget keys, plus the synthesized total.
    pub fn compare(spend: &CategoryBreakdown, budgets: &BudgetMap) -> BudgetReport {
        let mut categories: Vec<BudgetView> = spend
            .entries
            .iter()
            .filter(|entry| entry.category != TOTAL)
            .map(|entry| Self::view(&entry.category, entry.amount, budgets))
            .collect();
        for (category, limit) in budgets.iter() {
            if category == TOTAL || spend.get(category).is_some() {
                continue;
            }
            categories.push(Self::build_view(category, Decimal::ZERO, Some(*limit)));
        }

        let total_limit: Decimal = budgets
            .iter()
            .filter(|(category, _)| category.as_str() != TOTAL)
            .map(|(_, limit)| *limit)
            .sum();
        let total_spent: Decimal = categories.iter().map(|view| view.spent).sum();
        let total = BudgetView {
            category: TOTAL.to_string(),
            spent: total_spent,
            limit: total_limit,
            limit_set: categories.iter().any(|view| view.limit_set),
            percent_used: Self::percent_used(total_spent, total_limit),
        };
        BudgetReport { categories, total }
    }

    /// View for `"Total"` or one category; a category absent from the report
    /// gets an all-zero view.
    pub fn view_for(report: &BudgetReport, selection: &str) -> BudgetView {
        report
            .view(selection)
            .cloned()
            .unwrap_or_else(|| Self::build_view(selection, Decimal::ZERO, None))
    }

    /// Spend per type label within the calendar month containing `reference`,
    /// compared to `budgets`.
    pub fn monthly_report(
        transactions: &[Transaction],
        budgets: &BudgetMap,
        reference: NaiveDate,
    ) -> BudgetReport {
        let window = Self::month_window(reference);
        let in_month: Vec<Transaction> = transactions
            .iter()
            .filter(|txn| txn.date.is_some_and(|date| window.contains(date)))
            .cloned()
            .collect();
        let spend = CategoryService::aggregate_by_type_label(&in_month);
        Self::compare(&spend, budgets)
    }

    /// The whole calendar month containing `reference`.
    pub fn month_window(reference: NaiveDate) -> DateWindow {
        let start = month_start(reference);
        let next = month_start(start + Duration::days(31));
        DateWindow { start, end: next }
    }

    /// Month-to-date spend against the same days of the previous month. The
    /// previous window stops at today's day-of-month, clamped to that
    /// month's length.
    pub fn month_over_month(transactions: &[Transaction], today: NaiveDate) -> MonthComparison {
        let current_window = DateWindow {
            start: month_start(today),
            end: today + Duration::days(1),
        };
        let previous_last_of_month = current_window.start - Duration::days(1);
        let previous_start = month_start(previous_last_of_month);
        let previous_days = today.day().min(previous_last_of_month.day());
        let previous_window = DateWindow {
            start: previous_start,
            end: previous_start + Duration::days(previous_days as i64),
        };

        let current = Self::sum_in_window(transactions, &current_window);
        let previous = Self::sum_in_window(transactions, &previous_window);
        let difference = current - previous;
        let trend = if difference > Decimal::ZERO {
            SpendTrend::Overspending
        } else if difference < Decimal::ZERO {
            SpendTrend::OnTrack
        } else {
            SpendTrend::Steady
        };
        debug!(%current, %previous, %trend, "month over month");
        MonthComparison {
            current_window,
            previous_window,
            current,
            previous,
            difference,
            trend,
        }
    }

    pub fn sum_in_window(transactions: &[Transaction], window: &DateWindow) -> Decimal {
        transactions
            .iter()
            .filter(|txn| txn.date.is_some_and(|date| window.contains(date)))
            .map(|txn| txn.amount)
            .sum()
    }

    /// Returns `budgets` with `category` limited to `limit`. The input map
    /// is left untouched.
    pub fn set_limit(
        budgets: &BudgetMap,
        category: &str,
        limit: Decimal,
    ) -> Result<BudgetMap, CoreError> {
        if category.trim().eq_ignore_ascii_case(TOTAL) {
            return Err(CoreError::Validation(
                "the total budget is derived from category limits".into(),
            ));
        }
        let vocabulary = CategoryVocabulary::type_labels();
        let canonical = vocabulary
            .categories()
            .iter()
            .find(|known| known.eq_ignore_ascii_case(category.trim()))
            .ok_or_else(|| CoreError::Validation(format!("unknown category `{category}`")))?;
        if limit < Decimal::ZERO {
            return Err(CoreError::Validation("budget limit cannot be negative".into()));
        }
        Ok(budgets.with_limit(canonical.clone(), round_money(limit)))
    }

    fn build_view(category: &str, spent: Decimal, limit: Option<Decimal>) -> BudgetView {
        let limit_value = limit.unwrap_or(Decimal::ZERO);
        BudgetView {
            category: category.to_string(),
            spent,
            limit: limit_value,
            limit_set: limit.is_some(),
            percent_used: Self::percent_used(spent, limit_value),
        }
    }
}
