use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use raccoon_domain::{
    round_money, CalendarDay, CalendarMonth, DataIssue, SummaryStats, Transaction,
};
use rust_decimal::Decimal;

/// Whole-list figures that ignore time bucketing.
pub struct SummaryService;

impl SummaryService {
    /// Totals over every transaction, undated and flagged ones included.
    pub fn summarize(transactions: &[Transaction]) -> SummaryStats {
        let total_spent: Decimal = transactions.iter().map(|txn| txn.amount).sum();
        let transaction_count = transactions.len();
        let average_per_trip = if transaction_count == 0 {
            Decimal::ZERO
        } else {
            round_money(total_spent / Decimal::from(transaction_count as u64))
        };
        let dates = transactions.iter().filter_map(|txn| txn.date);
        SummaryStats {
            transaction_count,
            total_spent,
            undated_count: transactions.iter().filter(|txn| txn.date.is_none()).count(),
            flagged_count: transactions
                .iter()
                .filter(|txn| !txn.issues.is_empty())
                .count(),
            average_per_trip,
            first_purchase: dates.clone().min(),
            last_purchase: dates.max(),
        }
    }

    /// Days of one month that have purchases. A day is labeled with the
    /// type label of its largest receipt; the first one seen wins ties.
    pub fn calendar_month(transactions: &[Transaction], year: i32, month: u32) -> CalendarMonth {
        let mut days: Vec<CalendarDay> = Vec::new();
        for txn in transactions {
            let Some(date) = txn.date else { continue };
            if date.year() != year || date.month() != month {
                continue;
            }
            match days.iter_mut().find(|day| day.day == date.day()) {
                Some(day) => {
                    day.total += txn.amount;
                    if txn.amount > day.largest_amount {
                        day.largest_amount = txn.amount;
                        day.dominant_label = txn.type_label.clone();
                    }
                }
                None => days.push(CalendarDay {
                    day: date.day(),
                    dominant_label: txn.type_label.clone(),
                    largest_amount: txn.amount,
                    total: txn.amount,
                }),
            }
        }
        days.sort_by_key(|day| day.day);
        CalendarMonth { year, month, days }
    }

    /// Newest first; undated records trail in input order.
    pub fn recent(transactions: &[Transaction], limit: Option<usize>) -> Vec<&Transaction> {
        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by(|a, b| match (a.date, b.date) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        if let Some(limit) = limit {
            ordered.truncate(limit);
        }
        ordered
    }

    /// Every data issue paired with the id of the record it was found on.
    pub fn issues(transactions: &[Transaction]) -> Vec<(String, DataIssue)> {
        transactions
            .iter()
            .flat_map(|txn| {
                txn.issues
                    .iter()
                    .map(move |issue| (txn.id.clone(), issue.clone()))
            })
            .collect()
    }

    /// Dated purchases falling on `day`.
    pub fn on_day(transactions: &[Transaction], day: NaiveDate) -> Vec<&Transaction> {
        transactions
            .iter()
            .filter(|txn| txn.date == Some(day))
            .collect()
    }
}
