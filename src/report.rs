use std::fmt::{self, Write};

use colored::Colorize;
use raccoon_config::Config;
use raccoon_core::DashboardView;
use raccoon_domain::{BudgetView, Granularity, SpendTrend, TOTAL};
use rust_decimal::{Decimal, RoundingStrategy};

/// Budget use at or above this share is flagged before it goes over.
const NEAR_LIMIT_PERCENT: Decimal = Decimal::from_parts(90, 0, 0, false, 0);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Style {
    Header,
    Detail,
    Success,
    Warning,
    Error,
}

/// Renders dashboard views as plain-text reports.
pub struct ReportFormatter {
    currency: String,
    precision: u32,
    color: bool,
}

impl ReportFormatter {
    pub fn new(currency: impl Into<String>, precision: u8, color: bool) -> Self {
        Self {
            currency: currency.into(),
            precision: precision as u32,
            color,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.currency.clone(),
            config.currency_precision,
            config.ui_color_enabled,
        )
    }

    pub fn money(&self, amount: Decimal) -> String {
        let rounded = amount
            .round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero)
            .abs();
        let digits = format!("{:.*}", self.precision as usize, rounded);
        let sign = if amount.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        match currency_symbol(&self.currency) {
            Some(symbol) => format!("{sign}{symbol}{digits}"),
            None => format!("{sign}{digits} {}", self.currency),
        }
    }

    pub fn render(&self, view: &DashboardView) -> String {
        let mut out = String::new();
        if view.is_empty() {
            let _ = writeln!(out, "{}", self.style(Style::Warning, "No data available"));
            return out;
        }

        self.section(&mut out, granularity_title(view.selection.granularity));
        for bucket in &view.buckets {
            let receipts = bucket.transaction_count();
            let _ = writeln!(
                out,
                "  {:<16} {:>12}  ({} receipt{})",
                bucket.label,
                self.money(bucket.total_amount),
                receipts,
                plural(receipts)
            );
        }

        self.section(&mut out, "Spend by type");
        for (entry, (_, share)) in view
            .spend_by_type
            .entries
            .iter()
            .zip(view.spend_by_type.shares())
        {
            let _ = writeln!(
                out,
                "  {:<28} {:>12}  {:>6}%",
                entry.category,
                self.money(entry.amount),
                share.round_dp(1)
            );
        }

        self.section(&mut out, "Top stores");
        for (rank, store) in view.top_stores.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {:<24} {:>12}  ({} visit{})",
                rank + 1,
                store.name,
                self.money(store.amount),
                store.count,
                plural(store.count)
            );
        }

        if !view.top_items.is_empty() {
            self.section(&mut out, "Top items");
            for (rank, item) in view.top_items.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {}. {:<24} {:>12}",
                    rank + 1,
                    item.name,
                    self.money(item.amount)
                );
            }
        }

        self.section(&mut out, "Budget this month");
        let _ = writeln!(out, "{}", self.budget_line(&view.budget.total));
        for category in &view.budget.categories {
            let _ = writeln!(out, "{}", self.budget_line(category));
        }

        self.section(&mut out, "Month over month");
        let comparison = &view.comparison;
        let trend_style = match comparison.trend {
            SpendTrend::Overspending => Style::Error,
            SpendTrend::OnTrack => Style::Success,
            SpendTrend::Steady => Style::Detail,
        };
        let _ = writeln!(
            out,
            "  This month {}  vs  last month {}  {}",
            self.money(comparison.current),
            self.money(comparison.previous),
            self.style(
                trend_style,
                format!("{} ({})", comparison.trend, self.signed(comparison.difference))
            )
        );

        self.section(&mut out, "Summary");
        let summary = &view.summary;
        let _ = writeln!(
            out,
            "  {} receipt{}, {} spent, {} per trip",
            summary.transaction_count,
            plural(summary.transaction_count),
            self.money(summary.total_spent),
            self.money(summary.average_per_trip)
        );
        if summary.undated_count > 0 || summary.flagged_count > 0 {
            let _ = writeln!(
                out,
                "{}",
                self.style(
                    Style::Warning,
                    format!(
                        "  {} undated, {} with data issues",
                        summary.undated_count, summary.flagged_count
                    )
                )
            );
        }
        out
    }

    fn section(&self, out: &mut String, title: &str) {
        let _ = writeln!(out, "\n{}", self.style(Style::Header, format!("=== {title} ===")));
    }

    fn budget_line(&self, view: &BudgetView) -> String {
        let (style, status) = if !view.limit_set {
            (Style::Warning, "no limit")
        } else if view.is_over() {
            (Style::Error, "over")
        } else if view.percent_used >= NEAR_LIMIT_PERCENT {
            (Style::Warning, "near limit")
        } else {
            (Style::Success, "ok")
        };
        let name = if view.category == TOTAL {
            view.category.to_uppercase()
        } else {
            view.category.clone()
        };
        format!(
            "  {:<28} {:>12} of {:>12}  {:>6}%  {}",
            name,
            self.money(view.spent),
            self.money(view.limit),
            view.percent_used.round_dp(1),
            self.style(style, status)
        )
    }

    fn signed(&self, amount: Decimal) -> String {
        if amount > Decimal::ZERO {
            format!("+{}", self.money(amount))
        } else {
            self.money(amount)
        }
    }

    fn style(&self, style: Style, text: impl fmt::Display) -> String {
        let text = text.to_string();
        if !self.color {
            return text;
        }
        match style {
            Style::Header => text.bold().to_string(),
            Style::Success => text.green().to_string(),
            Style::Warning => text.yellow().to_string(),
            Style::Error => text.red().to_string(),
            Style::Detail => text,
        }
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

fn granularity_title(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Trip => "Spending by trip",
        Granularity::Week => "Spending by week",
        Granularity::Month => "Spending by month",
        Granularity::Year => "Spending by year",
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
