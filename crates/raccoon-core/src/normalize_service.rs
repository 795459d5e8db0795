use chrono::{DateTime, NaiveDate, NaiveDateTime};
use raccoon_domain::{
    round_money, CategoryVocabulary, DataIssue, LineItem, RawAmount, RawLineItem, RawTransaction,
    Transaction, UNKNOWN_ITEM, UNKNOWN_STORE,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Outcome of coercing one loosely typed money column.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Coerced {
    Value(Decimal),
    Missing,
    Invalid(String),
    Negative,
}

/// Turns raw backend rows into canonical transactions. Never fails: every
/// problem becomes a default value plus a `DataIssue` on the record.
pub struct NormalizeService;

impl NormalizeService {
    pub fn normalize(raw: &RawTransaction) -> Transaction {
        let vocabulary = CategoryVocabulary::type_labels();
        let mut issues = Vec::new();

        let amount = match Self::coerce(raw.amount.as_ref()) {
            Coerced::Value(value) => value,
            Coerced::Missing => {
                issues.push(DataIssue::MissingAmount);
                Decimal::ZERO
            }
            Coerced::Invalid(text) => {
                issues.push(DataIssue::InvalidAmount(text));
                Decimal::ZERO
            }
            Coerced::Negative => {
                issues.push(DataIssue::NegativeAmount);
                Decimal::ZERO
            }
        };

        let date = match raw.timestamp.as_deref().map(str::trim) {
            None | Some("") => {
                issues.push(DataIssue::MissingDate);
                None
            }
            Some(text) => {
                let parsed = Self::parse_date(text);
                if parsed.is_none() {
                    issues.push(DataIssue::InvalidDate(text.to_string()));
                }
                parsed
            }
        };

        let type_label = vocabulary.resolve(raw.type_label.as_deref());
        if let Some(label) = raw.type_label.as_deref().map(str::trim) {
            if !label.is_empty() && !vocabulary.contains(label) {
                issues.push(DataIssue::UnknownTypeLabel(label.to_string()));
            }
        }

        let merchant = non_blank(raw.merchant.as_deref()).unwrap_or(UNKNOWN_STORE);
        let line_items = raw
            .line_items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|item| Self::normalize_item(item, &mut issues))
            .collect();

        let transaction = Transaction {
            id: raw.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            date,
            amount,
            merchant: merchant.to_string(),
            merchant_address: non_blank(raw.merchant_address.as_deref()).map(str::to_string),
            type_label,
            line_items,
            issues,
        };
        if !transaction.issues.is_empty() {
            debug!(
                id = %transaction.id,
                issues = ?transaction.issues,
                "receipt normalized with data issues"
            );
        }
        transaction
    }

    /// Normalizes every row. Rows without an id get `row-<position>`.
    pub fn normalize_all(raws: &[RawTransaction]) -> Vec<Transaction> {
        let transactions: Vec<Transaction> = raws
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let mut txn = Self::normalize(raw);
                if txn.id.is_empty() {
                    txn.id = format!("row-{index}");
                }
                txn
            })
            .collect();
        let flagged = transactions.iter().filter(|t| !t.issues.is_empty()).count();
        let undated = transactions.iter().filter(|t| t.date.is_none()).count();
        info!(
            total = transactions.len(),
            flagged, undated, "normalized receipts"
        );
        transactions
    }

    /// Parses a purchase date. Accepts a plain date, an RFC 3339 timestamp
    /// (its own offset's calendar day) or a naive timestamp.
    pub fn parse_date(text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
            return Some(date);
        }
        if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
            return Some(stamp.date_naive());
        }
        DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|stamp| stamp.date())
    }

    /// Parses a money value the way receipt amounts are parsed, `None` when
    /// it is missing, non-numeric or negative.
    pub fn parse_amount(raw: Option<&RawAmount>) -> Option<Decimal> {
        match Self::coerce(raw) {
            Coerced::Value(value) => Some(value),
            _ => None,
        }
    }

    fn normalize_item(raw: &RawLineItem, issues: &mut Vec<DataIssue>) -> LineItem {
        let name = non_blank(raw.name.as_deref()).unwrap_or(UNKNOWN_ITEM).to_string();
        let price = match Self::coerce(raw.price.as_ref()) {
            Coerced::Value(value) => value,
            Coerced::Missing => Decimal::ZERO,
            Coerced::Invalid(_) | Coerced::Negative => {
                issues.push(DataIssue::InvalidItemPrice { item: name.clone() });
                Decimal::ZERO
            }
        };
        let quantity = match Self::coerce(raw.quantity.as_ref()) {
            Coerced::Value(value) if value > Decimal::ZERO => Some(value),
            _ => None,
        };
        LineItem {
            name,
            price,
            quantity,
            category: non_blank(raw.category.as_deref()).map(str::to_string),
        }
    }

    fn coerce(raw: Option<&RawAmount>) -> Coerced {
        let value = match raw {
            None => return Coerced::Missing,
            Some(RawAmount::Number(number)) => match Decimal::try_from(*number) {
                Ok(value) => value,
                Err(_) => return Coerced::Invalid(number.to_string()),
            },
            Some(RawAmount::Text(text)) => {
                let cleaned = text.trim().trim_start_matches('$').replace(',', "");
                if cleaned.is_empty() {
                    return Coerced::Missing;
                }
                match cleaned
                    .parse::<Decimal>()
                    .or_else(|_| Decimal::from_scientific(&cleaned))
                {
                    Ok(value) => value,
                    Err(_) => return Coerced::Invalid(text.clone()),
                }
            }
            Some(RawAmount::Flag(flag)) => return Coerced::Invalid(flag.to_string()),
            Some(RawAmount::Other(value)) => return Coerced::Invalid(value.to_string()),
        };
        if value < Decimal::ZERO {
            Coerced::Negative
        } else {
            Coerced::Value(round_money(value))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
