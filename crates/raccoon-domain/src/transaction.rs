//! Receipt records as fetched from the backend and in canonical form.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::common::*;

pub const UNKNOWN_STORE: &str = "Unknown Store";
pub const UNKNOWN_ITEM: &str = "Unknown Item";

/// Identifier as stored by the backend (serial integer or text/uuid).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
    Other(Value),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(value) => write!(f, "{value}"),
            RawId::Text(value) => f.write_str(value),
            RawId::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Loosely typed numeric column; the extraction pipeline writes numbers,
/// numeric strings and occasionally garbage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    Flag(bool),
    /// Anything else (objects, arrays); always an invalid amount.
    Other(Value),
}

/// A receipt exactly as the data source returned it. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default, alias = "purchase_date", alias = "date", deserialize_with = "lenient_text")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "total_amount")]
    pub amount: Option<RawAmount>,
    #[serde(default, alias = "store_name", alias = "store", deserialize_with = "lenient_text")]
    pub merchant: Option<String>,
    #[serde(default, alias = "store_address", deserialize_with = "lenient_text")]
    pub merchant_address: Option<String>,
    #[serde(default, alias = "receipt_type", deserialize_with = "lenient_text")]
    pub type_label: Option<String>,
    #[serde(default, alias = "receipt_items", alias = "items")]
    pub line_items: Option<Vec<RawLineItem>>,
}

/// A receipt line as the data source returned it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawLineItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<RawAmount>,
    #[serde(default)]
    pub quantity: Option<RawAmount>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
}

/// Text column that tolerates any JSON value. Non-strings keep their JSON
/// spelling so normalization can flag them instead of the whole row failing.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Data-quality problems found while normalizing a record. Informational only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataIssue {
    MissingAmount,
    InvalidAmount(String),
    NegativeAmount,
    MissingDate,
    InvalidDate(String),
    UnknownTypeLabel(String),
    InvalidItemPrice { item: String },
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::MissingAmount => f.write_str("amount missing, counted as 0"),
            DataIssue::InvalidAmount(raw) => write!(f, "amount `{raw}` is not a number"),
            DataIssue::NegativeAmount => f.write_str("negative amount, counted as 0"),
            DataIssue::MissingDate => f.write_str("purchase date missing"),
            DataIssue::InvalidDate(raw) => write!(f, "purchase date `{raw}` is not a date"),
            DataIssue::UnknownTypeLabel(raw) => write!(f, "unknown receipt type `{raw}`"),
            DataIssue::InvalidItemPrice { item } => write!(f, "price of `{item}` is not a number"),
        }
    }
}

/// Canonical purchase event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    /// `None` when the source date was missing or unparseable.
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub merchant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_address: Option<String>,
    pub type_label: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DataIssue>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: Option<NaiveDate>,
        amount: Decimal,
        merchant: impl Into<String>,
        type_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            amount,
            merchant: merchant.into(),
            merchant_address: None,
            type_label: type_label.into(),
            line_items: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.line_items = items;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.merchant_address = Some(address.into());
        self
    }

    /// Whether the record can take part in time-bucketed views.
    pub fn is_bucketable(&self) -> bool {
        self.date.is_some()
    }

    /// Line items, or a single synthetic item standing for the whole receipt
    /// when none were extracted.
    pub fn items_or_synthetic(&self) -> Vec<LineItem> {
        if self.line_items.is_empty() {
            vec![LineItem::new(
                self.type_label.clone(),
                self.amount,
                Some(self.type_label.clone()),
            )]
        } else {
            self.line_items.clone()
        }
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Amounted for Transaction {
    fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        match self.date {
            Some(date) => format!("{} {} ({})", date.format("%b %-d"), self.merchant, self.amount),
            None => format!("(undated) {} ({})", self.merchant, self.amount),
        }
    }
}

/// One product on a receipt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub name: String,
    /// Contribution of the line to the receipt total.
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: Decimal, category: Option<String>) -> Self {
        Self {
            name: name.into(),
            price,
            quantity: None,
            category,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Price per unit; the line price when quantity is absent or not positive.
    pub fn unit_price(&self) -> Decimal {
        match self.quantity {
            Some(quantity) if quantity > Decimal::ZERO => self.price / quantity,
            _ => self.price,
        }
    }
}

impl NamedEntity for LineItem {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Amounted for LineItem {
    fn amount(&self) -> Decimal {
        self.price
    }
}
