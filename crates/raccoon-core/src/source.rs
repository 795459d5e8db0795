use std::collections::HashMap;

use chrono::NaiveDate;
use raccoon_domain::{
    round_money, BudgetMap, CategoryVocabulary, Coordinates, DateWindow, RawAmount, RawId,
    RawLineItem, RawTransaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{normalize_service::NormalizeService, CoreError};

/// Filter passed to a data source when fetching receipts for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub owner: String,
    pub window: Option<DateWindow>,
    /// Canonical type labels; empty means every label.
    pub type_labels: Vec<String>,
}

impl TransactionQuery {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    pub fn within(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_type_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Applies the window and label filters to a raw row. Rows without a
    /// parseable date never match a windowed query. Labels match through
    /// their synonyms, so a `Groceries` filter also keeps `Grocery` rows.
    pub fn matches(&self, raw: &RawTransaction) -> bool {
        if let Some(window) = &self.window {
            let date = raw
                .timestamp
                .as_deref()
                .and_then(NormalizeService::parse_date);
            match date {
                Some(date) if window.contains(date) => {}
                _ => return false,
            }
        }
        if self.type_labels.is_empty() {
            return true;
        }
        let vocabulary = CategoryVocabulary::type_labels();
        let label = vocabulary.resolve(raw.type_label.as_deref());
        self.type_labels
            .iter()
            .any(|wanted| vocabulary.resolve(Some(wanted.as_str())) == label)
    }
}

/// Abstraction over the backend that owns receipt rows and budget limits.
pub trait ReceiptSource: Send + Sync {
    fn fetch_transactions(&self, query: &TransactionQuery)
        -> Result<Vec<RawTransaction>, CoreError>;
    fn fetch_budgets(&self, owner: &str) -> Result<BudgetMap, CoreError>;
    fn save_budgets(&self, owner: &str, budgets: &BudgetMap) -> Result<(), CoreError>;
    /// Stores a hand-entered receipt and returns its new id.
    fn insert_transaction(&self, owner: &str, receipt: &ManualReceipt)
        -> Result<String, CoreError>;
}

/// A receipt typed in by the user instead of extracted from a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualReceipt {
    pub merchant: String,
    /// Amount as entered.
    pub amount: String,
    pub date: NaiveDate,
    pub type_label: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ManualReceipt {
    pub fn new(
        merchant: impl Into<String>,
        amount: impl Into<String>,
        date: NaiveDate,
        type_label: impl Into<String>,
    ) -> Self {
        Self {
            merchant: merchant.into(),
            amount: amount.into(),
            date,
            type_label: type_label.into(),
            item_name: None,
            address: None,
        }
    }

    pub fn with_item(mut self, name: impl Into<String>) -> Self {
        self.item_name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Checks the entry and converts it into a backend row carrying `id`.
    /// The optional item is recorded as a single line priced at the total.
    pub fn into_raw(&self, id: impl Into<String>) -> Result<RawTransaction, CoreError> {
        let merchant = self.merchant.trim();
        if merchant.is_empty() {
            return Err(CoreError::Validation("store name is required".into()));
        }
        let amount: Decimal = self
            .amount
            .trim()
            .trim_start_matches('$')
            .parse()
            .map_err(|_| CoreError::Validation(format!("invalid amount `{}`", self.amount)))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(CoreError::Validation("amount cannot be negative".into()));
        }
        let vocabulary = CategoryVocabulary::type_labels();
        let type_label = vocabulary
            .categories()
            .iter()
            .find(|label| label.eq_ignore_ascii_case(self.type_label.trim()))
            .cloned()
            .ok_or_else(|| {
                CoreError::Validation(format!("unknown category `{}`", self.type_label))
            })?;
        let amount_text = round_money(amount).to_string();
        let line_items = self
            .item_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                vec![RawLineItem {
                    name: Some(name.to_string()),
                    price: Some(RawAmount::Text(amount_text.clone())),
                    quantity: Some(RawAmount::Number(1.0)),
                    category: Some(type_label.clone()),
                }]
            });
        Ok(RawTransaction {
            id: Some(RawId::Text(id.into())),
            timestamp: Some(self.date.format("%Y-%m-%d").to_string()),
            amount: Some(RawAmount::Text(amount_text)),
            merchant: Some(merchant.to_string()),
            merchant_address: self
                .address
                .as_deref()
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string),
            type_label: Some(type_label),
            line_items,
        })
    }
}

/// Get/put store for geocoded addresses.
pub trait GeoCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Coordinates>;
    fn put(&mut self, key: &str, coordinates: Coordinates);
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryGeoCache {
    entries: HashMap<String, Coordinates>,
}

impl InMemoryGeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoCache for InMemoryGeoCache {
    fn get(&self, key: &str) -> Option<Coordinates> {
        self.entries.get(key).copied()
    }

    fn put(&mut self, key: &str, coordinates: Coordinates) {
        self.entries.insert(key.to_string(), coordinates);
    }
}
