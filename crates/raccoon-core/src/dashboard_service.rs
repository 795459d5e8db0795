use chrono::NaiveDate;
use raccoon_domain::{
    Bucket, BucketItem, BudgetMap, BudgetReport, CategoryBreakdown, CategoryFilter,
    CategoryVocabulary, Granularity, MonthComparison, RankedEntry, SummaryStats, Transaction,
    WeekStart,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    budget_service::BudgetService,
    bucket_service::BucketService,
    category_service::CategoryService,
    normalize_service::NormalizeService,
    source::{ReceiptSource, TransactionQuery},
    summary_service::SummaryService,
};

pub const DEFAULT_TOP_N: usize = 5;

/// The user's current toggles. Changing any of them means computing a new view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewSelection {
    pub granularity: Granularity,
    pub category_filter: CategoryFilter,
    pub week_start: WeekStart,
    pub top_n: usize,
}

impl Default for ViewSelection {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            category_filter: CategoryFilter::All,
            week_start: WeekStart::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ViewSelection {
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_filter(mut self, filter: CategoryFilter) -> Self {
        self.category_filter = filter;
        self
    }

    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// Every derived figure the dashboard shows for one selection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardView {
    pub selection: ViewSelection,
    pub buckets: Vec<Bucket>,
    /// Receipt totals per type label.
    pub spend_by_type: CategoryBreakdown,
    /// Line-item totals per grocery tag.
    pub item_categories: CategoryBreakdown,
    pub top_stores: Vec<RankedEntry>,
    pub top_items: Vec<RankedEntry>,
    /// Current calendar month against the owner's limits.
    pub budget: BudgetReport,
    pub comparison: MonthComparison,
    pub summary: SummaryStats,
}

impl DashboardView {
    /// True when there is nothing to chart ("No data available").
    pub fn is_empty(&self) -> bool {
        self.summary.transaction_count == 0
    }
}

/// Drill-down for one selected bucket.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BucketDetail {
    pub label: String,
    pub total: Decimal,
    pub largest_items: Vec<BucketItem>,
    pub by_category: CategoryBreakdown,
}

/// Result of loading a dashboard from a data source.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum DataState {
    Ready(Box<DashboardView>),
    /// The source failed; the reason is shown instead of zero spend.
    Unavailable(String),
}

pub struct DashboardService;

impl DashboardService {
    /// Recomputes every view from scratch for `selection`.
    pub fn compute(
        transactions: &[Transaction],
        selection: &ViewSelection,
        budgets: &BudgetMap,
        today: NaiveDate,
    ) -> DashboardView {
        let item_vocabulary = CategoryVocabulary::item_categories();
        let buckets = BucketService::bucket_filtered(
            transactions,
            selection.granularity,
            selection.week_start,
            &selection.category_filter,
            &item_vocabulary,
        );

        let scoped: Vec<Transaction> = match &selection.category_filter {
            CategoryFilter::TypeLabel(label) => {
                let wanted = CategoryVocabulary::type_labels().resolve(Some(label.as_str()));
                transactions
                    .iter()
                    .filter(|txn| txn.type_label == wanted)
                    .cloned()
                    .collect()
            }
            _ => transactions.to_vec(),
        };
        let top_items = CategoryService::top_items(
            buckets.iter().flat_map(Bucket::line_items),
            selection.top_n,
        );

        let view = DashboardView {
            selection: selection.clone(),
            spend_by_type: CategoryService::aggregate_by_type_label(transactions),
            item_categories: CategoryService::aggregate_transactions(&scoped, &item_vocabulary),
            top_stores: CategoryService::top_stores(&scoped, selection.top_n),
            top_items,
            budget: BudgetService::monthly_report(transactions, budgets, today),
            comparison: BudgetService::month_over_month(transactions, today),
            summary: SummaryService::summarize(&scoped),
            buckets,
        };
        info!(
            buckets = view.buckets.len(),
            transactions = view.summary.transaction_count,
            granularity = %selection.granularity,
            "dashboard computed"
        );
        view
    }

    /// Fetches receipts and limits for `query.owner` and computes the view.
    /// Any fetch failure becomes [`DataState::Unavailable`].
    pub fn load(
        source: &dyn ReceiptSource,
        query: &TransactionQuery,
        selection: &ViewSelection,
        today: NaiveDate,
    ) -> DataState {
        let raws = match source.fetch_transactions(query) {
            Ok(raws) => raws,
            Err(err) => {
                warn!(owner = %query.owner, error = %err, "receipt fetch failed");
                return DataState::Unavailable(err.to_string());
            }
        };
        let budgets = match source.fetch_budgets(&query.owner) {
            Ok(budgets) => budgets,
            Err(err) => {
                warn!(owner = %query.owner, error = %err, "budget fetch failed");
                return DataState::Unavailable(err.to_string());
            }
        };
        let transactions = NormalizeService::normalize_all(&raws);
        DataState::Ready(Box::new(Self::compute(
            &transactions,
            selection,
            &budgets,
            today,
        )))
    }

    /// The largest lines of one bucket and its per-tag split.
    pub fn detail(bucket: &Bucket, top_n: usize) -> BucketDetail {
        BucketDetail {
            label: bucket.label.clone(),
            total: bucket.total_amount,
            largest_items: CategoryService::largest_items(&bucket.items, top_n),
            by_category: CategoryService::aggregate(
                bucket.line_items(),
                &CategoryVocabulary::item_categories(),
            ),
        }
    }
}
