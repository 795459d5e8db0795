use std::sync::Mutex;

use chrono::NaiveDate;
use raccoon_domain::{
    BudgetMap, CategoryFilter, CategoryVocabulary, Granularity, LineItem, RawAmount, RawId,
    RawTransaction, Transaction, WeekStart, UNCATEGORIZED,
};
use rust_decimal::Decimal;

use crate::{
    budget_service::BudgetService,
    bucket_service::BucketService,
    category_service::CategoryService,
    dashboard_service::{DashboardService, DataState, ViewSelection},
    normalize_service::NormalizeService,
    source::{ManualReceipt, ReceiptSource, TransactionQuery},
    summary_service::SummaryService,
    CoreError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

fn txn(id: &str, day: NaiveDate, amount: i64, label: &str) -> Transaction {
    Transaction::new(id, Some(day), dec(amount), "Shop", label)
}

fn sample() -> Vec<Transaction> {
    vec![
        txn("1", date(2023, 12, 30), 12, "Groceries"),
        txn("2", date(2024, 1, 5), 50, "Groceries").with_items(vec![
            LineItem::new("Apples", dec(20), Some("Fruits".into())),
            LineItem::new("Cheese", dec(30), Some("Dairy".into())),
        ]),
        txn("3", date(2024, 1, 20), 30, "Fuel"),
        txn("4", date(2024, 2, 3), 20, "Restaurants & Dining"),
        txn("5", date(2024, 2, 3), 8, "Groceries"),
        txn("6", date(2024, 6, 15), 44, "Travel"),
        Transaction::new("7", None, dec(9), "Shop", "Groceries"),
    ]
}

#[test]
fn scenario_month_buckets() {
    let txns = vec![
        txn("a", date(2024, 1, 5), 50, "Groceries"),
        txn("b", date(2024, 1, 20), 30, "Groceries"),
        txn("c", date(2024, 2, 3), 20, "Groceries"),
    ];
    let buckets = BucketService::bucket(&txns, Granularity::Month, WeekStart::Sunday);
    let summary: Vec<(&str, Decimal)> = buckets
        .iter()
        .map(|b| (b.label.as_str(), b.total_amount))
        .collect();
    assert_eq!(summary, vec![("Jan 2024", dec(80)), ("Feb 2024", dec(20))]);
}

#[test]
fn scenario_open_vocabulary_fold() {
    let items = vec![
        LineItem::new("a", dec(5), Some("Fruits".into())),
        LineItem::new("b", dec(3), Some("Fruits".into())),
        LineItem::new("c", dec(2), None),
    ];
    let breakdown = CategoryService::aggregate(&items, &CategoryVocabulary::open(UNCATEGORIZED));
    let pairs: Vec<(&str, Decimal)> = breakdown
        .entries
        .iter()
        .map(|e| (e.category.as_str(), e.amount))
        .collect();
    assert_eq!(pairs, vec![("Fruits", dec(8)), (UNCATEGORIZED, dec(2))]);
}

#[test]
fn scenario_budget_caps() {
    let budgets: BudgetMap = [("Groceries", dec(200))].into_iter().collect();
    let spend = CategoryService::aggregate_by_type_label(&[
        txn("a", date(2024, 1, 1), 250, "Groceries"),
        txn("b", date(2024, 1, 2), 50, "Fuel"),
    ]);
    let report = BudgetService::compare(&spend, &budgets);

    let total = BudgetService::view_for(&report, "Total");
    assert_eq!(total.limit, dec(200));
    assert_eq!(total.spent, dec(300));
    assert_eq!(total.percent_used, dec(100));

    let groceries = BudgetService::view_for(&report, "Groceries");
    assert_eq!(groceries.percent_used, dec(100));
    assert!(groceries.is_over());

    let fuel = BudgetService::view_for(&report, "Fuel");
    assert_eq!(fuel.limit, Decimal::ZERO);
    assert!(!fuel.limit_set);
    assert_eq!(fuel.spent, dec(50));
    assert_eq!(fuel.percent_used, dec(100));
}

#[test]
fn scenario_empty_input() {
    for granularity in Granularity::ALL {
        assert!(BucketService::bucket(&[], granularity, WeekStart::Sunday).is_empty());
    }
    let view = DashboardService::compute(
        &[],
        &ViewSelection::default(),
        &BudgetMap::new(),
        date(2024, 1, 1),
    );
    assert!(view.is_empty());
    assert!(view.buckets.is_empty());
    assert_eq!(view.budget.total.spent, Decimal::ZERO);
}

#[test]
fn scenario_malformed_record() {
    let mut raws: Vec<RawTransaction> = [("2024-01-05", 50.0), ("2024-01-20", 30.0), ("2024-02-03", 20.0)]
        .iter()
        .enumerate()
        .map(|(index, (day, amount))| RawTransaction {
            id: Some(RawId::Number(index as i64)),
            timestamp: Some(day.to_string()),
            amount: Some(RawAmount::Number(*amount)),
            ..RawTransaction::default()
        })
        .collect();
    raws.insert(
        1,
        RawTransaction {
            id: Some(RawId::Number(99)),
            timestamp: Some("not-a-date".into()),
            amount: None,
            ..RawTransaction::default()
        },
    );
    let txns = NormalizeService::normalize_all(&raws);
    for granularity in Granularity::ALL {
        let buckets = BucketService::bucket(&txns, granularity, WeekStart::Sunday);
        let mut ids: Vec<&str> = buckets
            .iter()
            .flat_map(|b| b.transaction_ids.iter().map(String::as_str))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["0", "1", "2"], "{granularity}");
        let bucketed: Decimal = buckets.iter().map(|b| b.total_amount).sum();
        assert_eq!(bucketed, dec(100), "{granularity}");
    }
    assert_eq!(
        BucketService::bucket(&txns, Granularity::Trip, WeekStart::Sunday).len(),
        3
    );

    let summary = SummaryService::summarize(&txns);
    assert_eq!(summary.transaction_count, 4);
    assert_eq!(summary.total_spent, dec(100));
    assert_eq!(summary.undated_count, 1);

    let view = DashboardService::compute(
        &txns,
        &ViewSelection::default().with_granularity(Granularity::Month),
        &BudgetMap::new(),
        date(2024, 2, 10),
    );
    assert_eq!(view.buckets.len(), 2);
    assert_eq!(view.summary.transaction_count, 4);
    assert_eq!(view.summary.total_spent, dec(100));
    assert_eq!(view.summary.flagged_count, 1);
}

#[test]
fn buckets_partition_dated_transactions() {
    let txns = sample();
    for granularity in Granularity::ALL {
        let buckets = BucketService::bucket(&txns, granularity, WeekStart::Monday);
        let mut ids: Vec<&str> = buckets
            .iter()
            .flat_map(|b| b.transaction_ids.iter().map(String::as_str))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"], "{granularity}");

        let bucketed: Decimal = buckets.iter().map(|b| b.total_amount).sum();
        let dated: Decimal = txns.iter().filter(|t| t.date.is_some()).map(|t| t.amount).sum();
        assert_eq!(bucketed, dated);
    }
}

#[test]
fn category_totals_conserve_spend() {
    let txns = sample();
    for vocabulary in [
        CategoryVocabulary::type_labels(),
        CategoryVocabulary::item_categories(),
        CategoryVocabulary::open(UNCATEGORIZED),
    ] {
        let items: Vec<LineItem> = txns.iter().flat_map(Transaction::items_or_synthetic).collect();
        let expected: Decimal = items.iter().map(|i| i.price).sum();
        let breakdown = CategoryService::aggregate(&items, &vocabulary);
        assert_eq!(breakdown.total(), expected);
    }
}

#[test]
fn bucketing_ignores_input_order() {
    let txns = sample();
    let mut reversed = txns.clone();
    reversed.reverse();
    let mut rotated = txns.clone();
    rotated.rotate_left(3);

    for granularity in Granularity::ALL {
        let baseline: Vec<(String, Decimal)> =
            BucketService::bucket(&txns, granularity, WeekStart::Sunday)
                .into_iter()
                .map(|b| (b.label, b.total_amount))
                .collect();
        for shuffled in [&reversed, &rotated] {
            let other: Vec<(String, Decimal)> =
                BucketService::bucket(shuffled, granularity, WeekStart::Sunday)
                    .into_iter()
                    .map(|b| (b.label, b.total_amount))
                    .collect();
            assert_eq!(baseline, other, "{granularity}");
        }
    }
}

#[test]
fn percent_used_stays_in_bounds() {
    let values = [
        Decimal::ZERO,
        Decimal::new(1, 25),
        Decimal::new(1, 2),
        dec(1),
        dec(49),
        dec(50),
        dec(99),
        dec(100),
        dec(250),
        dec(10_000),
        dec(1_000_000_000),
        Decimal::MAX,
    ];
    for spent in values {
        for limit in values {
            let percent = BudgetService::percent_used(spent, limit);
            assert!(percent >= Decimal::ZERO && percent <= dec(100), "{spent}/{limit}");
        }
    }
}

#[test]
fn years_never_merge_under_same_month() {
    let txns = vec![
        txn("a", date(2023, 1, 10), 1, "Groceries"),
        txn("b", date(2024, 1, 10), 2, "Groceries"),
    ];
    let buckets = BucketService::bucket(&txns, Granularity::Month, WeekStart::Sunday);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].label, "Jan 2023");
}

#[test]
fn dashboard_respects_type_filter() {
    let selection = ViewSelection::default()
        .with_filter(CategoryFilter::TypeLabel("Grocery".into()))
        .with_top_n(2);
    let view = DashboardService::compute(&sample(), &selection, &BudgetMap::new(), date(2024, 2, 10));
    let bucketed: Decimal = view.buckets.iter().map(|b| b.total_amount).sum();
    assert_eq!(bucketed, dec(70));
    assert_eq!(view.summary.total_spent, dec(79));
    assert_eq!(view.top_items.len(), 2);
    assert_eq!(view.top_items[0].name, "Cheese");
    // Spend by type is never filtered.
    assert_eq!(view.spend_by_type.get("Fuel"), Some(dec(30)));
    assert_eq!(view.budget.total.spent, dec(28));
    assert_eq!(view.comparison.current, dec(28));
    assert_eq!(view.comparison.previous, dec(50));

    let detail = DashboardService::detail(&view.buckets[1], 1);
    assert_eq!(detail.label, "Jan 2024");
    assert_eq!(detail.largest_items[0].item.name, "Cheese");
}

struct StubSource {
    rows: Vec<RawTransaction>,
    fail: bool,
    saved: Mutex<Option<BudgetMap>>,
}

impl ReceiptSource for StubSource {
    fn fetch_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<RawTransaction>, CoreError> {
        if self.fail {
            return Err(CoreError::Source("connection refused".into()));
        }
        Ok(self.rows.iter().filter(|r| query.matches(r)).cloned().collect())
    }

    fn fetch_budgets(&self, _owner: &str) -> Result<BudgetMap, CoreError> {
        Ok(self.saved.lock().unwrap().clone().unwrap_or_default())
    }

    fn save_budgets(&self, _owner: &str, budgets: &BudgetMap) -> Result<(), CoreError> {
        *self.saved.lock().unwrap() = Some(budgets.clone());
        Ok(())
    }

    fn insert_transaction(&self, _owner: &str, receipt: &ManualReceipt) -> Result<String, CoreError> {
        receipt.into_raw("stub").map(|_| "stub".to_string())
    }
}

#[test]
fn load_reports_unavailable_instead_of_zero() {
    let source = StubSource {
        rows: Vec::new(),
        fail: true,
        saved: Mutex::new(None),
    };
    let state = DashboardService::load(
        &source,
        &TransactionQuery::new("owner"),
        &ViewSelection::default(),
        date(2024, 1, 1),
    );
    match state {
        DataState::Unavailable(reason) => assert!(reason.contains("connection refused")),
        DataState::Ready(_) => panic!("expected unavailable"),
    }
}

#[test]
fn load_normalizes_and_computes() {
    let source = StubSource {
        rows: vec![RawTransaction {
            id: Some(RawId::Number(1)),
            timestamp: Some("2024-01-05T10:00:00Z".into()),
            amount: Some(RawAmount::Text("12.5".into())),
            type_label: Some("Grocery".into()),
            ..RawTransaction::default()
        }],
        fail: false,
        saved: Mutex::new(None),
    };
    let budgets = BudgetService::set_limit(&BudgetMap::new(), "Groceries", dec(25)).unwrap();
    source.save_budgets("owner", &budgets).unwrap();

    let state = DashboardService::load(
        &source,
        &TransactionQuery::new("owner"),
        &ViewSelection::default(),
        date(2024, 1, 31),
    );
    let DataState::Ready(view) = state else {
        panic!("expected ready");
    };
    assert_eq!(view.buckets.len(), 1);
    assert_eq!(view.budget.view("Groceries").map(|v| v.percent_used), Some(dec(50)));
}
