use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use raccoon_core::{
    source::{ManualReceipt, ReceiptSource, TransactionQuery},
    CoreError,
};
use raccoon_domain::{BudgetMap, CategoryVocabulary, RawId, RawTransaction};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

const FILE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const RECEIPTS_DIR: &str = "receipts";
const BUDGETS_DIR: &str = "budgets";

/// Filesystem-backed JSON stand-in for the receipt backend. Each owner has
/// one array of raw rows and one category-to-limit map.
#[derive(Debug, Clone)]
pub struct JsonReceiptStore {
    receipts_dir: PathBuf,
    budgets_dir: PathBuf,
}

impl JsonReceiptStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        let receipts_dir = root.join(RECEIPTS_DIR);
        let budgets_dir = root.join(BUDGETS_DIR);
        fs::create_dir_all(&receipts_dir)?;
        fs::create_dir_all(&budgets_dir)?;
        Ok(Self {
            receipts_dir,
            budgets_dir,
        })
    }

    pub fn receipts_path(&self, owner: &str) -> PathBuf {
        self.receipts_dir
            .join(format!("{}.{}", canonical_name(owner), FILE_EXTENSION))
    }

    pub fn budgets_path(&self, owner: &str) -> PathBuf {
        self.budgets_dir
            .join(format!("{}.{}", canonical_name(owner), FILE_EXTENSION))
    }

    /// Every stored row for `owner`, unfiltered.
    pub fn load_receipts(&self, owner: &str) -> Result<Vec<RawTransaction>, CoreError> {
        let path = self.receipts_path(owner);
        if !path.exists() {
            return Err(CoreError::OwnerNotFound(owner.to_string()));
        }
        let data = fs::read_to_string(&path)?;
        let values: Vec<Value> = serde_json::from_str(&data)?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| decode_row(owner, index, value))
            .collect())
    }

    /// Overwrites all rows stored for `owner`.
    pub fn replace_receipts(&self, owner: &str, rows: &[RawTransaction]) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(rows)?;
        write_atomic(&self.receipts_path(owner), &json)
    }

    /// Owners that have a receipts file, sorted.
    pub fn list_owners(&self) -> Result<Vec<String>, CoreError> {
        let mut owners = Vec::new();
        for entry in fs::read_dir(&self.receipts_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                owners.push(stem.to_string());
            }
        }
        owners.sort();
        Ok(owners)
    }
}

impl ReceiptSource for JsonReceiptStore {
    fn fetch_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<RawTransaction>, CoreError> {
        let rows = self.load_receipts(&query.owner)?;
        let total = rows.len();
        let matched: Vec<RawTransaction> =
            rows.into_iter().filter(|row| query.matches(row)).collect();
        debug!(owner = %query.owner, total, matched = matched.len(), "fetched receipts");
        Ok(matched)
    }

    fn fetch_budgets(&self, owner: &str) -> Result<BudgetMap, CoreError> {
        let path = self.budgets_path(owner);
        if !path.exists() {
            return Ok(BudgetMap::new());
        }
        let data = fs::read_to_string(&path)?;
        let stored: BudgetMap = serde_json::from_str(&data)?;
        Ok(stored.canonicalized(&CategoryVocabulary::type_labels()))
    }

    fn save_budgets(&self, owner: &str, budgets: &BudgetMap) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(budgets)?;
        write_atomic(&self.budgets_path(owner), &json)
    }

    fn insert_transaction(
        &self,
        owner: &str,
        receipt: &ManualReceipt,
    ) -> Result<String, CoreError> {
        let id = Uuid::new_v4().to_string();
        let row = receipt.into_raw(id.clone())?;
        let mut rows = match self.load_receipts(owner) {
            Ok(rows) => rows,
            Err(CoreError::OwnerNotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };
        rows.push(row);
        self.replace_receipts(owner, &rows)?;
        info!(owner, %id, "manual receipt stored");
        Ok(id)
    }
}

/// A row whose shape cannot be read still counts: it keeps its id and
/// normalizes to a zero-amount undated record.
fn decode_row(owner: &str, index: usize, value: Value) -> RawTransaction {
    let id = value.get("id").cloned();
    match serde_json::from_value(value) {
        Ok(row) => row,
        Err(err) => {
            warn!(owner, index, error = %err, "unreadable receipt row kept as empty");
            RawTransaction {
                id: id.and_then(|id| serde_json::from_value::<RawId>(id).ok()),
                ..RawTransaction::default()
            }
        }
    }
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "owner".into()
    } else {
        sanitized
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
