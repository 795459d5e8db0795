use std::path::{Path, PathBuf};

use raccoon_domain::{Granularity, WeekStart};
use serde::{Deserialize, Serialize};

/// Stores user-configurable report preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_currency_precision")]
    pub currency_precision: u8,
    #[serde(default)]
    pub week_start: WeekStart,
    #[serde(default)]
    pub default_granularity: Granularity,
    #[serde(default = "Config::default_top_n")]
    pub top_n: usize,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    /// Account whose receipts are reported when none is given explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root for receipt and budget files. Defaults to `<base>/data`.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            currency_precision: Self::default_currency_precision(),
            week_start: WeekStart::default(),
            default_granularity: Granularity::default(),
            top_n: Self::default_top_n(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            owner: None,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_currency_precision() -> u8 {
        2
    }

    pub fn default_top_n() -> usize {
        5
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(path) => path.clone(),
            None => base.join("data"),
        }
    }
}
