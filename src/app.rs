use std::path::PathBuf;

use chrono::NaiveDate;
use raccoon_config::{Config, ConfigManager};
use raccoon_core::{
    source::TransactionQuery,
    time::{Clock, SystemClock},
    DashboardService, DataState, ViewSelection,
};
use raccoon_domain::{CategoryFilter, Granularity, WeekStart};
use raccoon_storage_json::JsonReceiptStore;
use tracing::info;

use crate::{errors::AppError, report::ReportFormatter};

pub const USAGE: &str = "\
Usage: raccoon_report [OPTIONS]

Options:
  --config <dir>            Base directory holding config.json (default: $RACCOON_HOME or ~/.raccoon)
  --owner <id>              Account whose receipts are reported
  --granularity <g>         trip | week | month | year
  --category <label>        Only receipts with this type label
  --item-category <tag>     Only line items with this tag
  --week-start <day>        sunday | monday
  --top <n>                 Length of the top stores and items lists
  --today <YYYY-MM-DD>      Reference date for budget and month-over-month views
  --json                    Print the computed view as JSON
  -h, --help                Show this message";

/// Parsed command line. Unset options fall back to the stored config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config_dir: Option<PathBuf>,
    pub owner: Option<String>,
    pub granularity: Option<Granularity>,
    pub filter: CategoryFilter,
    pub week_start: Option<WeekStart>,
    pub top_n: Option<usize>,
    pub today: Option<NaiveDate>,
    pub json: bool,
    pub help: bool,
}

impl CliArgs {
    pub fn parse<I, S>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--json" => parsed.json = true,
                "--config" => parsed.config_dir = Some(PathBuf::from(value(&flag, args.next())?)),
                "--owner" => parsed.owner = Some(value(&flag, args.next())?),
                "--granularity" => {
                    let raw = value(&flag, args.next())?;
                    parsed.granularity =
                        Some(raw.parse().map_err(|err| AppError::Usage(format!("{err}")))?);
                }
                "--week-start" => {
                    let raw = value(&flag, args.next())?;
                    parsed.week_start =
                        Some(raw.parse().map_err(|err| AppError::Usage(format!("{err}")))?);
                }
                "--category" => {
                    parsed.filter = CategoryFilter::TypeLabel(value(&flag, args.next())?)
                }
                "--item-category" => {
                    parsed.filter = CategoryFilter::ItemCategory(value(&flag, args.next())?)
                }
                "--top" => {
                    let raw = value(&flag, args.next())?;
                    let n = raw
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| AppError::Usage(format!("invalid --top value `{raw}`")))?;
                    parsed.top_n = Some(n);
                }
                "--today" => {
                    let raw = value(&flag, args.next())?;
                    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                        AppError::Usage(format!("invalid --today date `{raw}`, expected YYYY-MM-DD"))
                    })?;
                    parsed.today = Some(date);
                }
                other => return Err(AppError::Usage(format!("unknown option `{other}`"))),
            }
        }
        Ok(parsed)
    }

    /// The view toggles after applying command-line overrides to `config`.
    pub fn selection(&self, config: &Config) -> ViewSelection {
        ViewSelection::default()
            .with_granularity(self.granularity.unwrap_or(config.default_granularity))
            .with_week_start(self.week_start.unwrap_or(config.week_start))
            .with_top_n(self.top_n.unwrap_or(config.top_n))
            .with_filter(self.filter.clone())
    }
}

fn value(flag: &str, next: Option<String>) -> Result<String, AppError> {
    next.filter(|value| !value.starts_with("--"))
        .ok_or_else(|| AppError::Usage(format!("option `{flag}` needs a value")))
}

/// Entry point of the report binary; returns the text written to stdout.
pub fn run<I, S>(args: I, clock: &dyn Clock) -> Result<String, AppError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args = CliArgs::parse(args)?;
    if args.help {
        return Ok(format!("{USAGE}\n"));
    }

    let base = args
        .config_dir
        .clone()
        .unwrap_or_else(ConfigManager::default_base_dir);
    let manager = ConfigManager::with_base_dir(base)?;
    let config = manager.load()?;
    let owner = args
        .owner
        .clone()
        .or_else(|| config.owner.clone())
        .ok_or_else(|| AppError::Usage("no owner given; pass --owner or set it in config.json".into()))?;

    let store = JsonReceiptStore::new(config.resolve_data_dir(manager.base_dir()))?;
    let selection = args.selection(&config);
    let today = args.today.unwrap_or_else(|| clock.today());
    info!(%owner, %today, granularity = %selection.granularity, "building report");

    let query = TransactionQuery::new(owner);
    match DashboardService::load(&store, &query, &selection, today) {
        DataState::Ready(view) => {
            if args.json {
                Ok(format!("{}\n", serde_json::to_string_pretty(&view)?))
            } else {
                Ok(ReportFormatter::from_config(&config).render(&view))
            }
        }
        DataState::Unavailable(reason) => Err(AppError::Unavailable(reason)),
    }
}

/// Runs against the process arguments and wall clock.
pub fn run_cli() -> Result<String, AppError> {
    run(std::env::args().skip(1), &SystemClock)
}
