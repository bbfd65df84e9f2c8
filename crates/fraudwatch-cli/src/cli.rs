//! CLI argument definitions for fraudwatch.
//!
//! Each dashboard page is a subcommand; the same pages can be entered line by
//! line inside `fraudwatch session`, which keeps one warehouse connection and
//! one result cache alive between pages.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `executive` | Headline fraud metrics and trends |
//! | `transactions` | Transaction drill-down with amount/alert/date filters |
//! | `customers` | Customer risk by category and KYC status |
//! | `alerts` | Alert management by severity, type and amount |
//! | `geography` | Fraud rate per location and region |
//! | `time-patterns` | Hourly, period and weekend patterns |
//! | `status` | Connection check and last-updated timestamp |
//! | `session` | Interactive loop with refresh |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--rows` | `20` | Rows shown per table section |
//! | `--config` | secrets file | Path to the TOML secrets file |
//! | `-v` | warn | Raise log verbosity (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! fraudwatch executive
//! fraudwatch transactions --min-amount 5000 --alert-status flagged-only
//! fraudwatch alerts --severity critical --format json --pretty
//! fraudwatch session
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use fraudwatch_warehouse::reports::MAX_AMOUNT_THRESHOLD;
use fraudwatch_warehouse::{
    AlertFilter, AlertSeverity, AlertStatus, AlertType, CustomerRiskFilter, KycStatus,
    RiskCategory, TransactionFilter,
};
use time::macros::format_description;
use time::Date;

/// 🔒 Fraudwatch - fraud monitoring dashboard for the terminal
///
/// Reads pre-aggregated fraud views from the warehouse, caches results for a
/// few minutes and renders them as metric tiles and tables.
#[derive(Debug, Parser)]
#[command(
    name = "fraudwatch",
    author,
    version,
    about = "Fraud monitoring dashboard over the reporting warehouse",
    long_about = "Fraudwatch renders the fraud monitoring dashboard pages from the \
reporting warehouse. Features include:\n\
\n\
  • Executive, transaction, customer, alert, geographic and time views\n\
  • Parameterized filters, never spliced into SQL\n\
  • Result cache with a fixed TTL and manual refresh\n\
  • Fail-soft sections: one broken query does not take the page down\n\
\n\
Use 'fraudwatch <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for pages.
    ///
    /// - table: aligned text (default)
    /// - json: one JSON document per page
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Rows shown per table section.
    #[arg(long, global = true, default_value_t = 20)]
    pub rows: usize,

    /// Path to the secrets file holding the `[warehouse]` table.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity: -v info, -vv debug, -vvv trace.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text for terminal display.
    Table,
    /// Single JSON document.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Page(PageCommand),

    /// 🔌 Check the warehouse connection.
    ///
    /// Prints whether a connection could be established and when the
    /// check ran.
    Status,

    /// 🔄 Interactive session reading page commands from stdin.
    ///
    /// Pages requested again within the cache TTL are served from cache.
    /// Type `refresh` to drop cached results, `status` for connection and
    /// cache statistics, `quit` to leave.
    Session,
}

/// Dashboard pages.
#[derive(Debug, Clone, Subcommand)]
pub enum PageCommand {
    /// 📊 Executive dashboard: headline metrics and trends.
    ///
    /// # Examples
    ///
    ///   fraudwatch executive
    ///   fraudwatch executive --format json --pretty
    Executive,

    /// 🔍 Transaction analysis.
    ///
    /// Shows the most recent 1,000 transactions matching the filters.
    ///
    /// # Examples
    ///
    ///   fraudwatch transactions --min-amount 5000
    ///   fraudwatch transactions --alert-status flagged-only --from 2026-01-01 --to 2026-01-31
    Transactions(TransactionArgs),

    /// 👥 Customer risk by risk category and KYC status.
    ///
    /// # Examples
    ///
    ///   fraudwatch customers --risk high --kyc pending --kyc expired
    Customers(CustomerArgs),

    /// 🚨 Alert management.
    ///
    /// Shows the most recent 500 alerts matching the filters. Without
    /// `--severity`, only critical and high alerts are listed.
    ///
    /// # Examples
    ///
    ///   fraudwatch alerts
    ///   fraudwatch alerts --severity medium --alert-type rapid-velocity --min-amount 0
    Alerts(AlertArgs),

    /// 📍 Geographic risk analysis.
    Geography,

    /// ⏰ Time-based fraud patterns.
    TimePatterns,
}

/// Arguments for the `transactions` page.
#[derive(Debug, Clone, Args)]
pub struct TransactionArgs {
    /// Minimum transaction amount.
    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_AMOUNT_THRESHOLD))
    )]
    pub min_amount: u32,

    /// Alert status of the listed transactions.
    #[arg(long, value_enum, default_value_t = AlertStatusArg::All)]
    pub alert_status: AlertStatusArg,

    /// First transaction date (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date, requires = "to")]
    pub from: Option<Date>,

    /// Last transaction date (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date, requires = "from")]
    pub to: Option<Date>,
}

impl TransactionArgs {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            min_amount: self.min_amount,
            alert_status: self.alert_status.into(),
            date_range: self.from.zip(self.to),
        }
    }
}

/// Arguments for the `customers` page.
#[derive(Debug, Clone, Args)]
pub struct CustomerArgs {
    /// Risk categories to include (repeatable). Defaults to all.
    #[arg(long = "risk", value_enum, value_delimiter = ',')]
    pub risk: Vec<RiskArg>,

    /// KYC statuses to include (repeatable). Defaults to all.
    #[arg(long = "kyc", value_enum, value_delimiter = ',')]
    pub kyc: Vec<KycArg>,
}

impl CustomerArgs {
    pub fn filter(&self) -> CustomerRiskFilter {
        let defaults = CustomerRiskFilter::default();
        CustomerRiskFilter {
            risk_categories: selection(&self.risk, defaults.risk_categories),
            kyc_statuses: selection(&self.kyc, defaults.kyc_statuses),
        }
    }
}

/// Arguments for the `alerts` page.
#[derive(Debug, Clone, Args)]
pub struct AlertArgs {
    /// Severities to include (repeatable). Defaults to critical and high.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub severity: Vec<SeverityArg>,

    /// Alert types to include (repeatable). Defaults to all.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub alert_type: Vec<AlertTypeArg>,

    /// Minimum transaction amount of the alerted transaction.
    #[arg(long, default_value_t = 35_000)]
    pub min_amount: u32,
}

impl AlertArgs {
    pub fn filter(&self) -> AlertFilter {
        let defaults = AlertFilter::default();
        AlertFilter {
            severities: selection(&self.severity, defaults.severities),
            alert_types: selection(&self.alert_type, defaults.alert_types),
            min_amount: self.min_amount,
        }
    }
}

fn selection<A, T>(selected: &[A], defaults: Vec<T>) -> Vec<T>
where
    A: Copy + Into<T>,
{
    if selected.is_empty() {
        defaults
    } else {
        selected.iter().copied().map(Into::into).collect()
    }
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected YYYY-MM-DD: {error}"))
}

/// Alert status selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlertStatusArg {
    All,
    FlaggedOnly,
    CleanOnly,
}

impl From<AlertStatusArg> for AlertStatus {
    fn from(value: AlertStatusArg) -> Self {
        match value {
            AlertStatusArg::All => Self::All,
            AlertStatusArg::FlaggedOnly => Self::FlaggedOnly,
            AlertStatusArg::CleanOnly => Self::CleanOnly,
        }
    }
}

/// Risk category selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RiskArg {
    High,
    Medium,
    Low,
}

impl From<RiskArg> for RiskCategory {
    fn from(value: RiskArg) -> Self {
        match value {
            RiskArg::High => Self::High,
            RiskArg::Medium => Self::Medium,
            RiskArg::Low => Self::Low,
        }
    }
}

/// KYC status selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KycArg {
    Verified,
    Pending,
    Expired,
}

impl From<KycArg> for KycStatus {
    fn from(value: KycArg) -> Self {
        match value {
            KycArg::Verified => Self::Verified,
            KycArg::Pending => Self::Pending,
            KycArg::Expired => Self::Expired,
        }
    }
}

/// Alert severity selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Critical,
    High,
    Medium,
    Low,
}

impl From<SeverityArg> for AlertSeverity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Critical => Self::Critical,
            SeverityArg::High => Self::High,
            SeverityArg::Medium => Self::Medium,
            SeverityArg::Low => Self::Low,
        }
    }
}

/// Alert type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlertTypeArg {
    HighValue,
    RapidVelocity,
    ForeignLocation,
    MultipleFailures,
}

impl From<AlertTypeArg> for AlertType {
    fn from(value: AlertTypeArg) -> Self {
        match value {
            AlertTypeArg::HighValue => Self::HighValue,
            AlertTypeArg::RapidVelocity => Self::RapidVelocity,
            AlertTypeArg::ForeignLocation => Self::ForeignLocation,
            AlertTypeArg::MultipleFailures => Self::MultipleFailures,
        }
    }
}

/// One line typed inside `fraudwatch session`.
#[derive(Debug, Parser)]
#[command(name = "fraudwatch>", no_binary_name = true, disable_version_flag = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Commands accepted inside a session.
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    #[command(flatten)]
    Page(PageCommand),

    /// Drop every cached result.
    Refresh,

    /// Connection and cache statistics.
    Status,

    /// Leave the session.
    #[command(alias = "exit")]
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use time::macros::date;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
        SessionLine::command().debug_assert();
    }

    #[test]
    fn transaction_flags_build_the_filter() {
        let cli = Cli::try_parse_from([
            "fraudwatch",
            "transactions",
            "--min-amount",
            "5000",
            "--alert-status",
            "flagged-only",
            "--from",
            "2026-01-01",
            "--to",
            "2026-01-31",
        ])
        .expect("parse");

        let Command::Page(PageCommand::Transactions(args)) = cli.command else {
            panic!("expected transactions page");
        };
        let filter = args.filter();
        assert_eq!(filter.min_amount, 5000);
        assert_eq!(filter.alert_status, AlertStatus::FlaggedOnly);
        assert_eq!(
            filter.date_range,
            Some((date!(2026 - 01 - 01), date!(2026 - 01 - 31)))
        );
    }

    #[test]
    fn amount_above_threshold_is_a_usage_error() {
        let result = Cli::try_parse_from(["fraudwatch", "transactions", "--min-amount", "100001"]);
        assert!(result.is_err());
    }

    #[test]
    fn half_open_date_range_is_rejected() {
        let result = Cli::try_parse_from(["fraudwatch", "transactions", "--from", "2026-01-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn omitted_multi_selects_fall_back_to_defaults() {
        let cli = Cli::try_parse_from(["fraudwatch", "alerts", "--alert-type", "high-value"])
            .expect("parse");
        let Command::Page(PageCommand::Alerts(args)) = cli.command else {
            panic!("expected alerts page");
        };
        let filter = args.filter();
        assert_eq!(
            filter.severities,
            vec![AlertSeverity::Critical, AlertSeverity::High]
        );
        assert_eq!(filter.alert_types, vec![AlertType::HighValue]);
        assert_eq!(filter.min_amount, 35_000);
    }

    #[test]
    fn alert_amount_has_no_upper_cap() {
        let cli = Cli::try_parse_from(["fraudwatch", "alerts", "--min-amount", "150000"])
            .expect("parse");
        let Command::Page(PageCommand::Alerts(args)) = cli.command else {
            panic!("expected alerts page");
        };
        assert_eq!(args.filter().min_amount, 150_000);
    }

    #[test]
    fn session_lines_parse_without_binary_name() {
        let line = SessionLine::try_parse_from(["customers", "--risk", "high,low"]).expect("parse");
        let SessionCommand::Page(PageCommand::Customers(args)) = line.command else {
            panic!("expected customers page");
        };
        assert_eq!(
            args.filter().risk_categories,
            vec![RiskCategory::High, RiskCategory::Low]
        );

        let quit = SessionLine::try_parse_from(["exit"]).expect("parse");
        assert!(matches!(quit.command, SessionCommand::Quit));
    }
}
