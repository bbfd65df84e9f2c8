//! Report queries over the fraud warehouse schema.
//!
//! Every filter value is bound as a parameter. Only the schema name, which
//! comes from validated configuration, is spliced into the SQL text.

use std::fmt::{self, Display, Formatter};

use time::Date;

use crate::config::is_identifier;
use crate::error::WarehouseError;
use crate::query::{Query, SqlParam};

/// Upper bound of the transaction amount threshold.
pub const MAX_AMOUNT_THRESHOLD: u32 = 100_000;

/// Rows returned by the transaction drill-down.
pub const TRANSACTION_LIMIT: i64 = 1000;

/// Rows returned by the alert drill-down.
pub const ALERT_LIMIT: i64 = 500;

/// Pre-aggregated reporting views maintained upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    FraudSummary,
    DailyTrends,
    AlertDistribution,
    CustomerSegments,
    GeographicRisk,
    TimePatterns,
}

impl ReportView {
    pub const fn view_name(self) -> &'static str {
        match self {
            Self::FraudSummary => "VW_TABLEAU_FRAUD_SUMMARY",
            Self::DailyTrends => "VW_TABLEAU_DAILY_TRENDS",
            Self::AlertDistribution => "VW_TABLEAU_ALERT_DISTRIBUTION",
            Self::CustomerSegments => "VW_TABLEAU_CUSTOMER_SEGMENTS",
            Self::GeographicRisk => "VW_TABLEAU_GEOGRAPHIC_RISK",
            Self::TimePatterns => "VW_TABLEAU_TIME_PATTERNS",
        }
    }

    const fn order_by(self) -> Option<&'static str> {
        match self {
            Self::DailyTrends => Some("DATE_VALUE"),
            Self::GeographicRisk => Some("FRAUD_RATE DESC"),
            Self::TimePatterns => Some("TXN_HOUR"),
            _ => None,
        }
    }
}

/// Alert status selector of the transaction drill-down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlertStatus {
    #[default]
    All,
    FlaggedOnly,
    CleanOnly,
}

impl AlertStatus {
    fn has_alert(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::FlaggedOnly => Some(true),
            Self::CleanOnly => Some(false),
        }
    }
}

/// Options offered by a multi-select filter.
pub trait FilterOption: Copy + Sized + 'static {
    const ALL: &'static [Self];
    fn label(self) -> &'static str;
}

macro_rules! filter_option {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl FilterOption for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

filter_option!(
    /// Customer risk category.
    RiskCategory {
        High => "High Risk",
        Medium => "Medium Risk",
        Low => "Low Risk",
    }
);

filter_option!(
    /// KYC verification status.
    KycStatus {
        Verified => "Verified",
        Pending => "Pending",
        Expired => "Expired",
    }
);

filter_option!(
    /// Alert severity.
    AlertSeverity {
        Critical => "Critical",
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
);

filter_option!(
    /// Alert rule type.
    AlertType {
        HighValue => "High Value",
        RapidVelocity => "Rapid Velocity",
        ForeignLocation => "Foreign Location",
        MultipleFailures => "Multiple Failures",
    }
);

/// Filters of the transaction drill-down.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionFilter {
    pub min_amount: u32,
    pub alert_status: AlertStatus,
    /// Inclusive range on the transaction date.
    pub date_range: Option<(Date, Date)>,
}

/// Filters of the customer risk page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRiskFilter {
    pub risk_categories: Vec<RiskCategory>,
    pub kyc_statuses: Vec<KycStatus>,
}

impl Default for CustomerRiskFilter {
    fn default() -> Self {
        Self {
            risk_categories: RiskCategory::ALL.to_vec(),
            kyc_statuses: KycStatus::ALL.to_vec(),
        }
    }
}

/// Filters of the alert management page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertFilter {
    pub severities: Vec<AlertSeverity>,
    pub alert_types: Vec<AlertType>,
    pub min_amount: u32,
}

impl Default for AlertFilter {
    fn default() -> Self {
        Self {
            severities: vec![AlertSeverity::Critical, AlertSeverity::High],
            alert_types: AlertType::ALL.to_vec(),
            min_amount: 35_000,
        }
    }
}

/// Builds report queries against one warehouse schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCatalog {
    schema: String,
}

impl ReportCatalog {
    /// # Errors
    /// Rejects schema names that are not plain identifiers.
    pub fn new(schema: impl Into<String>) -> Result<Self, WarehouseError> {
        let schema = schema.into();
        if !is_identifier(schema.as_str()) {
            return Err(WarehouseError::QueryRejected(format!(
                "schema '{schema}' must be a plain SQL identifier"
            )));
        }
        Ok(Self { schema })
    }

    /// `SELECT *` over a reporting view, in the view's natural order.
    pub fn view(&self, view: ReportView) -> Query {
        let mut sql = format!("SELECT * FROM {}.{}", self.schema, view.view_name());
        if let Some(order_by) = view.order_by() {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        Query::new(sql)
    }

    /// Like [`view`](Self::view) with a row limit.
    pub fn view_limited(&self, view: ReportView, limit: u32) -> Query {
        let base = self.view(view);
        Query::new(format!("{} LIMIT ?", base.sql())).bind(limit)
    }

    /// Recent transactions joined with customer, account and location.
    pub fn transactions(&self, filter: &TransactionFilter) -> Result<Query, WarehouseError> {
        if filter.min_amount > MAX_AMOUNT_THRESHOLD {
            return Err(WarehouseError::InvalidFilter(format!(
                "minimum amount must be between 0 and {MAX_AMOUNT_THRESHOLD}"
            )));
        }

        let schema = self.schema.as_str();
        let mut sql = format!(
            "SELECT ft.TXN_ID, ft.TXN_TIMESTAMP, dc.CUSTOMER_ID, dc.RISK_SCORE, da.ACCOUNT_TYPE, \
             ft.AMOUNT, dl.LOCATION, ft.HAS_ALERT, ft.ALERT_COUNT \
             FROM {schema}.FACT_TRANSACTIONS ft \
             JOIN {schema}.DIM_CUSTOMER dc ON ft.CUSTOMER_KEY = dc.CUSTOMER_KEY \
             JOIN {schema}.DIM_ACCOUNT da ON ft.ACCOUNT_KEY = da.ACCOUNT_KEY \
             JOIN {schema}.DIM_LOCATION dl ON ft.LOCATION_KEY = dl.LOCATION_KEY \
             WHERE ft.AMOUNT >= ?"
        );
        let mut params = vec![SqlParam::from(filter.min_amount)];

        if let Some(has_alert) = filter.alert_status.has_alert() {
            sql.push_str(" AND ft.HAS_ALERT = ?");
            params.push(SqlParam::from(has_alert));
        }

        if let Some((from, to)) = filter.date_range {
            if from > to {
                return Err(WarehouseError::InvalidFilter(format!(
                    "date range start {from} is after end {to}"
                )));
            }
            sql.push_str(
                " AND CAST(ft.TXN_TIMESTAMP AS DATE) BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)",
            );
            params.push(SqlParam::from(from));
            params.push(SqlParam::from(to));
        }

        sql.push_str(" ORDER BY ft.TXN_TIMESTAMP DESC LIMIT ?");
        params.push(SqlParam::from(TRANSACTION_LIMIT));

        Ok(with_params(sql, params))
    }

    /// KYC risk analysis restricted to the selected categories and statuses.
    pub fn customer_risk(&self, filter: &CustomerRiskFilter) -> Result<Query, WarehouseError> {
        require_selection(&filter.risk_categories)?;
        require_selection(&filter.kyc_statuses)?;

        let sql = format!(
            "SELECT * FROM {}.VW_KYC_RISK_ANALYSIS \
             WHERE RISK_CATEGORY IN ({}) AND KYC_STATUS IN ({})",
            self.schema,
            placeholders(filter.risk_categories.len()),
            placeholders(filter.kyc_statuses.len()),
        );
        let params = labels(&filter.risk_categories)
            .chain(labels(&filter.kyc_statuses))
            .collect();
        Ok(with_params(sql, params))
    }

    /// Recent alerts joined with customer and alert type.
    pub fn alerts(&self, filter: &AlertFilter) -> Result<Query, WarehouseError> {
        require_selection(&filter.severities)?;
        require_selection(&filter.alert_types)?;

        let schema = self.schema.as_str();
        let sql = format!(
            "SELECT fa.ALERT_ID, fa.ALERT_TIMESTAMP, dc.CUSTOMER_ID, dc.RISK_SCORE, \
             dat.ALERT_TYPE, dat.ALERT_SEVERITY, dat.ALERT_CATEGORY, \
             fa.TRANSACTION_AMOUNT, fa.CUSTOMER_RISK_SCORE \
             FROM {schema}.FACT_ALERTS fa \
             JOIN {schema}.DIM_CUSTOMER dc ON fa.CUSTOMER_KEY = dc.CUSTOMER_KEY \
             JOIN {schema}.DIM_ALERT_TYPE dat ON fa.ALERT_TYPE_KEY = dat.ALERT_TYPE_KEY \
             WHERE dat.ALERT_SEVERITY IN ({}) AND dat.ALERT_TYPE IN ({}) \
             AND fa.TRANSACTION_AMOUNT >= ? \
             ORDER BY fa.ALERT_TIMESTAMP DESC LIMIT ?",
            placeholders(filter.severities.len()),
            placeholders(filter.alert_types.len()),
        );
        let mut params: Vec<SqlParam> = labels(&filter.severities)
            .chain(labels(&filter.alert_types))
            .collect();
        params.push(SqlParam::from(filter.min_amount));
        params.push(SqlParam::from(ALERT_LIMIT));
        Ok(with_params(sql, params))
    }
}

fn with_params(sql: String, params: Vec<SqlParam>) -> Query {
    params
        .into_iter()
        .fold(Query::new(sql), |query, param| query.bind(param))
}

fn require_selection<T>(selected: &[T]) -> Result<(), WarehouseError> {
    if selected.is_empty() {
        return Err(WarehouseError::InvalidFilter(String::from(
            "select at least one option from each filter",
        )));
    }
    Ok(())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn labels<T: FilterOption>(selected: &[T]) -> impl Iterator<Item = SqlParam> + '_ {
    selected.iter().map(|option| SqlParam::from(option.label()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn catalog() -> ReportCatalog {
        ReportCatalog::new("GOLD").expect("catalog")
    }

    #[test]
    fn views_are_schema_qualified_and_ordered() {
        let query = catalog().view(ReportView::TimePatterns);
        assert_eq!(
            query.sql(),
            "SELECT * FROM GOLD.VW_TABLEAU_TIME_PATTERNS ORDER BY TXN_HOUR"
        );
        let limited = catalog().view_limited(ReportView::GeographicRisk, 10);
        assert!(limited.sql().ends_with("ORDER BY FRAUD_RATE DESC LIMIT ?"));
        assert_eq!(limited.params(), &[SqlParam::Integer(10)]);
    }

    #[test]
    fn flagged_high_value_filter_differs_from_defaults() {
        let flagged = catalog()
            .transactions(&TransactionFilter {
                min_amount: 5000,
                alert_status: AlertStatus::FlaggedOnly,
                date_range: None,
            })
            .expect("query");
        let everything = catalog()
            .transactions(&TransactionFilter::default())
            .expect("query");

        assert_ne!(flagged.cache_key(), everything.cache_key());
        assert!(flagged.sql().contains("ft.HAS_ALERT = ?"));
        assert!(!everything.sql().contains("HAS_ALERT = ?"));
        assert_eq!(flagged.params()[0], SqlParam::Integer(5000));
        assert_eq!(flagged.params()[1], SqlParam::Bool(true));
    }

    #[test]
    fn date_range_is_bound_and_validated() {
        let query = catalog()
            .transactions(&TransactionFilter {
                date_range: Some((date!(2026 - 01 - 01), date!(2026 - 01 - 31))),
                ..TransactionFilter::default()
            })
            .expect("query");
        assert!(query.params().contains(&SqlParam::Date(date!(2026 - 01 - 31))));

        let inverted = catalog().transactions(&TransactionFilter {
            date_range: Some((date!(2026 - 02 - 01), date!(2026 - 01 - 01))),
            ..TransactionFilter::default()
        });
        assert!(matches!(inverted, Err(WarehouseError::InvalidFilter(_))));
    }

    #[test]
    fn amount_threshold_is_bounded() {
        let result = catalog().transactions(&TransactionFilter {
            min_amount: MAX_AMOUNT_THRESHOLD + 1,
            ..TransactionFilter::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn multi_selects_become_placeholders() {
        let query = catalog()
            .customer_risk(&CustomerRiskFilter {
                risk_categories: vec![RiskCategory::High],
                kyc_statuses: vec![KycStatus::Pending, KycStatus::Expired],
            })
            .expect("query");
        assert!(query.sql().contains("RISK_CATEGORY IN (?)"));
        assert!(query.sql().contains("KYC_STATUS IN (?, ?)"));
        assert_eq!(
            query.params(),
            &[
                SqlParam::from("High Risk"),
                SqlParam::from("Pending"),
                SqlParam::from("Expired"),
            ]
        );
        assert!(query.read_only_sql().is_ok());
    }

    #[test]
    fn empty_selection_is_rejected() {
        let result = catalog().alerts(&AlertFilter {
            severities: Vec::new(),
            ..AlertFilter::default()
        });
        assert!(matches!(result, Err(WarehouseError::InvalidFilter(_))));
    }

    #[test]
    fn alert_defaults_bind_amount_and_limit() {
        let query = catalog().alerts(&AlertFilter::default()).expect("query");
        let params = query.params();
        assert_eq!(params.len(), 2 + 4 + 2);
        assert_eq!(params[6], SqlParam::Integer(35_000));
        assert_eq!(params[7], SqlParam::Integer(ALERT_LIMIT));
        assert!(query.read_only_sql().is_ok());
    }

    #[test]
    fn unsafe_schema_is_rejected() {
        assert!(ReportCatalog::new("GOLD.x; --").is_err());
    }
}
