//! Dashboard pages: metric tiles and sections derived from report queries.

mod alerts;
mod customers;
mod executive;
mod geography;
mod time_patterns;
mod transactions;

use std::sync::Arc;

use fraudwatch_warehouse::{
    CacheStatus, Connector, Query, QueryFailure, QueryOutcome, ReadThroughQueryService,
    ReportCatalog, TabularResult, WarehouseError,
};
use serde::Serialize;

use crate::cli::PageCommand;

/// Everything a page needs to fetch its data.
pub struct PageContext<'a, C: Connector> {
    service: &'a ReadThroughQueryService<C>,
    catalog: &'a ReportCatalog,
}

impl<'a, C: Connector> PageContext<'a, C> {
    pub fn new(service: &'a ReadThroughQueryService<C>, catalog: &'a ReportCatalog) -> Self {
        Self { service, catalog }
    }

    pub fn catalog(&self) -> &ReportCatalog {
        self.catalog
    }

    pub fn run(&self, query: &Query) -> Result<QueryOutcome, WarehouseError> {
        self.service.run(query)
    }

    /// Run the query a page cannot do without.
    ///
    /// Returns `None` after recording a failure section or the empty notice
    /// on `report`; the page must stop rendering then.
    fn primary(
        &self,
        report: &mut PageReport,
        title: &str,
        query: &Query,
        empty_notice: &str,
    ) -> Result<Option<QueryOutcome>, WarehouseError> {
        let outcome = self.run(query)?;
        if let Some(failure) = &outcome.failure {
            report.push(Section::failed(title, failure.clone()));
            report.stopped = true;
            return Ok(None);
        }
        if !outcome.has_data() {
            report.notice(empty_notice);
            report.stopped = true;
            return Ok(None);
        }
        Ok(Some(outcome))
    }

    /// Run `query` and show its rows as they are.
    fn section(&self, title: &str, query: &Query) -> Result<Section, WarehouseError> {
        let outcome = self.run(query)?;
        Ok(Section::from_outcome(title, &outcome))
    }
}

/// Build the report of one page.
///
/// # Errors
/// Connection failures and invalid filters stop the page.
pub fn build<C: Connector>(
    context: &PageContext<'_, C>,
    command: &PageCommand,
) -> Result<PageReport, WarehouseError> {
    match command {
        PageCommand::Executive => executive::build(context),
        PageCommand::Transactions(args) => transactions::build(context, &args.filter()),
        PageCommand::Customers(args) => customers::build(context, &args.filter()),
        PageCommand::Alerts(args) => alerts::build(context, &args.filter()),
        PageCommand::Geography => geography::build(context),
        PageCommand::TimePatterns => time_patterns::build(context),
    }
}

/// A rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub title: &'static str,
    pub tiles: Vec<Tile>,
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
    /// The primary query failed or was empty and nothing else was fetched.
    pub stopped: bool,
}

impl PageReport {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            tiles: Vec::new(),
            sections: Vec::new(),
            notices: Vec::new(),
            stopped: false,
        }
    }

    fn tile(&mut self, label: &'static str, value: String) {
        self.tiles.push(Tile {
            label,
            value,
            delta: None,
        });
    }

    fn tile_with_delta(&mut self, label: &'static str, value: String, delta: String) {
        self.tiles.push(Tile {
            label,
            value,
            delta: Some(delta),
        });
    }

    fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_owned());
    }
}

/// Headline metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    #[serde(flatten)]
    pub body: SectionBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionBody {
    Table {
        data: Arc<TabularResult>,
        cache: CacheStatus,
    },
    NoData,
    Failed(QueryFailure),
}

impl Section {
    fn from_outcome(title: &str, outcome: &QueryOutcome) -> Self {
        Self::derived(title, outcome, |_| None)
    }

    /// Show `derive(data)` instead of the raw rows. `None` keeps them as is.
    fn derived(
        title: &str,
        outcome: &QueryOutcome,
        derive: impl FnOnce(&TabularResult) -> Option<TabularResult>,
    ) -> Self {
        let body = if let Some(failure) = &outcome.failure {
            SectionBody::Failed(failure.clone())
        } else if !outcome.has_data() {
            SectionBody::NoData
        } else {
            let data = derive(&outcome.data).map_or_else(|| Arc::clone(&outcome.data), Arc::new);
            if data.is_empty() {
                SectionBody::NoData
            } else {
                SectionBody::Table {
                    data,
                    cache: outcome.cache,
                }
            }
        };
        Self {
            title: title.to_owned(),
            body,
        }
    }

    fn failed(title: &str, failure: QueryFailure) -> Self {
        Self {
            title: title.to_owned(),
            body: SectionBody::Failed(failure),
        }
    }
}

/// `1234567.4` -> `1,234,567`
pub fn format_count(value: f64) -> String {
    let rounded = if value.is_finite() { value.round() as i64 } else { 0 };
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

pub fn format_currency(value: f64) -> String {
    format!("₹{}", format_count(value))
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

const NOT_AVAILABLE: &str = "N/A";
