use fraudwatch_warehouse::tabular::as_f64;
use fraudwatch_warehouse::{Connector, ReportView, WarehouseError};

use super::{format_count, format_percent, PageContext, PageReport};

/// Locations shown in the geographic preview.
const TOP_LOCATIONS: u32 = 10;

pub fn build<C: Connector>(context: &PageContext<'_, C>) -> Result<PageReport, WarehouseError> {
    let mut report = PageReport::new("Executive Fraud Detection Dashboard");
    let catalog = context.catalog();

    let Some(summary) = context.primary(
        &mut report,
        "Summary",
        &catalog.view(ReportView::FraudSummary),
        "No data available. Check the warehouse connection and views.",
    )?
    else {
        return Ok(report);
    };

    let metrics = summary.data.lookup("METRIC_NAME", "METRIC_VALUE");
    let metric = |name: &str| metrics.get(name).and_then(as_f64).unwrap_or(0.0);

    let total = metric("Total Transactions").trunc();
    let flagged = metric("Flagged Transactions").trunc();
    let flagged_share = if total > 0.0 {
        format!("{:.1}%", flagged / total * 100.0)
    } else {
        String::from("0%")
    };

    report.tile("Total Transactions", format_count(total));
    report.tile_with_delta("Flagged Transactions", format_count(flagged), flagged_share);
    report.tile("Fraud Detection Rate", format_percent(metric("Fraud Detection Rate")));
    report.tile(
        "High Risk Customers",
        format_count(metric("High Risk Customers").trunc()),
    );

    report.push(context.section(
        "Daily Transaction Trends",
        &catalog.view(ReportView::DailyTrends),
    )?);
    report.push(context.section(
        "Alert Type Distribution",
        &catalog.view(ReportView::AlertDistribution),
    )?);
    report.push(context.section(
        "Customer Segment Performance",
        &catalog.view(ReportView::CustomerSegments),
    )?);
    report.push(context.section(
        "Geographic Risk Distribution",
        &catalog.view_limited(ReportView::GeographicRisk, TOP_LOCATIONS),
    )?);

    Ok(report)
}
