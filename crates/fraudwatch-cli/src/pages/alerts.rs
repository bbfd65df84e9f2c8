use fraudwatch_warehouse::{AlertFilter, AlertSeverity, Connector, FilterOption, WarehouseError};

use super::{format_count, format_currency, PageContext, PageReport, Section};

pub fn build<C: Connector>(
    context: &PageContext<'_, C>,
    filter: &AlertFilter,
) -> Result<PageReport, WarehouseError> {
    let mut report = PageReport::new("Alert Management");
    let query = context.catalog().alerts(filter)?;

    let Some(outcome) = context.primary(
        &mut report,
        "Alert Details",
        &query,
        "No alerts found with the selected filters",
    )?
    else {
        return Ok(report);
    };
    let data = &outcome.data;

    let critical = AlertSeverity::Critical.label();
    report.tile("Total Alerts", format_count(data.row_count() as f64));
    report.tile_with_delta(
        "Critical Alerts",
        format_count(data.count_where("ALERT_SEVERITY", |value| value == critical) as f64),
        String::from("High Priority"),
    );
    report.tile(
        "Total Exposure",
        format_currency(data.sum("TRANSACTION_AMOUNT")),
    );
    report.tile(
        "Avg Risk Score",
        format!("{:.0}", data.mean("CUSTOMER_RISK_SCORE").unwrap_or(0.0)),
    );

    report.push(Section::derived(
        "Alert Severity Breakdown",
        &outcome,
        |data| Some(data.value_counts("ALERT_SEVERITY", "ALERT_SEVERITY")),
    ));
    report.push(Section::derived(
        "Alert Type Distribution",
        &outcome,
        |data| Some(data.group_sum("ALERT_TYPE", &["TRANSACTION_AMOUNT"])),
    ));
    report.push(Section::from_outcome("Alert Details", &outcome));

    Ok(report)
}
