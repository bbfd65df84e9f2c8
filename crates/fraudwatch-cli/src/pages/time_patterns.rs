use fraudwatch_warehouse::tabular::{as_f64, is_truthy};
use fraudwatch_warehouse::{Connector, ReportView, TabularResult, WarehouseError};
use serde_json::Value;

use super::{format_count, format_percent, PageContext, PageReport, Section, NOT_AVAILABLE};

pub fn build<C: Connector>(context: &PageContext<'_, C>) -> Result<PageReport, WarehouseError> {
    let mut report = PageReport::new("Time-based Fraud Patterns");
    let catalog = context.catalog();

    let Some(hourly) = context.primary(
        &mut report,
        "Hourly Transaction Patterns",
        &catalog.view(ReportView::TimePatterns),
        "No time pattern data available",
    )?
    else {
        return Ok(report);
    };
    let daily = context.run(&catalog.view(ReportView::DailyTrends))?;

    report.tile(
        "Peak Transaction Hour",
        hour_label(hourly.data.value_at_max("TRANSACTION_COUNT", "TXN_HOUR")),
    );
    report.tile(
        "Highest Risk Hour",
        hour_label(hourly.data.value_at_max("FRAUD_RATE", "TXN_HOUR")),
    );
    report.tile(
        "Weekend Transactions",
        if daily.has_data() {
            format_count(
                daily
                    .data
                    .sum_where("TRANSACTION_COUNT", "IS_WEEKEND", is_truthy),
            )
        } else {
            String::from(NOT_AVAILABLE)
        },
    );
    report.tile(
        "Night Fraud Rate",
        hourly
            .data
            .mean_where("FRAUD_RATE", "TIME_PERIOD", |value| value == "Night")
            .map_or_else(|| String::from(NOT_AVAILABLE), format_percent),
    );

    report.push(Section::from_outcome(
        "Hourly Transaction Patterns",
        &hourly,
    ));
    report.push(Section::derived("Time Period Analysis", &hourly, |data| {
        Some(data.group_sum("TIME_PERIOD", &["TRANSACTION_COUNT", "FLAGGED_COUNT"]))
    }));
    report.push(Section::derived("Weekend vs Weekday", &daily, |data| {
        Some(weekend_split(data))
    }));

    Ok(report)
}

fn hour_label(hour: Option<&Value>) -> String {
    hour.and_then(as_f64)
        .map_or_else(|| String::from(NOT_AVAILABLE), |hour| format!("{}:00", hour as i64))
}

/// Daily totals grouped into weekend and weekday rows.
fn weekend_split(daily: &TabularResult) -> TabularResult {
    let mut split = daily.group_sum("IS_WEEKEND", &["TRANSACTION_COUNT", "FLAGGED_COUNT"]);
    for row in &mut split.rows {
        if let Some(label) = row.first_mut() {
            let weekend = is_truthy(label);
            *label = Value::from(if weekend { "Weekend" } else { "Weekday" });
        }
    }
    split
}
