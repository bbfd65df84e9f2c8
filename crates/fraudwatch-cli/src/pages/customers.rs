use fraudwatch_warehouse::{Connector, CustomerRiskFilter, WarehouseError};

use super::{format_count, format_percent, PageContext, PageReport, Section};

pub fn build<C: Connector>(
    context: &PageContext<'_, C>,
    filter: &CustomerRiskFilter,
) -> Result<PageReport, WarehouseError> {
    let mut report = PageReport::new("Customer Risk Analysis");
    let query = context.catalog().customer_risk(filter)?;

    let Some(outcome) = context.primary(
        &mut report,
        "Detailed Risk Analysis",
        &query,
        "No data available for selected filters",
    )?
    else {
        return Ok(report);
    };
    let data = &outcome.data;

    report.tile("Total Customers", format_count(data.sum("CUSTOMER_COUNT")));
    report.tile(
        "Total Transactions",
        format_count(data.sum("TOTAL_TRANSACTIONS")),
    );
    report.tile(
        "Flagged Transactions",
        format_count(data.sum("FLAGGED_TRANSACTIONS")),
    );
    report.tile(
        "Avg Fraud Rate",
        format_percent(data.mean("FRAUD_RATE_PCT").unwrap_or(0.0)),
    );

    report.push(Section::derived(
        "Risk Category Distribution",
        &outcome,
        |data| {
            Some(data.group_sum(
                "RISK_CATEGORY",
                &["CUSTOMER_COUNT", "TOTAL_TRANSACTIONS", "FLAGGED_TRANSACTIONS"],
            ))
        },
    ));
    report.push(Section::from_outcome("Detailed Risk Analysis", &outcome));

    Ok(report)
}
