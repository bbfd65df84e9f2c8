use fraudwatch_warehouse::tabular::is_truthy;
use fraudwatch_warehouse::{Connector, TransactionFilter, WarehouseError};

use super::{format_count, format_currency, PageContext, PageReport, Section};

pub fn build<C: Connector>(
    context: &PageContext<'_, C>,
    filter: &TransactionFilter,
) -> Result<PageReport, WarehouseError> {
    let mut report = PageReport::new("Transaction Analysis");
    let query = context.catalog().transactions(filter)?;

    let Some(outcome) = context.primary(
        &mut report,
        "Transaction Details",
        &query,
        "No transactions found with the selected filters",
    )?
    else {
        return Ok(report);
    };
    let data = &outcome.data;

    report.tile("Total Transactions", format_count(data.row_count() as f64));
    report.tile(
        "Flagged",
        format_count(data.count_where("HAS_ALERT", is_truthy) as f64),
    );
    report.tile("Total Value", format_currency(data.sum("AMOUNT")));
    report.tile(
        "Avg Amount",
        format_currency(data.mean("AMOUNT").unwrap_or(0.0)),
    );

    report.push(Section::derived(
        "Transactions by Account Type",
        &outcome,
        |data| Some(data.group_sum("ACCOUNT_TYPE", &["AMOUNT"])),
    ));
    report.push(Section::from_outcome("Transaction Details", &outcome));

    Ok(report)
}
