use fraudwatch_warehouse::tabular::as_f64;
use fraudwatch_warehouse::{Connector, ReportView, WarehouseError};

use super::{format_count, format_currency, format_percent, PageContext, PageReport, Section};

/// Fraud rate (percent) above which a location counts as high risk.
const HIGH_RISK_FRAUD_RATE: f64 = 5.0;

/// Locations shown in the heatmap section.
const HEATMAP_LOCATIONS: usize = 15;

pub fn build<C: Connector>(context: &PageContext<'_, C>) -> Result<PageReport, WarehouseError> {
    let mut report = PageReport::new("Geographic Risk Analysis");

    let Some(outcome) = context.primary(
        &mut report,
        "Location Performance Details",
        &context.catalog().view(ReportView::GeographicRisk),
        "No geographic data available",
    )?
    else {
        return Ok(report);
    };
    let data = &outcome.data;

    report.tile("Total Locations", format_count(data.row_count() as f64));
    report.tile(
        "High Risk Locations",
        format_count(data.count_where("FRAUD_RATE", |value| {
            as_f64(value).is_some_and(|rate| rate > HIGH_RISK_FRAUD_RATE)
        }) as f64),
    );
    report.tile(
        "Total Transaction Value",
        format_currency(data.sum("TOTAL_VALUE")),
    );
    report.tile(
        "Avg Fraud Rate",
        format_percent(data.mean("FRAUD_RATE").unwrap_or(0.0)),
    );

    report.push(Section::derived(
        "Geographic Fraud Heatmap",
        &outcome,
        |data| Some(data.head(HEATMAP_LOCATIONS)),
    ));
    report.push(Section::derived("Region Distribution", &outcome, |data| {
        Some(data.group_sum("REGION", &["TRANSACTION_COUNT", "FLAGGED_COUNT"]))
    }));
    report.push(Section::from_outcome(
        "Location Performance Details",
        &outcome,
    ));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::{catalog, service, table, FixtureConnector};
    use crate::pages::SectionBody;
    use serde_json::json;

    #[test]
    fn locations_above_five_percent_are_high_risk() {
        let rows = (0..20)
            .map(|index| {
                vec![
                    json!(format!("City {index}")),
                    json!(if index % 2 == 0 { "North" } else { "South" }),
                    json!(100),
                    json!(f64::from(index)),
                    json!(1000.0),
                    json!(index),
                ]
            })
            .collect();
        let connector = FixtureConnector::new(vec![(
            "VW_TABLEAU_GEOGRAPHIC_RISK",
            table(
                &[
                    "LOCATION",
                    "REGION",
                    "TRANSACTION_COUNT",
                    "FRAUD_RATE",
                    "TOTAL_VALUE",
                    "FLAGGED_COUNT",
                ],
                rows,
            ),
        )]);
        let service = service(&connector);
        let catalog = catalog();

        let report = build(&PageContext::new(&service, &catalog)).expect("page");

        assert_eq!(report.tiles[0].value, "20");
        assert_eq!(report.tiles[1].value, "14");
        assert_eq!(report.tiles[2].value, "₹20,000");
        assert_eq!(report.tiles[3].value, "9.50%");

        let SectionBody::Table { data: heatmap, .. } = &report.sections[0].body else {
            panic!("expected heatmap");
        };
        assert_eq!(heatmap.row_count(), 15);

        let SectionBody::Table { data: regions, .. } = &report.sections[1].body else {
            panic!("expected regions");
        };
        assert_eq!(regions.row_count(), 2);
        assert_eq!(regions.rows[0][2], json!(1000.0));
    }
}
