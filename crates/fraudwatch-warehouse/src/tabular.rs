//! Tabular query results.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

/// Column metadata for query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column data type as reported by the warehouse.
    #[serde(rename = "type")]
    pub r#type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
        }
    }
}

/// Named columns and the rows aligned to them.
///
/// Results handed out by the query service are shared snapshots; every
/// derivation below builds a new value instead of touching `self`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularResult {
    /// Column definitions.
    pub columns: Vec<Column>,
    /// Row data as JSON values.
    pub rows: Vec<Vec<Value>>,
    /// Whether rows were cut by the `max_rows` guardrail.
    pub truncated: bool,
}

impl TabularResult {
    /// Zero columns and zero rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            truncated: false,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows to show, whatever the reason.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// Values of one column, top to bottom.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let index = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|index| row.get(index)))
    }

    /// Sum of the numeric values of a column; non-numeric cells are skipped.
    pub fn sum(&self, name: &str) -> f64 {
        self.values(name).filter_map(as_f64).sum()
    }

    /// Mean of the numeric values of a column.
    pub fn mean(&self, name: &str) -> Option<f64> {
        let (total, count) = self
            .values(name)
            .filter_map(as_f64)
            .fold((0.0, 0_usize), |(total, count), value| (total + value, count + 1));
        (count > 0).then(|| total / count as f64)
    }

    /// Number of rows whose cell in `name` satisfies `predicate`.
    pub fn count_where(&self, name: &str, predicate: impl Fn(&Value) -> bool) -> usize {
        self.values(name).filter(|value| predicate(value)).count()
    }

    /// Value of `column` on the row where `by` is largest.
    pub fn value_at_max(&self, by: &str, column: &str) -> Option<&Value> {
        let by_index = self.column_index(by)?;
        let column_index = self.column_index(column)?;
        self.rows
            .iter()
            .filter_map(|row| Some((as_f64(row.get(by_index)?)?, row)))
            .fold(None::<(f64, &Vec<Value>)>, |best, (value, row)| match best {
                Some((best_value, _)) if best_value >= value => best,
                _ => Some((value, row)),
            })
            .and_then(|(_, row)| row.get(column_index))
    }

    /// Map of `key` column text to `value` column, first occurrence wins.
    pub fn lookup(&self, key: &str, value: &str) -> BTreeMap<String, Value> {
        let mut output = BTreeMap::new();
        let (Some(key_index), Some(value_index)) =
            (self.column_index(key), self.column_index(value))
        else {
            return output;
        };
        for row in &self.rows {
            if let (Some(key), Some(value)) = (row.get(key_index), row.get(value_index)) {
                output
                    .entry(display_value(key))
                    .or_insert_with(|| value.clone());
            }
        }
        output
    }

    /// Count rows per distinct value of `key`, most frequent first.
    pub fn value_counts(&self, key: &str, label: &str) -> TabularResult {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for value in self.values(key) {
            *counts.entry(display_value(value)).or_default() += 1;
        }
        let mut counts = counts.into_iter().collect::<Vec<_>>();
        counts.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));

        TabularResult::new(
            vec![Column::new(label, "VARCHAR"), Column::new("COUNT", "BIGINT")],
            counts
                .into_iter()
                .map(|(name, count)| vec![Value::String(name), Value::Number(Number::from(count))])
                .collect(),
        )
    }

    /// Sum of `name` over rows whose `by` cell satisfies `predicate`.
    pub fn sum_where(&self, name: &str, by: &str, predicate: impl Fn(&Value) -> bool) -> f64 {
        self.filtered(name, by, predicate).into_iter().sum()
    }

    /// Mean of `name` over rows whose `by` cell satisfies `predicate`.
    pub fn mean_where(
        &self,
        name: &str,
        by: &str,
        predicate: impl Fn(&Value) -> bool,
    ) -> Option<f64> {
        let (total, count) = self
            .filtered(name, by, predicate)
            .into_iter()
            .fold((0.0, 0_usize), |(total, count), value| (total + value, count + 1));
        (count > 0).then(|| total / count as f64)
    }

    fn filtered(&self, name: &str, by: &str, predicate: impl Fn(&Value) -> bool) -> Vec<f64> {
        let (Some(value_index), Some(by_index)) = (self.column_index(name), self.column_index(by))
        else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter(|row| row.get(by_index).is_some_and(|cell| predicate(cell)))
            .filter_map(|row| row.get(value_index).and_then(as_f64))
            .collect()
    }

    /// Group rows by `key`: row count plus the sum of each of `measures`.
    pub fn group_sum(&self, key: &str, measures: &[&str]) -> TabularResult {
        let Some(key_index) = self.column_index(key) else {
            return TabularResult::empty();
        };
        let measure_indexes = measures
            .iter()
            .map(|measure| self.column_index(measure))
            .collect::<Vec<_>>();

        let mut groups: BTreeMap<String, (u64, Vec<f64>)> = BTreeMap::new();
        for row in &self.rows {
            let Some(group) = row.get(key_index) else {
                continue;
            };
            let (count, totals) = groups
                .entry(display_value(group))
                .or_insert_with(|| (0, vec![0.0; measures.len()]));
            *count += 1;
            for (slot, index) in totals.iter_mut().zip(&measure_indexes) {
                if let Some(value) = index.and_then(|index| row.get(index)).and_then(as_f64) {
                    *slot += value;
                }
            }
        }

        let mut columns = vec![
            Column::new(self.columns[key_index].name.clone(), "VARCHAR"),
            Column::new("COUNT", "BIGINT"),
        ];
        columns.extend(
            measures
                .iter()
                .map(|measure| Column::new(measure.to_ascii_uppercase(), "DOUBLE")),
        );
        let rows = groups
            .into_iter()
            .map(|(group, (count, totals))| {
                let mut row = vec![Value::String(group), Value::Number(Number::from(count))];
                row.extend(totals.into_iter().map(number_from_f64));
                row
            })
            .collect();
        TabularResult::new(columns, rows)
    }

    /// First `count` rows.
    pub fn head(&self, count: usize) -> TabularResult {
        TabularResult {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(count).cloned().collect(),
            truncated: self.truncated || self.rows.len() > count,
        }
    }
}

/// Numeric view of a cell. Numeric strings (decimals) are accepted.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Truthiness of a cell: booleans, non-zero numbers and `"true"`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => text.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Text shown for a cell in tables and group labels.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::String(text) => text.clone(),
        _ => value.to_string(),
    }
}

/// Convert an f64 to a JSON number, returning Null for NaN/Inf.
pub(crate) fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alerts() -> TabularResult {
        TabularResult::new(
            vec![
                Column::new("ALERT_SEVERITY", "VARCHAR"),
                Column::new("TRANSACTION_AMOUNT", "DOUBLE"),
                Column::new("HAS_ALERT", "BOOLEAN"),
            ],
            vec![
                vec![json!("Critical"), json!(50000.0), json!(true)],
                vec![json!("High"), json!(40000.0), json!(false)],
                vec![json!("Critical"), json!("10000.5"), json!(true)],
            ],
        )
    }

    #[test]
    fn aggregates_columns_case_insensitively() {
        let table = alerts();
        assert_eq!(table.sum("transaction_amount"), 100000.5);
        assert_eq!(table.count_where("HAS_ALERT", is_truthy), 2);
        assert!(table.mean("missing").is_none());
    }

    #[test]
    fn value_counts_orders_by_frequency() {
        let counts = alerts().value_counts("ALERT_SEVERITY", "SEVERITY");
        assert_eq!(counts.columns[0].name, "SEVERITY");
        assert_eq!(counts.rows[0], vec![json!("Critical"), json!(2)]);
        assert_eq!(counts.rows[1], vec![json!("High"), json!(1)]);
    }

    #[test]
    fn group_sum_totals_each_measure() {
        let grouped = alerts().group_sum("ALERT_SEVERITY", &["TRANSACTION_AMOUNT"]);
        assert_eq!(grouped.row_count(), 2);
        assert_eq!(grouped.rows[0][1], json!(2));
        assert_eq!(grouped.rows[0][2], json!(60000.5));
    }

    #[test]
    fn filtered_aggregates_respect_the_predicate() {
        let table = alerts();
        assert_eq!(
            table.sum_where("TRANSACTION_AMOUNT", "HAS_ALERT", is_truthy),
            60000.5
        );
        assert_eq!(
            table.mean_where("TRANSACTION_AMOUNT", "ALERT_SEVERITY", |value| value == "High"),
            Some(40000.0)
        );
        assert!(table
            .mean_where("TRANSACTION_AMOUNT", "ALERT_SEVERITY", |value| value == "Low")
            .is_none());
    }

    #[test]
    fn value_at_max_picks_the_largest_row() {
        let table = alerts();
        assert_eq!(
            table.value_at_max("TRANSACTION_AMOUNT", "ALERT_SEVERITY"),
            Some(&json!("Critical"))
        );
    }

    #[test]
    fn empty_result_has_no_shape() {
        let empty = TabularResult::empty();
        assert_eq!(empty.column_count(), 0);
        assert_eq!(empty.row_count(), 0);
        assert!(empty.is_empty());
    }
}
