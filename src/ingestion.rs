//! Conversion of untyped backend result rows into [`AggregateRow`]s.
//!
//! Query backends hand back JSON-like records. They are converted once, here,
//! so the rest of the pipeline only ever sees typed rows.

use crate::error::{ReportError, Result};
use crate::schema::{AggregateRow, DayRow, EntityRow, MonthRow};
use crate::utils::parse_month_key;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

pub type RawRow = Map<String, Value>;

/// Field holding the grouped month in monthly aggregate results.
pub const MONTH_FIELD: &str = "month";
/// Field holding the grouped day in daily aggregate results.
pub const DAY_FIELD: &str = "due_date";
/// Field holding the counterparty name in entity aggregate results.
pub const ENTITY_FIELD: &str = "client_name";
/// Field holding the summed amount.
pub const AMOUNT_FIELD: &str = "total_amount";

pub fn parse_monthly_rows(raw: &[RawRow], month_field: &str, amount_field: &str) -> Result<Vec<MonthRow>> {
    parse_rows(raw, month_field, amount_field, |value| {
        let text = value
            .as_str()
            .ok_or_else(|| ReportError::query(format!("'{}' is not a string: {}", month_field, value)))?;
        parse_month_key(text).map_err(|e| ReportError::query(e.to_string()))
    })
}

pub fn parse_daily_rows(raw: &[RawRow], date_field: &str, amount_field: &str) -> Result<Vec<DayRow>> {
    parse_rows(raw, date_field, amount_field, |value| {
        let text = value
            .as_str()
            .ok_or_else(|| ReportError::query(format!("'{}' is not a string: {}", date_field, value)))?;
        let date_part = text.get(..10).unwrap_or(text);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|_| ReportError::query(format!("Invalid date in '{}': {}", date_field, text)))
    })
}

pub fn parse_entity_rows(raw: &[RawRow], key_field: &str, amount_field: &str) -> Result<Vec<EntityRow>> {
    parse_rows(raw, key_field, amount_field, |value| match value {
        Value::String(name) => Ok(name.clone()),
        other => Err(ReportError::query(format!(
            "'{}' is not a string: {}",
            key_field, other
        ))),
    })
}

fn parse_rows<K>(
    raw: &[RawRow],
    key_field: &str,
    amount_field: &str,
    parse_key: impl Fn(&Value) -> Result<K>,
) -> Result<Vec<AggregateRow<K>>> {
    raw.iter()
        .enumerate()
        .map(|(idx, row)| {
            let key_value = row.get(key_field).ok_or_else(|| {
                ReportError::query(format!("Row #{} has no '{}' field", idx, key_field))
            })?;
            let key = parse_key(key_value)?;
            let amount = match row.get(amount_field) {
                Some(value) => parse_amount(value).map_err(|e| {
                    ReportError::query(format!("Row #{} field '{}': {}", idx, amount_field, e))
                })?,
                None => Decimal::ZERO,
            };
            Ok(AggregateRow::new(key, amount))
        })
        .collect()
}

/// Reads an amount from a JSON number, numeric string or `null` (zero).
pub fn parse_amount(value: &Value) -> Result<Decimal> {
    match value {
        Value::Null => Ok(Decimal::ZERO),
        Value::Number(number) => decimal_from_text(&number.to_string()),
        Value::String(text) => decimal_from_text(text.trim()),
        other => Err(ReportError::query(format!("Not an amount: {}", other))),
    }
}

fn decimal_from_text(text: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| ReportError::query(format!("Not an amount: {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw(values: Vec<Value>) -> Vec<RawRow> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_monthly_rows() {
        let rows = raw(vec![
            json!({"month": "2024-10", "total_amount": 1000.5}),
            json!({"month": "2024-12", "total_amount": "500"}),
            json!({"month": "2025-01", "total_amount": null}),
        ]);

        let parsed = parse_monthly_rows(&rows, MONTH_FIELD, AMOUNT_FIELD).unwrap();
        assert_eq!(
            parsed,
            vec![
                MonthRow::new(ymd(2024, 10, 1), dec!(1000.5)),
                MonthRow::new(ymd(2024, 12, 1), dec!(500)),
                MonthRow::new(ymd(2025, 1, 1), Decimal::ZERO),
            ]
        );
    }

    #[test]
    fn test_parse_entity_rows_with_custom_fields() {
        let rows = raw(vec![json!({"client_name": "Acme", "revenue_current": 200})]);
        let parsed = parse_entity_rows(&rows, ENTITY_FIELD, "revenue_current").unwrap();
        assert_eq!(parsed, vec![EntityRow::new("Acme".to_string(), dec!(200))]);
    }

    #[test]
    fn test_parse_daily_rows_accepts_timestamps() {
        let rows = raw(vec![json!({"due_date": "2024-11-02T00:00:00Z", "total_amount": 1200})]);
        let parsed = parse_daily_rows(&rows, DAY_FIELD, AMOUNT_FIELD).unwrap();
        assert_eq!(parsed, vec![DayRow::new(ymd(2024, 11, 2), dec!(1200))]);
    }

    #[test]
    fn test_scientific_amount() {
        assert_eq!(parse_amount(&json!(1.5e3)).unwrap(), dec!(1500));
    }

    #[test]
    fn test_malformed_rows_are_query_failures() {
        let missing_key = raw(vec![json!({"total_amount": 1})]);
        assert!(matches!(
            parse_monthly_rows(&missing_key, MONTH_FIELD, AMOUNT_FIELD),
            Err(ReportError::QueryFailure(_))
        ));

        let bad_month = raw(vec![json!({"month": "Oct-2024", "total_amount": 1})]);
        assert!(matches!(
            parse_monthly_rows(&bad_month, MONTH_FIELD, AMOUNT_FIELD),
            Err(ReportError::QueryFailure(_))
        ));

        let bad_amount = raw(vec![json!({"client_name": "Acme", "total_amount": "lots"})]);
        assert!(matches!(
            parse_entity_rows(&bad_amount, ENTITY_FIELD, AMOUNT_FIELD),
            Err(ReportError::QueryFailure(_))
        ));
    }
}
