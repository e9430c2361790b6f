//! Gap-filling of sparse monthly aggregates onto a fixed month grid.

use crate::calendar::{month_buckets, MonthBucket};
use crate::error::Result;
use crate::schema::MonthRow;
use crate::utils::{checked_add, checked_total, month_start};
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A month slot together with its (possibly implied zero) amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyAmount {
    pub bucket: MonthBucket,
    pub amount: Decimal,
}

/// Left-joins `rows` onto `buckets`.
///
/// Every bucket appears exactly once, in the order given, with the amount of the
/// row for the same year and month or zero when there is none. Only year and
/// month are compared, on rows and buckets alike. Several rows for one month are
/// summed; a sum beyond the `Decimal` range is an error. Rows for months outside
/// the buckets are dropped.
pub fn fill_months(buckets: &[MonthBucket], rows: &[MonthRow]) -> Result<Vec<MonthlyAmount>> {
    let mut grid: BTreeMap<NaiveDate, Decimal> = buckets
        .iter()
        .map(|bucket| (month_start(bucket.month_start), Decimal::ZERO))
        .collect();

    let mut seen: HashSet<NaiveDate> = HashSet::new();
    let mut dropped = 0usize;

    for row in rows {
        let key = month_start(row.key);
        match grid.get_mut(&key) {
            Some(slot) => {
                if !seen.insert(key) {
                    warn!(
                        "Multiple aggregate rows for {}; summing them",
                        key.format("%Y-%m")
                    );
                }
                *slot = checked_add(*slot, row.amount)?;
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("{} rows fell outside the month grid and were dropped", dropped);
    }

    Ok(buckets
        .iter()
        .map(|bucket| MonthlyAmount {
            bucket: bucket.clone(),
            amount: grid
                .get(&month_start(bucket.month_start))
                .copied()
                .unwrap_or(Decimal::ZERO),
        })
        .collect())
}

/// Builds the month grid for `start..=end` and fills it from `rows`.
pub fn scaffold_range(start: NaiveDate, end: NaiveDate, rows: &[MonthRow]) -> Result<Vec<MonthlyAmount>> {
    let buckets = month_buckets(start, end)?;
    fill_months(&buckets, rows)
}

pub fn series_total(series: &[MonthlyAmount]) -> Result<Decimal> {
    checked_total(series.iter().map(|point| point.amount))
}

/// `(label, amount)` pairs in month order, ready for a bar chart.
pub fn chart_series(series: &[MonthlyAmount]) -> Vec<(String, Decimal)> {
    series
        .iter()
        .map(|point| (point.bucket.label.clone(), point.amount))
        .collect()
}
