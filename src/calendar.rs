//! Fiscal calendar arithmetic.
//!
//! A fiscal year runs from the first day of a configurable start month (October
//! by default) to the day before the same month a year later. All functions
//! here are pure; the only failure is a date chrono cannot represent.

use crate::error::{ReportError, Result};
use crate::utils::{
    first_of_month, month_start, next_month_start, shift_years_back, validate_fiscal_start_month,
};
use chrono::{Datelike, Months, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Inclusive date range of one fiscal year, either complete or cut at an as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FiscalYear {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FiscalYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Human readable range, e.g. `01 Oct 2024 - 30 Sep 2025`.
    pub fn caption(&self) -> String {
        format!(
            "{} - {}",
            self.start_date.format("%d %b %Y"),
            self.end_date.format("%d %b %Y")
        )
    }

    pub fn month_buckets(&self) -> Result<Vec<MonthBucket>> {
        month_buckets(self.start_date, self.end_date)
    }
}

/// One calendar month slot of a scaffolded series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MonthBucket {
    /// Always the first day of the month.
    pub month_start: NaiveDate,
    /// Abbreviated month and year, e.g. `Oct-2024`.
    pub label: String,
}

impl MonthBucket {
    pub fn for_date(date: NaiveDate) -> Self {
        let month_start = month_start(date);
        Self {
            month_start,
            label: month_start.format("%b-%Y").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCalendar {
    start_month: u32,
}

impl FiscalCalendar {
    pub const DEFAULT_START_MONTH: u32 = 10;

    pub fn new(start_month: u32) -> Result<Self> {
        validate_fiscal_start_month(start_month)?;
        Ok(Self { start_month })
    }

    pub fn start_month(&self) -> u32 {
        self.start_month
    }

    /// First day of the fiscal year that `reference` belongs to.
    pub fn fiscal_year_start(&self, reference: NaiveDate) -> Result<NaiveDate> {
        let year = if reference.month() >= self.start_month {
            reference.year()
        } else {
            reference.year() - 1
        };
        first_of_month(year, self.start_month)
    }

    /// The complete fiscal year containing `reference`.
    pub fn current_fiscal_year(&self, reference: NaiveDate) -> Result<FiscalYear> {
        let start_date = self.fiscal_year_start(reference)?;
        Ok(FiscalYear {
            start_date,
            end_date: full_year_end(start_date)?,
        })
    }

    /// The fiscal year containing `reference`, ending on `reference` itself.
    pub fn fiscal_year_to_date(&self, reference: NaiveDate) -> Result<FiscalYear> {
        Ok(FiscalYear {
            start_date: self.fiscal_year_start(reference)?,
            end_date: reference,
        })
    }
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self {
            start_month: Self::DEFAULT_START_MONTH,
        }
    }
}

/// The same range one calendar year earlier.
///
/// A complete fiscal year maps to the complete year before it, so its end is
/// recomputed from the shifted start and a 29 February end survives. Any other
/// range is a year-to-date cut and keeps its month and day: one ending
/// 19 Oct 2026 maps to one ending 19 Oct 2025.
pub fn previous_fiscal_year(fy: &FiscalYear) -> Result<FiscalYear> {
    let start_date = shift_years_back(fy.start_date, 1)?;
    let end_date = if fy.end_date == full_year_end(fy.start_date)? {
        full_year_end(start_date)?
    } else {
        shift_years_back(fy.end_date, 1)?
    };

    Ok(FiscalYear {
        start_date,
        end_date,
    })
}

/// Day before the same date twelve months later.
fn full_year_end(start_date: NaiveDate) -> Result<NaiveDate> {
    start_date
        .checked_add_months(Months::new(12))
        .and_then(|next_start| next_start.pred_opt())
        .ok_or_else(|| {
            ReportError::DateError(format!("Fiscal year starting {} has no end", start_date))
        })
}

/// Every calendar month from the month of `start` through the month of `end`.
///
/// The day of month is ignored. An inverted range (`end < start`) yields no
/// buckets rather than an error.
pub fn month_buckets(start: NaiveDate, end: NaiveDate) -> Result<Vec<MonthBucket>> {
    if end < start {
        return Ok(Vec::new());
    }

    let last = month_start(end);
    let mut current = month_start(start);
    let mut buckets = Vec::new();

    while current <= last {
        buckets.push(MonthBucket::for_date(current));
        current = next_month_start(current)?;
    }

    Ok(buckets)
}
