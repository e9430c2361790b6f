use crate::error::{ReportError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::Decimal;

/// `a + b`, or [`ReportError::AmountOverflow`] when the sum does not fit a `Decimal`.
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| ReportError::AmountOverflow(format!("{} + {}", a, b)))
}

pub fn checked_total(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, checked_add)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ReportError::DateError(format!("{:04}-{:02} is not a valid month", year, month))
    })
}

pub fn next_month_start(date: NaiveDate) -> Result<NaiveDate> {
    month_start(date)
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ReportError::DateError(format!("No month follows {}", date)))
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let start = first_of_month(year, month)?;
    next_month_start(start)?
        .pred_opt()
        .ok_or_else(|| ReportError::DateError(format!("No last day for {}", start)))
}

/// Moves `date` back by whole calendar years, keeping month and day.
/// February 29 lands on February 28 in a non-leap year.
pub fn shift_years_back(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    date.checked_sub_months(Months::new(years * 12))
        .ok_or_else(|| ReportError::DateError(format!("Cannot shift {} back {} years", date, years)))
}

/// Number of month boundaries between the months of `start` and `end`.
/// Negative when `end` falls in an earlier month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn validate_fiscal_start_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(ReportError::InvalidFiscalStartMonth(month));
    }
    Ok(())
}

/// Parses a month key as produced by ledger aggregate queries.
///
/// Accepts `YYYY-MM` (the grouped-month form) and full `YYYY-MM-DD` dates; the
/// result is always normalised to the first day of that month.
pub fn parse_month_key(key: &str) -> Result<NaiveDate> {
    let trimmed = key.trim();
    let date = match trimmed.len() {
        7 => NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d"),
        _ => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"),
    }
    .map_err(|_| {
        ReportError::DateError(format!(
            "Invalid month key: {}. Expected YYYY-MM or YYYY-MM-DD",
            key
        ))
    })?;

    Ok(month_start(date))
}
