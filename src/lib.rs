//! # Fiscal Summary
//!
//! A library for turning invoice ledger aggregates into fiscal-period summaries:
//! dense month-by-month series, year-over-year comparisons and per-client
//! variance tables, formatted for display.
//!
//! ## Core Concepts
//!
//! - **Fiscal Year**: A twelve month span starting on the first of a configurable month (October by default)
//! - **Year-to-Date**: The current fiscal year truncated at today, compared against the same span a year earlier
//! - **Scaffolding**: Sparse per-month totals are placed onto a dense month grid, with zeros for quiet months
//! - **Comparison Table**: Current and previous totals outer-joined by client, with a trailing totals row
//! - **Undefined Percentages**: A zero baseline yields no percentage at all, rendered as `-`
//!
//! ## Example
//!
//! ```rust,ignore
//! use fiscal_summary::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let ledger = MemoryLedger::new(vec![InvoiceLineItem {
//!     client_name: "Acme".to_string(),
//!     state: InvoiceState::Paid,
//!     issue_date: NaiveDate::from_ymd_opt(2024, 10, 3).unwrap(),
//!     due_date: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
//!     amount: dec!(1000),
//!     tax_amount: dec!(200),
//! }]);
//!
//! let summary = FinancialSummary::cached(ledger, &ReportSettings::default())?;
//! let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
//!
//! let overview = summary.invoicing_overview(today)?;
//! println!("{}: {}", overview.metric.label, overview.metric.value);
//!
//! let revenue = summary.revenue_comparison(today)?;
//! for row in &revenue.client_table.rows {
//!     println!("{}", row.join(" | "));
//! }
//! ```

pub mod cache;
pub mod calendar;
pub mod comparison;
pub mod config;
pub mod error;
pub mod format;
pub mod ingestion;
pub mod ledger;
pub mod report;
pub mod scaffold;
pub mod schema;
pub mod utils;
pub mod variance;

pub use cache::CachedLedger;
pub use calendar::{month_buckets, previous_fiscal_year, FiscalCalendar, FiscalYear, MonthBucket};
pub use comparison::{
    build as build_comparison, ComparisonColumn, ComparisonRow, ComparisonTable, FormattedTable,
    TableLabels, TOTAL_KEY,
};
pub use config::{ConnectionConfig, ReportSettings};
pub use error::{ReportError, Result};
pub use format::{format_number, ColumnRole, FormatStyle, NegativeStyle, UNDEFINED_PERCENT};
pub use ingestion::*;
pub use ledger::{DateBasis, LedgerQueryService, MemoryLedger, PeriodQuery};
pub use report::{
    format_monthly, CashflowReport, FinancialSummary, InvoicingOverview, MetricCard, RevenueReport,
};
pub use scaffold::{chart_series, fill_months, scaffold_range, series_total, MonthlyAmount};
pub use schema::*;
pub use utils::*;
pub use variance::{difference, percent_difference, Direction, Variance};

use chrono::NaiveDate;

/// Revenue comparison for `today` with default settings and no caching.
pub fn revenue_report<L: LedgerQueryService>(ledger: L, today: NaiveDate) -> Result<RevenueReport> {
    FinancialSummary::with_defaults(ledger).revenue_comparison(today)
}

/// Invoicing overview for `today` with default settings and no caching.
pub fn invoicing_report<L: LedgerQueryService>(
    ledger: L,
    today: NaiveDate,
) -> Result<InvoicingOverview> {
    FinancialSummary::with_defaults(ledger).invoicing_overview(today)
}

/// Cashflow for `today` with default settings and no caching.
pub fn cashflow_report<L: LedgerQueryService>(ledger: L, today: NaiveDate) -> Result<CashflowReport> {
    FinancialSummary::with_defaults(ledger).cashflow(today)
}
