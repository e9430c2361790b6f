//! The three summary views: invoicing overview, revenue comparison and cashflow.
//!
//! Each view is one synchronous pass: derive the periods, query the ledger,
//! scaffold or join, compute variances, format. Any ledger failure, or a sum
//! too large for a `Decimal`, aborts the whole view; nothing partial is returned.

use crate::cache::CachedLedger;
use crate::calendar::{previous_fiscal_year, FiscalCalendar, FiscalYear};
use crate::comparison::{self, ComparisonTable, FormattedTable, TableLabels};
use crate::config::ReportSettings;
use crate::error::Result;
use crate::format::FormatStyle;
use crate::ledger::{LedgerQueryService, PeriodQuery};
use crate::scaffold::{fill_months, scaffold_range, series_total, MonthlyAmount};
use crate::schema::DayRow;
use crate::utils::checked_total;
use crate::variance::Variance;
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A captioned headline figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
}

/// Invoiced amounts for the whole current fiscal year, month by month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InvoicingOverview {
    pub fiscal_year: FiscalYear,
    pub monthly: Vec<MonthlyAmount>,
    pub total_invoiced: Decimal,
    pub metric: MetricCard,
}

/// Fiscal-year-to-date revenue against the same span a year earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RevenueReport {
    pub current_period: FiscalYear,
    pub previous_period: FiscalYear,
    /// Current period only, every month from the fiscal start to today.
    pub monthly: Vec<MonthlyAmount>,
    pub current_total: Decimal,
    pub previous_total: Decimal,
    pub change: Variance,
    pub metrics: Vec<MetricCard>,
    pub clients: ComparisonTable,
    pub client_table: FormattedTable,
}

/// Amounts falling due from the start of the fiscal year onwards, tax included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CashflowReport {
    pub start_date: NaiveDate,
    /// Days with something due, in date order.
    pub daily: Vec<DayRow>,
    pub monthly: Vec<MonthlyAmount>,
    /// Single-row pivot: month labels as headers, formatted amounts as cells.
    pub monthly_table: FormattedTable,
}

/// `(label, formatted amount)` pairs in month order.
pub fn format_monthly(series: &[MonthlyAmount], style: &FormatStyle) -> Vec<(String, String)> {
    series
        .iter()
        .map(|point| (point.bucket.label.clone(), style.currency(point.amount)))
        .collect()
}

pub struct FinancialSummary<L> {
    ledger: L,
    calendar: FiscalCalendar,
    style: FormatStyle,
    labels: TableLabels,
}

impl<L> FinancialSummary<L>
where
    L: LedgerQueryService,
{
    pub fn new(ledger: L, settings: &ReportSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            ledger,
            calendar: settings.calendar()?,
            style: settings.format.clone(),
            labels: settings.labels.clone(),
        })
    }

    pub fn with_defaults(ledger: L) -> Self {
        Self {
            ledger,
            calendar: FiscalCalendar::default(),
            style: FormatStyle::default(),
            labels: TableLabels::default(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn style(&self) -> &FormatStyle {
        &self.style
    }

    pub fn invoicing_overview(&self, today: NaiveDate) -> Result<InvoicingOverview> {
        let fiscal_year = self.calendar.current_fiscal_year(today)?;
        info!("Building invoicing overview for {}", fiscal_year.caption());

        let query = PeriodQuery::issued_between(fiscal_year.start_date, fiscal_year.end_date);
        let rows = self.ledger.monthly_totals(&query)?;
        let monthly = fill_months(&fiscal_year.month_buckets()?, &rows)?;
        let total_invoiced = series_total(&monthly)?;

        Ok(InvoicingOverview {
            metric: MetricCard {
                label: format!("Total Invoiced ({})", fiscal_year.caption()),
                value: self.style.currency(total_invoiced),
            },
            fiscal_year,
            monthly,
            total_invoiced,
        })
    }

    pub fn revenue_comparison(&self, today: NaiveDate) -> Result<RevenueReport> {
        let current_period = self.calendar.fiscal_year_to_date(today)?;
        let previous_period = previous_fiscal_year(&current_period)?;
        info!(
            "Building revenue comparison: {} against {}",
            current_period.caption(),
            previous_period.caption()
        );

        let current_query =
            PeriodQuery::issued_between(current_period.start_date, current_period.end_date);
        let previous_query =
            PeriodQuery::issued_between(previous_period.start_date, previous_period.end_date);

        let current_rows = self.ledger.monthly_totals(&current_query)?;
        let previous_rows = self.ledger.monthly_totals(&previous_query)?;
        let current_clients = self.ledger.entity_totals(&current_query)?;
        let previous_clients = self.ledger.entity_totals(&previous_query)?;

        let monthly = fill_months(&current_period.month_buckets()?, &current_rows)?;
        let current_total = series_total(&monthly)?;
        let previous_total = checked_total(previous_rows.iter().map(|row| row.amount))?;
        let change = Variance::between(current_total, previous_total)?;

        let clients = comparison::build(&current_clients, &previous_clients)?;
        let client_table = clients.format(&self.labels, &self.style);
        debug!(
            "Revenue comparison has {} client rows",
            clients.entity_rows().len()
        );

        let metrics = vec![
            MetricCard {
                label: format!("Current ({})", short_caption(&current_period)),
                value: self.style.currency(current_total),
            },
            MetricCard {
                label: format!("Previous ({})", short_caption(&previous_period)),
                value: self.style.currency(previous_total),
            },
            MetricCard {
                label: "YOY % Change".to_string(),
                value: self.style.percent_or_dash(change.percent),
            },
        ];

        Ok(RevenueReport {
            current_period,
            previous_period,
            monthly,
            current_total,
            previous_total,
            change,
            metrics,
            clients,
            client_table,
        })
    }

    pub fn cashflow(&self, today: NaiveDate) -> Result<CashflowReport> {
        let start_date = self.calendar.fiscal_year_start(today)?;
        info!("Building cashflow from {}", start_date);

        let query = PeriodQuery::due_from(start_date);
        let mut daily = self.ledger.daily_totals(&query)?;
        daily.sort_by_key(|row| row.key);

        let month_rows = self.ledger.monthly_totals(&query)?;
        let last_month = month_rows
            .iter()
            .map(|row| row.key)
            .chain(daily.last().map(|row| row.key))
            .fold(today, NaiveDate::max);

        let monthly = scaffold_range(start_date, last_month, &month_rows)?;
        let monthly_table = FormattedTable {
            headers: monthly.iter().map(|p| p.bucket.label.clone()).collect(),
            rows: vec![monthly
                .iter()
                .map(|p| self.style.currency(p.amount))
                .collect()],
        };

        Ok(CashflowReport {
            start_date,
            daily,
            monthly,
            monthly_table,
        })
    }
}

impl<L> FinancialSummary<CachedLedger<L>>
where
    L: LedgerQueryService,
{
    /// Wraps `ledger` in a TTL cache sized from `settings`.
    pub fn cached(ledger: L, settings: &ReportSettings) -> Result<Self> {
        settings.validate()?;
        let cached =
            CachedLedger::with_config(ledger, settings.cache_capacity, settings.cache_ttl());
        Self::new(cached, settings)
    }
}

/// `1 Oct - 19 Oct 2026`
fn short_caption(period: &FiscalYear) -> String {
    format!(
        "{} - {}",
        period.start_date.format("%-d %b"),
        period.end_date.format("%d %b %Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::ledger::MemoryLedger;
    use crate::schema::{EntityRow, InvoiceLineItem, InvoiceState, MonthRow};
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(client: &str, issue: NaiveDate, due: NaiveDate, amount: Decimal) -> InvoiceLineItem {
        InvoiceLineItem {
            client_name: client.to_string(),
            state: InvoiceState::Paid,
            issue_date: issue,
            due_date: due,
            amount,
            tax_amount: amount / dec!(5),
        }
    }

    struct FailingLedger;

    impl LedgerQueryService for FailingLedger {
        fn monthly_totals(&self, _query: &PeriodQuery) -> Result<Vec<MonthRow>> {
            Ok(Vec::new())
        }

        fn entity_totals(&self, _query: &PeriodQuery) -> Result<Vec<EntityRow>> {
            Err(ReportError::query("quota exceeded"))
        }

        fn daily_totals(&self, _query: &PeriodQuery) -> Result<Vec<DayRow>> {
            Err(ReportError::query("quota exceeded"))
        }
    }

    #[test]
    fn test_invoicing_overview_scaffolds_full_year() {
        let ledger = MemoryLedger::new(vec![
            invoice("Acme", ymd(2024, 10, 3), ymd(2024, 11, 2), dec!(1000)),
            invoice("Beta", ymd(2024, 12, 9), ymd(2025, 1, 8), dec!(500)),
        ]);
        let summary = FinancialSummary::with_defaults(ledger);
        let overview = summary.invoicing_overview(ymd(2025, 3, 14)).unwrap();

        assert_eq!(overview.monthly.len(), 12);
        assert_eq!(overview.total_invoiced, dec!(1500));
        assert_eq!(
            overview.metric.label,
            "Total Invoiced (01 Oct 2024 - 30 Sep 2025)"
        );
        assert_eq!(overview.metric.value, "£1,500.00");

        let formatted = format_monthly(&overview.monthly, summary.style());
        assert_eq!(formatted[0], ("Oct-2024".to_string(), "£1,000.00".to_string()));
        assert_eq!(formatted[1], ("Nov-2024".to_string(), "£0.00".to_string()));
        assert_eq!(formatted[2], ("Dec-2024".to_string(), "£500.00".to_string()));
    }

    #[test]
    fn test_revenue_comparison_metrics_and_table() {
        let ledger = MemoryLedger::new(vec![
            invoice("Acme", ymd(2025, 10, 6), ymd(2025, 11, 5), dec!(200)),
            invoice("Beta", ymd(2025, 10, 10), ymd(2025, 11, 9), dec!(80)),
            invoice("Beta", ymd(2024, 10, 15), ymd(2024, 11, 14), dec!(100)),
            // After the as-of date a year earlier, so outside the previous YTD.
            invoice("Beta", ymd(2024, 10, 25), ymd(2024, 11, 24), dec!(999)),
        ]);
        let summary = FinancialSummary::with_defaults(ledger);
        let report = summary.revenue_comparison(ymd(2025, 10, 19)).unwrap();

        assert_eq!(report.current_period.end_date, ymd(2025, 10, 19));
        assert_eq!(report.previous_period.start_date, ymd(2024, 10, 1));
        assert_eq!(report.previous_period.end_date, ymd(2024, 10, 19));
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.current_total, dec!(280));
        assert_eq!(report.previous_total, dec!(100));
        assert_eq!(report.change.percent, Some(dec!(180)));

        assert_eq!(report.metrics[0].label, "Current (1 Oct - 19 Oct 2025)");
        assert_eq!(report.metrics[1].label, "Previous (1 Oct - 19 Oct 2024)");
        assert_eq!(report.metrics[2].value, "180.0%");

        assert_eq!(
            report.client_table.rows,
            vec![
                vec!["Acme", "£200.00", "£0.00", "£200.00", "-"],
                vec!["Beta", "£80.00", "£100.00", "(£20.00)", "-20.0%"],
                vec!["Total", "£280.00", "£100.00", "£180.00", "180.0%"],
            ]
        );
    }

    #[test]
    fn test_revenue_comparison_with_no_history() {
        let summary = FinancialSummary::with_defaults(MemoryLedger::default());
        let report = summary.revenue_comparison(ymd(2026, 2, 1)).unwrap();

        assert_eq!(report.monthly.len(), 5);
        assert!(report.monthly.iter().all(|p| p.amount.is_zero()));
        assert_eq!(report.metrics[2].value, "-");
        assert_eq!(
            report.client_table.rows,
            vec![vec!["Total", "£0.00", "£0.00", "£0.00", "-"]]
        );
    }

    #[test]
    fn test_cashflow_extends_to_last_due_month() {
        let ledger = MemoryLedger::new(vec![
            invoice("Acme", ymd(2024, 10, 3), ymd(2024, 11, 2), dec!(1000)),
            invoice("Beta", ymd(2024, 10, 9), ymd(2025, 2, 8), dec!(500)),
            invoice("Old", ymd(2024, 8, 1), ymd(2024, 9, 1), dec!(10)),
        ]);
        let summary = FinancialSummary::with_defaults(ledger);
        let report = summary.cashflow(ymd(2024, 10, 20)).unwrap();

        assert_eq!(report.start_date, ymd(2024, 10, 1));
        assert_eq!(
            report.daily,
            vec![
                DayRow::new(ymd(2024, 11, 2), dec!(1200)),
                DayRow::new(ymd(2025, 2, 8), dec!(600)),
            ]
        );
        assert_eq!(
            report.monthly_table.headers,
            vec!["Oct-2024", "Nov-2024", "Dec-2024", "Jan-2025", "Feb-2025"]
        );
        assert_eq!(
            report.monthly_table.rows[0],
            vec!["£0.00", "£1,200.00", "£0.00", "£0.00", "£600.00"]
        );
    }

    #[test]
    fn test_cashflow_without_data_covers_start_to_today() {
        let summary = FinancialSummary::with_defaults(MemoryLedger::default());
        let report = summary.cashflow(ymd(2024, 12, 2)).unwrap();
        assert!(report.daily.is_empty());
        assert_eq!(report.monthly.len(), 3);
    }

    #[test]
    fn test_query_failure_aborts_whole_report() {
        let summary = FinancialSummary::with_defaults(FailingLedger);

        let err = summary.revenue_comparison(ymd(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, ReportError::QueryFailure(_)));
        assert_eq!(
            err.user_message(),
            "An error occurred: Ledger query failed: quota exceeded"
        );
        assert!(summary.cashflow(ymd(2025, 1, 1)).is_err());
        assert!(summary.invoicing_overview(ymd(2025, 1, 1)).is_ok());
    }

    #[test]
    fn test_out_of_range_totals_abort_report() {
        struct OversizedLedger;

        impl LedgerQueryService for OversizedLedger {
            fn monthly_totals(&self, _query: &PeriodQuery) -> Result<Vec<MonthRow>> {
                Ok(vec![
                    MonthRow::new(ymd(2024, 10, 1), Decimal::MAX),
                    MonthRow::new(ymd(2024, 11, 1), Decimal::MAX),
                ])
            }

            fn entity_totals(&self, _query: &PeriodQuery) -> Result<Vec<EntityRow>> {
                Ok(Vec::new())
            }

            fn daily_totals(&self, _query: &PeriodQuery) -> Result<Vec<DayRow>> {
                Ok(Vec::new())
            }
        }

        let summary = FinancialSummary::with_defaults(OversizedLedger);
        let err = summary.invoicing_overview(ymd(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, ReportError::AmountOverflow(_)));
        assert!(err.user_message().starts_with("An error occurred: Amount out of range"));
        assert!(summary.revenue_comparison(ymd(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_custom_fiscal_start_from_settings() {
        let settings = ReportSettings {
            fiscal_year_start_month: 4,
            ..ReportSettings::default()
        };
        let summary = FinancialSummary::new(MemoryLedger::default(), &settings).unwrap();
        let overview = summary.invoicing_overview(ymd(2025, 3, 31)).unwrap();
        assert_eq!(overview.fiscal_year.start_date, ymd(2024, 4, 1));
        assert_eq!(overview.monthly[0].bucket.label, "Apr-2024");
        assert_eq!(overview.monthly[11].bucket.label, "Mar-2025");
    }

    #[test]
    fn test_cached_summary_reuses_results() {
        let ledger = MemoryLedger::new(vec![invoice(
            "Acme",
            ymd(2024, 10, 3),
            ymd(2024, 11, 2),
            dec!(1000),
        )]);
        let summary = FinancialSummary::cached(ledger, &ReportSettings::default()).unwrap();

        let first = summary.invoicing_overview(ymd(2025, 1, 1)).unwrap();
        let second = summary.invoicing_overview(ymd(2025, 1, 1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(summary.ledger().entry_count(), 1);
    }
}
