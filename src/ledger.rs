//! The read-only query surface the summary engine consumes.
//!
//! Storage and query language are the backend's business; the engine only
//! relies on the grouping and filtering contract documented on
//! [`LedgerQueryService`].

use crate::error::Result;
use crate::schema::{AggregateRow, DayRow, EntityRow, InvoiceLineItem, MonthRow};
use crate::utils::{checked_add, month_start};
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Which invoice date places a line item in a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBasis {
    IssueDate,
    DueDate,
}

/// Parameters of one aggregate query. Also the cache key for its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    /// Inclusive upper bound; `None` takes everything from `start` onwards.
    pub end: Option<NaiveDate>,
    pub basis: DateBasis,
    pub include_tax: bool,
}

impl PeriodQuery {
    /// Issue-date query over a closed range, net of tax.
    pub fn issued_between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: Some(end),
            basis: DateBasis::IssueDate,
            include_tax: false,
        }
    }

    /// Due-date query with no upper bound, tax included.
    pub fn due_from(start: NaiveDate) -> Self {
        Self {
            start,
            end: None,
            basis: DateBasis::DueDate,
            include_tax: true,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }
}

/// Aggregate queries over invoice line items.
///
/// Every operation sums line items whose invoice is in an active state (open,
/// paid or draft) and whose `basis` date falls within the query range. Tax is
/// added to the line amount when `include_tax` is set. Result order is not
/// part of the contract.
pub trait LedgerQueryService {
    /// One row per month that has activity, keyed by the first day of the month.
    fn monthly_totals(&self, query: &PeriodQuery) -> Result<Vec<MonthRow>>;

    /// One row per counterparty that has activity.
    fn entity_totals(&self, query: &PeriodQuery) -> Result<Vec<EntityRow>>;

    /// One row per day that has activity.
    fn daily_totals(&self, query: &PeriodQuery) -> Result<Vec<DayRow>>;
}

impl<T: LedgerQueryService + ?Sized> LedgerQueryService for &T {
    fn monthly_totals(&self, query: &PeriodQuery) -> Result<Vec<MonthRow>> {
        (**self).monthly_totals(query)
    }

    fn entity_totals(&self, query: &PeriodQuery) -> Result<Vec<EntityRow>> {
        (**self).entity_totals(query)
    }

    fn daily_totals(&self, query: &PeriodQuery) -> Result<Vec<DayRow>> {
        (**self).daily_totals(query)
    }
}

/// A ledger held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    items: Vec<InvoiceLineItem>,
}

impl MemoryLedger {
    pub fn new(items: Vec<InvoiceLineItem>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: InvoiceLineItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn matching<'a>(
        &'a self,
        query: &'a PeriodQuery,
    ) -> impl Iterator<Item = (NaiveDate, &'a InvoiceLineItem, Result<Decimal>)> + 'a {
        self.items.iter().filter_map(move |item| {
            if !item.state.is_active() {
                return None;
            }
            let date = match query.basis {
                DateBasis::IssueDate => item.issue_date,
                DateBasis::DueDate => item.due_date,
            };
            if !query.contains(date) {
                return None;
            }
            let amount = if query.include_tax {
                checked_add(item.amount, item.tax_amount)
            } else {
                Ok(item.amount)
            };
            Some((date, item, amount))
        })
    }

    fn grouped_by_date(
        &self,
        query: &PeriodQuery,
        key_of: impl Fn(NaiveDate) -> NaiveDate,
    ) -> Result<Vec<AggregateRow<NaiveDate>>> {
        let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for (date, _, amount) in self.matching(query) {
            let slot = totals.entry(key_of(date)).or_insert(Decimal::ZERO);
            *slot = checked_add(*slot, amount?)?;
        }
        Ok(totals
            .into_iter()
            .map(|(key, amount)| AggregateRow::new(key, amount))
            .collect())
    }
}

impl LedgerQueryService for MemoryLedger {
    fn monthly_totals(&self, query: &PeriodQuery) -> Result<Vec<MonthRow>> {
        let rows = self.grouped_by_date(query, month_start)?;
        debug!("Memory ledger: {} monthly rows for {:?}", rows.len(), query);
        Ok(rows)
    }

    fn entity_totals(&self, query: &PeriodQuery) -> Result<Vec<EntityRow>> {
        let mut totals: HashMap<&str, Decimal> = HashMap::new();
        for (_, item, amount) in self.matching(query) {
            let slot = totals.entry(item.client_name.as_str()).or_insert(Decimal::ZERO);
            *slot = checked_add(*slot, amount?)?;
        }

        let mut rows: Vec<EntityRow> = totals
            .into_iter()
            .map(|(name, amount)| EntityRow::new(name.to_string(), amount))
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));

        debug!("Memory ledger: {} entity rows for {:?}", rows.len(), query);
        Ok(rows)
    }

    fn daily_totals(&self, query: &PeriodQuery) -> Result<Vec<DayRow>> {
        let rows = self.grouped_by_date(query, |date| date)?;
        debug!("Memory ledger: {} daily rows for {:?}", rows.len(), query);
        Ok(rows)
    }
}
