//! Current-versus-previous comparison tables keyed by counterparty.
//!
//! [`build`] joins two keyed aggregate sets, orders the rows and appends a
//! totals row; [`ComparisonTable::format`] turns the result into display text
//! using one formatter per column role.

use crate::error::Result;
use crate::format::{ColumnRole, FormatStyle};
use crate::schema::EntityRow;
use crate::utils::{checked_add, checked_total};
use crate::variance::{difference, percent_difference};
use log::debug;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key of the synthetic row appended to every table.
pub const TOTAL_KEY: &str = "Total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonRow {
    pub entity_key: String,
    pub current_amount: Decimal,
    pub previous_amount: Decimal,
    pub difference: Decimal,
    /// `None` when `previous_amount` is zero.
    pub percent_difference: Option<Decimal>,
    /// Set only on the appended totals row, so a counterparty literally named
    /// "Total" is never mistaken for it.
    #[serde(default)]
    pub is_total: bool,
}

impl ComparisonRow {
    fn new(entity_key: String, current_amount: Decimal, previous_amount: Decimal) -> Result<Self> {
        Ok(Self {
            difference: difference(current_amount, previous_amount)?,
            percent_difference: percent_difference(current_amount, previous_amount),
            entity_key,
            current_amount,
            previous_amount,
            is_total: false,
        })
    }
}

/// Comparison rows, largest current amount first, totals row last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

/// Joins `current` and `previous` amounts per key and builds the table.
///
/// - Every key present on either side appears once; the missing side is zero.
///   Repeated keys within one side are summed.
/// - Rows are sorted by current amount, descending. The sort is stable: ties
///   keep first-seen order, which is every key of `current` in input order
///   followed by keys found only in `previous`, in their input order.
/// - The totals row sums both amount columns over all rows and derives its
///   variance from those sums.
///
/// Fails with [`ReportError::AmountOverflow`](crate::error::ReportError::AmountOverflow)
/// when a sum or difference does not fit a `Decimal`.
pub fn build(current: &[EntityRow], previous: &[EntityRow]) -> Result<ComparisonTable> {
    let mut order: Vec<String> = Vec::new();
    let mut amounts: HashMap<String, (Decimal, Decimal)> = HashMap::new();

    let sides: [(&[EntityRow], bool); 2] = [(current, true), (previous, false)];
    for (rows, is_current) in sides {
        for row in rows {
            let slot = amounts.entry(row.key.clone()).or_insert_with(|| {
                order.push(row.key.clone());
                (Decimal::ZERO, Decimal::ZERO)
            });
            if is_current {
                slot.0 = checked_add(slot.0, row.amount)?;
            } else {
                slot.1 = checked_add(slot.1, row.amount)?;
            }
        }
    }

    let mut rows: Vec<ComparisonRow> = order
        .into_iter()
        .map(|key| {
            let (current_amount, previous_amount) = amounts
                .get(&key)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            ComparisonRow::new(key, current_amount, previous_amount)
        })
        .collect::<Result<_>>()?;

    rows.sort_by(|a, b| b.current_amount.cmp(&a.current_amount));

    let total_current = checked_total(rows.iter().map(|r| r.current_amount))?;
    let total_previous = checked_total(rows.iter().map(|r| r.previous_amount))?;

    debug!(
        "Comparison table: {} entities, current total {}, previous total {}",
        rows.len(),
        total_current,
        total_previous
    );

    let mut total = ComparisonRow::new(TOTAL_KEY.to_string(), total_current, total_previous)?;
    total.is_total = true;
    rows.push(total);

    Ok(ComparisonTable { rows })
}

impl ComparisonTable {
    /// Rows excluding the totals row.
    pub fn entity_rows(&self) -> &[ComparisonRow] {
        match self.rows.split_last() {
            Some((last, rest)) if last.is_total => rest,
            _ => &self.rows,
        }
    }

    pub fn totals(&self) -> Option<&ComparisonRow> {
        self.rows.last().filter(|row| row.is_total)
    }

    pub fn format(&self, labels: &TableLabels, style: &FormatStyle) -> FormattedTable {
        FormattedTable {
            headers: ComparisonColumn::ALL
                .iter()
                .map(|column| column.header(labels).to_string())
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    ComparisonColumn::ALL
                        .iter()
                        .map(|column| column.render(row, style))
                        .collect()
                })
                .collect(),
        }
    }
}

/// Column headings of a formatted comparison table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TableLabels {
    pub entity: String,
    pub current: String,
    pub previous: String,
    pub difference: String,
    pub percent_difference: String,
}

impl Default for TableLabels {
    fn default() -> Self {
        Self {
            entity: "Client name".to_string(),
            current: "Revenue YTD".to_string(),
            previous: "Revenue previous YTD".to_string(),
            difference: "Difference".to_string(),
            percent_difference: "% Difference".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonColumn {
    Entity,
    Current,
    Previous,
    Difference,
    PercentDifference,
}

impl ComparisonColumn {
    pub const ALL: [ComparisonColumn; 5] = [
        ComparisonColumn::Entity,
        ComparisonColumn::Current,
        ComparisonColumn::Previous,
        ComparisonColumn::Difference,
        ComparisonColumn::PercentDifference,
    ];

    pub fn role(self) -> ColumnRole {
        match self {
            Self::Entity => ColumnRole::Text,
            Self::Current | Self::Previous => ColumnRole::Currency,
            Self::Difference => ColumnRole::SignedCurrency,
            Self::PercentDifference => ColumnRole::PercentOrDash,
        }
    }

    pub fn header(self, labels: &TableLabels) -> &str {
        match self {
            Self::Entity => &labels.entity,
            Self::Current => &labels.current,
            Self::Previous => &labels.previous,
            Self::Difference => &labels.difference,
            Self::PercentDifference => &labels.percent_difference,
        }
    }

    fn amount(self, row: &ComparisonRow) -> Decimal {
        match self {
            Self::Current => row.current_amount,
            Self::Previous => row.previous_amount,
            _ => row.difference,
        }
    }

    pub fn render(self, row: &ComparisonRow, style: &FormatStyle) -> String {
        match self.role() {
            ColumnRole::Text => row.entity_key.clone(),
            ColumnRole::Currency => style.currency(self.amount(row)),
            ColumnRole::SignedCurrency => style.signed_currency(self.amount(row)),
            ColumnRole::PercentOrDash => style.percent_or_dash(row.percent_difference),
        }
    }
}

/// Display-ready table: one header per column, one string per cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormattedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
