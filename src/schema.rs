use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A sparse observation returned by the ledger.
///
/// `K` is the grouping key: a month (first day of the month), a day, or a
/// counterparty name. A key missing from a result set means zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateRow<K> {
    pub key: K,
    pub amount: Decimal,
}

impl<K> AggregateRow<K> {
    pub fn new(key: K, amount: Decimal) -> Self {
        Self { key, amount }
    }
}

pub type MonthRow = AggregateRow<NaiveDate>;
pub type DayRow = AggregateRow<NaiveDate>;
pub type EntityRow = AggregateRow<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    #[schemars(description = "Not yet sent to the client")]
    Draft,

    #[schemars(description = "Sent and awaiting payment")]
    Open,

    #[schemars(description = "Fully paid")]
    Paid,

    #[schemars(description = "Closed without payment (written off)")]
    Closed,
}

impl InvoiceState {
    /// States whose line items count towards invoiced and cashflow totals.
    pub const ACTIVE: [InvoiceState; 3] = [InvoiceState::Open, InvoiceState::Paid, InvoiceState::Draft];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

/// One invoice line item as held by a ledger backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InvoiceLineItem {
    #[schemars(description = "Name of the client the invoice was issued to")]
    pub client_name: String,

    pub state: InvoiceState,

    #[schemars(description = "Date the invoice was issued (YYYY-MM-DD)")]
    pub issue_date: NaiveDate,

    #[schemars(description = "Date payment is due (YYYY-MM-DD)")]
    pub due_date: NaiveDate,

    #[schemars(description = "Net amount of the line item")]
    pub amount: Decimal,

    #[serde(default)]
    #[schemars(description = "Tax charged on the line item; zero when untaxed")]
    pub tax_amount: Decimal,
}
