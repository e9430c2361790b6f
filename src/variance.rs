//! Period-over-period variance calculations.

use crate::error::{ReportError, Result};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Signed change from `previous` to `current`.
pub fn difference(current: Decimal, previous: Decimal) -> Result<Decimal> {
    current
        .checked_sub(previous)
        .ok_or_else(|| ReportError::AmountOverflow(format!("{} - {}", current, previous)))
}

/// Percentage change from `previous` to `current`, at full precision.
///
/// Returns `None` whenever `previous` is zero, including when `current` is
/// zero as well: a zero baseline has no meaningful growth rate, and callers
/// render it as a dash rather than `0.0%`. A percentage too large for a
/// `Decimal` (a baseline of a few millionths of a penny, say) is `None` too.
pub fn percent_difference(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    current
        .checked_sub(previous)?
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Direction of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    Unchanged,
}

/// Absolute and relative change between two amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Variance {
    pub difference: Decimal,
    /// `None` when the previous amount is zero.
    pub percent: Option<Decimal>,
}

impl Variance {
    pub fn between(current: Decimal, previous: Decimal) -> Result<Self> {
        Ok(Self {
            difference: difference(current, previous)?,
            percent: percent_difference(current, previous),
        })
    }

    pub fn direction(&self) -> Direction {
        if self.difference.is_zero() {
            Direction::Unchanged
        } else if self.difference.is_sign_positive() {
            Direction::Increase
        } else {
            Direction::Decrease
        }
    }
}
