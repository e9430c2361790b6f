//! Presentation rules for amounts and percentages.
//!
//! Rounding happens here and nowhere else: amounts to two decimals, percentages
//! to one, both half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Rendering of an undefined percentage (zero baseline).
pub const UNDEFINED_PERCENT: &str = "-";

const CURRENCY_PRECISION: u32 = 2;
const PERCENT_PRECISION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NegativeStyle {
    /// `-£20.00`
    Sign,
    /// `(£20.00)`
    Parentheses,
}

/// How a table column's values are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Text,
    /// Amounts; negatives follow [`FormatStyle::negative_style`].
    Currency,
    /// Variances; negatives are always shown in accounting parentheses.
    SignedCurrency,
    /// Percentages, or a dash when undefined.
    PercentOrDash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FormatStyle {
    #[schemars(description = "Symbol placed before every amount")]
    pub currency_symbol: String,

    #[schemars(description = "Character inserted between groups of three integer digits")]
    pub grouping_separator: char,

    #[schemars(description = "How negative amounts in plain currency columns are shown")]
    pub negative_style: NegativeStyle,
}

impl Default for FormatStyle {
    fn default() -> Self {
        Self {
            currency_symbol: "£".to_string(),
            grouping_separator: ',',
            negative_style: NegativeStyle::Parentheses,
        }
    }
}

impl FormatStyle {
    pub fn currency(&self, amount: Decimal) -> String {
        self.money(amount, self.negative_style)
    }

    pub fn signed_currency(&self, amount: Decimal) -> String {
        self.money(amount, NegativeStyle::Parentheses)
    }

    pub fn percent_or_dash(&self, percent: Option<Decimal>) -> String {
        match percent {
            Some(value) => format!(
                "{}%",
                format_number(value, PERCENT_PRECISION, self.grouping_separator)
            ),
            None => UNDEFINED_PERCENT.to_string(),
        }
    }

    fn money(&self, amount: Decimal, negative_style: NegativeStyle) -> String {
        let rounded = round(amount, CURRENCY_PRECISION);
        let body = format!(
            "{}{}",
            self.currency_symbol,
            format_number(rounded.abs(), CURRENCY_PRECISION, self.grouping_separator)
        );

        if !rounded.is_sign_negative() {
            return body;
        }
        match negative_style {
            NegativeStyle::Sign => format!("-{}", body),
            NegativeStyle::Parentheses => format!("({})", body),
        }
    }
}

fn round(value: Decimal, precision: u32) -> Decimal {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Fixed-precision rendering with grouped integer digits, e.g. `-1,234.5`.
pub fn format_number(value: Decimal, precision: u32, separator: char) -> String {
    let rounded = round(value, precision);
    let body = format!("{:.*}", precision as usize, rounded.abs());
    let (int_part, frac_part) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body.as_str(), ""),
    };

    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    format!("{}{}{}", sign, group_digits(int_part, separator), frac_part)
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().enumerate() {
        if count != 0 && (digits.len() - count) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}
