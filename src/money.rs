//! Amounts of money: validated operation inputs, database storage, and display.
//!
//! Balances and amounts are [Decimal]s. SQLite has no decimal type, so they are
//! stored as canonical decimal text and parsed when read back.

use std::{str::FromStr, sync::OnceLock};

use numfmt::{Formatter, Precision};
use rusqlite::{Row, types::Type};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::Error;

/// A strictly positive amount of money to deposit, withdraw or transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new amount.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `value` is zero or negative.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            return Err(Error::InvalidAmount(value));
        }

        Ok(Self(value))
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Read the decimal stored as text in column `index` of `row`.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(index)?;

    Decimal::from_str(&raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Convert a decimal into the text stored in the database.
pub(crate) fn to_sql_text(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Format `amount` as dollars with two decimal places and thousands
/// separators, e.g. "$1,234.50" or "-$0.25".
///
/// The cents come straight from the rounded [Decimal]. Only the whole dollars
/// go through `numfmt`, which is exact for integers below 2^53.
pub fn format_currency(amount: Decimal) -> String {
    static WHOLE_DOLLARS_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let rounded = amount.round_dp(2);
    let magnitude = rounded.abs();
    let whole = magnitude.trunc();
    let cents = ((magnitude - whole) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or_default();

    let sign = if rounded.is_sign_negative() && !magnitude.is_zero() {
        "-"
    } else {
        ""
    };

    let formatter = WHOLE_DOLLARS_FMT.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(0)))
    });

    let whole_dollars = match (formatter, whole.to_f64()) {
        // Zero is hardcoded as "0" by numfmt, without the prefix.
        _ if whole.is_zero() => "$0".to_owned(),
        (Some(formatter), Some(whole)) => formatter.fmt_string(whole),
        _ => format!("${whole}"),
    };

    format!("{sign}{whole_dollars}.{cents:02}")
}
