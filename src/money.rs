//! Currencies, currency conversion and helpers for storing decimal amounts in SQLite.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Row, types::Type};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The currencies a card can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// United States dollar.
    #[serde(rename = "USD")]
    Usd,
    /// Belarusian ruble.
    #[serde(rename = "BYN")]
    Byn,
}

impl Currency {
    /// All currencies in the order they are shown in forms.
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Byn];

    /// The single character code used in the database.
    pub fn db_code(self) -> &'static str {
        match self {
            Currency::Usd => "U",
            Currency::Byn => "B",
        }
    }

    /// Parse the single character database code.
    pub fn from_db_code(code: &str) -> Option<Self> {
        match code {
            "U" => Some(Currency::Usd),
            "B" => Some(Currency::Byn),
            _ => None,
        }
    }

    /// The ISO 4217 code, e.g. "USD".
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Byn => "BYN",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Round `amount` to cents using banker's rounding.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Convert `amount` from one currency to another.
///
/// `usd_to_byn_rate` is the number of rubles in one dollar. The result is
/// rounded to cents.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if the conversion overflows.
pub fn convert(
    amount: Decimal,
    from: Currency,
    to: Currency,
    usd_to_byn_rate: Decimal,
) -> Result<Decimal, Error> {
    let converted = match (from, to) {
        (Currency::Usd, Currency::Byn) => amount.checked_mul(usd_to_byn_rate),
        (Currency::Byn, Currency::Usd) => amount.checked_div(usd_to_byn_rate),
        _ => Some(amount),
    };

    converted
        .map(round_cents)
        .ok_or(Error::AmountOverflow(amount))
}

/// Round `amount` to cents and check that it is still strictly positive.
///
/// # Errors
///
/// Returns [Error::NonPositiveAmount] for amounts that round to zero or below,
/// e.g. 0.004.
pub fn require_positive(amount: Decimal) -> Result<Decimal, Error> {
    let amount = round_cents(amount);

    if amount <= Decimal::ZERO {
        Err(Error::NonPositiveAmount)
    } else {
        Ok(amount)
    }
}

/// Add `amount` to `balance`.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if the sum does not fit in a [Decimal].
pub fn add_to_balance(balance: Decimal, amount: Decimal) -> Result<Decimal, Error> {
    balance
        .checked_add(amount)
        .ok_or(Error::AmountOverflow(amount))
}

/// Read a decimal stored as text from column `index` of `row`.
pub fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(index)?;

    Decimal::from_str(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Read a currency stored as its database code from column `index` of `row`.
pub fn get_currency(row: &Row, index: usize) -> Result<Currency, rusqlite::Error> {
    let raw: String = row.get(index)?;

    Currency::from_db_code(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("invalid currency code {raw:?}").into(),
        )
    })
}

/// Format `amount` with thousands separators and two decimal places,
/// followed by the currency code, e.g. "1,234.50 BYN".
pub fn format_money(amount: Decimal, currency: Currency) -> String {
    format!("{} {}", format_amount(amount), currency.code())
}

/// Format `amount` with thousands separators and two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = round_cents(amount);
    amount.rescale(2);

    let digits = amount.abs().to_string();
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };

    format!("{sign}{grouped}.{cents}")
}


#[cfg(test)]
mod format_tests {
    use rust_decimal_macros::dec;

    use crate::money::{Currency, format_amount, format_money};

    #[test]
    fn formats_zero() {
        assert_eq!(format_amount(dec!(0)), "0.00");
    }

    #[test]
    fn pads_trailing_zero() {
        assert_eq!(format_amount(dec!(12.3)), "12.30");
        assert_eq!(format_amount(dec!(12)), "12.00");
    }

    #[test]
    fn formats_negative_amount() {
        assert_eq!(format_amount(dec!(-5.5)), "-5.50");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(dec!(1234.5)), "1,234.50");
        assert_eq!(format_amount(dec!(999)), "999.00");
        assert_eq!(format_amount(dec!(-1234567)), "-1,234,567.00");
    }

    #[test]
    fn large_amounts_keep_their_cents() {
        assert_eq!(
            format_amount(dec!(12345678901234567.89)),
            "12,345,678,901,234,567.89"
        );
    }

    #[test]
    fn appends_currency_code() {
        assert_eq!(format_money(dec!(31.16), Currency::Byn), "31.16 BYN");
    }
}

#[cfg(test)]
mod currency_code_tests {
    use crate::money::Currency;

    #[test]
    fn db_code_round_trips() {
        for currency in Currency::ALL {
            assert_eq!(Currency::from_db_code(currency.db_code()), Some(currency));
        }
    }

    #[test]
    fn unknown_db_code_is_none() {
        assert_eq!(Currency::from_db_code("E"), None);
    }
}
