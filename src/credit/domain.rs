//! Credit application and credit types, and the annuity repayment formula.

use std::fmt::Display;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    money::{require_positive, round_cents},
};

/// Database identifier for a credit application.
pub type CreditApplicationId = i64;

/// Database identifier for a credit.
pub type CreditId = i64;

/// The longest purpose text accepted.
pub const PURPOSE_MAX_LENGTH: usize = 255;

/// Where a credit application is in the staff review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreditStatus {
    Pending,
    Approved,
    Rejected,
}

impl CreditStatus {
    /// The code used in the database.
    pub fn db_code(self) -> &'static str {
        match self {
            CreditStatus::Pending => "PENDING",
            CreditStatus::Approved => "APPROVED",
            CreditStatus::Rejected => "REJECTED",
        }
    }

    /// Parse the database code.
    pub fn from_db_code(code: &str) -> Option<Self> {
        match code {
            "PENDING" => Some(CreditStatus::Pending),
            "APPROVED" => Some(CreditStatus::Approved),
            "REJECTED" => Some(CreditStatus::Rejected),
            _ => None,
        }
    }
}

impl Display for CreditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CreditStatus::Pending => "Pending",
            CreditStatus::Approved => "Approved",
            CreditStatus::Rejected => "Rejected",
        };

        write!(f, "{label}")
    }
}

pub(crate) fn get_credit_status(row: &Row, index: usize) -> Result<CreditStatus, rusqlite::Error> {
    let raw: String = row.get(index)?;

    CreditStatus::from_db_code(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("invalid credit status {raw:?}").into(),
        )
    })
}

/// A user's request to borrow money.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditApplication {
    pub id: CreditApplicationId,
    pub user_id: UserID,
    pub amount: Decimal,
    pub purpose: String,
    pub status: CreditStatus,
    pub created_at: OffsetDateTime,
}

/// The data needed to submit a credit application.
#[derive(Debug, Clone)]
pub struct NewCreditApplication {
    /// The applicant.
    pub user_id: UserID,
    /// The amount asked for in BYN, rounded to cents.
    pub amount: Decimal,
    /// What the money is for, as written by the applicant.
    pub purpose: String,
    pub created_at: OffsetDateTime,
}

impl NewCreditApplication {
    /// Validate the submitted amount and purpose.
    ///
    /// # Errors
    ///
    /// - [Error::NonPositiveAmount] if `amount` rounds to zero or less,
    /// - [Error::EmptyField] if `purpose` is blank,
    /// - [Error::FieldTooLong] if `purpose` is longer than [PURPOSE_MAX_LENGTH].
    pub fn new(
        user_id: UserID,
        amount: Decimal,
        purpose: &str,
        created_at: OffsetDateTime,
    ) -> Result<Self, Error> {
        let amount = require_positive(amount)?;
        let purpose = purpose.trim();

        if purpose.is_empty() {
            return Err(Error::EmptyField("Purpose"));
        }

        if purpose.chars().count() > PURPOSE_MAX_LENGTH {
            return Err(Error::FieldTooLong("Purpose", PURPOSE_MAX_LENGTH));
        }

        Ok(Self {
            user_id,
            amount,
            purpose: purpose.to_owned(),
            created_at,
        })
    }
}

/// An approved loan and its repayment terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Credit {
    pub id: CreditId,
    pub user_id: UserID,
    pub application_id: CreditApplicationId,
    pub amount: Decimal,
    /// Yearly interest rate as a percentage.
    pub interest_rate: Decimal,
    pub term_months: u32,
    pub monthly_payment: Decimal,
    pub remaining_amount: Decimal,
    pub status: CreditStatus,
    pub created_at: OffsetDateTime,
}

/// Form data for a credit application.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditApplicationForm {
    pub amount: Decimal,
    pub purpose: String,
}

/// The fixed monthly payment that repays `principal` over `term_months`
/// at `annual_rate_percent` yearly interest, rounded to cents.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if the calculation overflows.
pub fn annuity(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Result<Decimal, Error> {
    let term_months = term_months.max(1);
    let monthly_rate = annual_rate_percent / Decimal::ONE_HUNDRED / Decimal::from(12);

    if monthly_rate.is_zero() {
        return Ok(round_cents(principal / Decimal::from(term_months)));
    }

    let growth = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..term_months {
        compound = compound
            .checked_mul(growth)
            .ok_or(Error::AmountOverflow(principal))?;
    }

    principal
        .checked_mul(monthly_rate)
        .and_then(|interest| interest.checked_mul(compound))
        .and_then(|numerator| numerator.checked_div(compound - Decimal::ONE))
        .map(round_cents)
        .ok_or(Error::AmountOverflow(principal))
}


#[cfg(test)]
mod new_credit_application_tests {
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{Error, auth::UserID};

    use super::{NewCreditApplication, PURPOSE_MAX_LENGTH};

    #[test]
    fn trims_purpose() {
        let application = NewCreditApplication::new(
            UserID::new(1),
            dec!(500),
            "  New roof ",
            datetime!(2025-03-01 12:00 UTC),
        )
        .unwrap();

        assert_eq!(application.purpose, "New roof");
    }

    #[test]
    fn rejects_non_positive_amount() {
        let result = NewCreditApplication::new(
            UserID::new(1),
            dec!(0),
            "Roof",
            datetime!(2025-03-01 12:00 UTC),
        );

        assert_eq!(result.err(), Some(Error::NonPositiveAmount));
    }

    #[test]
    fn rejects_amount_that_rounds_to_zero() {
        let result = NewCreditApplication::new(
            UserID::new(1),
            dec!(0.004),
            "Roof",
            datetime!(2025-03-01 12:00 UTC),
        );

        assert_eq!(result.err(), Some(Error::NonPositiveAmount));
    }

    #[test]
    fn rejects_blank_purpose() {
        let result = NewCreditApplication::new(
            UserID::new(1),
            dec!(10),
            "   ",
            datetime!(2025-03-01 12:00 UTC),
        );

        assert_eq!(result.err(), Some(Error::EmptyField("Purpose")));
    }

    #[test]
    fn rejects_long_purpose() {
        let result = NewCreditApplication::new(
            UserID::new(1),
            dec!(10),
            &"a".repeat(PURPOSE_MAX_LENGTH + 1),
            datetime!(2025-03-01 12:00 UTC),
        );

        assert_eq!(
            result.err(),
            Some(Error::FieldTooLong("Purpose", PURPOSE_MAX_LENGTH))
        );
    }
}
