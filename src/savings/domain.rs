//! Savings goal types and the monthly contribution calculation.

use std::fmt::Display;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// Database identifier for a savings goal.
pub type SavingsGoalId = i64;

/// The longest goal name accepted.
pub const GOAL_NAME_MAX_LENGTH: usize = 100;

/// How many days in the future a target date must at least be.
pub const MIN_DAYS_TO_TARGET: i64 = 30;

/// The name of a savings goal, unique among a user's goals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalName(String);

impl GoalName {
    /// Create a goal name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyField] if `name` is empty or only whitespace,
    /// or [Error::FieldTooLong] if it is longer than [GOAL_NAME_MAX_LENGTH].
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyField("Goal name"))
        } else if name.chars().count() > GOAL_NAME_MAX_LENGTH {
            Err(Error::FieldTooLong("Goal name", GOAL_NAME_MAX_LENGTH))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a goal name without validation.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for GoalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for GoalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An amount a user wants to have saved by a date.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsGoal {
    pub id: SavingsGoalId,
    pub user_id: UserID,
    pub goal_name: GoalName,
    pub target_amount: Decimal,
    pub target_date: Date,
    pub is_active: bool,
    /// Set once the user has reviewed and accepted the monthly payment.
    pub approved: bool,
    pub monthly_payment: Decimal,
    pub created_at: OffsetDateTime,
}

/// The data needed to create a savings goal.
#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    /// The user saving towards the goal.
    pub user_id: UserID,
    /// Unique among the user's goals.
    pub goal_name: GoalName,
    /// How much the user wants to have saved.
    pub target_amount: Decimal,
    /// The date by which the target should be reached.
    pub target_date: Date,
    /// The monthly plan is counted from this date.
    pub created_at: OffsetDateTime,
}

/// Form data for creating or editing a savings goal.
#[derive(Debug, Clone, Deserialize)]
pub struct SavingsGoalForm {
    pub goal_name: String,
    pub target_amount: Decimal,
    pub target_date: Date,
}

/// The number of calendar months from `start` to `target`, at least one.
pub fn total_months(start: Date, target: Date) -> u32 {
    let months = (target.year() - start.year()) * 12 + i32::from(u8::from(target.month()))
        - i32::from(u8::from(start.month()));

    u32::try_from(months).unwrap_or(0).max(1)
}

/// The amount to put aside each month to reach `target_amount` in
/// `total_months`, rounded to a whole unit with banker's rounding.
pub fn monthly_payment(target_amount: Decimal, total_months: u32) -> Decimal {
    (target_amount / Decimal::from(total_months.max(1)))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Check that a target amount is not negative.
///
/// # Errors
///
/// Returns [Error::NegativeAmount] for amounts below zero.
pub fn validate_target_amount(target_amount: Decimal) -> Result<Decimal, Error> {
    if target_amount < Decimal::ZERO {
        Err(Error::NegativeAmount)
    } else {
        Ok(target_amount)
    }
}

/// Check that `target_date` is at least [MIN_DAYS_TO_TARGET] days after `today`.
///
/// # Errors
///
/// Returns [Error::TargetDateTooSoon] with the earliest allowed date otherwise.
pub fn validate_target_date(target_date: Date, today: Date) -> Result<Date, Error> {
    let earliest = today.saturating_add(Duration::days(MIN_DAYS_TO_TARGET));

    if target_date < earliest {
        Err(Error::TargetDateTooSoon(earliest))
    } else {
        Ok(target_date)
    }
}


#[cfg(test)]
mod monthly_payment_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::Error;

    use super::{
        monthly_payment, total_months, validate_target_amount, validate_target_date,
    };

    #[test]
    fn counts_calendar_months() {
        assert_eq!(total_months(date!(2025 - 01 - 31), date!(2025 - 03 - 01)), 2);
        assert_eq!(total_months(date!(2025 - 11 - 15), date!(2026 - 02 - 15)), 3);
    }

    #[test]
    fn same_month_counts_as_one() {
        assert_eq!(total_months(date!(2025 - 03 - 01), date!(2025 - 03 - 31)), 1);
    }

    #[test]
    fn target_before_start_counts_as_one() {
        assert_eq!(total_months(date!(2025 - 03 - 01), date!(2024 - 03 - 01)), 1);
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(monthly_payment(dec!(5), 2), dec!(2));
        assert_eq!(monthly_payment(dec!(7), 2), dec!(4));
        assert_eq!(monthly_payment(dec!(1000), 3), dec!(333));
    }

    #[test]
    fn zero_target_needs_nothing() {
        assert_eq!(monthly_payment(dec!(0), 6), dec!(0));
    }

    #[test]
    fn target_date_needs_thirty_days() {
        let today = date!(2025 - 03 - 01);

        assert_eq!(
            validate_target_date(date!(2025 - 03 - 31), today),
            Ok(date!(2025 - 03 - 31))
        );
        assert_eq!(
            validate_target_date(date!(2025 - 03 - 30), today),
            Err(Error::TargetDateTooSoon(date!(2025 - 03 - 31)))
        );
    }

    #[test]
    fn negative_target_amount_is_rejected() {
        assert_eq!(validate_target_amount(dec!(-1)), Err(Error::NegativeAmount));
        assert_eq!(validate_target_amount(dec!(0)), Ok(dec!(0)));
    }
}
