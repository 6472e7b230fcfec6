//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    alert::Alert, forbidden::Forbidden, internal_server_error::InternalServerError,
    not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// A session would expire outside the range of representable date times.
    #[error("the session expiry is out of range")]
    SessionExpiryOutOfRange,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The email address already belongs to a registered user.
    #[error("a user with the email {0} already exists")]
    DuplicateEmail(String),

    /// A required text field was left empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A text field exceeded its maximum length.
    #[error("{0} must be at most {1} characters")]
    FieldTooLong(&'static str, usize),

    /// A postal code that is zero or negative.
    #[error("postal code must be a positive number")]
    InvalidPostalCode,

    /// An amount of money that is zero or negative where a positive amount is required.
    #[error("Amount must be greater than zero.")]
    NonPositiveAmount,

    /// An amount of money that is negative where a non-negative amount is required.
    #[error("Amount cannot be negative.")]
    NegativeAmount,

    /// A credit card that has been blocked from receiving deposits was used to pay.
    #[error("Deposit not allowed for credit card")]
    DepositNotAllowed,

    /// A credit card does not hold enough money for a payment.
    #[error("Insufficient funds for credit card payment")]
    InsufficientCreditFunds,

    /// A debit card does not hold enough money for a payment.
    #[error("Insufficient funds for debit card")]
    InsufficientDebitFunds,

    /// The card already has a deposit waiting for staff approval.
    #[error("You already have a pending deposit. Awaiting staff approval.")]
    DepositAlreadyPending,

    /// Staff tried to approve or reject a deposit on a card without one.
    #[error("No pending deposit for this card")]
    NoPendingDeposit,

    /// No card has the account number entered as the transfer receiver.
    #[error("No card with account number {0}")]
    ReceiverNotFound(String),

    /// The sending card does not hold enough money for a transfer.
    #[error("Insufficient funds to transfer.")]
    InsufficientTransferFunds,

    /// The sending and receiving card of a transfer are the same card.
    #[error("Cannot transfer funds from and to the same card.")]
    SameCardTransfer,

    /// A date field that is not in the form YYYY-MM-DD.
    #[error("\"{0}\" is not a date in the form YYYY-MM-DD")]
    InvalidDate(String),

    /// The end of a date range is before its start.
    #[error("the end date {1} is before the start date {0}")]
    InvalidDateRange(Date, Date),

    /// The target date of a savings goal is too close to the current date.
    #[error("the target date must be on or after {0}")]
    TargetDateTooSoon(Date),

    /// The user already has a savings goal with this name.
    #[error("a savings goal named \"{0}\" already exists")]
    DuplicateGoalName(String),

    /// A credit application that has already been approved or rejected.
    #[error("this credit application has already been decided")]
    CreditApplicationDecided,

    /// The exchange rate or credit terms are not usable.
    #[error("invalid banking rules: {0}")]
    InvalidBankingRules(String),

    /// A calculation on an amount of money overflowed.
    #[error("the amount {0} is too large")]
    AmountOverflow(Decimal),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows, or when
    /// a user asks for a resource that belongs to another user.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The user is logged in but is not allowed to see the page.
    #[error("you do not have permission to access this page")]
    Forbidden,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a card that does not exist
    #[error("tried to update a card that is not in the database")]
    UpdateMissingCard,

    /// Every generated account number for a new card was already taken.
    #[error("could not generate an unused account number after {0} attempts")]
    AccountNumberCollision(u32),

    /// Tried to update a savings goal that does not exist
    #[error("tried to update a savings goal that is not in the database")]
    UpdateMissingSavingsGoal,

    /// Tried to delete a savings goal that does not exist
    #[error("tried to delete a savings goal that is not in the database")]
    DeleteMissingSavingsGoal,

    /// An authenticator secret could not be turned into one-time codes.
    #[error("could not use the authenticator secret: {0}")]
    TotpError(String),

    /// Tried to update a credit application that does not exist
    #[error("tried to update a credit application that is not in the database")]
    UpdateMissingCreditApplication,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail(String::new())
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("savings_goal.goal_name") =>
            {
                Error::DuplicateGoalName(String::new())
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::Forbidden => Forbidden.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError::with_hint(format!(
                "The bank's timezone \"{timezone}\" is not a canonical timezone name, \
                e.g. \"Europe/Minsk\". Check the server's --timezone option."
            ))
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid timezone settings".to_owned(),
                    details: format!(
                        "The bank's timezone \"{timezone}\" is not a canonical timezone name."
                    ),
                },
            ),
            Error::NonPositiveAmount
            | Error::NegativeAmount
            | Error::AmountOverflow(_)
            | Error::DepositNotAllowed
            | Error::InsufficientCreditFunds
            | Error::InsufficientDebitFunds
            | Error::InsufficientTransferFunds
            | Error::SameCardTransfer
            | Error::ReceiverNotFound(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "Could not complete the payment".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::DepositAlreadyPending | Error::NoPendingDeposit => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not process the deposit".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::CreditApplicationDecided => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not decide the credit application".to_owned(),
                    details: "The application has already been approved or rejected. \
                    Try refreshing the page to see its current status."
                        .to_owned(),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found. \
                    Try refreshing the page to see if it has been removed."
                        .to_owned(),
                },
            ),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                Alert::Error {
                    message: "Permission denied".to_owned(),
                    details: "Only staff members can do this.".to_owned(),
                },
            ),
            Error::UpdateMissingCard => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update card".to_owned(),
                    details: "The card could not be found.".to_owned(),
                },
            ),
            Error::UpdateMissingSavingsGoal => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update savings goal".to_owned(),
                    details: "The savings goal could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingSavingsGoal => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete savings goal".to_owned(),
                    details: "The savings goal could not be found. \
                    Try refreshing the page to see if the goal has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCreditApplication => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update credit application".to_owned(),
                    details: "The credit application could not be found.".to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use crate::{
        Error,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[tokio::test]
    async fn insufficient_funds_alert_shows_message() {
        let response = Error::InsufficientDebitFunds.into_alert_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(
            text.contains("Insufficient funds for debit card"),
            "want alert text to contain the error message, got {text:?}"
        );
    }

    #[tokio::test]
    async fn pending_deposit_alert_is_a_conflict() {
        let response = Error::DepositAlreadyPending.into_alert_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unique_email_violation_maps_to_duplicate_email() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE user (id INTEGER PRIMARY KEY, email TEXT NOT NULL UNIQUE);
                INSERT INTO user (email) VALUES ('a@example.com');",
            )
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO user (email) VALUES ('a@example.com')", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicateEmail(String::new()));
    }
}
