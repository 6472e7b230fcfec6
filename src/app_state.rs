//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use rust_decimal::Decimal;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, timezone::get_timezone};

/// The exchange rate and credit terms the bank operates with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankingRules {
    /// How many Belarusian rubles one US dollar buys.
    pub usd_to_byn_rate: Decimal,
    /// The yearly interest rate for new credits as a percentage, e.g. 5.0 for 5%.
    pub credit_interest_rate: Decimal,
    /// The number of monthly repayments for new credits.
    pub credit_term_months: u32,
}

impl BankingRules {
    /// Create a new set of rules.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidBankingRules] if the exchange rate is not
    /// positive, the interest rate is negative or the term is zero months.
    pub fn new(
        usd_to_byn_rate: Decimal,
        credit_interest_rate: Decimal,
        credit_term_months: u32,
    ) -> Result<Self, Error> {
        if usd_to_byn_rate <= Decimal::ZERO {
            return Err(Error::InvalidBankingRules(format!(
                "the exchange rate must be positive, got {usd_to_byn_rate}"
            )));
        }

        if credit_interest_rate < Decimal::ZERO {
            return Err(Error::InvalidBankingRules(format!(
                "the interest rate cannot be negative, got {credit_interest_rate}"
            )));
        }

        if credit_term_months == 0 {
            return Err(Error::InvalidBankingRules(
                "the credit term must be at least one month".to_owned(),
            ));
        }

        Ok(Self {
            usd_to_byn_rate,
            credit_interest_rate,
            credit_term_months,
        })
    }
}

impl Default for BankingRules {
    fn default() -> Self {
        Self {
            usd_to_byn_rate: Decimal::new(3116, 3),
            credit_interest_rate: Decimal::new(5, 0),
            credit_term_months: 12,
        }
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Europe/Minsk".
    pub local_timezone: String,

    /// The exchange rate and credit terms.
    pub banking_rules: BankingRules,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Europe/Minsk".
    ///
    /// # Errors
    /// Returns an error if `local_timezone` is unknown or the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        banking_rules: BankingRules,
    ) -> Result<Self, Error> {
        get_timezone(local_timezone)?;
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            banking_rules,
            db_connection: connection,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
