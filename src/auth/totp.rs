//! One-time codes from an authenticator app, asked for after the password when logging in.
//!
//! Each user gets a random secret when their account is created. The profile
//! page shows it as an `otpauth://` URL that authenticator apps can import.

use rand::Rng;
use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::{
    Error,
    auth::{Email, UserID},
};

const ISSUER: &str = "Bankroll";
const CODE_DIGITS: usize = 6;
const STEP_SECONDS: u64 = 30;
/// Codes from one step either side of the current one are also accepted.
const ALLOWED_SKEW: u8 = 1;
const SECRET_BYTES: usize = 20;

/// A base32 encoded TOTP secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpSecret(String);

impl TotpSecret {
    /// A new random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill(&mut bytes);

        Self(Secret::Raw(bytes.to_vec()).to_encoded().to_string())
    }

    fn authenticator(&self, email: &Email) -> Result<TOTP, Error> {
        let secret = Secret::Encoded(self.0.clone())
            .to_bytes()
            .map_err(|error| Error::TotpError(format!("{error:?}")))?;

        TOTP::new(
            Algorithm::SHA1,
            CODE_DIGITS,
            ALLOWED_SKEW,
            STEP_SECONDS,
            secret,
            Some(ISSUER.to_owned()),
            email.to_string(),
        )
        .map_err(|error| Error::TotpError(error.to_string()))
    }

    /// The `otpauth://totp/...` URL for adding this secret to an authenticator app.
    ///
    /// # Errors
    ///
    /// Returns [Error::TotpError] if the stored secret is malformed.
    pub fn otpauth_url(&self, email: &Email) -> Result<String, Error> {
        Ok(self.authenticator(email)?.get_url())
    }

    /// Whether `code` is the current code, or one step either side of it, at `now`.
    ///
    /// # Errors
    ///
    /// Returns [Error::TotpError] if the stored secret is malformed.
    pub fn verify(&self, email: &Email, code: &str, now: OffsetDateTime) -> Result<bool, Error> {
        let Ok(timestamp) = u64::try_from(now.unix_timestamp()) else {
            return Ok(false);
        };

        Ok(self.authenticator(email)?.check(code.trim(), timestamp))
    }

    #[cfg(test)]
    pub fn code_at(&self, email: &Email, time: OffsetDateTime) -> String {
        self.authenticator(email)
            .unwrap()
            .generate(time.unix_timestamp() as u64)
    }
}

/// Give `user_id` a new authenticator secret.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the user already has a secret or does not exist.
pub fn create_totp_device(user_id: UserID, connection: &Connection) -> Result<TotpSecret, Error> {
    let secret = TotpSecret::generate();

    connection.execute(
        "INSERT INTO totp_device (user_id, secret) VALUES (?1, ?2)",
        (user_id.as_i64(), &secret.0),
    )?;

    Ok(secret)
}

/// The authenticator secret of `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user has no authenticator set up.
pub fn get_totp_secret(user_id: UserID, connection: &Connection) -> Result<TotpSecret, Error> {
    connection
        .query_row(
            "SELECT secret FROM totp_device WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0).map(TotpSecret),
        )
        .optional()?
        .ok_or(Error::NotFound)
}

/// Create the table for authenticator secrets.
pub fn create_totp_device_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS totp_device (
            user_id INTEGER PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
            secret TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

#[cfg(test)]
mod totp_tests {
    use time::{Duration, macros::datetime};

    use crate::{
        Error,
        auth::{Email, UserID},
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{TotpSecret, create_totp_device, get_totp_secret};

    fn email() -> Email {
        Email::new_unchecked("anna@example.com")
    }

    #[test]
    fn current_code_is_accepted() {
        let secret = TotpSecret::generate();
        let now = datetime!(2025-03-01 12:00:10 UTC);
        let code = secret.code_at(&email(), now);

        assert_eq!(secret.verify(&email(), &code, now), Ok(true));
    }

    #[test]
    fn code_from_previous_step_is_accepted() {
        let secret = TotpSecret::generate();
        let now = datetime!(2025-03-01 12:00:10 UTC);
        let code = secret.code_at(&email(), now - Duration::seconds(30));

        assert_eq!(secret.verify(&email(), &code, now), Ok(true));
    }

    #[test]
    fn stale_code_is_rejected() {
        let secret = TotpSecret::generate();
        let now = datetime!(2025-03-01 12:00:10 UTC);
        let code = secret.code_at(&email(), now - Duration::minutes(5));

        assert_eq!(secret.verify(&email(), &code, now), Ok(false));
    }

    #[test]
    fn code_for_another_secret_is_rejected() {
        let now = datetime!(2025-03-01 12:00:10 UTC);
        let code = TotpSecret::generate().code_at(&email(), now);

        assert_eq!(TotpSecret::generate().verify(&email(), &code, now), Ok(false));
    }

    #[test]
    fn otpauth_url_names_bank_and_user() {
        let url = TotpSecret::generate().otpauth_url(&email()).unwrap();

        assert!(url.starts_with("otpauth://totp/Bankroll:"), "got {url}");
        assert!(url.contains("anna%40example.com"), "got {url}");
        assert!(url.contains("issuer=Bankroll"), "got {url}");
    }

    #[test]
    fn device_is_stored_per_user() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");

        let secret = create_totp_device(user.id, &connection).unwrap();

        assert_eq!(get_totp_secret(user.id, &connection), Ok(secret));
        assert_eq!(
            get_totp_secret(UserID::new(user.id.as_i64() + 1), &connection),
            Err(Error::NotFound)
        );
        assert!(create_totp_device(user.id, &connection).is_err());
    }
}
