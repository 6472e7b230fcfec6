//! Password strength checks and hashing.
//!
//! A raw password becomes a [ValidatedPassword] once `zxcvbn` rates it hard
//! to guess, and only a [ValidatedPassword] can be hashed into a [PasswordHash].

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// The weakest `zxcvbn` score accepted for new passwords.
const MIN_PASSWORD_SCORE: Score = Score::Three;

/// A password strong enough to protect a bank account, before hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// `user_inputs` are other things the user typed, e.g. their email and
    /// names. A password built from them counts as weak.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with `zxcvbn`'s advice on making the password stronger.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let entropy = zxcvbn(raw_password, user_inputs);

        if entropy.score() >= MIN_PASSWORD_SCORE {
            return Ok(Self(raw_password.to_owned()));
        }

        let advice = entropy
            .feedback()
            .map(|feedback| feedback.to_string())
            .filter(|advice| !advice.trim().is_empty())
            .unwrap_or_else(|| "Use a longer password with fewer common words.".to_owned());

        Err(Error::TooWeak(advice))
    }

    /// Skip the strength check, e.g. for fixtures and the test database.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A salted bcrypt hash of a password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used outside of tests.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds of bcrypt.
    ///
    /// Tests use a low cost like 4 to stay fast.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Whether `raw_password` is the password this hash was made from.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        bcrypt::verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
