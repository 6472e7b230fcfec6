//! The session token stored, encrypted, in the auth cookie.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// Identifies a logged-in user until `expires_at`.
///
/// The expiry is stored as a Unix timestamp, so it is only precise to the second.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub user_id: UserID,
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// A token for `user_id` that expires `lifetime` from now.
    ///
    /// # Errors
    ///
    /// Returns [Error::SessionExpiryOutOfRange] if the expiry cannot be represented.
    pub fn new(user_id: UserID, lifetime: Duration) -> Result<Self, Error> {
        let expires_at = OffsetDateTime::now_utc().unix_timestamp() + lifetime.whole_seconds();

        Ok(Self {
            user_id,
            expires_at: OffsetDateTime::from_unix_timestamp(expires_at)
                .map_err(|_| Error::SessionExpiryOutOfRange)?,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }

    /// The later of this token and a fresh one lasting `lifetime`.
    ///
    /// Sessions slide forward on activity but are never shortened, so a
    /// "remember me" session keeps its week.
    pub fn renewed(self, lifetime: Duration) -> Result<Self, Error> {
        let fresh = Self::new(self.user_id, lifetime)?;

        Ok(if fresh.expires_at > self.expires_at {
            fresh
        } else {
            self
        })
    }
}
