//! Reading and writing the encrypted session cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID, auth::token::Token};

pub(crate) const COOKIE_TOKEN: &str = "token";
/// How long a session lasts without activity.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

fn session_cookie(value: String, expires_at: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((COOKIE_TOKEN, value))
        .expires(expires_at)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

fn store_token(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(&token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(session_cookie(value, token.expires_at)))
}

/// Log `user_id` in for `duration` by adding a session cookie to `jar`.
///
/// # Errors
///
/// Returns an error if the token cannot be created or serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    store_token(jar, Token::new(user_id, duration)?)
}

/// Overwrite the session cookie with one the browser discards immediately.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut cookie = session_cookie("deleted".to_owned(), OffsetDateTime::UNIX_EPOCH);
    cookie.set_max_age(Duration::ZERO);

    jar.add(cookie)
}

/// The unexpired token in the session cookie.
///
/// # Errors
///
/// Returns [Error::CookieMissing] if there is no session cookie and
/// [Error::InvalidCredentials] if it is unreadable or expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;

    match serde_json::from_str::<Token>(cookie.value_trimmed()) {
        Ok(token) if !token.is_expired() => Ok(token),
        _ => Err(Error::InvalidCredentials),
    }
}

/// Push the session's expiry out to at least `duration` from now.
///
/// The jar is returned unchanged in the error case.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?.renewed(duration)?;

    store_token(jar, token)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{
            UserID,
            cookie::{
                COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, extend_auth_cookie_duration_if_needed,
                get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
            },
        },
    };

    fn empty_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::from(&Sha512::digest(b"bankroll-cookie-tests")))
    }

    fn logged_in_jar(duration: Duration) -> PrivateCookieJar {
        set_auth_cookie(empty_jar(), UserID::new(12), duration).unwrap()
    }

    #[track_caller]
    fn assert_expires_in(expires_at: OffsetDateTime, want: Duration) {
        let got = expires_at - OffsetDateTime::now_utc();
        assert!(
            (got - want).abs() <= Duration::seconds(1),
            "want expiry in about {want}, got {got}"
        );
    }

    #[test]
    fn session_cookie_holds_user_and_expiry() {
        let jar = logged_in_jar(DEFAULT_COOKIE_DURATION);

        let token = get_token_from_cookies(&jar).unwrap();
        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(token.user_id, UserID::new(12));
        assert_expires_in(token.expires_at, DEFAULT_COOKIE_DURATION);
        assert_eq!(cookie.expires_datetime(), Some(token.expires_at));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }

    #[test]
    fn jar_without_session_reports_missing_cookie() {
        assert_eq!(
            get_token_from_cookies(&empty_jar()),
            Err(Error::CookieMissing)
        );
    }

    #[test]
    fn unreadable_session_is_rejected() {
        let jar = empty_jar().add(Cookie::new(COOKIE_TOKEN, "{\"user_id\":12}"));

        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn expired_session_is_rejected() {
        let jar = logged_in_jar(Duration::seconds(-30));

        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn activity_slides_short_session_forward() {
        let jar = logged_in_jar(Duration::seconds(10));

        let jar = extend_auth_cookie_duration_if_needed(jar, DEFAULT_COOKIE_DURATION).unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_expires_in(token.expires_at, DEFAULT_COOKIE_DURATION);
        assert_eq!(
            jar.get(COOKIE_TOKEN).unwrap().expires_datetime(),
            Some(token.expires_at)
        );
    }

    #[test]
    fn activity_does_not_cut_remembered_session_short() {
        let jar = logged_in_jar(Duration::days(7));

        let jar = extend_auth_cookie_duration_if_needed(jar, DEFAULT_COOKIE_DURATION).unwrap();

        assert_expires_in(
            get_token_from_cookies(&jar).unwrap().expires_at,
            Duration::days(7),
        );
    }

    #[test]
    fn extending_expired_session_fails() {
        let jar = logged_in_jar(Duration::seconds(-30));

        let result = extend_auth_cookie_duration_if_needed(jar, DEFAULT_COOKIE_DURATION);

        assert!(matches!(result, Err(Error::InvalidCredentials)));
    }

    #[test]
    fn logging_out_replaces_session() {
        let jar = invalidate_auth_cookie(logged_in_jar(DEFAULT_COOKIE_DURATION));

        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }
}
