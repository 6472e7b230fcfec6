//! The log-in page and the endpoint that starts a session.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{
        Email, User, get_totp_secret, get_user_by_email, normalize_redirect_url, set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, field_error, loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
};

/// Session length when "remember me" is ticked.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";
pub const INACTIVE_ACCOUNT_ERROR_MSG: &str = "This account has been deactivated.";
pub const INVALID_OTP_ERROR_MSG: &str = "Invalid one-time code.";

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="find button"
            class="space-y-5"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            div {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }
                input
                    type="email" name="email" id="email" value=(email)
                    placeholder="you@example.com" autocomplete="username"
                    class=(FORM_TEXT_INPUT_STYLE) required autofocus;
            }

            (password_input("password", "Password", 0, false, None))

            div {
                label for="otp_token" class=(FORM_LABEL_STYLE) { "Authenticator code" }
                input
                    type="text" name="otp_token" id="otp_token"
                    inputmode="numeric" pattern="[0-9]{6}" maxlength="6"
                    autocomplete="one-time-code" placeholder="123456"
                    class=(FORM_TEXT_INPUT_STYLE) required;
            }

            label class="flex items-center gap-3 text-sm text-gray-900 dark:text-white" {
                input type="checkbox" name="remember_me" class=(FORM_CHECKBOX_STYLE);
                "Keep me logged in on this device for a week"
            }

            (field_error(error_message))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) {
                span id="indicator" class="htmx-indicator" { (loading_spinner()) }
                "Log in"
            }

            p class="text-sm text-gray-500 dark:text-gray-400" {
                "New to Bankroll? "
                a href=(endpoints::REGISTER_VIEW) class=(LINK_STYLE) { "Open an account" }
            }
        }
    }
}

/// Keep `raw_url` only if it is a safe place to send the user after logging in.
fn parse_redirect_url(raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url?;
    let redirect_url = normalize_redirect_url(raw_url);

    if redirect_url.is_none() {
        tracing::warn!("Ignoring redirect URL {raw_url:?}");
    }

    redirect_url
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
///
/// The auth guard sends users here with the page they wanted in `redirect_url`.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref());
    let form = log_in_form("", None, redirect_url.as_deref());

    base("Log In", &log_in_register("Log in to your account", &form)).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session lasts without "remember me".
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    #[cfg(test)]
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: crate::app_state::create_cookie_key(cookie_secret),
            cookie_duration: crate::auth::DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    pub email: String,
    pub password: String,
    /// The code shown by the user's authenticator app.
    pub otp_token: String,
    /// Checkboxes are only sent when ticked, so any value means "yes".
    pub remember_me: Option<String>,
    pub redirect_url: Option<String>,
}

/// Why a log-in attempt was turned down.
enum Rejection {
    /// Shown to the user next to the form.
    Form(&'static str),
    /// Logged, and the user is sent to the error page.
    Internal(Error),
}

/// Look up the account for `email`, check its password and then the one-time code.
///
/// Unknown emails and wrong passwords are indistinguishable to the caller so
/// that the form cannot be used to find out who banks here. The one-time code
/// is only checked once the password is known to be right.
fn check_credentials(
    user_data: &LogInData,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Rejection> {
    let email = Email::new(&user_data.email)
        .map_err(|_| Rejection::Form(INVALID_CREDENTIALS_ERROR_MSG))?;

    let user = match get_user_by_email(&email, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Rejection::Form(INVALID_CREDENTIALS_ERROR_MSG)),
        Err(error) => return Err(Rejection::Internal(error)),
    };

    if !user
        .password_hash
        .verify(&user_data.password)
        .map_err(Rejection::Internal)?
    {
        return Err(Rejection::Form(INVALID_CREDENTIALS_ERROR_MSG));
    }

    if !user.is_active {
        tracing::info!("Deactivated user {} tried to log in", user.id);
        return Err(Rejection::Form(INACTIVE_ACCOUNT_ERROR_MSG));
    }

    let secret = match get_totp_secret(user.id, connection) {
        Ok(secret) => secret,
        Err(Error::NotFound) => {
            tracing::warn!("User {} has no authenticator and cannot log in", user.id);
            return Err(Rejection::Form(INVALID_OTP_ERROR_MSG));
        }
        Err(error) => return Err(Rejection::Internal(error)),
    };

    if !secret
        .verify(&user.email, &user_data.otp_token, now)
        .map_err(Rejection::Internal)?
    {
        tracing::info!("User {} entered a wrong one-time code", user.id);
        return Err(Rejection::Form(INVALID_OTP_ERROR_MSG));
    }

    Ok(user)
}

/// Log the user in and send them to the page they asked for, or the home page.
///
/// Bad credentials re-render the form with an error message.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref());

    let result = match state.db_connection.lock() {
        Ok(connection) => check_credentials(&user_data, OffsetDateTime::now_utc(), &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Rejection::Internal(Error::DatabaseLockError))
        }
    };

    let user = match result {
        Ok(user) => user,
        Err(Rejection::Form(message)) => {
            return log_in_form(&user_data.email, Some(message), redirect_url.as_deref())
                .into_response();
        }
        Err(Rejection::Internal(error)) => {
            tracing::error!("Could not check credentials: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let cookie_duration = match user_data.remember_me {
        Some(_) => REMEMBER_ME_COOKIE_DURATION,
        None => state.cookie_duration,
    };

    match set_auth_cookie(jar, user.id, cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(redirect_url.unwrap_or_else(|| endpoints::ROOT.to_owned())),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not set the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod log_in_page_tests {
    use axum::{extract::Query, http::StatusCode};
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    use super::{RedirectQuery, get_log_in_page};

    async fn redirect_inputs(redirect_url: Option<&str>) -> Vec<String> {
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: redirect_url.map(str::to_owned),
        }))
        .await;
        let document = parse_html_document(response).await;
        let selector = Selector::parse("input[name=redirect_url]").unwrap();

        document
            .select(&selector)
            .filter_map(|input| input.value().attr("value").map(str::to_owned))
            .collect()
    }

    #[tokio::test]
    async fn log_in_page_has_form_and_register_link() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None })).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::LOG_IN_API, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "otp_token", "text");
        assert_form_submit_button(&form);

        let links: Vec<_> = form
            .select(&Selector::parse("a[href]").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(links, [endpoints::REGISTER_VIEW]);
    }

    #[tokio::test]
    async fn log_in_page_carries_redirect_url_into_form() {
        let target = "/cards/1/statement?start_date=2025-10-01";

        assert_eq!(redirect_inputs(Some(target)).await, [target]);
    }

    #[tokio::test]
    async fn log_in_page_drops_external_redirect_url() {
        assert!(
            redirect_inputs(Some("https://example.com/phish"))
                .await
                .is_empty()
        );
    }
}
