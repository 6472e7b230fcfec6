//! Middleware that only lets logged-in users through and keeps their session alive.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    },
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session lasts without activity.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How an unauthenticated client is sent to the log-in page.
#[derive(Clone, Copy)]
enum LogInRedirect {
    /// A plain 303 for full page loads.
    Page,
    /// An `HX-Redirect` so that HTMX navigates the whole page instead of
    /// swapping the log-in page into a fragment.
    Htmx,
}

impl LogInRedirect {
    fn respond(self, log_in_url: String) -> Response {
        match self {
            LogInRedirect::Page => Redirect::to(&log_in_url).into_response(),
            LogInRedirect::Htmx => (HxRedirect(log_in_url), StatusCode::OK).into_response(),
        }
    }
}

async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    redirect: LogInRedirect,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::<Key>::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read the cookie jar: {error:?}");
            let request = Request::from_parts(parts, body);
            return redirect.respond(build_log_in_redirect_url(&request));
        }
    };

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(_) => {
            let request = Request::from_parts(parts, body);
            return redirect.respond(build_log_in_redirect_url(&request));
        }
    };

    parts.extensions.insert(token.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not extend the session of user {}: {error}", token.user_id);
            jar
        }
    };

    let (mut parts, body) = response.into_parts();
    let jar_response = jar.into_response();
    for cookie in jar_response.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, cookie.clone());
    }

    Response::from_parts(parts, body)
}

/// Reject requests without a valid session by redirecting to the log-in page.
///
/// The user's ID is added to the request, so handlers can take
/// `Extension(user_id): Extension<UserID>`. Each request through the guard
/// pushes the session's expiry out to [AuthState::cookie_duration] from now.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, LogInRedirect::Page).await
}

/// [auth_guard] for routes called by HTMX, which redirects with `HX-Redirect`.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, LogInRedirect::Htmx).await
}

impl AuthState {
    /// Session settings using the default session length.
    #[cfg(test)]
    pub(crate) fn with_key(cookie_key: Key) -> Self {
        Self {
            cookie_key,
            cookie_duration: crate::auth::DEFAULT_COOKIE_DURATION,
        }
    }
}
