//! The page and endpoint for changing the password of the logged in user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::{
        PasswordHash, UserID, ValidatedPassword, get_user_by_id,
        register_user::PASSWORD_INPUT_MIN_LENGTH, update_password,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, password_input},
    navigation::NavBar,
};

/// The state needed for changing a password.
#[derive(Debug, Clone)]
pub struct ChangePasswordState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used to hash the new password.
    pub hash_cost: u32,
}

impl FromRef<AppState> for ChangePasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default)]
struct ChangePasswordErrors<'a> {
    old_password: Option<&'a str>,
    new_password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

const INCORRECT_PASSWORD_MSG: &str = "Incorrect password.";
const PASSWORDS_DO_NOT_MATCH_MSG: &str = "Passwords do not match";

fn change_password_form(errors: &ChangePasswordErrors, alert: Option<Alert>) -> Markup {
    html! {
        form
            hx-post=(endpoints::CHANGE_PASSWORD_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(alert) = alert {
                (alert.into_markup())
            }

            (password_input("old_password", "Current password", 0, true, errors.old_password))
            (password_input("new_password", "New password", PASSWORD_INPUT_MIN_LENGTH, false, errors.new_password))
            (password_input("confirm_password", "Confirm new password", PASSWORD_INPUT_MIN_LENGTH, false, errors.confirm_password))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change Password" }
        }
    }
}

/// Render the page for changing the user's password.
pub async fn get_change_password_page(
    State(state): State<ChangePasswordState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;
        get_user_by_id(user_id, &connection)?
    };

    let nav_bar = NavBar::for_user(user.is_staff, endpoints::PROFILE_VIEW).into_html();
    let form = change_password_form(&ChangePasswordErrors::default(), None);
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Change Password" }
            (form)
        }
    };

    Ok(base("Change Password", &content).into_response())
}

/// Replace the user's password after checking the current one.
///
/// On success the emptied form is returned with a success alert.
pub async fn change_password_endpoint(
    State(state): State<ChangePasswordState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => {
            tracing::error!("could not get user {user_id}: {error}");
            return error.into_alert_response();
        }
    };

    match user.password_hash.verify(&form.old_password) {
        Ok(true) => {}
        Ok(false) => {
            let errors = ChangePasswordErrors {
                old_password: Some(INCORRECT_PASSWORD_MSG),
                ..Default::default()
            };
            return change_password_form(&errors, None).into_response();
        }
        Err(error) => {
            tracing::error!("could not verify password: {error}");
            return error.into_alert_response();
        }
    }

    let user_inputs = [
        user.email.as_ref(),
        user.first_name.as_str(),
        user.last_name.as_str(),
    ];
    let validated_password = match ValidatedPassword::new(&form.new_password, &user_inputs) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            let errors = ChangePasswordErrors {
                new_password: Some(&message),
                ..Default::default()
            };
            return change_password_form(&errors, None).into_response();
        }
    };

    if form.new_password != form.confirm_password {
        let errors = ChangePasswordErrors {
            confirm_password: Some(PASSWORDS_DO_NOT_MATCH_MSG),
            ..Default::default()
        };
        return change_password_form(&errors, None).into_response();
    }

    let result = PasswordHash::new(validated_password, state.hash_cost)
        .and_then(|hash| update_password(user_id, &hash, &connection));

    match result {
        Ok(()) => {
            tracing::info!("User {user_id} changed their password");
            let alert = Alert::SuccessSimple {
                message: "Your password has been changed.".to_owned(),
            };
            change_password_form(&ChangePasswordErrors::default(), Some(alert)).into_response()
        }
        Err(error) => {
            tracing::error!("could not change password for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
