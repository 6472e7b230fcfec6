//! Applying for a credit.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    credit::{
        CreditApplicationForm, NewCreditApplication, PURPOSE_MAX_LENGTH,
        create_credit_application,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, loading_spinner,
    },
    navigation::NavBar,
};

/// The state needed for applying for a credit.
#[derive(Debug, Clone)]
pub struct ApplyCreditState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ApplyCreditState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn credit_application_form(amount: &str, purpose: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::CREDIT_APPLICATIONS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { "Error: " (error_message) }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount (BYN)" }
                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    value=(amount)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="purpose" class=(FORM_LABEL_STYLE) { "Purpose" }
                textarea
                    id="purpose"
                    name="purpose"
                    rows="3"
                    maxlength=(PURPOSE_MAX_LENGTH)
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                { (purpose) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" { (loading_spinner()) }
                "Submit application"
            }
        }
    }
}

/// Render the credit application form.
pub async fn get_apply_credit_page() -> Response {
    let nav_bar = NavBar::new(endpoints::CREDITS_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Apply for a credit" }
            (credit_application_form("", "", None))
        }
    };

    base("Apply for a Credit", &content).into_response()
}

/// Submit a credit application and redirect to the credits page.
///
/// Invalid input re-renders the form with an error message.
pub async fn apply_credit_endpoint(
    State(state): State<ApplyCreditState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CreditApplicationForm>,
) -> Response {
    let new_application = match NewCreditApplication::new(
        user_id,
        form.amount,
        &form.purpose,
        OffsetDateTime::now_utc(),
    ) {
        Ok(new_application) => new_application,
        Err(error) => {
            return credit_application_form(
                &form.amount.to_string(),
                &form.purpose,
                Some(&error.to_string()),
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_credit_application(new_application, &connection) {
        Ok(application) => {
            tracing::info!(
                "User {user_id} applied for credit {} of {} BYN",
                application.id,
                application.amount
            );
            (
                HxRedirect(endpoints::CREDITS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create credit application for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
