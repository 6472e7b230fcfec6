//! The staff decision on a single deposit.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    card::CardId,
    deposit::{approve_deposit, get_pending_deposit, reject_deposit},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base, money,
    },
    navigation::NavBar,
};

/// The state needed for deciding on a deposit.
#[derive(Debug, Clone)]
pub struct DepositDecisionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DepositDecisionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The staff decision. An unticked checkbox is not sent, which rejects the deposit.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionForm {
    pub approved: Option<String>,
}

impl DecisionForm {
    pub fn is_approved(&self) -> bool {
        self.approved.is_some()
    }
}

/// Render the decision form for the pending deposit on a card.
pub async fn get_deposit_decision_page(
    State(state): State<DepositDecisionState>,
    Path(card_id): Path<CardId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let deposit = get_pending_deposit(card_id, &connection)?;
    let decision_url = format_endpoint(endpoints::DEPOSIT_DECISION_API, card_id);

    let nav_bar = NavBar::staff(endpoints::DEPOSIT_QUEUE_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Deposit decision" }

            dl class="w-full mb-4 grid grid-cols-2 gap-2"
            {
                dt class="font-medium" { "Owner" }
                dd { (deposit.owner_email) }
                dt class="font-medium" { "Card" }
                dd { (deposit.card_name) }
                dt class="font-medium" { "Account number" }
                dd class="font-mono" { (deposit.account_no) }
                dt class="font-medium" { "Amount" }
                dd { (money(deposit.amount, deposit.currency)) }
            }

            form
                hx-post=(decision_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                div class="flex items-center gap-2"
                {
                    input
                        id="approved"
                        type="checkbox"
                        name="approved"
                        value="on"
                        class=(FORM_CHECKBOX_STYLE);
                    label for="approved" { "Approve this deposit" }
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Submitting without ticking the box rejects the deposit."
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Submit decision" }
            }

            a href=(endpoints::DEPOSIT_QUEUE_VIEW) class=(LINK_STYLE) { "Back to the queue" }
        }
    };

    Ok(base("Deposit decision", &content).into_response())
}

/// Approve or reject the pending deposit on a card and return to the queue.
pub async fn decide_deposit_endpoint(
    State(state): State<DepositDecisionState>,
    Extension(staff_id): Extension<UserID>,
    Path(card_id): Path<CardId>,
    Form(form): Form<DecisionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = if form.is_approved() {
        approve_deposit(card_id, &connection)
    } else {
        reject_deposit(card_id, &connection)
    };

    match result {
        Ok(_) => {
            tracing::info!(
                "Staff member {staff_id} {} the deposit on card {card_id}",
                if form.is_approved() { "approved" } else { "rejected" }
            );
            (
                HxRedirect(endpoints::DEPOSIT_QUEUE_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
