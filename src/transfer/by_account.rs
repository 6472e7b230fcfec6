//! Transfers to any card by its account number.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    card::{CardId, get_card_for_user, get_cards_for_user},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    transfer::{
        form::{amount_input, card_select},
        transfer_by_account_number,
    },
};

/// The state needed for transfers.
#[derive(Debug, Clone)]
pub struct TransferState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub usd_to_byn_rate: Decimal,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            usd_to_byn_rate: state.banking_rules.usd_to_byn_rate,
        }
    }
}

/// Form data for a transfer by account number.
#[derive(Debug, Deserialize)]
pub struct TransferByAccountForm {
    pub card_id: CardId,
    pub receiver_account_number: String,
    pub amount: Decimal,
}

/// Render the form for sending money to an account number.
pub async fn get_transfer_by_account_page(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let cards = get_cards_for_user(user_id, &connection)?;

    let nav_bar = NavBar::new(endpoints::TRANSFERS_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Transfer by account number" }

            @if cards.is_empty() {
                p
                {
                    "You need a card to send money. "
                    a href=(endpoints::NEW_CARD_VIEW) class=(LINK_STYLE) { "Open a card" }
                }
            } @else {
                form
                    hx-post=(endpoints::TRANSFER_BY_ACCOUNT_API)
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (card_select("card_id", "From", &cards))

                    div
                    {
                        label for="receiver_account_number" class=(FORM_LABEL_STYLE)
                        {
                            "Receiver account number"
                        }

                        input
                            id="receiver_account_number"
                            type="text"
                            name="receiver_account_number"
                            inputmode="numeric"
                            pattern="[0-9 ]{16,}"
                            placeholder="1234567890123456"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    (amount_input())

                    button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="htmx-indicator" { (loading_spinner()) }
                        "Send"
                    }
                }
            }
        }
    };

    Ok(base("Transfer by account number", &content).into_response())
}

/// Handle a transfer by account number and redirect to the card list on success.
pub async fn transfer_by_account_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransferByAccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let sender = match get_card_for_user(form.card_id, user_id, &connection) {
        Ok(card) => card,
        Err(error) => return error.into_alert_response(),
    };

    match transfer_by_account_number(
        &sender,
        &form.receiver_account_number,
        form.amount,
        state.usd_to_byn_rate,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(outcome) => {
            tracing::info!(
                "User {user_id} sent {} from card {} to card {}",
                form.amount,
                outcome.sender.id,
                outcome.receiver.id
            );
            (
                HxRedirect(endpoints::CARDS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
