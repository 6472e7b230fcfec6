//! Transfers between two cards of the same user.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    card::{CardId, get_card_for_user, get_cards_for_user},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base, loading_spinner},
    navigation::NavBar,
    transfer::{
        TransferState,
        form::{amount_input, card_select},
        transfer_funds,
    },
};

/// Form data for a transfer between the user's own cards.
#[derive(Debug, Deserialize)]
pub struct TransferBetweenCardsForm {
    pub from_card_id: CardId,
    pub to_card_id: CardId,
    pub amount: Decimal,
}

/// Render the form for moving money between the user's cards.
pub async fn get_transfer_between_cards_page(
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
            h1 class="text-xl font-bold mb-4" { "Transfer between my cards" }

            @if cards.len() < 2 {
                p
                {
                    "You need at least two cards to move money between them. "
                    a href=(endpoints::NEW_CARD_VIEW) class=(LINK_STYLE) { "Open a card" }
                }
            } @else {
                form
                    hx-post=(endpoints::TRANSFER_BETWEEN_CARDS_API)
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (card_select("from_card_id", "From", &cards))
                    (card_select("to_card_id", "To", &cards))
                    (amount_input())

                    button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="htmx-indicator" { (loading_spinner()) }
                        "Transfer"
                    }
                }
            }
        }
    };

    Ok(base("Transfer between my cards", &content).into_response())
}

/// Handle a transfer between the user's cards and redirect to the card list on success.
pub async fn transfer_between_cards_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransferBetweenCardsForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let cards = get_card_for_user(form.from_card_id, user_id, &connection).and_then(|sender| {
        get_card_for_user(form.to_card_id, user_id, &connection).map(|receiver| (sender, receiver))
    });
    let (sender, receiver) = match cards {
        Ok(cards) => cards,
        Err(error) => return error.into_alert_response(),
    };

    match transfer_funds(
        &sender,
        &receiver,
        form.amount,
        state.usd_to_byn_rate,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(_) => {
            tracing::info!(
                "User {user_id} moved {} from card {} to card {}",
                form.amount,
                sender.id,
                receiver.id
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
