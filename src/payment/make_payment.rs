//! Paying for purchases with a card.

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
use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    card::{Card, CardId, CardType, get_card_for_user, get_cards_for_user, update_card_funds},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, loading_spinner,
    },
    money::{Currency, convert, format_money, require_positive},
    navigation::NavBar,
    payment::{NewPayment, PaymentKind, create_payment},
};

/// Charge `amount`, priced in rubles, to `card`.
///
/// A dollar card is debited the amount converted at `usd_to_byn_rate`.
/// A purchase payment in rubles is recorded and the card balance reduced in
/// a single transaction.
///
/// # Errors
///
/// Checked in this order:
/// - [Error::NonPositiveAmount] if `amount`, or the converted debit, rounds to zero or below,
/// - [Error::DepositNotAllowed] for a credit card that is blocked,
/// - [Error::InsufficientCreditFunds] for a credit card with a balance below the debit,
/// - [Error::InsufficientDebitFunds] for a debit card with a balance below the debit.
pub fn pay_with_card(
    card: &Card,
    amount: Decimal,
    usd_to_byn_rate: Decimal,
    timestamp: OffsetDateTime,
    connection: &Connection,
) -> Result<Card, Error> {
    let amount = require_positive(amount)?;
    let debit = convert(amount, Currency::Byn, card.currency, usd_to_byn_rate)?;
    if debit.is_zero() {
        return Err(Error::NonPositiveAmount);
    }

    match card.card_type {
        CardType::Credit if !card.is_deposit_allowed => return Err(Error::DepositNotAllowed),
        CardType::Credit if card.balance < debit => return Err(Error::InsufficientCreditFunds),
        CardType::Debit if card.balance < debit => return Err(Error::InsufficientDebitFunds),
        _ => {}
    }

    let transaction = connection.unchecked_transaction()?;

    create_payment(
        NewPayment {
            card_id: card.id,
            amount,
            currency: Currency::Byn,
            card_type: card.card_type,
            kind: PaymentKind::Purchase,
            timestamp,
            deposit_pending: false,
        },
        &transaction,
    )?;

    let mut updated_card = card.clone();
    updated_card.balance -= debit;
    update_card_funds(&updated_card, &transaction)?;

    transaction.commit()?;

    Ok(updated_card)
}

/// The state needed for making a payment.
#[derive(Debug, Clone)]
pub struct PaymentState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// How many rubles one dollar buys.
    pub usd_to_byn_rate: Decimal,
}

impl FromRef<AppState> for PaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            usd_to_byn_rate: state.banking_rules.usd_to_byn_rate,
        }
    }
}

/// Form data for making a payment.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub card_id: CardId,
    /// The price in rubles.
    pub amount: Decimal,
}

/// Render the payment form with a choice of the user's cards.
pub async fn get_new_payment_page(
    State(state): State<PaymentState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let cards = get_cards_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve cards for user {user_id}: {error}"))?;

    let nav_bar = NavBar::new(endpoints::CARDS_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Make a Payment" }

            @if cards.is_empty() {
                p
                {
                    "You need a card to make payments. "
                    a href=(endpoints::NEW_CARD_VIEW) class=(LINK_STYLE) { "Open a card" }
                }
            } @else {
                (payment_form(&cards, state.usd_to_byn_rate))
            }
        }
    };

    Ok(base("Make a Payment", &content).into_response())
}

fn payment_form(cards: &[Card], usd_to_byn_rate: Decimal) -> Markup {
    html! {
        form
            hx-post=(endpoints::PAYMENTS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="card_id" class=(FORM_LABEL_STYLE) { "Card" }

                select id="card_id" name="card_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for card in cards {
                        option value=(card.id)
                        {
                            (card.name) " (" (format_money(card.balance, card.currency)) ")"
                        }
                    }
                }
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
                    class=(FORM_TEXT_INPUT_STYLE);

                p class="mt-1 text-sm text-gray-500 dark:text-gray-400"
                {
                    "Dollar cards are charged at 1 USD = " (usd_to_byn_rate) " BYN."
                }
            }

            button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="htmx-indicator" { (loading_spinner()) }
                "Pay"
            }
        }
    }
}

/// Handle the payment form submission.
///
/// On success the client is redirected to the statement of the card.
pub async fn make_payment_endpoint(
    State(state): State<PaymentState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<PaymentForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let card = match get_card_for_user(form.card_id, user_id, &connection) {
        Ok(card) => card,
        Err(error) => {
            tracing::warn!("User {user_id} tried to pay with card {}: {error}", form.card_id);
            return error.into_alert_response();
        }
    };

    match pay_with_card(
        &card,
        form.amount,
        state.usd_to_byn_rate,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(_) => {
            tracing::info!("User {user_id} paid {} BYN with card {}", form.amount, card.id);
            (
                HxRedirect(format_endpoint(endpoints::CARD_STATEMENT_VIEW, card.id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::info!("Payment with card {} failed: {error}", card.id);
            error.into_alert_response()
        }
    }
}
