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
use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    card::{CardId, get_card_for_user},
    deposit::request_deposit,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, loading_spinner, money,
    },
    navigation::NavBar,
};

/// The state needed for requesting a deposit.
#[derive(Debug, Clone)]
pub struct DepositState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DepositState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Form data for requesting a deposit.
#[derive(Debug, Deserialize)]
pub struct DepositForm {
    pub amount: Decimal,
}

/// Render the deposit form for one of the user's cards.
pub async fn get_deposit_page(
    State(state): State<DepositState>,
    Extension(user_id): Extension<UserID>,
    Path(card_id): Path<CardId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let card = get_card_for_user(card_id, user_id, &connection)?;
    let deposit_url = format_endpoint(endpoints::DEPOSIT_API, card.id);

    let nav_bar = NavBar::new(endpoints::CARDS_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-2" { "Deposit to " (card.name) }
            p class="mb-4" { "Balance: " (money(card.balance, card.currency)) }

            @if card.deposit_pending {
                p
                {
                    "A deposit of " (money(card.pending_deposit_amount, card.currency))
                    " is awaiting staff approval. "
                    a href=(endpoints::CARDS_VIEW) class=(LINK_STYLE) { "Back to cards" }
                }
            } @else {
                form
                    hx-post=(deposit_url)
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    class="w-full space-y-4 md:space-y-6"
                {
                    div
                    {
                        label for="amount" class=(FORM_LABEL_STYLE)
                        {
                            "Amount (" (card.currency) ")"
                        }

                        input
                            id="amount"
                            type="number"
                            name="amount"
                            step="0.01"
                            min="0.01"
                            placeholder="0.00"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "The money is added to your card once a staff member approves the deposit."
                    }

                    button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="htmx-indicator" { (loading_spinner()) }
                        "Request deposit"
                    }
                }
            }
        }
    };

    Ok(base("Deposit", &content).into_response())
}

/// Handle a deposit request and redirect to the card list on success.
pub async fn request_deposit_endpoint(
    State(state): State<DepositState>,
    Extension(user_id): Extension<UserID>,
    Path(card_id): Path<CardId>,
    Form(form): Form<DepositForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let card = match get_card_for_user(card_id, user_id, &connection) {
        Ok(card) => card,
        Err(error) => return error.into_alert_response(),
    };

    match request_deposit(&card, form.amount, OffsetDateTime::now_utc(), &connection) {
        Ok(_) => {
            tracing::info!("User {user_id} requested a deposit of {} to card {card_id}", form.amount);
            (
                HxRedirect(endpoints::CARDS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod request_deposit_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;

    use crate::{
        card::{CardType, get_card},
        endpoints,
        money::Currency,
        test_utils::{
            assert_hx_redirect, create_test_card, create_test_user, get_test_connection,
            parse_html_fragment,
        },
    };

    use super::{DepositForm, DepositState, request_deposit_endpoint};

    #[tokio::test]
    async fn redirects_to_cards() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(0));
        let state = DepositState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = request_deposit_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(card.id),
            Form(DepositForm { amount: dec!(50) }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CARDS_VIEW);
        let card = get_card(card.id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(card.deposit_pending);
        assert_eq!(card.pending_deposit_amount, dec!(50));
    }

    #[tokio::test]
    async fn second_request_shows_pending_message() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(0));
        let state = DepositState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        request_deposit_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(card.id),
            Form(DepositForm { amount: dec!(50) }),
        )
        .await;

        let response = request_deposit_endpoint(
            State(state),
            Extension(user.id),
            Path(card.id),
            Form(DepositForm { amount: dec!(10) }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("You already have a pending deposit. Awaiting staff approval."));
    }
}
