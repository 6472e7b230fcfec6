//! Card opening page and endpoint.

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

use crate::{
    AppState, Error,
    auth::UserID,
    card::{
        CARD_NAME_MAX_LENGTH, CardName, CardType, NewCard, create_card, domain::CardFormData,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    money::Currency,
    navigation::NavBar,
};

/// The state needed for opening a card.
#[derive(Debug, Clone)]
pub struct CreateCardEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCardEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for opening a card.
pub async fn get_new_card_page() -> Response {
    new_card_view().into_response()
}

/// Handle the card opening form submission.
pub async fn create_card_endpoint(
    State(state): State<CreateCardEndpointState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CardFormData>,
) -> Response {
    let name = match CardName::new(&form.name) {
        Ok(name) => name,
        Err(error) => {
            return new_card_form_view(&form.name, &format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_card = NewCard {
        user_id,
        name,
        card_type: form.card_type,
        currency: form.currency,
    };

    match create_card(new_card, &connection) {
        Ok(card) => {
            tracing::info!(
                "User {user_id} opened {} {} card {}",
                card.currency,
                card.card_type,
                card.id
            );
            (
                HxRedirect(endpoints::CARDS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while opening a card: {error}");
            error.into_alert_response()
        }
    }
}

fn new_card_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::CARDS_VIEW).into_html();
    let form = new_card_form_view("", "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Open a Card" }
            (form)
        }
    };

    base("Open Card", &content)
}

fn new_card_form_view(name: &str, error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::CARDS_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Card Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(name)
                    placeholder="Everyday spending"
                    maxlength=(CARD_NAME_MAX_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Card type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for (index, card_type) in CardType::ALL.into_iter().enumerate() {
                        @let id = format!("card-type-{}", card_type.form_value());

                        div class="flex items-center gap-3"
                        {
                            input
                                name="card_type"
                                id=(id)
                                type="radio"
                                value=(card_type.form_value())
                                checked[index == 0]
                                required
                                tabindex="0"
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (card_type) }
                        }
                    }
                }
            }

            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Currency" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for (index, currency) in Currency::ALL.into_iter().enumerate() {
                        @let id = format!("currency-{}", currency.code());

                        div class="flex items-center gap-3"
                        {
                            input
                                name="currency"
                                id=(id)
                                type="radio"
                                value=(currency.code())
                                checked[index == 0]
                                required
                                tabindex="0"
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (currency) }
                        }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Open Card" }
        }
    }
}

#[cfg(test)]
mod new_card_page_tests {
    use axum::http::StatusCode;

    use crate::{
        card::get_new_card_page,
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button,
            assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_new_card_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CARDS_API, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "card_type", "radio");
        assert_form_input(&form, "currency", "radio");
        assert_form_submit_button(&form);
    }
}

#[cfg(test)]
mod create_card_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};

    use crate::{
        card::{CardType, create_card_endpoint, domain::CardFormData, get_cards_for_user},
        endpoints,
        money::Currency,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_valid_html,
            create_test_user, get_test_connection, must_get_form, parse_html_fragment,
        },
    };

    use super::CreateCardEndpointState;

    #[tokio::test]
    async fn can_open_card() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = CreateCardEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = CardFormData {
            name: "Travel".to_owned(),
            card_type: CardType::Credit,
            currency: Currency::Usd,
        };

        let response = create_card_endpoint(State(state.clone()), Extension(user.id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CARDS_VIEW);
        let cards = get_cards_for_user(user.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name.as_ref(), "Travel");
        assert_eq!(cards[0].card_type, CardType::Credit);
        assert_eq!(cards[0].currency, Currency::Usd);
    }

    #[tokio::test]
    async fn rejects_long_name() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = CreateCardEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = CardFormData {
            name: "A name that is far too long".to_owned(),
            card_type: CardType::Debit,
            currency: Currency::Byn,
        };

        let response = create_card_endpoint(State(state.clone()), Extension(user.id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Card name must be at most 20 characters");
        let cards = get_cards_for_user(user.id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(cards.is_empty());
    }
}
