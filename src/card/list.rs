//! The page listing the user's cards.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    card::{Card, get_cards_for_user},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_PENDING_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, money,
    },
    navigation::NavBar,
};

/// The state needed for the cards page.
#[derive(Debug, Clone)]
pub struct CardsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CardsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's cards, or a prompt to open one if they have none.
pub async fn get_cards_page(
    State(state): State<CardsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let cards = get_cards_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve cards for user {user_id}: {error}"))?;

    Ok(cards_view(&cards).into_response())
}

fn card_row(card: &Card) -> Markup {
    let statement_url = format_endpoint(endpoints::CARD_STATEMENT_VIEW, card.id);
    let deposit_url = format_endpoint(endpoints::DEPOSIT_VIEW, card.id);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (card.name) }
            td class=(TABLE_CELL_STYLE) { span class="font-mono" { (card.account_no) } }
            td class=(TABLE_CELL_STYLE) { (card.card_type) }
            td class=(TABLE_CELL_STYLE)
            {
                (money(card.balance, card.currency))

                @if card.deposit_pending {
                    " "
                    span class=(BADGE_PENDING_STYLE)
                    {
                        "+" (money(card.pending_deposit_amount, card.currency)) " pending"
                    }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(statement_url) class=(LINK_STYLE) { "Statement" }

                    @if !card.deposit_pending {
                        a href=(deposit_url) class=(LINK_STYLE) { "Deposit" }
                    }
                }
            }
        }
    }
}

fn cards_view(cards: &[Card]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CARDS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Cards" }

                    div class="flex gap-4"
                    {
                        @if !cards.is_empty() {
                            a href=(endpoints::NEW_PAYMENT_VIEW) class=(LINK_STYLE) { "Make a Payment" }
                        }
                        a href=(endpoints::NEW_CARD_VIEW) class=(LINK_STYLE) { "Open a Card" }
                    }
                }

                @if cards.is_empty() {
                    p class="text-center text-gray-500 dark:text-gray-400"
                    {
                        "You don't have any cards yet. "
                        a href=(endpoints::NEW_CARD_VIEW) class=(LINK_STYLE)
                        {
                            "Open your first card"
                        }
                    }
                } @else {
                    div class="overflow-x-auto dark:bg-gray-800"
                    {
                        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Account number" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Balance" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }

                            tbody
                            {
                                @for card in cards {
                                    (card_row(card))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Cards", &content)
}

#[cfg(test)]
mod cards_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;

    use crate::{
        card::{CardType, get_cards_page},
        endpoints::{self, format_endpoint},
        money::Currency,
        test_utils::{
            assert_valid_html, create_test_card, create_test_user, get_test_connection,
            parse_html_document,
        },
    };

    use super::CardsPageState;

    #[tokio::test]
    async fn shows_empty_state_without_cards() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = CardsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_cards_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert!(html.select(&Selector::parse("table").unwrap()).next().is_none());
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("You don't have any cards yet."));
    }

    #[tokio::test]
    async fn lists_only_the_users_cards() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let other = create_test_user(&connection, "boris@example.com");
        let card = create_test_card(
            &connection,
            &user,
            CardType::Debit,
            Currency::Byn,
            dec!(1234.5),
        );
        create_test_card(&connection, &other, CardType::Debit, Currency::Usd, dec!(1));
        let state = CardsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_cards_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows: Vec<_> = html
            .select(&Selector::parse("tbody tr").unwrap())
            .collect();
        assert_eq!(rows.len(), 1);
        let row_text = rows[0].text().collect::<String>();
        assert!(row_text.contains(&card.account_no));
        assert!(row_text.contains("1,234.50 BYN"));

        let links: Vec<_> = rows[0]
            .select(&Selector::parse("a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(
            links,
            vec![
                format_endpoint(endpoints::CARD_STATEMENT_VIEW, card.id),
                format_endpoint(endpoints::DEPOSIT_VIEW, card.id),
            ]
        );
    }
}
