//! The statement of a card for a date range.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use time_tz::{OffsetDateTimeExt, Tz};

use crate::{
    AppState, Error,
    auth::UserID,
    card::{Card, CardId, get_card_for_user},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_PENDING_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, money,
    },
    money::{add_to_balance, convert},
    navigation::NavBar,
    payment::{Payment, get_payments_for_card},
    timezone::{get_timezone, start_of_local_day},
};

/// The payments of a card split by whether they are settled.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub settled: Vec<Payment>,
    /// Deposits waiting for staff approval.
    pub pending: Vec<Payment>,
    /// The sum of settled purchases and outgoing transfers in the card's currency.
    pub total_spent: Decimal,
}

impl Statement {
    fn empty() -> Self {
        Self {
            settled: Vec::new(),
            pending: Vec::new(),
            total_spent: Decimal::ZERO,
        }
    }
}

/// Split `payments` into settled and pending and total the money spent.
///
/// Amounts recorded in another currency are converted to the card's currency
/// at `usd_to_byn_rate` before being added to the total.
pub fn build_statement(
    card: &Card,
    payments: Vec<Payment>,
    usd_to_byn_rate: Decimal,
) -> Result<Statement, Error> {
    let mut statement = Statement::empty();

    for payment in payments {
        if payment.deposit_pending {
            statement.pending.push(payment);
            continue;
        }

        if payment.kind.is_outgoing() {
            let spent = convert(payment.amount, payment.currency, card.currency, usd_to_byn_rate)?;
            statement.total_spent = add_to_balance(statement.total_spent, spent)?;
        }

        statement.settled.push(payment);
    }

    Ok(statement)
}

/// The UTC instants covering the local dates `start_date` to `end_date`
/// inclusive, as a half-open range.
///
/// # Errors
///
/// Returns [Error::InvalidDateRange] if `end_date` is before `start_date`.
pub fn statement_bounds(
    start_date: Date,
    end_date: Date,
    timezone: &Tz,
) -> Result<(OffsetDateTime, OffsetDateTime), Error> {
    if end_date < start_date {
        return Err(Error::InvalidDateRange(start_date, end_date));
    }

    let day_after_end = end_date.next_day().unwrap_or(end_date);

    Ok((
        start_of_local_day(start_date, timezone),
        start_of_local_day(day_after_end, timezone),
    ))
}

/// The state needed for the statement page.
#[derive(Debug, Clone)]
pub struct StatementState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical name of the timezone dates are interpreted in.
    pub local_timezone: String,
    pub usd_to_byn_rate: Decimal,
}

impl FromRef<AppState> for StatementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            usd_to_byn_rate: state.banking_rules.usd_to_byn_rate,
        }
    }
}

/// The optional date range of a statement.
///
/// The dates are kept as text so that a malformed date is reported on the
/// page instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct StatementQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date field, treating a missing or blank field as no date.
fn parse_query_date(raw: Option<&str>) -> Result<Option<Date>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Date::parse(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| Error::InvalidDate(raw.to_owned())),
    }
}

fn load_statement(
    card: &Card,
    query: &StatementQuery,
    timezone: &Tz,
    usd_to_byn_rate: Decimal,
    connection: &Connection,
) -> Result<Statement, Error> {
    let start_date = parse_query_date(query.start_date.as_deref())?;
    let end_date = parse_query_date(query.end_date.as_deref())?;

    let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
        return Ok(Statement::empty());
    };

    let (start, end) = statement_bounds(start_date, end_date, timezone)?;
    let payments = get_payments_for_card(card.id, start, end, connection)?;

    build_statement(card, payments, usd_to_byn_rate)
}

/// Render the statement of one of the user's cards.
///
/// Without both dates the statement is empty. Malformed or reversed dates
/// give an empty statement with an error message.
pub async fn get_statement_page(
    State(state): State<StatementState>,
    Extension(user_id): Extension<UserID>,
    Path(card_id): Path<CardId>,
    Query(query): Query<StatementQuery>,
) -> Result<Response, Error> {
    let timezone = get_timezone(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let card = get_card_for_user(card_id, user_id, &connection)?;

    let (statement, error_message) =
        match load_statement(&card, &query, timezone, state.usd_to_byn_rate, &connection) {
            Ok(statement) => (statement, None),
            Err(error @ (Error::InvalidDate(_) | Error::InvalidDateRange(..))) => {
                (Statement::empty(), Some(error.to_string()))
            }
            Err(error) => return Err(error),
        };

    Ok(statement_view(
        &card,
        &query,
        &statement,
        error_message.as_deref(),
        timezone,
    )
    .into_response())
}

const TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

fn format_timestamp(timestamp: OffsetDateTime, timezone: &Tz) -> String {
    let local = timestamp.to_timezone(timezone);

    local
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| local.to_string())
}

fn payment_row(payment: &Payment, timezone: &Tz) -> Markup {
    let signed_amount = if payment.kind.is_outgoing() {
        -payment.amount
    } else {
        payment.amount
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (format_timestamp(payment.timestamp, timezone)) }
            td class=(TABLE_CELL_STYLE) { (payment.kind) }
            td class=(TABLE_CELL_STYLE) { (money(signed_amount, payment.currency)) }
        }
    }
}

fn payments_table(id: &str, payments: &[Payment], timezone: &Tz) -> Markup {
    html! {
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table id=(id) class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    }
                }

                tbody
                {
                    @for payment in payments {
                        (payment_row(payment, timezone))
                    }

                    @if payments.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="3" class="px-6 py-4 text-center" { "No payments" }
                        }
                    }
                }
            }
        }
    }
}

fn statement_view(
    card: &Card,
    query: &StatementQuery,
    statement: &Statement,
    error_message: Option<&str>,
    timezone: &Tz,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CARDS_VIEW).into_html();
    let statement_url = format_endpoint(endpoints::CARD_STATEMENT_VIEW, card.id);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="space-y-1"
                {
                    h1 class="text-xl font-bold" { "Statement for " (card.name) }
                    p class="font-mono text-sm" { (card.account_no) }
                    p { "Balance: " (money(card.balance, card.currency)) }
                }

                form
                    method="get"
                    action=(statement_url)
                    class="flex flex-wrap items-end gap-4"
                {
                    div
                    {
                        label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                        input
                            id="start_date"
                            type="date"
                            name="start_date"
                            required
                            value=[query.start_date.as_deref()]
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                        input
                            id="end_date"
                            type="date"
                            name="end_date"
                            required
                            value=[query.end_date.as_deref()]
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" }
                    }
                }

                @if let Some(error_message) = error_message {
                    p class="text-red-600 dark:text-red-400" { "Error: " (error_message) }
                }

                p id="total-spent" class="text-lg"
                {
                    "Total spent: " (money(statement.total_spent, card.currency))
                }

                h2 class="text-lg font-semibold" { "Payments" }
                (payments_table("settled-payments", &statement.settled, timezone))

                h2 class="text-lg font-semibold"
                {
                    "Pending deposits "
                    @if !statement.pending.is_empty() {
                        span class=(BADGE_PENDING_STYLE) { (statement.pending.len()) }
                    }
                }
                (payments_table("pending-payments", &statement.pending, timezone))
            }
        }
    };

    base("Statement", &content)
}



#[cfg(test)]
mod statement_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, Query, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        Error,
        card::{Card, CardType},
        money::Currency,
        payment::{NewPayment, PaymentKind, create_payment},
        test_utils::{
            assert_valid_html, create_test_card, create_test_user, get_test_connection,
            parse_html_document,
        },
    };

    use super::{StatementQuery, StatementState, get_statement_page};

    fn state_with(connection: rusqlite::Connection) -> StatementState {
        StatementState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
            usd_to_byn_rate: dec!(3.116),
        }
    }

    fn purchase_today(card: &Card, connection: &rusqlite::Connection) {
        create_payment(
            NewPayment {
                card_id: card.id,
                amount: dec!(12.34),
                currency: Currency::Byn,
                card_type: card.card_type,
                kind: PaymentKind::Purchase,
                timestamp: OffsetDateTime::now_utc(),
                deposit_pending: false,
            },
            connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn without_range_shows_empty_statement() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(100));
        purchase_today(&card, &connection);

        let response = get_statement_page(
            State(state_with(connection)),
            Extension(user.id),
            Path(card.id),
            Query(StatementQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows = html
            .select(&Selector::parse("#settled-payments tbody tr").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].text().collect::<String>().contains("No payments"));
        let total = html
            .select(&Selector::parse("#total-spent").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(total.contains("0.00 BYN"), "got {total}");
    }

    #[tokio::test]
    async fn shows_payments_in_range() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(100));
        purchase_today(&card, &connection);
        let today = OffsetDateTime::now_utc().date();

        let response = get_statement_page(
            State(state_with(connection)),
            Extension(user.id),
            Path(card.id),
            Query(StatementQuery {
                start_date: today.previous_day().map(|date| date.to_string()),
                end_date: Some(today.to_string()),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows = html
            .select(&Selector::parse("#settled-payments tbody tr").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].text().collect::<String>().contains("Purchase"));
        let total = html
            .select(&Selector::parse("#total-spent").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(total.contains("12.34 BYN"), "got {total}");
    }

    #[tokio::test]
    async fn reversed_range_shows_error() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(100));

        let response = get_statement_page(
            State(state_with(connection)),
            Extension(user.id),
            Path(card.id),
            Query(StatementQuery {
                start_date: Some("2025-03-02".to_owned()),
                end_date: Some("2025-03-01".to_owned()),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Error: the end date 2025-03-01 is before the start date 2025-03-02"));
    }

    #[tokio::test]
    async fn malformed_date_shows_empty_statement_with_error() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(100));
        purchase_today(&card, &connection);

        let response = get_statement_page(
            State(state_with(connection)),
            Extension(user.id),
            Path(card.id),
            Query(StatementQuery {
                start_date: Some("2025-13-40".to_owned()),
                end_date: Some("2025-03-01".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("\"2025-13-40\" is not a date in the form YYYY-MM-DD"));
        let rows = html
            .select(&Selector::parse("#settled-payments tbody tr").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].text().collect::<String>().contains("No payments"));
    }

    #[tokio::test]
    async fn blank_dates_show_empty_statement() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(100));

        let response = get_statement_page(
            State(state_with(connection)),
            Extension(user.id),
            Path(card.id),
            Query(StatementQuery {
                start_date: Some(String::new()),
                end_date: Some(String::new()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(!text.contains("Error:"));
    }

    #[tokio::test]
    async fn other_users_card_is_not_found() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection, "anna@example.com");
        let other = create_test_user(&connection, "boris@example.com");
        let card = create_test_card(&connection, &owner, CardType::Debit, Currency::Byn, dec!(100));

        let result = get_statement_page(
            State(state_with(connection)),
            Extension(other.id),
            Path(card.id),
            Query(StatementQuery::default()),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
