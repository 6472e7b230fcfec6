//! The customer's credits and credit applications.

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
    credit::{
        Credit, CreditApplication, CreditStatus, get_active_credits,
        get_credit_applications_for_user,
    },
    endpoints,
    html::{
        BADGE_APPROVED_STYLE, BADGE_PENDING_STYLE, BADGE_REJECTED_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, money,
    },
    money::Currency,
    navigation::NavBar,
};

/// The state needed for the credits page.
#[derive(Debug, Clone)]
pub struct CreditsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreditsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A coloured label for the status of a credit application.
pub fn status_badge(status: CreditStatus) -> Markup {
    let style = match status {
        CreditStatus::Pending => BADGE_PENDING_STYLE,
        CreditStatus::Approved => BADGE_APPROVED_STYLE,
        CreditStatus::Rejected => BADGE_REJECTED_STYLE,
    };

    html! { span class=(style) { (status) } }
}

/// Render the user's active credits and their credit applications.
pub async fn get_credits_page(
    State(state): State<CreditsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let credits = get_active_credits(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve credits: {error}"))?;
    let applications = get_credit_applications_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve credit applications: {error}"))?;

    Ok(credits_view(&credits, &applications).into_response())
}

fn credits_table(credits: &[Credit]) -> Markup {
    html! {
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table id="active-credits" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Interest" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Term" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Monthly payment" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Remaining" }
                    }
                }

                tbody
                {
                    @for credit in credits {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (money(credit.amount, Currency::Byn)) }
                            td class=(TABLE_CELL_STYLE) { (credit.interest_rate) "%" }
                            td class=(TABLE_CELL_STYLE) { (credit.term_months) " months" }
                            td class=(TABLE_CELL_STYLE) { (money(credit.monthly_payment, Currency::Byn)) }
                            td class=(TABLE_CELL_STYLE) { (money(credit.remaining_amount, Currency::Byn)) }
                        }
                    }
                }
            }
        }
    }
}

fn applications_table(applications: &[CreditApplication]) -> Markup {
    html! {
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table id="credit-applications" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Submitted" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Purpose" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                    }
                }

                tbody
                {
                    @for application in applications {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (application.created_at.date()) }
                            td class=(TABLE_CELL_STYLE) { (money(application.amount, Currency::Byn)) }
                            td class=(TABLE_CELL_STYLE) { (application.purpose) }
                            td class=(TABLE_CELL_STYLE) { (status_badge(application.status)) }
                        }
                    }
                }
            }
        }
    }
}

fn credits_view(credits: &[Credit], applications: &[CreditApplication]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CREDITS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                div class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Credits" }
                    a href=(endpoints::APPLY_CREDIT_VIEW) class=(LINK_STYLE) { "Apply for a credit" }
                }

                @if credits.is_empty() {
                    p class="text-gray-500 dark:text-gray-400" { "You have no active credits." }
                } @else {
                    (credits_table(credits))
                }
            }

            section class="space-y-4 w-full lg:max-w-5xl mt-8"
            {
                h2 class="text-lg font-semibold" { "Applications" }

                @if applications.is_empty() {
                    p class="text-gray-500 dark:text-gray-400" { "You have not applied for a credit yet." }
                } @else {
                    (applications_table(applications))
                }
            }
        }
    };

    base("Credits", &content)
}

#[cfg(test)]
mod credits_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::datetime;

    use crate::{
        app_state::BankingRules,
        credit::{NewCreditApplication, create_credit_application, decide_credit_application},
        test_utils::{assert_valid_html, create_test_user, get_test_connection, parse_html_document},
    };

    use super::{CreditsPageState, get_credits_page};

    #[tokio::test]
    async fn shows_credits_and_applications() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let approved = create_credit_application(
            NewCreditApplication::new(user.id, dec!(12000), "Car", datetime!(2025-03-01 12:00 UTC))
                .unwrap(),
            &connection,
        )
        .unwrap();
        create_credit_application(
            NewCreditApplication::new(user.id, dec!(300), "Phone", datetime!(2025-03-05 12:00 UTC))
                .unwrap(),
            &connection,
        )
        .unwrap();
        decide_credit_application(
            approved.id,
            true,
            &BankingRules::default(),
            datetime!(2025-03-02 12:00 UTC),
            &connection,
        )
        .unwrap();
        let state = CreditsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_credits_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let credit_rows = Selector::parse("#active-credits tbody tr").unwrap();
        assert_eq!(html.select(&credit_rows).count(), 1);
        let credit_text = html
            .select(&credit_rows)
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(
            credit_text.contains("1,027.29 BYN"),
            "want monthly payment in row, got {credit_text:?}"
        );

        let application_rows = Selector::parse("#credit-applications tbody tr").unwrap();
        let statuses: Vec<String> = html
            .select(&application_rows)
            .map(|row| row.text().collect::<String>())
            .collect();
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].contains("Phone") && statuses[0].contains("Pending"));
        assert!(statuses[1].contains("Car") && statuses[1].contains("Approved"));
    }

    #[tokio::test]
    async fn empty_page_shows_messages() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = CreditsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_credits_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("You have no active credits."));
        assert!(text.contains("You have not applied for a credit yet."));
    }
}
