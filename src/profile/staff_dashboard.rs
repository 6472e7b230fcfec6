//! The landing page for staff members.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    credit::count_pending_credit_applications,
    deposit::count_pending_deposits,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    profile::ProfileState,
};

fn queue_card(id: &str, title: &str, count: usize, url: &str) -> Markup {
    html! {
        div class="p-6 rounded-lg border border-gray-200 bg-white dark:bg-gray-800 dark:border-gray-700"
        {
            h2 class="text-lg font-semibold" { (title) }
            p id=(id) class="text-3xl font-bold my-2" { (count) }
            a href=(url) class=(LINK_STYLE) { "Open queue" }
        }
    }
}

/// Render the number of deposits and credit applications awaiting a decision.
pub async fn get_staff_dashboard_page(State(state): State<ProfileState>) -> Result<Response, Error> {
    let (deposit_count, credit_count) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            count_pending_deposits(&connection)?,
            count_pending_credit_applications(&connection)?,
        )
    };

    let nav_bar = NavBar::staff(endpoints::STAFF_DASHBOARD_VIEW).into_html();
    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Staff dashboard" }

                div class="grid gap-4 sm:grid-cols-2"
                {
                    (queue_card("pending-deposits", "Pending deposits", deposit_count, endpoints::DEPOSIT_QUEUE_VIEW))
                    (queue_card(
                        "pending-credit-applications",
                        "Pending credit applications",
                        credit_count,
                        endpoints::CREDIT_APPLICATIONS_VIEW,
                    ))
                }
            }
        }
    };

    Ok(base("Staff dashboard", &content).into_response())
}

#[cfg(test)]
mod staff_dashboard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        card::CardType,
        credit::{NewCreditApplication, create_credit_application},
        deposit::request_deposit,
        money::Currency,
        profile::ProfileState,
        test_utils::{
            assert_valid_html, create_test_card, create_test_user, get_test_connection,
            parse_html_document,
        },
    };

    use super::get_staff_dashboard_page;

    fn count(html: &scraper::Html, id: &str) -> String {
        html.select(&Selector::parse(&format!("#{id}")).unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>()
    }

    #[tokio::test]
    async fn shows_queue_counts() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_test_card(&connection, &user, CardType::Debit, Currency::Byn, dec!(0));
        request_deposit(&card, dec!(50), OffsetDateTime::now_utc(), &connection).unwrap();
        for purpose in ["Car", "Roof"] {
            create_credit_application(
                NewCreditApplication::new(
                    user.id,
                    dec!(1000),
                    purpose,
                    datetime!(2025-03-01 12:00 UTC),
                )
                .unwrap(),
                &connection,
            )
            .unwrap();
        }
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_staff_dashboard_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(count(&html, "pending-deposits"), "1");
        assert_eq!(count(&html, "pending-credit-applications"), "2");
    }
}
