//! The staff queue of deposits awaiting approval.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    deposit::{PendingDeposit, get_pending_deposits},
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, money,
    },
    navigation::NavBar,
};

/// The state needed for the deposit queue.
#[derive(Debug, Clone)]
pub struct DepositQueueState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DepositQueueState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render every card with a deposit awaiting approval.
pub async fn get_deposit_queue_page(
    State(state): State<DepositQueueState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let deposits = get_pending_deposits(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve pending deposits: {error}"))?;

    Ok(deposit_queue_view(&deposits).into_response())
}

fn deposit_row(deposit: &PendingDeposit) -> Markup {
    let decision_url = format_endpoint(endpoints::DEPOSIT_DECISION_VIEW, deposit.card_id);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (deposit.owner_email) }
            td class=(TABLE_CELL_STYLE) { span class="font-mono" { (deposit.account_no) } }
            td class=(TABLE_CELL_STYLE) { (deposit.card_name) }
            td class=(TABLE_CELL_STYLE) { (money(deposit.amount, deposit.currency)) }
            td class=(TABLE_CELL_STYLE)
            {
                a href=(decision_url) class=(LINK_STYLE) { "Review" }
            }
        }
    }
}

fn deposit_queue_view(deposits: &[PendingDeposit]) -> Markup {
    let nav_bar = NavBar::staff(endpoints::DEPOSIT_QUEUE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Pending deposits" }

                @if deposits.is_empty() {
                    p class="text-center text-gray-500 dark:text-gray-400"
                    {
                        "There are no deposits awaiting approval."
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
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Owner" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Account number" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Card" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }

                            tbody
                            {
                                @for deposit in deposits {
                                    (deposit_row(deposit))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Pending deposits", &content)
}
