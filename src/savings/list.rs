use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    money::format_amount,
    navigation::NavBar,
    savings::{SavingsGoal, SavingsGoalState, get_approved_savings_goals},
};

/// Render the user's approved savings goals.
pub async fn get_savings_goals_page(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let goals = get_approved_savings_goals(user_id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve savings goals for user {user_id}: {error}")
    })?;

    Ok(savings_goals_view(&goals).into_response())
}

fn goal_row(goal: &SavingsGoal) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_SAVINGS_GOAL_VIEW, goal.id);
    let delete_url = format_endpoint(endpoints::DELETE_SAVINGS_GOAL_VIEW, goal.id);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (goal.goal_name) }
            td class=(TABLE_CELL_STYLE) { (format_amount(goal.target_amount)) }
            td class=(TABLE_CELL_STYLE) { (goal.target_date) }
            td class=(TABLE_CELL_STYLE) { (format_amount(goal.monthly_payment)) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }
                    a href=(delete_url) class=(BUTTON_DELETE_STYLE) { "Delete" }
                }
            }
        }
    }
}

fn savings_goals_view(goals: &[SavingsGoal]) -> Markup {
    let nav_bar = NavBar::new(endpoints::SAVINGS_GOALS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Savings Goals" }
                    a href=(endpoints::NEW_SAVINGS_GOAL_VIEW) class=(LINK_STYLE) { "New Goal" }
                }

                @if goals.is_empty() {
                    p class="text-center text-gray-500 dark:text-gray-400"
                    {
                        "You don't have any savings goals yet. "
                        a href=(endpoints::NEW_SAVINGS_GOAL_VIEW) class=(LINK_STYLE)
                        {
                            "Set your first goal"
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
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Goal" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Target" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "By" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Monthly" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }

                            tbody
                            {
                                @for goal in goals {
                                    (goal_row(goal))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Savings Goals", &content)
}

#[cfg(test)]
mod savings_goals_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::{date, datetime};

    use crate::{
        savings::{
            GoalName, NewSavingsGoal, SavingsGoalState, approve_savings_goal, create_savings_goal,
        },
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_document,
        },
    };

    use super::get_savings_goals_page;

    #[tokio::test]
    async fn lists_only_approved_goals() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        for name in ["Car", "House"] {
            create_savings_goal(
                NewSavingsGoal {
                    user_id: user.id,
                    goal_name: GoalName::new_unchecked(name),
                    target_amount: dec!(1200),
                    target_date: date!(2026 - 01 - 15),
                    created_at: datetime!(2025-01-10 09:00 UTC),
                },
                &connection,
            )
            .unwrap();
        }
        approve_savings_goal(1, user.id, dec!(100), &connection).unwrap();
        let state = SavingsGoalState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_savings_goals_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows: Vec<_> = html
            .select(&Selector::parse("tbody tr").unwrap())
            .collect();
        assert_eq!(rows.len(), 1);
        let text = rows[0].text().collect::<String>();
        assert!(text.contains("Car"));
        assert!(text.contains("100.00"));
    }

    #[tokio::test]
    async fn shows_empty_state() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = SavingsGoalState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_savings_goals_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("You don't have any savings goals yet."));
    }
}
