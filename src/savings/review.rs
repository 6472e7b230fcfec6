//! Reviewing and approving the monthly payment of a new savings goal.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;

use crate::{
    Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base},
    money::format_amount,
    navigation::NavBar,
    savings::{
        SavingsGoal, SavingsGoalId, SavingsGoalState, approve_savings_goal,
        domain::{monthly_payment, total_months},
        get_savings_goal,
    },
};

fn goal_plan(goal: &SavingsGoal) -> (u32, rust_decimal::Decimal) {
    let months = total_months(goal.created_at.date(), goal.target_date);

    (months, monthly_payment(goal.target_amount, months))
}

/// Render the monthly payment plan of a savings goal for the user to approve.
pub async fn get_review_savings_goal_page(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<SavingsGoalId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let goal = get_savings_goal(goal_id, user_id, &connection)?;
    let (months, monthly) = goal_plan(&goal);
    let approve_url = format_endpoint(endpoints::APPROVE_SAVINGS_GOAL_API, goal.id);
    let edit_url = format_endpoint(endpoints::EDIT_SAVINGS_GOAL_VIEW, goal.id);

    let nav_bar = NavBar::new(endpoints::SAVINGS_GOALS_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Review " (goal.goal_name) }

            dl class="w-full mb-4 grid grid-cols-2 gap-2"
            {
                dt class="font-medium" { "Target amount" }
                dd { (format_amount(goal.target_amount)) }
                dt class="font-medium" { "Target date" }
                dd { (goal.target_date) }
                dt class="font-medium" { "Months to save" }
                dd id="total-months" { (months) }
                dt class="font-medium" { "Monthly payment" }
                dd id="monthly-payment" { (format_amount(monthly)) }
            }

            @if goal.approved {
                p { "You have already approved this goal." }
            } @else {
                form
                    hx-post=(approve_url)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4"
                {
                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Approve plan" }
                }
            }

            div class="mt-4 flex gap-4"
            {
                a href=(edit_url) class=(LINK_STYLE) { "Edit goal" }
                a href=(endpoints::SAVINGS_GOALS_VIEW) class=(LINK_STYLE) { "Back to goals" }
            }
        }
    };

    Ok(base("Review Savings Goal", &content).into_response())
}

/// Approve the plan of a savings goal and redirect to the goals list.
pub async fn approve_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<SavingsGoalId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_savings_goal(goal_id, user_id, &connection).and_then(|goal| {
        let (_, monthly) = goal_plan(&goal);
        approve_savings_goal(goal.id, user_id, monthly, &connection)
    });

    match result {
        Ok(()) => {
            tracing::info!("User {user_id} approved savings goal {goal_id}");
            (
                HxRedirect(endpoints::SAVINGS_GOALS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod review_savings_goal_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        endpoints,
        savings::{
            GoalName, NewSavingsGoal, SavingsGoalState, create_savings_goal, get_savings_goal,
        },
        test_utils::{
            assert_hx_redirect, assert_valid_html, create_test_user, get_test_connection,
            parse_html_document,
        },
    };

    use super::{approve_savings_goal_endpoint, get_review_savings_goal_page};

    fn state_with_goal() -> (SavingsGoalState, crate::auth::UserID, i64) {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let goal = create_savings_goal(
            NewSavingsGoal {
                user_id: user.id,
                goal_name: GoalName::new_unchecked("Car"),
                target_amount: dec!(1000),
                target_date: date!(2025 - 04 - 20),
                created_at: datetime!(2025-01-05 10:00 UTC),
            },
            &connection,
        )
        .unwrap();

        (
            SavingsGoalState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
            goal.id,
        )
    }

    #[tokio::test]
    async fn shows_months_and_monthly_payment() {
        let (state, user_id, goal_id) = state_with_goal();

        let response =
            get_review_savings_goal_page(State(state), Extension(user_id), Path(goal_id))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text_of = |selector: &str| {
            html.select(&Selector::parse(selector).unwrap())
                .next()
                .unwrap()
                .text()
                .collect::<String>()
        };
        assert_eq!(text_of("#total-months"), "3");
        assert_eq!(text_of("#monthly-payment"), "333.00");
    }

    #[tokio::test]
    async fn approve_marks_goal_approved() {
        let (state, user_id, goal_id) = state_with_goal();

        let response =
            approve_savings_goal_endpoint(State(state.clone()), Extension(user_id), Path(goal_id))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::SAVINGS_GOALS_VIEW);
        let goal = get_savings_goal(goal_id, user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(goal.approved);
        assert!(!goal.is_active);
        assert_eq!(goal.monthly_payment, dec!(333));
    }

    #[tokio::test]
    async fn other_users_goal_is_not_found() {
        let (state, _, goal_id) = state_with_goal();
        let other = create_test_user(&state.db_connection.lock().unwrap(), "boris@example.com");

        let result =
            get_review_savings_goal_page(State(state), Extension(other.id), Path(goal_id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
