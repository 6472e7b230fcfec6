//! Deleting savings goals after confirmation.

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
    savings::{SavingsGoalId, SavingsGoalState, delete_savings_goal, get_savings_goal},
};

/// Ask the user to confirm deleting a savings goal.
pub async fn get_delete_savings_goal_page(
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
    let delete_url = format_endpoint(endpoints::SAVINGS_GOAL_API, goal.id);

    let nav_bar = NavBar::new(endpoints::SAVINGS_GOALS_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Delete " (goal.goal_name) "?" }

            p class="mb-4"
            {
                "The goal of saving " (format_amount(goal.target_amount))
                " by " (goal.target_date) " will be removed. This cannot be undone."
            }

            form
                hx-delete=(delete_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Delete goal" }
            }

            a href=(endpoints::SAVINGS_GOALS_VIEW) class={ (LINK_STYLE) " mt-4" } { "Cancel" }
        }
    };

    Ok(base("Delete Savings Goal", &content).into_response())
}

/// Delete a savings goal and redirect to the goals list.
pub async fn delete_savings_goal_endpoint(
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

    match delete_savings_goal(goal_id, user_id, &connection) {
        Ok(()) => {
            tracing::info!("User {user_id} deleted savings goal {goal_id}");
            (
                HxRedirect(endpoints::SAVINGS_GOALS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DeleteMissingSavingsGoal) => {
            Error::DeleteMissingSavingsGoal.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting savings goal {goal_id}: {error}");
            error.into_alert_response()
        }
    }
}
