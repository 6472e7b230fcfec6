//! Editing savings goals.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    savings::{
        GoalName, SavingsGoal, SavingsGoalForm, SavingsGoalId, SavingsGoalState,
        domain::{monthly_payment, total_months, validate_target_amount, validate_target_date},
        form::{FormAction, FormValues, savings_goal_form},
        get_savings_goal, update_savings_goal,
    },
    timezone::local_today,
};

/// Apply the form to `goal`.
///
/// A changed target date must still be far enough from `today`. The monthly
/// payment is recomputed when the amount or date changes.
fn apply_changes(goal: &SavingsGoal, form: &SavingsGoalForm, today: Date) -> Result<SavingsGoal, Error> {
    let goal_name = GoalName::new(&form.goal_name)?;
    let target_amount = validate_target_amount(form.target_amount)?;
    let target_date = if form.target_date == goal.target_date {
        goal.target_date
    } else {
        validate_target_date(form.target_date, today)?
    };

    let mut updated = goal.clone();
    updated.goal_name = goal_name;

    if target_amount != goal.target_amount || target_date != goal.target_date {
        updated.target_amount = target_amount;
        updated.target_date = target_date;
        updated.monthly_payment = monthly_payment(
            target_amount,
            total_months(goal.created_at.date(), target_date),
        );
    }

    Ok(updated)
}

/// Render the edit form for a savings goal, pre-filled with its values.
pub async fn get_edit_savings_goal_page(
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
    let update_url = format_endpoint(endpoints::SAVINGS_GOAL_API, goal.id);
    let values = FormValues {
        goal_name: goal.goal_name.as_ref(),
        target_amount: Some(goal.target_amount.to_string()),
        target_date: Some(goal.target_date),
    };

    let nav_bar = NavBar::new(endpoints::SAVINGS_GOALS_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Savings Goal" }
            (savings_goal_form(FormAction::Update(&update_url), &values, None, None))
        }
    };

    Ok(base("Edit Savings Goal", &content).into_response())
}

/// Save changes to a savings goal and redirect to the goals list.
pub async fn update_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<SavingsGoalId>,
    Form(form): Form<SavingsGoalForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let goal = match get_savings_goal(goal_id, user_id, &connection) {
        Ok(goal) => goal,
        Err(Error::NotFound) => return Error::UpdateMissingSavingsGoal.into_alert_response(),
        Err(error) => return error.into_alert_response(),
    };

    let result = apply_changes(&goal, &form, today)
        .and_then(|updated| update_savings_goal(&updated, &connection));

    match result {
        Ok(()) => {
            tracing::info!("User {user_id} updated savings goal {goal_id}");
            (
                HxRedirect(endpoints::SAVINGS_GOALS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::SqlError(_)) => error.into_alert_response(),
        Err(error) => {
            let update_url = format_endpoint(endpoints::SAVINGS_GOAL_API, goal_id);
            let values = FormValues {
                goal_name: &form.goal_name,
                target_amount: Some(form.target_amount.to_string()),
                target_date: Some(form.target_date),
            };

            savings_goal_form(
                FormAction::Update(&update_url),
                &values,
                None,
                Some(&error.to_string()),
            )
            .into_response()
        }
    }
}
