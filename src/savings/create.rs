//! Creating savings goals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    savings::{
        GoalName, NewSavingsGoal, SavingsGoalForm, create_savings_goal,
        domain::{MIN_DAYS_TO_TARGET, validate_target_amount, validate_target_date},
        form::{FormAction, FormValues, savings_goal_form},
    },
    timezone::local_today,
};

/// The state needed for creating and editing savings goals.
#[derive(Debug, Clone)]
pub struct SavingsGoalState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical name of the timezone "today" is taken from.
    pub local_timezone: String,
}

impl FromRef<AppState> for SavingsGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn earliest_target_date(today: Date) -> Date {
    today.saturating_add(time::Duration::days(MIN_DAYS_TO_TARGET))
}

/// Render the page for creating a savings goal.
pub async fn get_new_savings_goal_page(
    State(state): State<SavingsGoalState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let nav_bar = NavBar::new(endpoints::SAVINGS_GOALS_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Savings Goal" }
            (savings_goal_form(
                FormAction::Create(endpoints::SAVINGS_GOALS_API),
                &FormValues::default(),
                Some(earliest_target_date(today)),
                None,
            ))
        }
    };

    Ok(base("New Savings Goal", &content).into_response())
}

/// Handle the savings goal form and redirect to the review page on success.
///
/// Invalid input re-renders the form with an error message.
pub async fn create_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SavingsGoalForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let render_error = |error: Error| {
        let values = FormValues {
            goal_name: &form.goal_name,
            target_amount: Some(form.target_amount.to_string()),
            target_date: Some(form.target_date),
        };

        savings_goal_form(
            FormAction::Create(endpoints::SAVINGS_GOALS_API),
            &values,
            Some(earliest_target_date(today)),
            Some(&error.to_string()),
        )
        .into_response()
    };

    let validated = GoalName::new(&form.goal_name).and_then(|goal_name| {
        let target_amount = validate_target_amount(form.target_amount)?;
        let target_date = validate_target_date(form.target_date, today)?;
        Ok((goal_name, target_amount, target_date))
    });
    let (goal_name, target_amount, target_date) = match validated {
        Ok(validated) => validated,
        Err(error) => return render_error(error),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_goal = NewSavingsGoal {
        user_id,
        goal_name,
        target_amount,
        target_date,
        created_at: OffsetDateTime::now_utc(),
    };

    match create_savings_goal(new_goal, &connection) {
        Ok(goal) => {
            tracing::info!("User {user_id} created savings goal {}", goal.id);
            (
                HxRedirect(format_endpoint(endpoints::REVIEW_SAVINGS_GOAL_VIEW, goal.id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateGoalName(_)) => render_error(error),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a savings goal: {error}");
            error.into_alert_response()
        }
    }
}
