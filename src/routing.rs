//! Application router configuration with public, customer and staff route definitions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Router,
    extract::{FromRef, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use rusqlite::Connection;
use tower_http::services::ServeDir;

use crate::{
    AppState, Error,
    auth::{
        UserID, auth_guard, auth_guard_hx, change_password_endpoint, get_change_password_page,
        get_log_in_page, get_log_out, get_register_page, get_user_by_id, post_log_in,
        register_user, staff_guard,
    },
    card::{create_card_endpoint, get_cards_page, get_new_card_page},
    credit::{
        apply_credit_endpoint, decide_credit_endpoint, get_apply_credit_page,
        get_credit_applications_page, get_credit_decision_page, get_credits_page,
    },
    deposit::{
        decide_deposit_endpoint, get_deposit_decision_page, get_deposit_page,
        get_deposit_queue_page, request_deposit_endpoint,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    payment::{get_new_payment_page, get_statement_page, make_payment_endpoint},
    profile::{
        get_edit_address_page, get_profile_page, get_staff_dashboard_page,
        update_address_endpoint,
    },
    savings::{
        approve_savings_goal_endpoint, create_savings_goal_endpoint, delete_savings_goal_endpoint,
        get_delete_savings_goal_page, get_edit_savings_goal_page, get_new_savings_goal_page,
        get_review_savings_goal_page, get_savings_goals_page, update_savings_goal_endpoint,
    },
    transfer::{
        get_transfer_between_cards_page, get_transfer_by_account_page, get_transfers_page,
        transfer_between_cards_endpoint, transfer_by_account_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .route(endpoints::EDIT_ADDRESS_VIEW, get(get_edit_address_page))
        .route(
            endpoints::CHANGE_PASSWORD_VIEW,
            get(get_change_password_page),
        )
        .route(endpoints::CARDS_VIEW, get(get_cards_page))
        .route(endpoints::NEW_CARD_VIEW, get(get_new_card_page))
        .route(endpoints::CARD_STATEMENT_VIEW, get(get_statement_page))
        .route(endpoints::DEPOSIT_VIEW, get(get_deposit_page))
        .route(endpoints::NEW_PAYMENT_VIEW, get(get_new_payment_page))
        .route(endpoints::TRANSFERS_VIEW, get(get_transfers_page))
        .route(
            endpoints::TRANSFER_BY_ACCOUNT_VIEW,
            get(get_transfer_by_account_page),
        )
        .route(
            endpoints::TRANSFER_BETWEEN_CARDS_VIEW,
            get(get_transfer_between_cards_page),
        )
        .route(endpoints::SAVINGS_GOALS_VIEW, get(get_savings_goals_page))
        .route(
            endpoints::NEW_SAVINGS_GOAL_VIEW,
            get(get_new_savings_goal_page),
        )
        .route(
            endpoints::REVIEW_SAVINGS_GOAL_VIEW,
            get(get_review_savings_goal_page),
        )
        .route(
            endpoints::EDIT_SAVINGS_GOAL_VIEW,
            get(get_edit_savings_goal_page),
        )
        .route(
            endpoints::DELETE_SAVINGS_GOAL_VIEW,
            get(get_delete_savings_goal_page),
        )
        .route(endpoints::CREDITS_VIEW, get(get_credits_page))
        .route(endpoints::APPLY_CREDIT_VIEW, get(get_apply_credit_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::CHANGE_PASSWORD_API,
                post(change_password_endpoint),
            )
            .route(endpoints::ADDRESS_API, post(update_address_endpoint))
            .route(endpoints::CARDS_API, post(create_card_endpoint))
            .route(endpoints::DEPOSIT_API, post(request_deposit_endpoint))
            .route(endpoints::PAYMENTS_API, post(make_payment_endpoint))
            .route(
                endpoints::TRANSFER_BY_ACCOUNT_API,
                post(transfer_by_account_endpoint),
            )
            .route(
                endpoints::TRANSFER_BETWEEN_CARDS_API,
                post(transfer_between_cards_endpoint),
            )
            .route(
                endpoints::SAVINGS_GOALS_API,
                post(create_savings_goal_endpoint),
            )
            .route(
                endpoints::SAVINGS_GOAL_API,
                put(update_savings_goal_endpoint)
                    .delete(delete_savings_goal_endpoint),
            )
            .route(
                endpoints::APPROVE_SAVINGS_GOAL_API,
                post(approve_savings_goal_endpoint),
            )
            .route(
                endpoints::CREDIT_APPLICATIONS_API,
                post(apply_credit_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    // The staff guard reads the user ID, so the auth guard must wrap it.
    let staff_views = Router::new()
        .route(endpoints::STAFF_DASHBOARD_VIEW, get(get_staff_dashboard_page))
        .route(endpoints::DEPOSIT_QUEUE_VIEW, get(get_deposit_queue_page))
        .route(
            endpoints::DEPOSIT_DECISION_VIEW,
            get(get_deposit_decision_page),
        )
        .route(
            endpoints::CREDIT_APPLICATIONS_VIEW,
            get(get_credit_applications_page),
        )
        .route(
            endpoints::CREDIT_DECISION_VIEW,
            get(get_credit_decision_page),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), staff_guard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let staff_api = Router::new()
        .route(endpoints::DEPOSIT_DECISION_API, post(decide_deposit_endpoint))
        .route(endpoints::CREDIT_DECISION_API, post(decide_credit_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), staff_guard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    protected_routes
        .merge(staff_views)
        .merge(staff_api)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The state needed for the root redirect.
#[derive(Debug, Clone)]
struct IndexState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for IndexState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The root path '/' redirects staff to their dashboard and customers to their cards.
async fn get_index_page(
    State(state): State<IndexState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;

    let target = if user.is_staff {
        endpoints::STAFF_DASHBOARD_VIEW
    } else {
        endpoints::CARDS_VIEW
    };

    Ok(Redirect::to(target).into_response())
}
