//! Middleware that restricts routes to staff members.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
};

/// The state needed for the staff guard.
#[derive(Debug, Clone)]
pub struct StaffState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StaffState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that only lets staff members through.
///
/// Must run after [crate::auth::auth_guard] so that the user ID is available.
/// Customers get a 403 page.
pub async fn staff_guard(
    State(state): State<StaffState>,
    Extension(user_id): Extension<UserID>,
    request: Request,
    next: Next,
) -> Response {
    let is_staff = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_id(user_id, &connection) {
            Ok(user) => user.is_staff,
            Err(error) => {
                tracing::error!("could not get user {user_id}: {error}");
                return error.into_response();
            }
        }
    };

    if !is_staff {
        tracing::warn!(
            "User {user_id} tried to access the staff page {}",
            request.uri().path()
        );
        return Error::Forbidden.into_response();
    }

    next.run(request).await
}
