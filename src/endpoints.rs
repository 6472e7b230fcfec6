//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/cards/{card_id}/statement', use [format_endpoint].

/// The root route which redirects to the card list or the staff dashboard.
pub const ROOT: &str = "/";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The user's profile page.
pub const PROFILE_VIEW: &str = "/profile";
/// The page for adding or editing the user's address.
pub const EDIT_ADDRESS_VIEW: &str = "/profile/address";
/// The page for changing the user's password.
pub const CHANGE_PASSWORD_VIEW: &str = "/profile/password";
/// The page listing the user's cards.
pub const CARDS_VIEW: &str = "/cards";
/// The page for opening a new card.
pub const NEW_CARD_VIEW: &str = "/cards/new";
/// The statement of a single card.
pub const CARD_STATEMENT_VIEW: &str = "/cards/{card_id}/statement";
/// The page for requesting a deposit onto a card.
pub const DEPOSIT_VIEW: &str = "/cards/{card_id}/deposit";
/// The page for paying with a card.
pub const NEW_PAYMENT_VIEW: &str = "/payments/new";
/// The page linking to the two kinds of transfers.
pub const TRANSFERS_VIEW: &str = "/transfers";
/// The page for sending money to any card by its account number.
pub const TRANSFER_BY_ACCOUNT_VIEW: &str = "/transfers/account";
/// The page for moving money between the user's own cards.
pub const TRANSFER_BETWEEN_CARDS_VIEW: &str = "/transfers/cards";
/// The page listing the user's approved savings goals.
pub const SAVINGS_GOALS_VIEW: &str = "/savings";
/// The page for creating a savings goal.
pub const NEW_SAVINGS_GOAL_VIEW: &str = "/savings/new";
/// The page showing the monthly contribution of a new savings goal.
pub const REVIEW_SAVINGS_GOAL_VIEW: &str = "/savings/{goal_id}/review";
/// The page for editing a savings goal.
pub const EDIT_SAVINGS_GOAL_VIEW: &str = "/savings/{goal_id}/edit";
/// The page asking the user to confirm deleting a savings goal.
pub const DELETE_SAVINGS_GOAL_VIEW: &str = "/savings/{goal_id}/delete";
/// The page listing the user's active credits.
pub const CREDITS_VIEW: &str = "/credits";
/// The page for applying for a credit.
pub const APPLY_CREDIT_VIEW: &str = "/credits/apply";

/// The landing page for staff.
pub const STAFF_DASHBOARD_VIEW: &str = "/staff";
/// The queue of deposits waiting for approval.
pub const DEPOSIT_QUEUE_VIEW: &str = "/staff/deposits";
/// The page for approving or rejecting the pending deposit on a card.
pub const DEPOSIT_DECISION_VIEW: &str = "/staff/deposits/{card_id}";
/// The list of all credit applications.
pub const CREDIT_APPLICATIONS_VIEW: &str = "/staff/credits";
/// The page for approving or rejecting a credit application.
pub const CREDIT_DECISION_VIEW: &str = "/staff/credits/{application_id}";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to change the current user's password.
pub const CHANGE_PASSWORD_API: &str = "/api/profile/password";
/// The route to set the current user's address.
pub const ADDRESS_API: &str = "/api/profile/address";
/// The route to open cards.
pub const CARDS_API: &str = "/api/cards";
/// The route to request a deposit onto a card.
pub const DEPOSIT_API: &str = "/api/cards/{card_id}/deposit";
/// The route to make payments.
pub const PAYMENTS_API: &str = "/api/payments";
/// The route to transfer money to a card by account number.
pub const TRANSFER_BY_ACCOUNT_API: &str = "/api/transfers/account";
/// The route to transfer money between the user's own cards.
pub const TRANSFER_BETWEEN_CARDS_API: &str = "/api/transfers/cards";
/// The route to create savings goals.
pub const SAVINGS_GOALS_API: &str = "/api/savings";
/// The route to update or delete a savings goal.
pub const SAVINGS_GOAL_API: &str = "/api/savings/{goal_id}";
/// The route to approve the monthly contribution of a savings goal.
pub const APPROVE_SAVINGS_GOAL_API: &str = "/api/savings/{goal_id}/approve";
/// The route to apply for credits.
pub const CREDIT_APPLICATIONS_API: &str = "/api/credits";
/// The route for staff to approve or reject a pending deposit.
pub const DEPOSIT_DECISION_API: &str = "/api/staff/deposits/{card_id}";
/// The route for staff to approve or reject a credit application.
pub const CREDIT_DECISION_API: &str = "/api/staff/credits/{application_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/cards/{card_id}', '{card_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
