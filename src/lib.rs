//! Bankroll is a web app for a small retail bank.
//!
//! Customers open debit and credit cards in US dollars or Belarusian rubles,
//! pay, transfer money, plan savings goals and apply for credits. Staff members
//! approve deposits and credit applications.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod card;
mod credit;
mod db;
mod deposit;
mod endpoints;
mod error;
mod forbidden;
mod html;
mod internal_server_error;
mod logging;
mod money;
mod navigation;
mod not_found;
mod payment;
mod profile;
mod routing;
mod savings;
mod timezone;
mod transfer;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, BankingRules};
pub use auth::{
    Email, NewUser, PasswordHash, TotpSecret, User, UserID, ValidatedPassword, create_totp_device,
    create_user, get_user_by_email, get_user_by_id, set_staff, update_password,
};
pub use card::{CardName, CardType, NewCard, create_card, update_card_funds};
pub use credit::{NewCreditApplication, create_credit_application};
pub use db::initialize as initialize_db;
pub use deposit::request_deposit;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::Currency;
pub use routing::build_router;
pub use savings::{GoalName, NewSavingsGoal, approve_savings_goal, create_savings_goal};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
