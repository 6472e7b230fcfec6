//! Payments record every event that changes a card's balance.

mod db;
mod domain;
mod make_payment;
mod statement;

pub use db::{
    create_payment, create_payment_table, delete_pending_deposits, get_payments_for_card,
    settle_pending_deposits,
};
pub use domain::{NewPayment, Payment, PaymentKind};
pub use make_payment::{get_new_payment_page, make_payment_endpoint};
pub use statement::get_statement_page;
