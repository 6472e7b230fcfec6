/*! Creates the application's database schema. */

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    auth::{create_totp_device_table, create_user_table},
    card::create_card_table,
    credit::create_credit_tables,
    payment::create_payment_table,
    profile::create_address_table,
    savings::create_savings_goal_table,
};

/// Create all the tables for the domain models if they do not already exist.
///
/// The tables are created inside a single exclusive transaction, so either
/// every table is created or none are. Foreign key enforcement is switched on
/// for `connection`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_totp_device_table(&transaction)?;
    create_address_table(&transaction)?;
    create_card_table(&transaction)?;
    create_payment_table(&transaction)?;
    create_savings_goal_table(&transaction)?;
    create_credit_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
