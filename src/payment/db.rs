//! Database operations for payments.

use rusqlite::{Connection, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    card::{CardId, get_card_type},
    money::{get_currency, get_decimal, round_cents},
    payment::{NewPayment, Payment, domain::get_payment_kind},
};

/// Record a payment and return it with its generated ID.
///
/// The amount is rounded to cents and the timestamp is stored in UTC.
pub fn create_payment(new_payment: NewPayment, connection: &Connection) -> Result<Payment, Error> {
    let amount = round_cents(new_payment.amount);
    let timestamp = new_payment.timestamp.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO payment (card_id, amount, currency, card_type, kind, timestamp, deposit_pending)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            new_payment.card_id,
            amount.to_string(),
            new_payment.currency.db_code(),
            new_payment.card_type.db_code(),
            new_payment.kind.db_code(),
            timestamp,
            new_payment.deposit_pending,
        ),
    )?;

    Ok(Payment {
        id: connection.last_insert_rowid(),
        card_id: new_payment.card_id,
        amount,
        currency: new_payment.currency,
        card_type: new_payment.card_type,
        kind: new_payment.kind,
        timestamp,
        deposit_pending: new_payment.deposit_pending,
    })
}

/// Retrieve the payments of a card made from `start` (inclusive) up to `end`
/// (exclusive), oldest first.
pub fn get_payments_for_card(
    card_id: CardId,
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<Payment>, Error> {
    connection
        .prepare(
            "SELECT id, card_id, amount, currency, card_type, kind, timestamp, deposit_pending
            FROM payment
            WHERE card_id = ?1 AND timestamp >= ?2 AND timestamp < ?3
            ORDER BY timestamp ASC, id ASC",
        )?
        .query_map(
            (
                card_id,
                start.to_offset(UtcOffset::UTC),
                end.to_offset(UtcOffset::UTC),
            ),
            map_row,
        )?
        .map(|maybe_payment| maybe_payment.map_err(|error| error.into()))
        .collect()
}

/// Mark the pending deposit payments of a card as settled.
///
/// Returns the number of payments that were updated.
pub fn settle_pending_deposits(card_id: CardId, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE payment SET deposit_pending = 0 WHERE card_id = ?1 AND deposit_pending = 1",
            [card_id],
        )
        .map_err(|error| error.into())
}

/// Remove the pending deposit payments of a card.
///
/// Returns the number of payments that were removed.
pub fn delete_pending_deposits(card_id: CardId, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM payment WHERE card_id = ?1 AND deposit_pending = 1",
            [card_id],
        )
        .map_err(|error| error.into())
}

/// Initialize the payment table and indexes.
pub fn create_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS payment (
            id INTEGER PRIMARY KEY,
            card_id INTEGER NOT NULL REFERENCES card(id) ON DELETE CASCADE,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL CHECK (currency IN ('U', 'B')),
            card_type TEXT NOT NULL CHECK (card_type IN ('D', 'C')),
            kind TEXT NOT NULL CHECK (kind IN ('P', 'D', 'I', 'O')),
            timestamp TEXT NOT NULL,
            deposit_pending INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_payment_card_timestamp ON payment(card_id, timestamp);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Payment, rusqlite::Error> {
    Ok(Payment {
        id: row.get(0)?,
        card_id: row.get(1)?,
        amount: get_decimal(row, 2)?,
        currency: get_currency(row, 3)?,
        card_type: get_card_type(row, 4)?,
        kind: get_payment_kind(row, 5)?,
        timestamp: row.get(6)?,
        deposit_pending: row.get(7)?,
    })
}
