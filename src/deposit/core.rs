//! Requesting deposits and the staff decision on them.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    Error,
    card::{Card, CardId, CardName, get_card, update_card_funds},
    money::{Currency, add_to_balance, get_currency, get_decimal, require_positive},
    payment::{
        NewPayment, PaymentKind, create_payment, delete_pending_deposits, settle_pending_deposits,
    },
};

/// A card with a deposit waiting for a staff decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDeposit {
    pub card_id: CardId,
    pub card_name: CardName,
    pub account_no: String,
    pub owner_email: String,
    pub amount: Decimal,
    pub currency: Currency,
}

/// Ask for `amount` to be added to `card` once staff approve it.
///
/// The amount is held in the card's pending deposit and a pending deposit
/// payment is recorded.
///
/// # Errors
///
/// - [Error::NonPositiveAmount] if `amount` is zero or negative,
/// - [Error::DepositAlreadyPending] if the card already has a deposit awaiting approval,
/// - [Error::AmountOverflow] if the pending amount would overflow.
pub fn request_deposit(
    card: &Card,
    amount: Decimal,
    timestamp: OffsetDateTime,
    connection: &Connection,
) -> Result<Card, Error> {
    let amount = require_positive(amount)?;

    if card.deposit_pending {
        return Err(Error::DepositAlreadyPending);
    }

    let mut updated_card = card.clone();
    updated_card.pending_deposit_amount = add_to_balance(card.pending_deposit_amount, amount)?;
    updated_card.deposit_pending = true;

    let transaction = connection.unchecked_transaction()?;

    update_card_funds(&updated_card, &transaction)?;

    create_payment(
        NewPayment {
            card_id: card.id,
            amount,
            currency: card.currency,
            card_type: card.card_type,
            kind: PaymentKind::Deposit,
            timestamp,
            deposit_pending: true,
        },
        &transaction,
    )?;

    transaction.commit()?;

    Ok(updated_card)
}

/// Add the pending deposit of a card to its balance.
///
/// # Errors
///
/// - [Error::NoPendingDeposit] if the card has no deposit awaiting approval,
/// - [Error::NotFound] if the card does not exist,
/// - [Error::AmountOverflow] if the new balance would overflow. The deposit stays pending.
pub fn approve_deposit(card_id: CardId, connection: &Connection) -> Result<Card, Error> {
    let mut card = get_pending_card(card_id, connection)?;

    card.balance = add_to_balance(card.balance, card.pending_deposit_amount)?;
    card.pending_deposit_amount = Decimal::ZERO;
    card.deposit_pending = false;

    let transaction = connection.unchecked_transaction()?;
    update_card_funds(&card, &transaction)?;
    settle_pending_deposits(card.id, &transaction)?;

    transaction.commit()?;

    Ok(card)
}

/// Discard the pending deposit of a card.
///
/// # Errors
///
/// Returns [Error::NoPendingDeposit] if the card has no deposit awaiting approval,
/// or [Error::NotFound] if the card does not exist.
pub fn reject_deposit(card_id: CardId, connection: &Connection) -> Result<Card, Error> {
    let mut card = get_pending_card(card_id, connection)?;

    let transaction = connection.unchecked_transaction()?;

    card.pending_deposit_amount = Decimal::ZERO;
    card.deposit_pending = false;
    update_card_funds(&card, &transaction)?;
    delete_pending_deposits(card.id, &transaction)?;

    transaction.commit()?;

    Ok(card)
}

fn get_pending_card(card_id: CardId, connection: &Connection) -> Result<Card, Error> {
    let card = get_card(card_id, connection)?;

    if card.deposit_pending {
        Ok(card)
    } else {
        Err(Error::NoPendingDeposit)
    }
}

/// Every card with a deposit awaiting approval, oldest card first.
pub fn get_pending_deposits(connection: &Connection) -> Result<Vec<PendingDeposit>, Error> {
    connection
        .prepare(
            "SELECT card.id, card.name, card.account_no, user.email, card.pending_deposit_amount, card.currency
            FROM card
            INNER JOIN user ON user.id = card.user_id
            WHERE card.deposit_pending = 1
            ORDER BY card.id ASC",
        )?
        .query_map([], map_pending_deposit)?
        .map(|maybe_deposit| maybe_deposit.map_err(|error| error.into()))
        .collect()
}

/// The deposit awaiting approval on a single card.
///
/// # Errors
///
/// Returns [Error::NotFound] if the card does not exist or has no pending deposit.
pub fn get_pending_deposit(
    card_id: CardId,
    connection: &Connection,
) -> Result<PendingDeposit, Error> {
    connection
        .prepare(
            "SELECT card.id, card.name, card.account_no, user.email, card.pending_deposit_amount, card.currency
            FROM card
            INNER JOIN user ON user.id = card.user_id
            WHERE card.deposit_pending = 1 AND card.id = ?1",
        )?
        .query_row([card_id], map_pending_deposit)
        .map_err(|error| error.into())
}

/// The number of cards with a deposit awaiting approval.
pub fn count_pending_deposits(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM card WHERE deposit_pending = 1",
            [],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_pending_deposit(row: &Row) -> Result<PendingDeposit, rusqlite::Error> {
    let card_name: String = row.get(1)?;

    Ok(PendingDeposit {
        card_id: row.get(0)?,
        card_name: CardName::new_unchecked(&card_name),
        account_no: row.get(2)?,
        owner_email: row.get(3)?,
        amount: get_decimal(row, 4)?,
        currency: get_currency(row, 5)?,
    })
}
