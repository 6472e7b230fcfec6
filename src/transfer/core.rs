//! Moving money between cards.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    Error,
    card::{Card, get_card_by_account_no, update_card_funds},
    money::{add_to_balance, convert, require_positive},
    payment::{NewPayment, PaymentKind, create_payment},
};

/// The sender and receiver cards after a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub sender: Card,
    pub receiver: Card,
}

/// Send `amount` from `sender` to the card with `receiver_account_number`.
///
/// # Errors
///
/// Checked in this order:
/// - [Error::NonPositiveAmount] if `amount` is zero or negative,
/// - [Error::ReceiverNotFound] if no card has the account number,
/// - then the checks of [transfer_funds].
pub fn transfer_by_account_number(
    sender: &Card,
    receiver_account_number: &str,
    amount: Decimal,
    usd_to_byn_rate: Decimal,
    timestamp: OffsetDateTime,
    connection: &Connection,
) -> Result<TransferOutcome, Error> {
    let amount = require_positive(amount)?;

    let receiver = match get_card_by_account_no(receiver_account_number, connection) {
        Ok(card) => card,
        Err(Error::NotFound) => {
            return Err(Error::ReceiverNotFound(
                receiver_account_number.trim().to_owned(),
            ));
        }
        Err(error) => return Err(error),
    };

    transfer_funds(
        sender,
        &receiver,
        amount,
        usd_to_byn_rate,
        timestamp,
        connection,
    )
}

/// Send `amount` in the sender's currency from `sender` to `receiver`.
///
/// The receiver is credited the amount converted to its currency. Both
/// balances and the outgoing and incoming payments are written in a single
/// transaction.
///
/// # Errors
///
/// Checked in this order:
/// - [Error::NonPositiveAmount] if `amount` is zero or negative,
/// - [Error::InsufficientTransferFunds] if `amount` exceeds the sender's balance,
/// - [Error::SameCardTransfer] if the sender and receiver are the same card,
/// - [Error::AmountOverflow] if the receiver's balance would overflow.
pub fn transfer_funds(
    sender: &Card,
    receiver: &Card,
    amount: Decimal,
    usd_to_byn_rate: Decimal,
    timestamp: OffsetDateTime,
    connection: &Connection,
) -> Result<TransferOutcome, Error> {
    let amount = require_positive(amount)?;

    if amount > sender.balance {
        return Err(Error::InsufficientTransferFunds);
    }

    if sender.id == receiver.id {
        return Err(Error::SameCardTransfer);
    }

    let credited = convert(amount, sender.currency, receiver.currency, usd_to_byn_rate)?;

    let mut sender = sender.clone();
    sender.balance -= amount;
    let mut receiver = receiver.clone();
    receiver.balance = add_to_balance(receiver.balance, credited)?;

    let transaction = connection.unchecked_transaction()?;
    update_card_funds(&sender, &transaction)?;
    update_card_funds(&receiver, &transaction)?;

    create_payment(
        NewPayment {
            card_id: sender.id,
            amount,
            currency: sender.currency,
            card_type: sender.card_type,
            kind: PaymentKind::TransferOut,
            timestamp,
            deposit_pending: false,
        },
        &transaction,
    )?;
    create_payment(
        NewPayment {
            card_id: receiver.id,
            amount: credited,
            currency: receiver.currency,
            card_type: receiver.card_type,
            kind: PaymentKind::TransferIn,
            timestamp,
            deposit_pending: false,
        },
        &transaction,
    )?;

    transaction.commit()?;

    Ok(TransferOutcome { sender, receiver })
}
