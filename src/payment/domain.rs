//! Core payment domain types.

use std::fmt::Display;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    card::{CardId, CardType},
    money::Currency,
};

/// Database identifier for a payment.
pub type PaymentId = i64;

/// The event that changed a card's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentKind {
    /// Money spent with the card.
    Purchase,
    /// Money added to the card after staff approval.
    Deposit,
    /// Money received from another card.
    TransferIn,
    /// Money sent to another card.
    TransferOut,
}

impl PaymentKind {
    /// The single character code used in the database.
    pub fn db_code(self) -> &'static str {
        match self {
            PaymentKind::Purchase => "P",
            PaymentKind::Deposit => "D",
            PaymentKind::TransferIn => "I",
            PaymentKind::TransferOut => "O",
        }
    }

    /// Parse the single character database code.
    pub fn from_db_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(PaymentKind::Purchase),
            "D" => Some(PaymentKind::Deposit),
            "I" => Some(PaymentKind::TransferIn),
            "O" => Some(PaymentKind::TransferOut),
            _ => None,
        }
    }

    /// Whether money left the card.
    pub fn is_outgoing(self) -> bool {
        matches!(self, PaymentKind::Purchase | PaymentKind::TransferOut)
    }
}

impl Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaymentKind::Purchase => "Purchase",
            PaymentKind::Deposit => "Deposit",
            PaymentKind::TransferIn => "Transfer in",
            PaymentKind::TransferOut => "Transfer out",
        };

        write!(f, "{label}")
    }
}

pub(crate) fn get_payment_kind(row: &Row, index: usize) -> Result<PaymentKind, rusqlite::Error> {
    let raw: String = row.get(index)?;

    PaymentKind::from_db_code(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("invalid payment kind code {raw:?}").into(),
        )
    })
}

/// A record of a balance-affecting event on a card.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub card_id: CardId,
    /// Always positive, the kind says which way the money moved.
    pub amount: Decimal,
    pub currency: Currency,
    pub card_type: CardType,
    pub kind: PaymentKind,
    /// When the payment was made, in UTC.
    pub timestamp: OffsetDateTime,
    /// Set for deposits that staff have not approved yet.
    pub deposit_pending: bool,
}

/// The data needed to record a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub card_id: CardId,
    pub amount: Decimal,
    pub currency: Currency,
    pub card_type: CardType,
    pub kind: PaymentKind,
    pub timestamp: OffsetDateTime,
    pub deposit_pending: bool,
}
