//! Core card domain types.

use std::fmt::Display;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, auth::UserID, money::Currency};

/// Database identifier for a card.
pub type CardId = i64;

/// The maximum number of characters in a card name.
pub const CARD_NAME_MAX_LENGTH: usize = 20;

/// Whether a card spends the holder's own money or borrowed money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Debit,
    Credit,
}

impl CardType {
    /// All card types in the order they are shown in forms.
    pub const ALL: [CardType; 2] = [CardType::Debit, CardType::Credit];

    /// The single character code used in the database.
    pub fn db_code(self) -> &'static str {
        match self {
            CardType::Debit => "D",
            CardType::Credit => "C",
        }
    }

    /// Parse the single character database code.
    pub fn from_db_code(code: &str) -> Option<Self> {
        match code {
            "D" => Some(CardType::Debit),
            "C" => Some(CardType::Credit),
            _ => None,
        }
    }

    /// The value used for this card type in HTML forms.
    pub fn form_value(self) -> &'static str {
        match self {
            CardType::Debit => "debit",
            CardType::Credit => "credit",
        }
    }
}

impl Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardType::Debit => write!(f, "Debit"),
            CardType::Credit => write!(f, "Credit"),
        }
    }
}

/// Read a card type stored as its database code from column `index` of `row`.
pub fn get_card_type(row: &Row, index: usize) -> Result<CardType, rusqlite::Error> {
    let raw: String = row.get(index)?;

    CardType::from_db_code(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("invalid card type code {raw:?}").into(),
        )
    })
}

/// A validated card name between 1 and [CARD_NAME_MAX_LENGTH] characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CardName(String);

impl CardName {
    /// Create a card name from user input.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyField] if `name` is blank or
    /// [Error::FieldTooLong] if it has more than [CARD_NAME_MAX_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyField("Card name"))
        } else if name.chars().count() > CARD_NAME_MAX_LENGTH {
            Err(Error::FieldTooLong("Card name", CARD_NAME_MAX_LENGTH))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a card name without validation.
    ///
    /// The caller should ensure that the name is not empty and not too long.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CardName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CardName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A card that holds a balance in a single currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub user_id: UserID,
    pub name: CardName,
    /// 16 random digits, unique across all cards.
    pub account_no: String,
    /// 3 random digits between 100 and 999.
    pub cvv: u16,
    pub balance: Decimal,
    /// The amount waiting for staff approval.
    pub pending_deposit_amount: Decimal,
    /// Credit cards with this set to false cannot be used for payments.
    pub is_deposit_allowed: bool,
    pub deposit_pending: bool,
    pub card_type: CardType,
    pub currency: Currency,
}

/// The data needed to open a new card.
#[derive(Debug, Clone)]
pub struct NewCard {
    /// The owner of the card.
    pub user_id: UserID,
    /// The name shown in the card list, unique for the owner.
    pub name: CardName,
    pub card_type: CardType,
    /// The currency the balance is kept in.
    pub currency: Currency,
}

/// Form data for opening a card.
#[derive(Debug, Serialize, Deserialize)]
pub struct CardFormData {
    pub name: String,
    pub card_type: CardType,
    pub currency: Currency,
}
