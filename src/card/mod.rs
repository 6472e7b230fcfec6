//! Debit and credit cards that hold a balance in US dollars or Belarusian rubles.

mod create;
mod db;
mod domain;
mod list;

pub use create::{create_card_endpoint, get_new_card_page};
pub use db::{
    create_card, create_card_table, get_card, get_card_by_account_no, get_card_for_user,
    get_cards_for_user, update_card_funds,
};
pub use domain::{CARD_NAME_MAX_LENGTH, Card, CardId, CardName, CardType, NewCard, get_card_type};
pub use list::get_cards_page;
