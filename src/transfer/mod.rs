//! Sending money between cards, converting between currencies where needed.

mod between_cards;
mod by_account;
mod core;
mod form;
mod menu;

pub use between_cards::{get_transfer_between_cards_page, transfer_between_cards_endpoint};
pub use by_account::{TransferState, get_transfer_by_account_page, transfer_by_account_endpoint};
pub use core::{transfer_by_account_number, transfer_funds};
pub use menu::get_transfers_page;
