use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    auth::{Email, NewUser, PasswordHash, User, create_user, set_staff},
    card::{Card, CardName, CardType, NewCard, create_card, update_card_funds},
    db::initialize,
    money::Currency,
};

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn create_test_user(connection: &Connection, email: &str) -> User {
    create_user(
        NewUser {
            email: Email::new_unchecked(email),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn create_test_staff(connection: &Connection, email: &str) -> User {
    let mut user = create_test_user(connection, email);
    set_staff(user.id, true, connection).expect("Could not make test user staff");
    user.is_staff = true;
    user
}

/// Open a card for `user` and set its balance.
pub(crate) fn create_test_card(
    connection: &Connection,
    user: &User,
    card_type: CardType,
    currency: Currency,
    balance: Decimal,
) -> Card {
    let mut card = create_card(
        NewCard {
            user_id: user.id,
            name: CardName::new_unchecked("Test card"),
            card_type,
            currency,
        },
        connection,
    )
    .expect("Could not create test card");

    card.balance = balance;
    update_card_funds(&card, connection).expect("Could not set test card balance");
    card
}
