//! Database operations for cards.

use rand::Rng;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;

use crate::{
    Error,
    auth::UserID,
    card::{Card, CardId, CardName, NewCard, domain::get_card_type},
    money::{get_currency, get_decimal, round_cents},
};

/// The number of digits in an account number.
pub const ACCOUNT_NUMBER_LENGTH: usize = 16;

/// How many account numbers to try before giving up on opening a card.
const MAX_ACCOUNT_NUMBER_ATTEMPTS: u32 = 10;

/// Create a random account number made of [ACCOUNT_NUMBER_LENGTH] digits.
pub fn generate_account_number(rng: &mut impl Rng) -> String {
    (0..ACCOUNT_NUMBER_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Create a random three digit CVV code.
pub fn generate_cvv(rng: &mut impl Rng) -> u16 {
    rng.gen_range(100..=999)
}

/// Open a card with a zero balance and a generated account number and CVV.
///
/// A new account number is generated if the first one is already taken.
///
/// # Errors
///
/// Returns [Error::AccountNumberCollision] if no unused account number was
/// found, or [Error::SqlError] if another SQL error occurred.
pub fn create_card(new_card: NewCard, connection: &Connection) -> Result<Card, Error> {
    create_card_with_rng(new_card, &mut rand::thread_rng(), connection)
}

pub(crate) fn create_card_with_rng(
    new_card: NewCard,
    rng: &mut impl Rng,
    connection: &Connection,
) -> Result<Card, Error> {
    let cvv = generate_cvv(rng);

    for _ in 0..MAX_ACCOUNT_NUMBER_ATTEMPTS {
        let account_no = generate_account_number(rng);

        let result = connection.execute(
            "INSERT INTO card (user_id, name, account_no, cvv, balance, pending_deposit_amount, card_type, currency)
            VALUES (?1, ?2, ?3, ?4, '0', '0', ?5, ?6)",
            (
                new_card.user_id.as_i64(),
                new_card.name.as_ref(),
                &account_no,
                cvv,
                new_card.card_type.db_code(),
                new_card.currency.db_code(),
            ),
        );

        match result {
            Ok(_) => {
                return Ok(Card {
                    id: connection.last_insert_rowid(),
                    user_id: new_card.user_id,
                    name: new_card.name,
                    account_no,
                    cvv,
                    balance: Decimal::ZERO,
                    pending_deposit_amount: Decimal::ZERO,
                    is_deposit_allowed: true,
                    deposit_pending: false,
                    card_type: new_card.card_type,
                    currency: new_card.currency,
                });
            }
            // Code 2067 occurs when a UNIQUE constraint failed.
            Err(rusqlite::Error::SqliteFailure(sql_error, Some(ref desc)))
                if sql_error.extended_code == 2067 && desc.contains("card.account_no") =>
            {
                tracing::warn!("Account number collision when opening a card, retrying");
            }
            Err(error) => return Err(error.into()),
        }
    }

    Err(Error::AccountNumberCollision(MAX_ACCOUNT_NUMBER_ATTEMPTS))
}

const SELECT_CARD: &str = "SELECT id, user_id, name, account_no, cvv, balance, \
    pending_deposit_amount, is_deposit_allowed, deposit_pending, card_type, currency FROM card";

/// Retrieve a single card by ID regardless of who owns it.
pub fn get_card(card_id: CardId, connection: &Connection) -> Result<Card, Error> {
    connection
        .prepare(&format!("{SELECT_CARD} WHERE id = :id"))?
        .query_row(&[(":id", &card_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a card that belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the card does not exist or belongs to another user.
pub fn get_card_for_user(
    card_id: CardId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Card, Error> {
    connection
        .prepare(&format!("{SELECT_CARD} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((card_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve the card with the account number `account_no`.
pub fn get_card_by_account_no(account_no: &str, connection: &Connection) -> Result<Card, Error> {
    connection
        .prepare(&format!("{SELECT_CARD} WHERE account_no = ?1"))?
        .query_row([account_no.trim()], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the cards of `user_id` in the order they were opened.
pub fn get_cards_for_user(user_id: UserID, connection: &Connection) -> Result<Vec<Card>, Error> {
    connection
        .prepare(&format!("{SELECT_CARD} WHERE user_id = ?1 ORDER BY id ASC"))?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_card| maybe_card.map_err(|error| error.into()))
        .collect()
}

/// Write the balance, pending deposit and deposit flags of `card` to the database.
///
/// Amounts are rounded to cents.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCard] if the card does not exist.
pub fn update_card_funds(card: &Card, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE card SET balance = ?1, pending_deposit_amount = ?2, \
        is_deposit_allowed = ?3, deposit_pending = ?4 WHERE id = ?5",
        (
            round_cents(card.balance).to_string(),
            round_cents(card.pending_deposit_amount).to_string(),
            card.is_deposit_allowed,
            card.deposit_pending,
            card.id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCard);
    }

    Ok(())
}

/// Initialize the card table and indexes.
pub fn create_card_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS card (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            account_no TEXT NOT NULL UNIQUE,
            cvv INTEGER NOT NULL,
            balance TEXT NOT NULL DEFAULT '0',
            pending_deposit_amount TEXT NOT NULL DEFAULT '0',
            is_deposit_allowed INTEGER NOT NULL DEFAULT 1,
            deposit_pending INTEGER NOT NULL DEFAULT 0,
            card_type TEXT NOT NULL CHECK (card_type IN ('D', 'C')),
            currency TEXT NOT NULL CHECK (currency IN ('U', 'B'))
        );

        CREATE INDEX IF NOT EXISTS idx_card_user_id ON card(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Card, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Card {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CardName::new_unchecked(&raw_name),
        account_no: row.get(3)?,
        cvv: row.get(4)?,
        balance: get_decimal(row, 5)?,
        pending_deposit_amount: get_decimal(row, 6)?,
        is_deposit_allowed: row.get(7)?,
        deposit_pending: row.get(8)?,
        card_type: get_card_type(row, 9)?,
        currency: get_currency(row, 10)?,
    })
}

#[cfg(test)]
mod account_number_tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::{ACCOUNT_NUMBER_LENGTH, generate_account_number, generate_cvv};

    #[test]
    fn account_number_has_sixteen_digits() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let account_no = generate_account_number(&mut rng);

            assert_eq!(account_no.len(), ACCOUNT_NUMBER_LENGTH);
            assert!(account_no.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn cvv_has_three_digits() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let cvv = generate_cvv(&mut rng);

            assert!((100..=999).contains(&cvv), "got CVV {cvv}");
        }
    }
}

#[cfg(test)]
mod card_query_tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        auth::UserID,
        card::{
            CardName, CardType, NewCard, create_card, get_card, get_card_by_account_no,
            get_card_for_user, get_cards_for_user, update_card_funds,
        },
        money::Currency,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::create_card_with_rng;

    fn new_card(user_id: UserID, name: &str) -> NewCard {
        NewCard {
            user_id,
            name: CardName::new_unchecked(name),
            card_type: CardType::Debit,
            currency: Currency::Byn,
        }
    }

    #[test]
    fn create_card_starts_with_zero_balance() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");

        let card = create_card(new_card(user.id, "Everyday"), &connection).unwrap();

        assert!(card.id > 0);
        assert_eq!(card.balance, dec!(0));
        assert_eq!(card.pending_deposit_amount, dec!(0));
        assert!(card.is_deposit_allowed);
        assert!(!card.deposit_pending);
        assert_eq!(get_card(card.id, &connection), Ok(card));
    }

    #[test]
    fn create_card_retries_on_account_number_collision() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let first = create_card_with_rng(
            new_card(user.id, "First"),
            &mut StdRng::seed_from_u64(7),
            &connection,
        )
        .unwrap();

        // The same seed produces the same first account number.
        let second = create_card_with_rng(
            new_card(user.id, "Second"),
            &mut StdRng::seed_from_u64(7),
            &connection,
        )
        .unwrap();

        assert_ne!(first.account_no, second.account_no);
    }

    #[test]
    fn get_card_for_user_hides_other_users_cards() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection, "anna@example.com");
        let other = create_test_user(&connection, "boris@example.com");
        let card = create_card(new_card(owner.id, "Everyday"), &connection).unwrap();

        assert_eq!(
            get_card_for_user(card.id, owner.id, &connection),
            Ok(card.clone())
        );
        assert_eq!(
            get_card_for_user(card.id, other.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_card_by_account_no_ignores_surrounding_whitespace() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let card = create_card(new_card(user.id, "Everyday"), &connection).unwrap();

        let got = get_card_by_account_no(&format!(" {} ", card.account_no), &connection);

        assert_eq!(got, Ok(card));
    }

    #[test]
    fn get_cards_for_user_returns_only_their_cards() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection, "anna@example.com");
        let other = create_test_user(&connection, "boris@example.com");
        let first = create_card(new_card(owner.id, "First"), &connection).unwrap();
        let second = create_card(new_card(owner.id, "Second"), &connection).unwrap();
        create_card(new_card(other.id, "Other"), &connection).unwrap();

        let cards = get_cards_for_user(owner.id, &connection).unwrap();

        assert_eq!(cards, vec![first, second]);
    }

    #[test]
    fn update_card_funds_rounds_to_cents() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let mut card = create_card(new_card(user.id, "Everyday"), &connection).unwrap();
        card.balance = dec!(10.125);
        card.pending_deposit_amount = dec!(5);
        card.deposit_pending = true;

        update_card_funds(&card, &connection).unwrap();

        let got = get_card(card.id, &connection).unwrap();
        assert_eq!(got.balance, dec!(10.12));
        assert_eq!(got.pending_deposit_amount, dec!(5));
        assert!(got.deposit_pending);
    }

    #[test]
    fn update_card_funds_fails_on_missing_card() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let mut card = create_card(new_card(user.id, "Everyday"), &connection).unwrap();
        card.id += 100;

        assert_eq!(
            update_card_funds(&card, &connection),
            Err(Error::UpdateMissingCard)
        );
    }
}
