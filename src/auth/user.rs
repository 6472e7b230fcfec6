//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{Email, PasswordHash},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A customer or staff member of the bank.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user logs in with.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// Whether the user can approve deposits and credit applications.
    pub is_staff: bool,
    /// Inactive users cannot log in.
    pub is_active: bool,
}

impl User {
    /// The user's first and last name separated by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The data needed to register a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The address the user logs in with, unique across users.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// The bcrypt hash of the user's password.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                password TEXT NOT NULL,
                is_staff INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// New users are active customers.
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if the email is already registered, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection
        .execute(
            "INSERT INTO user (email, first_name, last_name, password) VALUES (?1, ?2, ?3, ?4)",
            (
                new_user.email.as_ref(),
                &new_user.first_name,
                &new_user.last_name,
                new_user.password_hash.as_ref(),
            ),
        )
        .map_err(|error| match Error::from(error) {
            Error::DuplicateEmail(_) => Error::DuplicateEmail(new_user.email.to_string()),
            error => error,
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: new_user.email,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        password_hash: new_user.password_hash,
        is_staff: false,
        is_active: true,
    })
}

const SELECT_USER: &str =
    "SELECT id, email, first_name, last_name, password, is_staff, is_active FROM user";

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has this email.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE email = :email"))?
        .query_row(&[(":email", email.as_ref())], map_row)
        .map_err(|error| error.into())
}

#[cfg(test)]
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Replace the password hash of a user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Grant or revoke staff permissions for a user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn set_staff(user_id: UserID, is_staff: bool, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET is_staff = ?1 WHERE id = ?2",
        (is_staff, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: Email::new_unchecked(&raw_email),
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        is_staff: row.get(5)?,
        is_active: row.get(6)?,
    })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{
            Email, NewUser, PasswordHash,
            user::{
                UserID, count_users, create_user, create_user_table, get_user_by_email,
                get_user_by_id, set_staff, update_password,
            },
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: Email::new_unchecked(email),
            first_name: "Ivan".to_owned(),
            last_name: "Petrov".to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("ivan@example.com"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email.as_ref(), "ivan@example.com");
        assert!(!inserted_user.is_staff);
        assert!(inserted_user.is_active);
    }

    #[test]
    fn insert_user_fails_with_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(new_user("ivan@example.com"), &db_connection).unwrap();

        let result = create_user(new_user("ivan@example.com"), &db_connection);

        assert_eq!(
            result,
            Err(Error::DuplicateEmail("ivan@example.com".to_owned()))
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("ivan@example.com"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_succeeds() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("ivan@example.com"), &db_connection).unwrap();

        let retrieved_user =
            get_user_by_email(&Email::new_unchecked("ivan@example.com"), &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn returns_correct_count() {
        let db_connection = get_db_connection();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        create_user(new_user("ivan@example.com"), &db_connection).unwrap();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }

    #[test]
    fn update_password_replaces_hash() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ivan@example.com"), &db_connection).unwrap();
        let new_hash = PasswordHash::new_unchecked("hunter3");

        update_password(user.id, &new_hash, &db_connection).unwrap();

        let got = get_user_by_id(user.id, &db_connection).unwrap();
        assert_eq!(got.password_hash, new_hash);
    }

    #[test]
    fn set_staff_grants_permission() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ivan@example.com"), &db_connection).unwrap();

        set_staff(user.id, true, &db_connection).unwrap();

        assert!(get_user_by_id(user.id, &db_connection).unwrap().is_staff);
    }

    #[test]
    fn set_staff_fails_for_missing_user() {
        let db_connection = get_db_connection();

        assert_eq!(
            set_staff(UserID::new(7), true, &db_connection),
            Err(Error::NotFound)
        );
    }
}
