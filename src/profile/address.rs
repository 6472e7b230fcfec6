//! The postal address stored for each user.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::Deserialize;

use crate::{Error, auth::UserID};

const STREET_ADDRESS_MAX_LENGTH: usize = 512;
const CITY_MAX_LENGTH: usize = 256;
const COUNTRY_MAX_LENGTH: usize = 256;

/// A user's postal address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAddress {
    pub street_address: String,
    pub city: String,
    /// Always greater than zero.
    pub postal_code: u32,
    pub country: String,
}

/// The raw address form. The postal code is kept as text so that a bad value
/// can be shown back to the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

fn required_text(value: &str, field: &'static str, max_length: usize) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::EmptyField(field));
    }

    if value.chars().count() > max_length {
        return Err(Error::FieldTooLong(field, max_length));
    }

    Ok(value.to_owned())
}

impl UserAddress {
    /// Validate the address form.
    ///
    /// # Errors
    ///
    /// - [Error::EmptyField] or [Error::FieldTooLong] for a bad text field,
    /// - [Error::InvalidPostalCode] if the postal code is not a positive whole number.
    pub fn from_form(form: &AddressForm) -> Result<Self, Error> {
        let street_address = required_text(
            &form.street_address,
            "Street address",
            STREET_ADDRESS_MAX_LENGTH,
        )?;
        let city = required_text(&form.city, "City", CITY_MAX_LENGTH)?;
        let postal_code = match form.postal_code.trim().parse::<u32>() {
            Ok(code) if code > 0 => code,
            _ => return Err(Error::InvalidPostalCode),
        };
        let country = required_text(&form.country, "Country", COUNTRY_MAX_LENGTH)?;

        Ok(Self {
            street_address,
            city,
            postal_code,
            country,
        })
    }
}

/// Get the address of a user, if they have saved one.
pub fn get_address(
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<UserAddress>, Error> {
    connection
        .query_row(
            "SELECT street_address, city, postal_code, country FROM user_address WHERE user_id = ?1",
            [user_id.as_i64()],
            map_address_row,
        )
        .optional()
        .map_err(|error| error.into())
}

/// Save the address of a user, replacing any existing address.
pub fn save_address(
    user_id: UserID,
    address: &UserAddress,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_address (user_id, street_address, city, postal_code, country)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(user_id) DO UPDATE SET
            street_address = excluded.street_address,
            city = excluded.city,
            postal_code = excluded.postal_code,
            country = excluded.country",
        (
            user_id.as_i64(),
            &address.street_address,
            &address.city,
            address.postal_code,
            &address.country,
        ),
    )?;

    Ok(())
}

/// Create the table for user addresses.
pub fn create_address_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_address (
            user_id INTEGER PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
            street_address TEXT NOT NULL,
            city TEXT NOT NULL,
            postal_code INTEGER NOT NULL CHECK (postal_code > 0),
            country TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_address_row(row: &Row) -> Result<UserAddress, rusqlite::Error> {
    Ok(UserAddress {
        street_address: row.get(0)?,
        city: row.get(1)?,
        postal_code: row.get(2)?,
        country: row.get(3)?,
    })
}
