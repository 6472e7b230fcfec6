use std::{error::Error, io, path::Path};

use clap::Parser;
use rusqlite::Connection;

use bankroll::{Email, PasswordHash, User, ValidatedPassword, get_user_by_email, update_password};

/// Set a new password for a customer or staff member who cannot log in.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address of the user.
    #[arg(long)]
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        return Err(format!("no database at {}", db_path.display()).into());
    }

    let connection = Connection::open(db_path)?;
    let email = Email::new(&args.email)?;
    let user = get_user_by_email(&email, &connection)
        .map_err(|error| format!("could not find {email}: {error}"))?;

    println!("Resetting the password for {} {} <{email}>", user.first_name, user.last_name);

    let Some(password_hash) = prompt_new_password(&user)? else {
        println!("Password unchanged.");
        return Ok(());
    };

    update_password(user.id, &password_hash, &connection)?;
    println!("Password updated.");

    Ok(())
}

/// Read a password from the terminal, or `None` if stdin closes.
fn read_password(prompt: &str) -> io::Result<Option<String>> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Ok(Some(password)),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(error) => Err(error),
    }
}

/// Ask until the user enters a strong password twice.
fn prompt_new_password(user: &User) -> Result<Option<PasswordHash>, Box<dyn Error>> {
    let user_inputs = [
        user.email.as_ref(),
        user.first_name.as_str(),
        user.last_name.as_str(),
    ];

    loop {
        let Some(password) = read_password("New password: ")? else {
            return Ok(None);
        };

        let validated_password = match ValidatedPassword::new(&password, &user_inputs) {
            Ok(validated_password) => validated_password,
            Err(error) => {
                eprintln!("{error}");
                continue;
            }
        };

        let Some(confirmation) = read_password("Confirm password: ")? else {
            return Ok(None);
        };

        if password != confirmation {
            eprintln!("The passwords do not match, try again.");
            continue;
        }

        return Ok(Some(PasswordHash::new(
            validated_password,
            PasswordHash::DEFAULT_COST,
        )?));
    }
}
