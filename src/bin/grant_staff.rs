use std::{error::Error, path::Path};

use clap::Parser;
use rusqlite::Connection;

use bankroll::{Email, get_user_by_email, set_staff};

/// A utility for granting or revoking staff permissions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address of the user.
    #[arg(long)]
    email: String,

    /// Remove staff permissions instead of granting them.
    #[arg(long)]
    revoke: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        return Err(format!("no database at {}", db_path.display()).into());
    }

    let connection = Connection::open(db_path)?;
    let email = Email::new(&args.email)?;
    let user = get_user_by_email(&email, &connection)?;

    set_staff(user.id, !args.revoke, &connection)?;

    if args.revoke {
        println!("{email} is no longer a staff member.");
    } else {
        println!("{email} is now a staff member.");
    }

    Ok(())
}
