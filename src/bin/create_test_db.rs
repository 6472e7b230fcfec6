use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use bankroll::{
    CardName, CardType, Currency, Email, GoalName, NewCard, NewCreditApplication, NewSavingsGoal,
    NewUser, PasswordHash, ValidatedPassword, approve_savings_goal, create_card,
    create_credit_application, create_savings_goal, create_totp_device, create_user,
    initialize_db, request_deposit, set_staff, update_card_funds,
};

/// A utility for creating a test database for the bankroll server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    println!("Creating staff member staff@example.com...");
    let staff = create_user(
        NewUser {
            email: Email::new("staff@example.com")?,
            first_name: "Olga".to_owned(),
            last_name: "Ivanova".to_owned(),
            password_hash: password_hash.clone(),
        },
        &conn,
    )?;
    set_staff(staff.id, true, &conn)?;
    let staff_secret = create_totp_device(staff.id, &conn)?;

    println!("Creating customer test@example.com...");
    let customer = create_user(
        NewUser {
            email: Email::new("test@example.com")?,
            first_name: "Test".to_owned(),
            last_name: "Customer".to_owned(),
            password_hash,
        },
        &conn,
    )?;
    let customer_secret = create_totp_device(customer.id, &conn)?;

    println!("Opening cards...");
    let mut debit_card = create_card(
        NewCard {
            user_id: customer.id,
            name: CardName::new("Everyday")?,
            card_type: CardType::Debit,
            currency: Currency::Byn,
        },
        &conn,
    )?;
    debit_card.balance = Decimal::new(150_000, 2);
    update_card_funds(&debit_card, &conn)?;

    let mut credit_card = create_card(
        NewCard {
            user_id: customer.id,
            name: CardName::new("Travel")?,
            card_type: CardType::Credit,
            currency: Currency::Usd,
        },
        &conn,
    )?;
    credit_card.balance = Decimal::new(25_000, 2);
    update_card_funds(&credit_card, &conn)?;

    let now = OffsetDateTime::now_utc();

    println!("Requesting a deposit for staff to review...");
    request_deposit(&debit_card, Decimal::new(200, 0), now, &conn)?;

    println!("Submitting a credit application...");
    create_credit_application(
        NewCreditApplication::new(customer.id, Decimal::new(5_000, 0), "New kitchen", now)?,
        &conn,
    )?;

    println!("Adding a savings goal...");
    let goal = create_savings_goal(
        NewSavingsGoal {
            user_id: customer.id,
            goal_name: GoalName::new("Holiday")?,
            target_amount: Decimal::new(3_000, 0),
            target_date: (now + Duration::days(365)).date(),
            created_at: now,
        },
        &conn,
    )?;
    approve_savings_goal(goal.id, customer.id, goal.monthly_payment, &conn)?;

    println!("Success! Log in as test@example.com or staff@example.com with the password 'test'.");
    println!("Add these accounts to an authenticator app for the one-time codes:");
    println!("  {}", customer_secret.otpauth_url(&customer.email)?);
    println!("  {}", staff_secret.otpauth_url(&staff.email)?);

    Ok(())
}
