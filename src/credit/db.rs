//! Database operations for credit applications and credits.

use rusqlite::{Connection, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    app_state::BankingRules,
    auth::UserID,
    credit::{
        Credit, CreditApplication, CreditApplicationId, CreditStatus, NewCreditApplication,
        annuity, domain::get_credit_status,
    },
    money::{get_decimal, round_cents},
};

/// A credit application with the email of the user who submitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationWithApplicant {
    pub application: CreditApplication,
    pub applicant_email: String,
}

const SELECT_APPLICATION: &str =
    "SELECT id, user_id, amount, purpose, status, created_at FROM credit_application";

/// Submit a credit application in the pending state.
pub fn create_credit_application(
    new_application: NewCreditApplication,
    connection: &Connection,
) -> Result<CreditApplication, Error> {
    let created_at = new_application.created_at.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO credit_application (user_id, amount, purpose, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_application.user_id.as_i64(),
            new_application.amount.to_string(),
            &new_application.purpose,
            CreditStatus::Pending.db_code(),
            created_at,
        ),
    )?;

    Ok(CreditApplication {
        id: connection.last_insert_rowid(),
        user_id: new_application.user_id,
        amount: new_application.amount,
        purpose: new_application.purpose,
        status: CreditStatus::Pending,
        created_at,
    })
}

/// Retrieve a credit application by ID.
pub fn get_credit_application(
    application_id: CreditApplicationId,
    connection: &Connection,
) -> Result<CreditApplication, Error> {
    connection
        .prepare(&format!("{SELECT_APPLICATION} WHERE id = ?1"))?
        .query_row([application_id], map_application_row)
        .map_err(|error| error.into())
}

/// Retrieve the credit applications of a user, newest first.
pub fn get_credit_applications_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CreditApplication>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_APPLICATION} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([user_id.as_i64()], map_application_row)?
        .map(|maybe_application| maybe_application.map_err(|error| error.into()))
        .collect()
}

/// Retrieve every credit application with the applicant's email, pending
/// applications first and then oldest first.
pub fn get_all_credit_applications(
    connection: &Connection,
) -> Result<Vec<ApplicationWithApplicant>, Error> {
    connection
        .prepare(
            "SELECT a.id, a.user_id, a.amount, a.purpose, a.status, a.created_at, user.email
            FROM credit_application a
            INNER JOIN user ON user.id = a.user_id
            ORDER BY a.status <> 'PENDING', a.created_at ASC, a.id ASC",
        )?
        .query_map([], |row| {
            Ok(ApplicationWithApplicant {
                application: map_application_row(row)?,
                applicant_email: row.get(6)?,
            })
        })?
        .map(|maybe_application| maybe_application.map_err(|error| error.into()))
        .collect()
}

/// The number of applications awaiting a staff decision.
pub fn count_pending_credit_applications(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM credit_application WHERE status = ?1",
            [CreditStatus::Pending.db_code()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Approve or reject a pending credit application.
///
/// Approving creates a credit with the bank's current interest rate and
/// term. The credit is returned when one was created.
///
/// # Errors
///
/// - [Error::NotFound] if the application does not exist,
/// - [Error::CreditApplicationDecided] if it is no longer pending.
pub fn decide_credit_application(
    application_id: CreditApplicationId,
    approved: bool,
    banking_rules: &BankingRules,
    decided_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Option<Credit>, Error> {
    let application = get_credit_application(application_id, connection)?;

    if application.status != CreditStatus::Pending {
        return Err(Error::CreditApplicationDecided);
    }

    let transaction = connection.unchecked_transaction()?;

    let credit = if approved {
        Some(create_credit(&application, banking_rules, decided_at, &transaction)?)
    } else {
        None
    };

    let new_status = if approved {
        CreditStatus::Approved
    } else {
        CreditStatus::Rejected
    };
    let rows_affected = transaction.execute(
        "UPDATE credit_application SET status = ?1 WHERE id = ?2 AND status = ?3",
        (
            new_status.db_code(),
            application_id,
            CreditStatus::Pending.db_code(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCreditApplication);
    }

    transaction.commit()?;

    Ok(credit)
}

fn create_credit(
    application: &CreditApplication,
    banking_rules: &BankingRules,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Credit, Error> {
    let created_at = created_at.to_offset(UtcOffset::UTC);
    let amount = round_cents(application.amount);
    let monthly_payment = annuity(
        amount,
        banking_rules.credit_interest_rate,
        banking_rules.credit_term_months,
    )?;

    connection.execute(
        "INSERT INTO credit
            (user_id, application_id, amount, interest_rate, term_months, monthly_payment, remaining_amount, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            application.user_id.as_i64(),
            application.id,
            amount.to_string(),
            banking_rules.credit_interest_rate.to_string(),
            banking_rules.credit_term_months,
            monthly_payment.to_string(),
            amount.to_string(),
            CreditStatus::Approved.db_code(),
            created_at,
        ),
    )?;

    Ok(Credit {
        id: connection.last_insert_rowid(),
        user_id: application.user_id,
        application_id: application.id,
        amount,
        interest_rate: banking_rules.credit_interest_rate,
        term_months: banking_rules.credit_term_months,
        monthly_payment,
        remaining_amount: amount,
        status: CreditStatus::Approved,
        created_at,
    })
}

/// Retrieve the approved credits of a user, newest first.
pub fn get_active_credits(user_id: UserID, connection: &Connection) -> Result<Vec<Credit>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, application_id, amount, interest_rate, term_months,
                monthly_payment, remaining_amount, status, created_at
            FROM credit
            WHERE user_id = ?1 AND status = ?2
            ORDER BY created_at DESC, id DESC",
        )?
        .query_map(
            (user_id.as_i64(), CreditStatus::Approved.db_code()),
            map_credit_row,
        )?
        .map(|maybe_credit| maybe_credit.map_err(|error| error.into()))
        .collect()
}

/// Initialize the credit application and credit tables.
pub fn create_credit_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS credit_application (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            amount TEXT NOT NULL,
            purpose TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED')),
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS credit (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            application_id INTEGER NOT NULL UNIQUE REFERENCES credit_application(id) ON DELETE CASCADE,
            amount TEXT NOT NULL,
            interest_rate TEXT NOT NULL,
            term_months INTEGER NOT NULL CHECK (term_months > 0),
            monthly_payment TEXT NOT NULL,
            remaining_amount TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED')),
            created_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}

fn map_application_row(row: &Row) -> Result<CreditApplication, rusqlite::Error> {
    Ok(CreditApplication {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: get_decimal(row, 2)?,
        purpose: row.get(3)?,
        status: get_credit_status(row, 4)?,
        created_at: row.get(5)?,
    })
}

fn map_credit_row(row: &Row) -> Result<Credit, rusqlite::Error> {
    Ok(Credit {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        application_id: row.get(2)?,
        amount: get_decimal(row, 3)?,
        interest_rate: get_decimal(row, 4)?,
        term_months: row.get(5)?,
        monthly_payment: get_decimal(row, 6)?,
        remaining_amount: get_decimal(row, 7)?,
        status: get_credit_status(row, 8)?,
        created_at: row.get(9)?,
    })
}
