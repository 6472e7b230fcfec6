//! Database operations for savings goals.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::UtcOffset;

use crate::{
    Error,
    auth::UserID,
    money::get_decimal,
    savings::{
        GoalName, NewSavingsGoal, SavingsGoal, SavingsGoalId,
        domain::{monthly_payment, total_months},
    },
};

const SELECT_GOAL: &str = "SELECT id, user_id, goal_name, target_amount, target_date, \
    is_active, approved, monthly_payment, created_at FROM savings_goal";

/// Create a savings goal with its monthly payment worked out from the
/// creation date.
///
/// # Errors
///
/// Returns [Error::DuplicateGoalName] if the user already has a goal with the same name.
pub fn create_savings_goal(
    new_goal: NewSavingsGoal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let created_at = new_goal.created_at.to_offset(UtcOffset::UTC);
    let monthly = monthly_payment(
        new_goal.target_amount,
        total_months(created_at.date(), new_goal.target_date),
    );

    connection
        .execute(
            "INSERT INTO savings_goal
                (user_id, goal_name, target_amount, target_date, is_active, approved, monthly_payment, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, 0, ?5, ?6)",
            (
                new_goal.user_id.as_i64(),
                new_goal.goal_name.as_ref(),
                new_goal.target_amount.to_string(),
                new_goal.target_date,
                monthly.to_string(),
                created_at,
            ),
        )
        .map_err(|error| match Error::from(error) {
            Error::DuplicateGoalName(_) => Error::DuplicateGoalName(new_goal.goal_name.to_string()),
            error => error,
        })?;

    Ok(SavingsGoal {
        id: connection.last_insert_rowid(),
        user_id: new_goal.user_id,
        goal_name: new_goal.goal_name,
        target_amount: new_goal.target_amount,
        target_date: new_goal.target_date,
        is_active: true,
        approved: false,
        monthly_payment: monthly,
        created_at,
    })
}

/// Retrieve a savings goal that belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the goal does not exist or belongs to another user.
pub fn get_savings_goal(
    goal_id: SavingsGoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection
        .prepare(&format!("{SELECT_GOAL} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((goal_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve the approved goals of a user, nearest target date first.
pub fn get_approved_savings_goals(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_GOAL} WHERE user_id = ?1 AND approved = 1 ORDER BY target_date ASC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

/// Accept a goal's monthly payment.
///
/// The goal is marked approved and inactive.
///
/// # Errors
///
/// Returns [Error::UpdateMissingSavingsGoal] if the goal does not exist or
/// belongs to another user.
pub fn approve_savings_goal(
    goal_id: SavingsGoalId,
    user_id: UserID,
    monthly_payment: Decimal,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_goal SET approved = 1, is_active = 0, monthly_payment = ?1
        WHERE id = ?2 AND user_id = ?3",
        (monthly_payment.to_string(), goal_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingSavingsGoal);
    }

    Ok(())
}

/// Save the name, target amount, target date and monthly payment of `goal`.
///
/// # Errors
///
/// - [Error::DuplicateGoalName] if another goal of the user has the same name,
/// - [Error::UpdateMissingSavingsGoal] if the goal does not exist or belongs to another user.
pub fn update_savings_goal(goal: &SavingsGoal, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE savings_goal
            SET goal_name = ?1, target_amount = ?2, target_date = ?3, monthly_payment = ?4
            WHERE id = ?5 AND user_id = ?6",
            (
                goal.goal_name.as_ref(),
                goal.target_amount.to_string(),
                goal.target_date,
                goal.monthly_payment.to_string(),
                goal.id,
                goal.user_id.as_i64(),
            ),
        )
        .map_err(|error| match Error::from(error) {
            Error::DuplicateGoalName(_) => Error::DuplicateGoalName(goal.goal_name.to_string()),
            error => error,
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingSavingsGoal);
    }

    Ok(())
}

/// Delete a savings goal of a user.
///
/// # Errors
///
/// Returns [Error::DeleteMissingSavingsGoal] if the goal does not exist or
/// belongs to another user.
pub fn delete_savings_goal(
    goal_id: SavingsGoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
        (goal_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingSavingsGoal);
    }

    Ok(())
}

/// Initialize the savings goal table.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            goal_name TEXT NOT NULL,
            target_amount TEXT NOT NULL,
            target_date TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            approved INTEGER NOT NULL DEFAULT 0,
            monthly_payment TEXT NOT NULL DEFAULT '0',
            created_at TEXT NOT NULL,
            UNIQUE(user_id, goal_name)
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    let goal_name: String = row.get(2)?;

    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        goal_name: GoalName::new_unchecked(&goal_name),
        target_amount: get_decimal(row, 3)?,
        target_date: row.get(4)?,
        is_active: row.get(5)?,
        approved: row.get(6)?,
        monthly_payment: get_decimal(row, 7)?,
        created_at: row.get(8)?,
    })
}
