//! Carry recurring expenses over into the next month.

use axum::{Json, extract::State};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    calendar::{previous_period, validate_period},
    db::lock_connection,
    expense::ExpenseState,
    response::{ApiResult, ok},
};

/// Copy the recurring expenses of the month before `(month, year)` into
/// `(month, year)`.
///
/// An expense is skipped if the target month already has a recurring expense
/// with the same name, so calling this more than once for a month has no
/// further effect. A one-off expense of the same name does not block the copy.
/// The copies keep the name, amount, card and card flag. They are unpaid and
/// recurring.
///
/// Returns the number of expenses created.
pub fn clone_recurring_expenses(
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<usize, Error> {
    validate_period(month, year)?;
    let (previous_month, previous_year) = previous_period(month, year);

    let created = connection.execute(
        "INSERT INTO expense (name, amount, month, year, paid, card_id, with_card, recurring)
        SELECT e.name, e.amount, ?1, ?2, 0, e.card_id, e.with_card, 1
        FROM expense e
        WHERE e.recurring = 1
            AND e.month = ?3
            AND e.year = ?4
            AND NOT EXISTS (
                SELECT 1 FROM expense t
                WHERE t.recurring = 1 AND t.name = e.name AND t.month = ?1 AND t.year = ?2
            )",
        params![month, year, previous_month, previous_year],
    )?;

    if created > 0 {
        tracing::info!("Copied {created} recurring expenses into {month}/{year}");
    }

    Ok(created)
}

#[derive(Debug, Deserialize)]
pub struct ClonePeriod {
    pub month: u8,
    pub year: i32,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CloneResult {
    pub created: usize,
}

/// Copy last month's recurring expenses into the given month.
pub async fn clone_recurring_expenses_endpoint(
    State(state): State<ExpenseState>,
    Json(period): Json<ClonePeriod>,
) -> ApiResult<CloneResult> {
    let connection = lock_connection(&state.db_connection)?;

    let created = clone_recurring_expenses(period.month, period.year, &connection)?;

    Ok(ok(CloneResult { created }))
}
