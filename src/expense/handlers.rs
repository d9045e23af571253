//! Endpoints for listing, creating, updating and deleting expenses.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    calendar::validate_period,
    db::lock_connection,
    expense::{
        ExpenseState,
        db::{create_expense, delete_expense, get_expenses_for_period, update_expense},
        domain::{Expense, ExpenseForm, ExpenseId, ExpenseUpdate},
        recurring::clone_recurring_expenses,
    },
    response::{ApiResult, acknowledged, ok},
};

/// The month to list expenses for.
#[derive(Debug, Deserialize)]
pub struct ExpensePeriod {
    pub month: u8,
    pub year: i32,
}

/// List the expenses of a month, newest first.
///
/// Recurring expenses from the month before are copied in first, so opening a
/// new month fills it with the usual bills.
pub async fn get_expenses_endpoint(
    State(state): State<ExpenseState>,
    Query(period): Query<ExpensePeriod>,
) -> ApiResult<Vec<Expense>> {
    validate_period(period.month, period.year)?;
    let connection = lock_connection(&state.db_connection)?;

    clone_recurring_expenses(period.month, period.year, &connection)?;

    get_expenses_for_period(period.month, period.year, &connection).map(ok)
}

pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Json(form): Json<ExpenseForm>,
) -> ApiResult<Expense> {
    let form = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    create_expense(&form, &connection).map(ok)
}

pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
    Json(update): Json<ExpenseUpdate>,
) -> ApiResult<Expense> {
    let update = update.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    update_expense(expense_id, &update, &connection).map(ok)
}

pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    delete_expense(expense_id, &connection)?;

    Ok(acknowledged())
}
