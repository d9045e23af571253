//! Monthly and yearly expense totals.

use axum::extract::{Query, State};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    calendar::PeriodQuery,
    db::lock_connection,
    expense::ExpenseState,
    response::{ApiResult, ok},
};

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct ExpenseSummaryQuery {
    pub month: Option<u8>,
    pub year: Option<i32>,
    /// Only count paid (or unpaid) expenses.
    pub paid: Option<bool>,
}

/// The sum of expense amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpenseSummary {
    /// Total for the requested month and year.
    pub month_total: f64,
    /// Total for the requested year.
    pub year_total: f64,
}

/// Sum the expense amounts. Filters that are `None` are ignored, e.g. without
/// a year the "year" total covers every year.
pub fn get_expense_summary(
    query: ExpenseSummaryQuery,
    connection: &Connection,
) -> Result<ExpenseSummary, Error> {
    let month_total = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expense
        WHERE (?1 IS NULL OR month = ?1)
            AND (?2 IS NULL OR year = ?2)
            AND (?3 IS NULL OR paid = ?3)",
        params![query.month, query.year, query.paid],
        |row| row.get(0),
    )?;

    let year_total = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expense
        WHERE (?1 IS NULL OR year = ?1)
            AND (?2 IS NULL OR paid = ?2)",
        params![query.year, query.paid],
        |row| row.get(0),
    )?;

    Ok(ExpenseSummary {
        month_total,
        year_total,
    })
}

pub async fn get_expense_summary_endpoint(
    State(state): State<ExpenseState>,
    Query(query): Query<ExpenseSummaryQuery>,
) -> ApiResult<ExpenseSummary> {
    PeriodQuery {
        month: query.month,
        year: query.year,
    }
    .validate()?;
    let connection = lock_connection(&state.db_connection)?;

    get_expense_summary(query, &connection).map(ok)
}
