//! Endpoint for listing loans.

use axum::extract::State;

use crate::{
    db::lock_connection,
    loan::{Loan, LoanState, db::get_all_loans},
    response::{ApiResult, ok},
};

/// Get every loan ordered by ID.
pub async fn get_loans_endpoint(State(state): State<LoanState>) -> ApiResult<Vec<Loan>> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_loans(&connection).map(ok)
}
