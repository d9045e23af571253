//! Endpoint for replacing the fields of a loan.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    db::lock_connection,
    loan::{Loan, LoanForm, LoanId, LoanState, db::update_loan},
    response::{ApiResult, ok},
};

/// Update every field of a loan and return it with its recomputed totals.
pub async fn update_loan_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
    Json(form): Json<LoanForm>,
) -> ApiResult<Loan> {
    let form = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    update_loan(loan_id, &form, &connection).map(ok)
}
