//! Endpoint for deleting a loan.

use axum::extract::{Path, State};

use crate::{
    db::lock_connection,
    loan::{LoanId, LoanState, db::delete_loan},
    response::{ApiResult, acknowledged},
};

/// Delete a loan together with its payments and detail.
pub async fn delete_loan_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    delete_loan(loan_id, &connection)?;
    tracing::info!("Deleted loan {loan_id}");

    Ok(acknowledged())
}
