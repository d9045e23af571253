//! Endpoint for adding a loan.

use axum::{Json, extract::State};

use crate::{
    db::lock_connection,
    loan::{Loan, LoanForm, LoanState, create_loan},
    response::{ApiResult, ok},
};

/// Create a loan and return it with its totals.
pub async fn create_loan_endpoint(
    State(state): State<LoanState>,
    Json(form): Json<LoanForm>,
) -> ApiResult<Loan> {
    let form = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    let loan = create_loan(&form, &connection)?;
    tracing::info!("Created loan {} ({})", loan.id, loan.name);

    Ok(ok(loan))
}
