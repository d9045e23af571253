//! Loans paid back in fixed monthly installments.
//!
//! Each loan keeps running totals (amount paid, remaining debt, etc.) that
//! are recomputed from its payments whenever a payment is added or removed.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod create;
mod db;
mod delete;
mod detail;
mod domain;
mod edit;
mod list;
mod payment;
mod summary;

pub use create::create_loan_endpoint;
pub use db::{create_loan, create_loan_tables, get_loan};
pub use delete::delete_loan_endpoint;
pub use detail::{delete_loan_detail_endpoint, get_loan_detail_endpoint, upsert_loan_detail_endpoint};
pub use domain::{Loan, LoanForm, LoanId};
pub use edit::update_loan_endpoint;
pub use list::get_loans_endpoint;
pub use payment::{
    LoanPaymentForm, close_loan_endpoint, get_loan_payments_endpoint, pay_loan_endpoint,
    register_loan_payment, undo_loan_payment_endpoint,
};
pub use summary::get_loan_summary_endpoint;

/// The state needed by the loan endpoints.
#[derive(Debug, Clone)]
pub struct LoanState {
    /// The database connection for managing loans.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone that decides the default payment date.
    pub local_timezone: String,
}

impl FromRef<AppState> for LoanState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
