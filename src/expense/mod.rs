//! Monthly expenses, how they were paid and the recurring expenses that are
//! carried over from one month to the next.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod db;
mod detail;
mod domain;
mod handlers;
mod payment;
mod recurring;
mod summary;

pub use db::{create_expense, create_expense_tables, get_expense};
pub use detail::{
    delete_expense_detail_endpoint, get_expense_detail_endpoint, upsert_expense_detail_endpoint,
};
pub use domain::{Expense, ExpenseForm, ExpenseId, ExpenseUpdate};
pub use handlers::{
    create_expense_endpoint, delete_expense_endpoint, get_expenses_endpoint,
    update_expense_endpoint,
};
pub use payment::{
    get_expense_payments_endpoint, pay_expense_endpoint, undo_expense_payment_endpoint,
};
pub use recurring::{clone_recurring_expenses, clone_recurring_expenses_endpoint};
pub use summary::get_expense_summary_endpoint;

/// The state needed by the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone that decides the default payment date.
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
