//! Monthly card statements and whether they have been paid.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod db;
mod detail;
mod domain;
mod handlers;
mod payment;

pub use db::{create_statement_tables, get_statement, upsert_statement};
pub use detail::{
    delete_statement_detail_endpoint, get_statement_detail_endpoint,
    upsert_statement_detail_endpoint,
};
pub use domain::{Statement, StatementForm, StatementId, StatementUpdate};
pub use handlers::{
    create_statement_endpoint, delete_statement_endpoint, get_statements_endpoint,
    update_statement_endpoint,
};
pub use payment::{pay_statement_endpoint, undo_statement_payment_endpoint};

/// The state needed by the statement endpoints.
#[derive(Debug, Clone)]
pub struct StatementState {
    /// The database connection for managing statements.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone that decides the default payment date.
    pub local_timezone: String,
}

impl FromRef<AppState> for StatementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
