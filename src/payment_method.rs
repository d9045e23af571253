//! The ways a bill can be paid, e.g. "Cash" or "Bank transfer".

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    db::lock_connection,
    response::{ApiResult, ok},
};

pub type PaymentMethodId = DatabaseId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodForm {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PaymentMethodForm {
    fn validate(self) -> Result<Self, Error> {
        let name = self.name.trim().to_owned();

        if name.is_empty() {
            return Err(Error::Validation(
                "payment method name must not be empty".to_owned(),
            ));
        }

        Ok(Self { name, ..self })
    }
}

/// The state needed by the payment method endpoints.
#[derive(Debug, Clone)]
pub struct PaymentMethodState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PaymentMethodState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub fn create_payment_method_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payment_method (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            active INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_payment_method(row: &Row) -> Result<PaymentMethod, rusqlite::Error> {
    Ok(PaymentMethod {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
    })
}

pub fn get_payment_methods(
    active: Option<bool>,
    connection: &Connection,
) -> Result<Vec<PaymentMethod>, Error> {
    connection
        .prepare(
            "SELECT id, name, active FROM payment_method
            WHERE ?1 IS NULL OR active = ?1
            ORDER BY id ASC",
        )?
        .query_map([active], map_row_to_payment_method)?
        .map(|maybe_method| maybe_method.map_err(Error::from))
        .collect()
}

/// # Errors
/// Returns [Error::Duplicate] if the name is taken.
pub fn create_payment_method(
    form: &PaymentMethodForm,
    connection: &Connection,
) -> Result<PaymentMethod, Error> {
    connection
        .query_row(
            "INSERT INTO payment_method (name, active) VALUES (?1, ?2)
            RETURNING id, name, active",
            params![form.name, form.active],
            map_row_to_payment_method,
        )
        .map_err(Error::from)
}

/// # Errors
/// Returns [Error::NotFound] if there is no payment method with `id`.
pub fn update_payment_method(
    id: PaymentMethodId,
    form: &PaymentMethodForm,
    connection: &Connection,
) -> Result<PaymentMethod, Error> {
    connection
        .query_row(
            "UPDATE payment_method SET name = ?1, active = ?2 WHERE id = ?3
            RETURNING id, name, active",
            params![form.name, form.active, id],
            map_row_to_payment_method,
        )
        .map_err(Error::from)
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentMethodFilter {
    pub active: Option<bool>,
}

pub async fn get_payment_methods_endpoint(
    State(state): State<PaymentMethodState>,
    Query(filter): Query<PaymentMethodFilter>,
) -> ApiResult<Vec<PaymentMethod>> {
    let connection = lock_connection(&state.db_connection)?;

    get_payment_methods(filter.active, &connection).map(ok)
}

pub async fn create_payment_method_endpoint(
    State(state): State<PaymentMethodState>,
    Json(form): Json<PaymentMethodForm>,
) -> ApiResult<PaymentMethod> {
    let form = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    create_payment_method(&form, &connection).map(ok)
}

pub async fn update_payment_method_endpoint(
    State(state): State<PaymentMethodState>,
    Path(payment_method_id): Path<PaymentMethodId>,
    Json(form): Json<PaymentMethodForm>,
) -> ApiResult<PaymentMethod> {
    let form = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    update_payment_method(payment_method_id, &form, &connection).map(ok)
}
