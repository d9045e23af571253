//! The banks that issue cards and loans.

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

pub type BankId = DatabaseId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    pub active: bool,
}

/// The state needed by the bank endpoints.
#[derive(Debug, Clone)]
pub struct BankState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BankState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub fn create_bank_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS bank (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            active INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_bank(row: &Row) -> Result<Bank, rusqlite::Error> {
    Ok(Bank {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
    })
}

fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::Validation("bank name must not be empty".to_owned()));
    }

    Ok(name.to_owned())
}

fn name_taken(error: Error) -> Error {
    match error {
        Error::Duplicate(_) => Error::Duplicate("a bank with that name already exists".to_owned()),
        error => error,
    }
}

/// Parse the `active` filter. `None` means every bank.
///
/// Unknown values fall back to listing every bank.
pub fn parse_active_filter(value: Option<&str>) -> Option<bool> {
    let value = value?.to_lowercase();

    match value.as_str() {
        "true" | "1" | "t" | "yes" | "si" => Some(true),
        "false" | "0" | "f" | "no" => Some(false),
        _ => None,
    }
}

/// Get the banks ordered by name, optionally only those with `active` status.
pub fn get_banks(active: Option<bool>, connection: &Connection) -> Result<Vec<Bank>, Error> {
    connection
        .prepare(
            "SELECT id, name, active FROM bank
            WHERE ?1 IS NULL OR active = ?1
            ORDER BY name ASC",
        )?
        .query_map([active], map_row_to_bank)?
        .map(|maybe_bank| maybe_bank.map_err(Error::from))
        .collect()
}

/// # Errors
/// Returns [Error::Validation] for an empty name or [Error::Duplicate] if the
/// name is taken.
pub fn create_bank(name: &str, connection: &Connection) -> Result<Bank, Error> {
    let name = validate_name(name)?;

    connection
        .query_row(
            "INSERT INTO bank (name) VALUES (?1) RETURNING id, name, active",
            [name],
            map_row_to_bank,
        )
        .map_err(|error| name_taken(error.into()))
}

/// # Errors
/// Returns [Error::NotFound] if there is no bank with `id` or
/// [Error::Duplicate] if another bank has the name.
pub fn rename_bank(id: BankId, name: &str, connection: &Connection) -> Result<Bank, Error> {
    let name = validate_name(name)?;

    connection
        .query_row(
            "UPDATE bank SET name = ?1 WHERE id = ?2 RETURNING id, name, active",
            params![name, id],
            map_row_to_bank,
        )
        .map_err(|error| name_taken(error.into()))
}

/// # Errors
/// Returns [Error::NotFound] if there is no bank with `id`.
pub fn set_bank_active(id: BankId, active: bool, connection: &Connection) -> Result<Bank, Error> {
    connection
        .query_row(
            "UPDATE bank SET active = ?1 WHERE id = ?2 RETURNING id, name, active",
            params![active, id],
            map_row_to_bank,
        )
        .map_err(Error::from)
}

#[derive(Debug, Default, Deserialize)]
pub struct BankFilter {
    /// `true`, `false` or `all`. Defaults to `true`.
    pub active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BankForm {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    pub active: bool,
}

pub async fn get_banks_endpoint(
    State(state): State<BankState>,
    Query(filter): Query<BankFilter>,
) -> ApiResult<Vec<Bank>> {
    let active = parse_active_filter(Some(filter.active.as_deref().unwrap_or("true")));
    let connection = lock_connection(&state.db_connection)?;

    get_banks(active, &connection).map(ok)
}

pub async fn create_bank_endpoint(
    State(state): State<BankState>,
    Json(form): Json<BankForm>,
) -> ApiResult<Bank> {
    let connection = lock_connection(&state.db_connection)?;

    create_bank(&form.name, &connection).map(ok)
}

pub async fn rename_bank_endpoint(
    State(state): State<BankState>,
    Path(bank_id): Path<BankId>,
    Json(form): Json<BankForm>,
) -> ApiResult<Bank> {
    let connection = lock_connection(&state.db_connection)?;

    rename_bank(bank_id, &form.name, &connection).map(ok)
}

pub async fn set_bank_active_endpoint(
    State(state): State<BankState>,
    Path(bank_id): Path<BankId>,
    Json(form): Json<ActiveForm>,
) -> ApiResult<Bank> {
    let connection = lock_connection(&state.db_connection)?;

    set_bank_active(bank_id, form.active, &connection).map(ok)
}
