//! Database initialisation and helpers for working with the SQLite schema.
//!
//! Databases created by older versions of the app may be missing columns that
//! were added later. [initialize] adds those columns, and [table_columns] lets
//! code that writes optional columns check which ones actually exist.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::{
    Connection, Transaction, TransactionBehavior, functions::FunctionFlags, params_from_iter,
    types::Value,
};

use crate::{
    Error, bank::create_bank_table, card::create_card_tables, concept::create_concept_table,
    expense::create_expense_tables, loan::create_loan_tables,
    payment_method::create_payment_method_table, statement::create_statement_tables,
};

/// Create all the tables for the domain models and bring older databases up
/// to date.
///
/// This is safe to call on every start up.
///
/// # Errors
/// Returns an error if any of the SQL statements fail.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    register_functions(connection)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_bank_table(&transaction)?;
    create_concept_table(&transaction)?;
    create_payment_method_table(&transaction)?;
    create_card_tables(&transaction)?;
    create_loan_tables(&transaction)?;
    create_expense_tables(&transaction)?;
    create_statement_tables(&transaction)?;

    migrate(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Fold `text` to upper case so searches can ignore case.
///
/// SQLite's `UPPER` only folds ASCII letters, so searches go through the
/// `FOLD_CASE` SQL function, which calls this.
pub fn fold_case(text: &str) -> String {
    text.to_uppercase()
}

/// Register the app's SQL functions on `connection`.
fn register_functions(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.create_scalar_function(
        "FOLD_CASE",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;

            Ok(text.map(|text| fold_case(&text)))
        },
    )
}

/// Columns that were added after the first release of their table.
const ADDED_COLUMNS: &[(&str, &str, &str)] = &[
    (
        "loan",
        "initial_paid_installments",
        "INTEGER NOT NULL DEFAULT 0",
    ),
    ("loan", "due_day", "INTEGER"),
    ("loan", "bank", "TEXT"),
    ("loan_payment", "closing", "INTEGER NOT NULL DEFAULT 0"),
    ("card", "active", "INTEGER NOT NULL DEFAULT 1"),
    ("expense", "recurring", "INTEGER NOT NULL DEFAULT 0"),
    ("expense", "due_date", "TEXT"),
    ("statement", "paid", "INTEGER NOT NULL DEFAULT 0"),
    ("statement", "paid_on", "TEXT"),
    ("loan_detail", "adjustment_index", "TEXT"),
    ("loan_detail", "administration_fee", "REAL"),
    ("loan_detail", "collateral_type", "TEXT"),
    ("loan_detail", "collateral_description", "TEXT"),
    ("loan_detail", "collateral_until", "TEXT"),
    ("loan_detail", "net_received", "REAL"),
    ("loan_detail", "upfront_costs_total", "REAL"),
    ("loan_detail", "tags", "TEXT"),
];

fn migrate(connection: &Connection) -> Result<(), Error> {
    for (table, column, declaration) in ADDED_COLUMNS {
        if ensure_column(connection, table, column, declaration)? {
            tracing::info!("Added missing column {table}.{column}");
        }
    }

    Ok(())
}

/// Add `column` to `table` if it does not exist yet.
///
/// `declaration` is the column type and constraints, e.g. `"INTEGER NOT NULL DEFAULT 0"`.
/// SQLite requires a default value for `NOT NULL` columns added this way.
///
/// Returns whether the column was added.
pub fn ensure_column(
    connection: &Connection,
    table: &str,
    column: &str,
    declaration: &str,
) -> Result<bool, Error> {
    if table_columns(connection, table)?.contains(column) {
        return Ok(false);
    }

    connection.execute(
        &format!("ALTER TABLE \"{table}\" ADD COLUMN \"{column}\" {declaration}"),
        (),
    )?;

    Ok(true)
}

/// The names of the columns in `table`.
///
/// Returns an empty set if the table does not exist.
pub fn table_columns(connection: &Connection, table: &str) -> Result<HashSet<String>, Error> {
    connection
        .prepare("SELECT name FROM pragma_table_info(?1)")?
        .query_map([table], |row| row.get(0))?
        .map(|maybe_name| maybe_name.map_err(Error::from))
        .collect()
}

/// The declared type of `column` in `table` in lower case, e.g. `"integer"`.
///
/// Returns `None` if the table or column does not exist.
pub fn column_type(
    connection: &Connection,
    table: &str,
    column: &str,
) -> Result<Option<String>, Error> {
    let declared_type = connection
        .prepare("SELECT type FROM pragma_table_info(?1) WHERE name = ?2")?
        .query_row([table, column], |row| row.get::<_, String>(0));

    match declared_type {
        Ok(declared_type) => Ok(Some(declared_type.to_lowercase())),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Insert or update the 1:1 detail row keyed by `key_column = key` in `table`.
///
/// Only the fields with a non-null value overwrite the stored row, so clients
/// can send just the fields they want to change. `updated_at` is refreshed on
/// every call.
pub fn upsert_detail(
    connection: &Connection,
    table: &str,
    key_column: &str,
    key: i64,
    fields: Vec<(&str, Value)>,
) -> Result<(), Error> {
    let columns: Vec<&str> = fields.iter().map(|(column, _)| *column).collect();

    let mut insert_columns = vec![key_column];
    insert_columns.extend(&columns);
    let placeholders: Vec<String> = (1..=insert_columns.len())
        .map(|index| format!("?{index}"))
        .collect();
    let mut updates: Vec<String> = columns
        .iter()
        .map(|column| format!("{column} = COALESCE(excluded.{column}, {table}.{column})"))
        .collect();
    updates.push("updated_at = CURRENT_TIMESTAMP".to_owned());

    let query = format!(
        "INSERT INTO {table} ({}, updated_at) VALUES ({}, CURRENT_TIMESTAMP)
        ON CONFLICT ({key_column}) DO UPDATE SET {}",
        insert_columns.join(", "),
        placeholders.join(", "),
        updates.join(", ")
    );

    let values = std::iter::once(Value::Integer(key)).chain(fields.into_iter().map(|(_, value)| value));
    connection.execute(&query, params_from_iter(values))?;

    Ok(())
}

/// Convert an optional date to a value that SQLite stores as `YYYY-MM-DD` text.
pub fn date_value(date: Option<time::Date>) -> Value {
    date.map_or(Value::Null, |date| Value::Text(date.to_string()))
}

/// Treat empty or whitespace-only strings as missing.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
