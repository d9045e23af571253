use rusqlite::{Connection, Row, params};

use crate::{
    Error,
    expense::domain::{Expense, ExpenseForm, ExpenseId, ExpenseUpdate},
};

pub fn create_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL CHECK (year BETWEEN 2000 AND 2100),
            paid INTEGER NOT NULL DEFAULT 0,
            card_id INTEGER REFERENCES card(id),
            installments INTEGER NOT NULL DEFAULT 1 CHECK (installments >= 1),
            kind TEXT,
            with_card INTEGER NOT NULL DEFAULT 0,
            recurring INTEGER NOT NULL DEFAULT 0,
            due_date TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_expense_period ON expense(year, month);

        CREATE TABLE IF NOT EXISTS expense_payment (
            id INTEGER PRIMARY KEY,
            expense_id INTEGER NOT NULL REFERENCES expense(id) ON DELETE CASCADE,
            paid_on TEXT NOT NULL,
            amount REAL NOT NULL,
            method TEXT NOT NULL,
            card_id INTEGER REFERENCES card(id),
            note TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_expense_payment_expense ON expense_payment(expense_id);

        CREATE TABLE IF NOT EXISTS expense_detail (
            id INTEGER PRIMARY KEY,
            expense_id INTEGER NOT NULL UNIQUE REFERENCES expense(id) ON DELETE CASCADE,
            company TEXT,
            tax_id TEXT,
            document_type TEXT,
            document_number TEXT,
            document_date TEXT,
            category TEXT,
            payment_method TEXT,
            deductible INTEGER,
            currency TEXT,
            exchange_rate REAL,
            net REAL,
            tax REAL,
            exempt REAL,
            discount REAL,
            document_total REAL,
            warranty_months INTEGER,
            warranty_until TEXT,
            location TEXT,
            tags TEXT,
            notes TEXT,
            updated_at TEXT NOT NULL
        );",
    )
}

const EXPENSE_COLUMNS: &str =
    "id, name, amount, month, year, paid, card_id, installments, kind, with_card, recurring, due_date";

fn map_row_to_expense(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        month: row.get(3)?,
        year: row.get(4)?,
        paid: row.get(5)?,
        card_id: row.get(6)?,
        installments: row.get(7)?,
        kind: row.get(8)?,
        with_card: row.get(9)?,
        recurring: row.get(10)?,
        due_date: row.get(11)?,
    })
}

/// Create an expense. The form should already be validated.
///
/// # Errors
/// Returns [Error::InvalidForeignKey] if `card_id` does not refer to a card.
pub fn create_expense(form: &ExpenseForm, connection: &Connection) -> Result<Expense, Error> {
    connection.execute(
        "INSERT INTO expense (name, amount, month, year, paid, card_id, installments, kind, \
            with_card, recurring, due_date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            form.name,
            form.amount,
            form.month,
            form.year,
            form.paid.unwrap_or(false),
            form.card_id,
            form.installments.unwrap_or(1),
            form.kind,
            form.with_card.unwrap_or(false),
            form.recurring.unwrap_or(false),
            form.due_date,
        ],
    )?;

    get_expense(connection.last_insert_rowid(), connection)
}

/// # Errors
/// Returns [Error::NotFound] if there is no expense with `id`.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = ?1"),
            [id],
            map_row_to_expense,
        )
        .map_err(Error::from)
}

/// Get the expenses for a month, newest first.
pub fn get_expenses_for_period(
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE month = ?1 AND year = ?2 ORDER BY id DESC"
        ))?
        .query_map(params![month, year], map_row_to_expense)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Change the fields given in `update`, leaving the rest as they are.
///
/// # Errors
/// Returns [Error::NotFound] if there is no expense with `id`.
pub fn update_expense(
    id: ExpenseId,
    update: &ExpenseUpdate,
    connection: &Connection,
) -> Result<Expense, Error> {
    let rows_affected = connection.execute(
        "UPDATE expense
        SET name = COALESCE(?1, name),
            amount = COALESCE(?2, amount),
            month = COALESCE(?3, month),
            year = COALESCE(?4, year),
            paid = COALESCE(?5, paid),
            card_id = COALESCE(?6, card_id),
            installments = COALESCE(?7, installments),
            kind = COALESCE(?8, kind),
            with_card = COALESCE(?9, with_card),
            recurring = COALESCE(?10, recurring),
            due_date = COALESCE(?11, due_date)
        WHERE id = ?12",
        params![
            update.name,
            update.amount,
            update.month,
            update.year,
            update.paid,
            update.card_id,
            update.installments,
            update.kind,
            update.with_card,
            update.recurring,
            update.due_date,
            id,
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_expense(id, connection)
}

/// Delete an expense with its payments and detail.
///
/// # Errors
/// Returns [Error::NotFound] if there is no expense with `id`.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    transaction.execute("DELETE FROM expense_detail WHERE expense_id = ?1", [id])?;
    transaction.execute("DELETE FROM expense_payment WHERE expense_id = ?1", [id])?;
    let rows_affected = transaction.execute("DELETE FROM expense WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}
