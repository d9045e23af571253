//! Database queries for loans and their totals.

use rusqlite::{Connection, Row, params, params_from_iter, types::Value};

use crate::{
    Error,
    db::{column_type, table_columns},
    loan::domain::{Loan, LoanForm, LoanId, LoanTotals},
};

const LOAN_COLUMNS: &str = "id, name, installment_amount, total_installments, \
    initial_paid_installments, paid_installments, first_month, first_year, due_day, bank, \
    total_amount, amount_paid, remaining_debt, paid_off";

/// Create the loan, loan payment and loan detail tables.
///
/// # Errors
/// Returns an error if any of the SQL statements fail.
pub fn create_loan_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS loan (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            installment_amount REAL NOT NULL CHECK (installment_amount > 0),
            total_installments INTEGER NOT NULL CHECK (total_installments > 0),
            initial_paid_installments INTEGER NOT NULL DEFAULT 0,
            paid_installments INTEGER NOT NULL DEFAULT 0,
            first_month INTEGER CHECK (first_month BETWEEN 1 AND 12),
            first_year INTEGER CHECK (first_year BETWEEN 2000 AND 2100),
            due_day INTEGER CHECK (due_day BETWEEN 1 AND 31),
            bank TEXT,
            total_amount REAL NOT NULL DEFAULT 0,
            amount_paid REAL NOT NULL DEFAULT 0,
            remaining_debt REAL NOT NULL DEFAULT 0,
            paid_off INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS loan_payment (
            id INTEGER PRIMARY KEY,
            loan_id INTEGER NOT NULL REFERENCES loan(id) ON DELETE CASCADE,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL CHECK (year BETWEEN 2000 AND 2100),
            amount REAL NOT NULL,
            paid_on TEXT NOT NULL,
            closing INTEGER NOT NULL DEFAULT 0,
            UNIQUE (loan_id, month, year)
        );

        CREATE INDEX IF NOT EXISTS idx_loan_payment_loan ON loan_payment(loan_id);

        CREATE TABLE IF NOT EXISTS loan_detail (
            id INTEGER PRIMARY KEY,
            loan_id INTEGER NOT NULL UNIQUE REFERENCES loan(id) ON DELETE CASCADE,
            contract_number TEXT,
            granted_on TEXT,
            original_amount REAL,
            currency TEXT,
            term_months INTEGER CHECK (term_months BETWEEN 1 AND 600),
            annual_interest_rate REAL,
            rate_type TEXT,
            adjustment_index TEXT,
            first_installment_on TEXT,
            executive_name TEXT,
            executive_email TEXT,
            executive_phone TEXT,
            credit_life_insurance INTEGER,
            unemployment_insurance INTEGER,
            monthly_insurance_cost REAL,
            administration_fee REAL,
            prepayment_allowed INTEGER,
            prepayment_cost REAL,
            collateral_type TEXT,
            collateral_description TEXT,
            collateral_until TEXT,
            net_received REAL,
            upfront_costs_total REAL,
            tags TEXT,
            notes TEXT,
            updated_at TEXT NOT NULL
        );",
    )
}

fn map_row_to_loan(row: &Row) -> Result<Loan, rusqlite::Error> {
    Ok(Loan {
        id: row.get(0)?,
        name: row.get(1)?,
        installment_amount: row.get(2)?,
        total_installments: row.get(3)?,
        initial_paid_installments: row.get(4)?,
        paid_installments: row.get(5)?,
        first_month: row.get(6)?,
        first_year: row.get(7)?,
        due_day: row.get(8)?,
        bank: row.get(9)?,
        total_amount: row.get(10)?,
        amount_paid: row.get(11)?,
        remaining_debt: row.get(12)?,
        paid_off: row.get(13)?,
    })
}

/// Create a loan and work out its totals.
///
/// The form should already be validated with [LoanForm::validate].
pub fn create_loan(form: &LoanForm, connection: &Connection) -> Result<Loan, Error> {
    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "INSERT INTO loan (name, installment_amount, total_installments, \
            initial_paid_installments, first_month, first_year, due_day, bank)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            form.name,
            form.installment_amount,
            form.total_installments,
            form.initial_paid_installments.unwrap_or(0),
            form.first_month,
            form.first_year,
            form.due_day,
            form.bank,
        ],
    )?;

    let id = transaction.last_insert_rowid();
    recompute_loan_totals(id, &transaction)?;
    let loan = get_loan(id, &transaction)?;

    transaction.commit()?;

    Ok(loan)
}

/// Get a loan by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no loan with `id`.
pub fn get_loan(id: LoanId, connection: &Connection) -> Result<Loan, Error> {
    connection
        .prepare(&format!("SELECT {LOAN_COLUMNS} FROM loan WHERE id = ?1"))?
        .query_row([id], map_row_to_loan)
        .map_err(Error::from)
}

/// Get every loan ordered by ID.
pub fn get_all_loans(connection: &Connection) -> Result<Vec<Loan>, Error> {
    connection
        .prepare(&format!("SELECT {LOAN_COLUMNS} FROM loan ORDER BY id"))?
        .query_map([], map_row_to_loan)?
        .map(|maybe_loan| maybe_loan.map_err(Error::from))
        .collect()
}

/// Replace the fields of a loan and recompute its totals.
///
/// # Errors
/// Returns [Error::NotFound] if there is no loan with `id`.
pub fn update_loan(id: LoanId, form: &LoanForm, connection: &Connection) -> Result<Loan, Error> {
    let transaction = connection.unchecked_transaction()?;

    let rows_affected = transaction.execute(
        "UPDATE loan
        SET name = ?1, installment_amount = ?2, total_installments = ?3, \
            initial_paid_installments = ?4, first_month = ?5, first_year = ?6, \
            due_day = ?7, bank = ?8
        WHERE id = ?9",
        params![
            form.name,
            form.installment_amount,
            form.total_installments,
            form.initial_paid_installments.unwrap_or(0),
            form.first_month,
            form.first_year,
            form.due_day,
            form.bank,
            id,
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    recompute_loan_totals(id, &transaction)?;
    let loan = get_loan(id, &transaction)?;

    transaction.commit()?;

    Ok(loan)
}

/// Delete a loan along with its payments and detail.
///
/// # Errors
/// Returns [Error::NotFound] if there is no loan with `id`.
pub fn delete_loan(id: LoanId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    transaction.execute("DELETE FROM loan_detail WHERE loan_id = ?1", [id])?;
    transaction.execute("DELETE FROM loan_payment WHERE loan_id = ?1", [id])?;
    let rows_affected = transaction.execute("DELETE FROM loan WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}

/// Aggregate columns that older databases may not have.
const TOTAL_COLUMNS: [&str; 5] = [
    "total_amount",
    "amount_paid",
    "remaining_debt",
    "paid_installments",
    "paid_off",
];

/// Recalculate and store the totals of a loan from its payments.
///
/// Only the aggregate columns that exist in the loan table are written.
/// Databases from the first release track a `paid` column instead, which holds
/// either a flag or the amount paid depending on its declared type.
///
/// # Errors
/// Returns [Error::NotFound] if there is no loan with `id`.
pub fn recompute_loan_totals(id: LoanId, connection: &Connection) -> Result<LoanTotals, Error> {
    let (installment_amount, total_installments, initial_paid_installments): (f64, u32, u32) =
        connection.query_row(
            "SELECT installment_amount, total_installments, initial_paid_installments
            FROM loan WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

    let (payment_count, payment_sum, closed): (u32, f64, bool) = connection.query_row(
        "SELECT COUNT(*), COALESCE(SUM(amount), 0), COALESCE(MAX(closing), 0)
        FROM loan_payment WHERE loan_id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let totals = LoanTotals::compute(
        installment_amount,
        total_installments,
        initial_paid_installments,
        payment_count,
        payment_sum,
        closed,
    );

    let columns = table_columns(connection, "loan")?;
    let mut assignments = Vec::new();
    let mut values = Vec::new();

    for column in TOTAL_COLUMNS {
        if !columns.contains(column) {
            continue;
        }

        let value = match column {
            "total_amount" => Value::Real(totals.total_amount),
            "amount_paid" => Value::Real(totals.amount_paid),
            "remaining_debt" => Value::Real(totals.remaining_debt),
            "paid_installments" => Value::Integer(i64::from(totals.paid_installments)),
            _ => Value::Integer(i64::from(totals.paid_off)),
        };
        assignments.push(format!("{column} = ?{}", values.len() + 1));
        values.push(value);
    }

    match column_type(connection, "loan", "paid")?.as_deref() {
        Some("boolean" | "bool") => {
            assignments.push(format!("paid = ?{}", values.len() + 1));
            values.push(Value::Integer(i64::from(totals.paid_off)));
        }
        Some("real" | "numeric" | "decimal" | "integer" | "float" | "double") => {
            assignments.push(format!("paid = ?{}", values.len() + 1));
            values.push(Value::Real(totals.amount_paid));
        }
        _ => {}
    }

    if assignments.is_empty() {
        return Ok(totals);
    }

    let query = format!(
        "UPDATE loan SET {} WHERE id = ?{}",
        assignments.join(", "),
        values.len() + 1
    );
    values.push(Value::Integer(id));
    connection.execute(&query, params_from_iter(values))?;

    Ok(totals)
}
