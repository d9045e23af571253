//! Registering, undoing and listing loan payments, and closing loans early.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    calendar::{PeriodQuery, validate_period},
    database_id::DatabaseId,
    db::lock_connection,
    loan::{
        Loan, LoanId, LoanState,
        db::{get_loan, recompute_loan_totals},
        domain::LoanPayment,
    },
    response::{ApiResult, acknowledged, ok},
    timezone::today,
};

/// The accounting period a payment is for, with optional overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanPaymentForm {
    pub month: u8,
    pub year: i32,
    /// Defaults to the installment amount, or the remaining debt when closing.
    pub amount: Option<f64>,
    /// Defaults to today.
    pub paid_on: Option<Date>,
}

impl LoanPaymentForm {
    fn validate(&self) -> Result<(), Error> {
        validate_period(self.month, self.year)?;

        match self.amount {
            Some(amount) if !amount.is_finite() || amount < 0.0 => Err(Error::Validation(
                "amount must not be negative".to_owned(),
            )),
            _ => Ok(()),
        }
    }
}

const PAYMENT_COLUMNS: &str = "id, loan_id, month, year, amount, paid_on, closing";

fn map_row_to_payment(row: &Row) -> Result<LoanPayment, rusqlite::Error> {
    Ok(LoanPayment {
        id: row.get(0)?,
        loan_id: row.get(1)?,
        month: row.get(2)?,
        year: row.get(3)?,
        amount: row.get(4)?,
        paid_on: row.get(5)?,
        closing: row.get(6)?,
    })
}

fn insert_payment(
    loan_id: LoanId,
    form: &LoanPaymentForm,
    amount: f64,
    paid_on: Date,
    closing: bool,
    connection: &Connection,
) -> Result<LoanPayment, Error> {
    connection.execute(
        "INSERT INTO loan_payment (loan_id, month, year, amount, paid_on, closing)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![loan_id, form.month, form.year, amount, paid_on, closing],
    )?;

    Ok(LoanPayment {
        id: connection.last_insert_rowid(),
        loan_id,
        month: form.month,
        year: form.year,
        amount,
        paid_on,
        closing,
    })
}

/// Record the installment for one accounting period.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the loan does not exist,
/// - [Error::LoanPaidOff] if every installment is already paid,
/// - [Error::DuplicatePeriodPayment] if the period has already been paid.
pub fn register_loan_payment(
    loan_id: LoanId,
    form: &LoanPaymentForm,
    today: Date,
    connection: &Connection,
) -> Result<LoanPayment, Error> {
    form.validate()?;

    let transaction = connection.unchecked_transaction()?;

    let loan = get_loan(loan_id, &transaction)?;
    if loan.paid_off {
        return Err(Error::LoanPaidOff);
    }

    let amount = form.amount.unwrap_or(loan.installment_amount);
    let paid_on = form.paid_on.unwrap_or(today);
    let payment = insert_payment(loan_id, form, amount, paid_on, false, &transaction)?;

    recompute_loan_totals(loan_id, &transaction)?;
    transaction.commit()?;

    Ok(payment)
}

/// Pay off the rest of a loan with a single closing payment.
///
/// The payment amount defaults to the remaining debt. Undoing the closing
/// payment re-opens the loan.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the loan does not exist,
/// - [Error::LoanPaidOff] if the loan is already paid off,
/// - [Error::DuplicatePeriodPayment] if the period has already been paid.
pub fn close_loan(
    loan_id: LoanId,
    form: &LoanPaymentForm,
    today: Date,
    connection: &Connection,
) -> Result<Loan, Error> {
    form.validate()?;

    let transaction = connection.unchecked_transaction()?;

    let loan = get_loan(loan_id, &transaction)?;
    if loan.paid_off {
        return Err(Error::LoanPaidOff);
    }

    let amount = form.amount.unwrap_or(loan.remaining_debt);
    let paid_on = form.paid_on.unwrap_or(today);
    insert_payment(loan_id, form, amount, paid_on, true, &transaction)?;

    recompute_loan_totals(loan_id, &transaction)?;
    let loan = get_loan(loan_id, &transaction)?;
    transaction.commit()?;

    Ok(loan)
}

/// Delete the payment for the latest accounting period.
///
/// # Errors
/// Returns [Error::NotFound] if the loan does not exist or
/// [Error::NoPaymentsToUndo] if it has no payments.
pub fn undo_last_loan_payment(loan_id: LoanId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    get_loan(loan_id, &transaction)?;

    let latest_payment: Option<DatabaseId> = transaction
        .query_row(
            "SELECT id FROM loan_payment
            WHERE loan_id = ?1
            ORDER BY year DESC, month DESC, id DESC
            LIMIT 1",
            [loan_id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(payment_id) = latest_payment else {
        return Err(Error::NoPaymentsToUndo);
    };

    transaction.execute("DELETE FROM loan_payment WHERE id = ?1", [payment_id])?;
    recompute_loan_totals(loan_id, &transaction)?;
    transaction.commit()?;

    Ok(())
}

/// Get the payments of a loan, newest period first.
///
/// # Errors
/// Returns [Error::NotFound] if the loan does not exist.
pub fn get_loan_payments(
    loan_id: LoanId,
    filter: PeriodQuery,
    connection: &Connection,
) -> Result<Vec<LoanPayment>, Error> {
    get_loan(loan_id, connection)?;

    connection
        .prepare(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM loan_payment
            WHERE loan_id = ?1 AND (?2 IS NULL OR month = ?2) AND (?3 IS NULL OR year = ?3)
            ORDER BY year DESC, month DESC, id DESC"
        ))?
        .query_map(params![loan_id, filter.month, filter.year], map_row_to_payment)?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}

/// Record a loan installment.
pub async fn pay_loan_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
    Json(form): Json<LoanPaymentForm>,
) -> ApiResult<LoanPayment> {
    let today = today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    register_loan_payment(loan_id, &form, today, &connection).map(ok)
}

/// Undo the latest loan installment.
pub async fn undo_loan_payment_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    undo_last_loan_payment(loan_id, &connection)?;

    Ok(acknowledged())
}

/// List the payments of a loan, optionally for a single month or year.
pub async fn get_loan_payments_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
    Query(filter): Query<PeriodQuery>,
) -> ApiResult<Vec<LoanPayment>> {
    filter.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    get_loan_payments(loan_id, filter, &connection).map(ok)
}

/// Close a loan early and return it with its updated totals.
pub async fn close_loan_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
    Json(form): Json<LoanPaymentForm>,
) -> ApiResult<Loan> {
    let today = today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let loan = close_loan(loan_id, &form, today, &connection)?;
    tracing::info!("Closed loan {loan_id} early");

    Ok(ok(loan))
}
