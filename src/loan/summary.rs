//! An overview of every loan for a given month: what is due, what has been
//! paid and what is still owed.

use axum::extract::{Query, State};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    calendar::{PeriodQuery, add_months, clamp_day},
    db::lock_connection,
    loan::{Loan, LoanId, LoanState, db::get_all_loans},
    response::{ApiResult, ok},
    timezone::today,
};

/// How one loan stands in the requested period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanSummaryItem {
    pub id: LoanId,
    pub name: String,
    pub bank: Option<String>,
    pub installment_amount: f64,
    pub total_installments: u32,
    pub paid_installments: u32,
    pub total_paid: f64,
    pub remaining_debt: f64,
    pub last_paid_month: Option<u8>,
    pub last_paid_year: Option<i32>,
    /// The due date of the next unpaid installment.
    pub next_due_date: Option<Date>,
    pub finished: bool,
    /// Whether the next installment is due in the requested period.
    pub due_in_period: bool,
}

/// The per-loan summaries and their totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanSummary {
    pub month: u8,
    pub year: i32,
    pub loans: Vec<LoanSummaryItem>,
    /// The installments due in the period for loans that are not finished.
    pub period_total: f64,
    pub remaining_total: f64,
    pub paid_total: f64,
}

/// The due date of the installment after the last one paid.
///
/// Installments are due monthly from the first period, on the loan's due day
/// (or the first of the month when no due day is set).
fn next_due_date(loan: &Loan) -> Result<Option<Date>, Error> {
    let (Some(first_month), Some(first_year)) = (loan.first_month, loan.first_year) else {
        return Ok(None);
    };

    if loan.paid_off {
        return Ok(None);
    }

    let (year, month) = add_months(first_year, first_month, i64::from(loan.paid_installments));

    clamp_day(year, month, loan.due_day.unwrap_or(1)).map(Some)
}

fn get_last_paid_period(
    loan_id: LoanId,
    connection: &Connection,
) -> Result<Option<(u8, i32)>, Error> {
    connection
        .query_row(
            "SELECT month, year FROM loan_payment
            WHERE loan_id = ?1
            ORDER BY year DESC, month DESC, id DESC
            LIMIT 1",
            [loan_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(Error::from)
}

/// Summarise every loan for the period `(month, year)`.
pub fn get_loan_summary(month: u8, year: i32, connection: &Connection) -> Result<LoanSummary, Error> {
    let mut loans = Vec::new();

    for loan in get_all_loans(connection)? {
        let last_paid = get_last_paid_period(loan.id, connection)?;
        let next_due_date = next_due_date(&loan)?;
        let due_in_period = next_due_date
            .is_some_and(|date| date.month() as u8 == month && date.year() == year);

        loans.push(LoanSummaryItem {
            id: loan.id,
            name: loan.name,
            bank: loan.bank,
            installment_amount: loan.installment_amount,
            total_installments: loan.total_installments,
            paid_installments: loan.paid_installments,
            total_paid: loan.amount_paid,
            remaining_debt: loan.remaining_debt,
            last_paid_month: last_paid.map(|(month, _)| month),
            last_paid_year: last_paid.map(|(_, year)| year),
            next_due_date,
            finished: loan.paid_off,
            due_in_period,
        });
    }

    let period_total = loans
        .iter()
        .filter(|loan| !loan.finished && loan.due_in_period)
        .map(|loan| loan.installment_amount)
        .sum();
    let remaining_total = loans.iter().map(|loan| loan.remaining_debt).sum();
    let paid_total = loans.iter().map(|loan| loan.total_paid).sum();

    Ok(LoanSummary {
        month,
        year,
        loans,
        period_total,
        remaining_total,
        paid_total,
    })
}

/// Summarise the loans for a period, defaulting to the current month.
pub async fn get_loan_summary_endpoint(
    State(state): State<LoanState>,
    Query(period): Query<PeriodQuery>,
) -> ApiResult<LoanSummary> {
    period.validate()?;
    let (month, year) = period.or_today(today(&state.local_timezone)?);
    let connection = lock_connection(&state.db_connection)?;

    get_loan_summary(month, year, &connection).map(ok)
}
