use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::{validate_day, validate_month, validate_year},
    database_id::DatabaseId,
    db::non_empty,
};

/// Alias for the integer type used for loan IDs.
pub type LoanId = DatabaseId;

/// A loan along with its running totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loan {
    /// The ID of the loan.
    pub id: LoanId,
    /// A name for the loan, e.g. "Car".
    pub name: String,
    /// The amount due each month.
    pub installment_amount: f64,
    /// The number of installments needed to pay off the loan.
    pub total_installments: u32,
    /// Installments that were paid before the loan was added to the app.
    pub initial_paid_installments: u32,
    /// Installments paid so far, including the initial ones.
    pub paid_installments: u32,
    /// The month of the first installment.
    pub first_month: Option<u8>,
    /// The year of the first installment.
    pub first_year: Option<i32>,
    /// The day of the month installments are due.
    pub due_day: Option<u8>,
    /// The bank that granted the loan.
    pub bank: Option<String>,
    /// `installment_amount * total_installments`.
    pub total_amount: f64,
    /// The sum of all payments, including the initial installments.
    pub amount_paid: f64,
    /// The amount still owed.
    pub remaining_debt: f64,
    /// Whether every installment has been paid.
    pub paid_off: bool,
}

/// The fields a client sends to create or replace a loan.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanForm {
    pub name: String,
    pub installment_amount: f64,
    pub total_installments: u32,
    pub initial_paid_installments: Option<u32>,
    pub first_month: Option<u8>,
    pub first_year: Option<i32>,
    pub due_day: Option<u8>,
    pub bank: Option<String>,
}

impl LoanForm {
    /// Check the form and tidy up its text fields.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the name is empty, the installment
    /// amount or count is not positive, more installments are marked as paid
    /// than exist, or the first period or due day is out of range.
    pub fn validate(mut self) -> Result<Self, Error> {
        self.name = self.name.trim().to_owned();
        self.bank = non_empty(self.bank);

        if self.name.is_empty() {
            return Err(Error::Validation("name must not be empty".to_owned()));
        }

        if !self.installment_amount.is_finite() || self.installment_amount <= 0.0 {
            return Err(Error::Validation(
                "installment_amount must be greater than zero".to_owned(),
            ));
        }

        if self.total_installments == 0 {
            return Err(Error::Validation(
                "total_installments must be greater than zero".to_owned(),
            ));
        }

        if self.initial_paid_installments.unwrap_or(0) > self.total_installments {
            return Err(Error::Validation(
                "initial_paid_installments cannot exceed total_installments".to_owned(),
            ));
        }

        if let Some(month) = self.first_month {
            validate_month(month)?;
        }

        if let Some(year) = self.first_year {
            validate_year(year)?;
        }

        if let Some(day) = self.due_day {
            validate_day(day)?;
        }

        Ok(self)
    }
}

/// A single payment towards a loan for one accounting period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanPayment {
    pub id: DatabaseId,
    pub loan_id: LoanId,
    pub month: u8,
    pub year: i32,
    pub amount: f64,
    pub paid_on: Date,
    /// Whether this payment closed the loan early.
    pub closing: bool,
}

/// The totals derived from a loan's installments and payments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTotals {
    pub total_amount: f64,
    pub amount_paid: f64,
    pub remaining_debt: f64,
    pub paid_installments: u32,
    pub paid_off: bool,
}

impl LoanTotals {
    /// Work out the totals for a loan.
    ///
    /// A closing payment settles the loan no matter how many installments
    /// were paid before it.
    pub fn compute(
        installment_amount: f64,
        total_installments: u32,
        initial_paid_installments: u32,
        payment_count: u32,
        payment_sum: f64,
        closed: bool,
    ) -> Self {
        let total_amount = installment_amount * f64::from(total_installments);
        let amount_paid = installment_amount * f64::from(initial_paid_installments) + payment_sum;

        if closed {
            return Self {
                total_amount,
                amount_paid,
                remaining_debt: 0.0,
                paid_installments: total_installments,
                paid_off: true,
            };
        }

        let paid_installments = initial_paid_installments + payment_count;

        Self {
            total_amount,
            amount_paid,
            remaining_debt: (total_amount - amount_paid).max(0.0),
            paid_installments,
            paid_off: paid_installments >= total_installments,
        }
    }
}
