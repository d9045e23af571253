use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::{validate_month, validate_period, validate_year},
    card::CardId,
    database_id::DatabaseId,
    db::non_empty,
};

/// Alias for the integer type used for expense IDs.
pub type ExpenseId = DatabaseId;

/// Something that has to be paid in a given month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub name: String,
    pub amount: f64,
    pub month: u8,
    pub year: i32,
    pub paid: bool,
    pub card_id: Option<CardId>,
    /// The number of installments the purchase was split into.
    pub installments: u32,
    pub kind: Option<String>,
    /// Whether the expense was bought with a card.
    pub with_card: bool,
    /// Recurring expenses are copied into the following month.
    pub recurring: bool,
    pub due_date: Option<Date>,
}

/// A payment made towards an expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpensePayment {
    pub id: DatabaseId,
    pub expense_id: ExpenseId,
    pub paid_on: Date,
    pub amount: f64,
    /// How it was paid, e.g. "credit" or "cash/debit".
    pub method: String,
    pub card_id: Option<CardId>,
    pub note: Option<String>,
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation("amount must not be negative".to_owned()))
    }
}

fn validate_installments(installments: u32) -> Result<(), Error> {
    if installments >= 1 {
        Ok(())
    } else {
        Err(Error::Validation(
            "installments must be at least 1".to_owned(),
        ))
    }
}

/// The fields a client sends to create an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseForm {
    pub name: String,
    pub amount: f64,
    pub month: u8,
    pub year: i32,
    pub paid: Option<bool>,
    pub card_id: Option<CardId>,
    pub installments: Option<u32>,
    pub kind: Option<String>,
    pub with_card: Option<bool>,
    pub recurring: Option<bool>,
    pub due_date: Option<Date>,
}

impl ExpenseForm {
    /// Check the form and tidy up its text fields.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the name is empty, the amount is
    /// negative, the period is out of range or there are zero installments.
    pub fn validate(mut self) -> Result<Self, Error> {
        self.name = self.name.trim().to_owned();
        self.kind = non_empty(self.kind);

        if self.name.is_empty() {
            return Err(Error::Validation("name must not be empty".to_owned()));
        }

        validate_amount(self.amount)?;
        validate_period(self.month, self.year)?;
        validate_installments(self.installments.unwrap_or(1))?;

        Ok(self)
    }
}

/// A partial update to an expense. Missing fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpenseUpdate {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub month: Option<u8>,
    pub year: Option<i32>,
    pub paid: Option<bool>,
    pub card_id: Option<CardId>,
    pub installments: Option<u32>,
    pub kind: Option<String>,
    pub with_card: Option<bool>,
    pub recurring: Option<bool>,
    pub due_date: Option<Date>,
}

impl ExpenseUpdate {
    /// Check the fields that were given.
    pub fn validate(mut self) -> Result<Self, Error> {
        self.name = non_empty(self.name);
        self.kind = non_empty(self.kind);

        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }

        if let Some(month) = self.month {
            validate_month(month)?;
        }

        if let Some(year) = self.year {
            validate_year(year)?;
        }

        if let Some(installments) = self.installments {
            validate_installments(installments)?;
        }

        Ok(self)
    }
}
