use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::{next_occurrence, validate_day},
    database_id::DatabaseId,
    db::non_empty,
};

/// Alias for the integer type used for card IDs.
pub type CardId = DatabaseId;

/// Whether purchases on a card are paid later (credit) or straight away (debit).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    #[default]
    Credit,
    Debit,
}

impl CardKind {
    fn as_str(&self) -> &'static str {
        match self {
            CardKind::Credit => "credit",
            CardKind::Debit => "debit",
        }
    }
}

impl ToSql for CardKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "credit" => Ok(CardKind::Credit),
            "debit" => Ok(CardKind::Debit),
            other => Err(FromSqlError::Other(
                format!("unknown card kind {other:?}").into(),
            )),
        }
    }
}

/// A credit or debit card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub bank: Option<String>,
    pub kind: CardKind,
    pub credit_limit: Option<f64>,
    /// The day of the month the billing period closes.
    pub closing_day: Option<u8>,
    /// The day of the month the statement must be paid.
    pub due_day: Option<u8>,
    /// Inactive cards have been deleted by the user.
    pub active: bool,
}

/// A card with its upcoming billing dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardListing {
    #[serde(flatten)]
    pub card: Card,
    pub next_closing_date: Option<Date>,
    pub next_due_date: Option<Date>,
}

impl CardListing {
    /// Work out the next closing and due dates on or after `today`.
    pub fn new(card: Card, today: Date) -> Result<Self, Error> {
        let next_closing_date = card
            .closing_day
            .map(|day| next_occurrence(today, day))
            .transpose()?;
        let next_due_date = card
            .due_day
            .map(|day| next_occurrence(today, day))
            .transpose()?;

        Ok(Self {
            card,
            next_closing_date,
            next_due_date,
        })
    }
}

fn default_active() -> bool {
    true
}

/// The fields a client sends to create or replace a card.
#[derive(Debug, Clone, Deserialize)]
pub struct CardForm {
    pub name: String,
    pub bank: Option<String>,
    #[serde(default)]
    pub kind: CardKind,
    pub credit_limit: Option<f64>,
    pub closing_day: Option<u8>,
    pub due_day: Option<u8>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl CardForm {
    /// Check the form and tidy up its text fields.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the name is empty, the credit limit is
    /// negative or a day is not between 1 and 31.
    pub fn validate(mut self) -> Result<Self, Error> {
        self.name = self.name.trim().to_owned();
        self.bank = non_empty(self.bank);

        if self.name.is_empty() {
            return Err(Error::Validation("name must not be empty".to_owned()));
        }

        if self
            .credit_limit
            .is_some_and(|limit| !limit.is_finite() || limit < 0.0)
        {
            return Err(Error::Validation(
                "credit_limit must not be negative".to_owned(),
            ));
        }

        if let Some(day) = self.closing_day {
            validate_day(day)?;
        }

        if let Some(day) = self.due_day {
            validate_day(day)?;
        }

        Ok(self)
    }
}
