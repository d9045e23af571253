use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::{validate_month, validate_period, validate_year},
    card::CardId,
    database_id::DatabaseId,
};

/// Alias for the integer type used for statement IDs.
pub type StatementId = DatabaseId;

/// The amount billed to a card for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub id: StatementId,
    pub card_id: CardId,
    /// The name of the card, if it still exists.
    pub card_name: Option<String>,
    /// The bank that issued the card.
    pub bank: Option<String>,
    pub month: u8,
    pub year: i32,
    pub total: f64,
    pub paid: bool,
    pub paid_on: Option<Date>,
}

fn validate_total(total: f64) -> Result<(), Error> {
    if total.is_finite() && total >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation("total must not be negative".to_owned()))
    }
}

/// The fields a client sends to create a statement.
///
/// Creating a statement for a card and month that already has one replaces
/// its total.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementForm {
    pub card_id: CardId,
    pub month: u8,
    pub year: i32,
    pub total: f64,
}

impl StatementForm {
    pub fn validate(&self) -> Result<(), Error> {
        validate_period(self.month, self.year)?;
        validate_total(self.total)
    }
}

/// A partial update to a statement. Missing fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatementUpdate {
    pub card_id: Option<CardId>,
    pub month: Option<u8>,
    pub year: Option<i32>,
    pub total: Option<f64>,
    /// Marking a statement as paid without `paid_on` uses today's date.
    /// Marking it as unpaid clears the date.
    pub paid: Option<bool>,
    pub paid_on: Option<Date>,
}

impl StatementUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(month) = self.month {
            validate_month(month)?;
        }

        if let Some(year) = self.year {
            validate_year(year)?;
        }

        if let Some(total) = self.total {
            validate_total(total)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{StatementForm, StatementUpdate};

    #[test]
    fn negative_total_is_rejected() {
        let form = StatementForm {
            card_id: 1,
            month: 5,
            year: 2025,
            total: -1.0,
        };

        assert!(matches!(form.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn zero_total_is_allowed() {
        let form = StatementForm {
            card_id: 1,
            month: 5,
            year: 2025,
            total: 0.0,
        };

        assert!(form.validate().is_ok());
    }

    #[test]
    fn update_checks_month() {
        let update = StatementUpdate {
            month: Some(13),
            ..Default::default()
        };

        assert!(matches!(update.validate(), Err(Error::Validation(_))));
    }
}
