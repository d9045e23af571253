//! Optional invoice or receipt details for an expense.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::{Connection, OptionalExtension, Row, types::Type, types::Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    Error,
    db::{date_value, lock_connection, non_empty, upsert_detail},
    expense::{ExpenseId, ExpenseState, get_expense},
    response::{ApiResult, acknowledged, ok},
};

/// Details from the receipt or invoice of an expense. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseDetail {
    pub company: Option<String>,
    pub tax_id: Option<String>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub document_date: Option<Date>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub deductible: Option<bool>,
    pub currency: Option<String>,
    pub exchange_rate: Option<f64>,
    pub net: Option<f64>,
    pub tax: Option<f64>,
    pub exempt: Option<f64>,
    pub discount: Option<f64>,
    /// Computed from the other amounts when not given.
    pub document_total: Option<f64>,
    pub warranty_months: Option<u32>,
    pub warranty_until: Option<Date>,
    pub location: Option<String>,
    /// Free-form tags, stored as JSON.
    pub tags: Option<serde_json::Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDetailRecord {
    pub expense_id: ExpenseId,
    #[serde(flatten)]
    pub detail: ExpenseDetail,
    pub updated_at: String,
}

impl ExpenseDetail {
    fn normalize(self) -> Self {
        let document_total = self.document_total.or_else(|| {
            let parts = [self.net, self.tax, self.exempt, self.discount].map(|part| part.unwrap_or(0.0));

            if parts.iter().any(|part| *part != 0.0) {
                let [net, tax, exempt, discount] = parts;
                Some(net + tax + exempt - discount)
            } else {
                None
            }
        });

        Self {
            company: non_empty(self.company),
            tax_id: non_empty(self.tax_id),
            document_type: non_empty(self.document_type),
            document_number: non_empty(self.document_number),
            category: non_empty(self.category),
            payment_method: non_empty(self.payment_method),
            currency: non_empty(self.currency),
            location: non_empty(self.location),
            notes: non_empty(self.notes),
            document_total,
            ..self
        }
    }

    fn into_fields(self) -> Result<Vec<(&'static str, Value)>, Error> {
        let tags = self
            .tags
            .map(|tags| serde_json::to_string(&tags))
            .transpose()
            .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

        Ok(vec![
            ("company", self.company.into()),
            ("tax_id", self.tax_id.into()),
            ("document_type", self.document_type.into()),
            ("document_number", self.document_number.into()),
            ("document_date", date_value(self.document_date)),
            ("category", self.category.into()),
            ("payment_method", self.payment_method.into()),
            ("deductible", self.deductible.into()),
            ("currency", self.currency.into()),
            ("exchange_rate", self.exchange_rate.into()),
            ("net", self.net.into()),
            ("tax", self.tax.into()),
            ("exempt", self.exempt.into()),
            ("discount", self.discount.into()),
            ("document_total", self.document_total.into()),
            ("warranty_months", self.warranty_months.into()),
            ("warranty_until", date_value(self.warranty_until)),
            ("location", self.location.into()),
            ("tags", tags.into()),
            ("notes", self.notes.into()),
        ])
    }
}

fn parse_tags(row: &Row) -> Result<Option<serde_json::Value>, rusqlite::Error> {
    let Some(tags) = row.get::<_, Option<String>>("tags")? else {
        return Ok(None);
    };

    serde_json::from_str(&tags).map(Some).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(error))
    })
}

fn map_row_to_detail(row: &Row) -> Result<ExpenseDetailRecord, rusqlite::Error> {
    Ok(ExpenseDetailRecord {
        expense_id: row.get("expense_id")?,
        detail: ExpenseDetail {
            company: row.get("company")?,
            tax_id: row.get("tax_id")?,
            document_type: row.get("document_type")?,
            document_number: row.get("document_number")?,
            document_date: row.get("document_date")?,
            category: row.get("category")?,
            payment_method: row.get("payment_method")?,
            deductible: row.get("deductible")?,
            currency: row.get("currency")?,
            exchange_rate: row.get("exchange_rate")?,
            net: row.get("net")?,
            tax: row.get("tax")?,
            exempt: row.get("exempt")?,
            discount: row.get("discount")?,
            document_total: row.get("document_total")?,
            warranty_months: row.get("warranty_months")?,
            warranty_until: row.get("warranty_until")?,
            location: row.get("location")?,
            tags: parse_tags(row)?,
            notes: row.get("notes")?,
        },
        updated_at: row.get("updated_at")?,
    })
}

pub fn get_expense_detail(
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Option<ExpenseDetailRecord>, Error> {
    connection
        .query_row(
            "SELECT * FROM expense_detail WHERE expense_id = ?1",
            [expense_id],
            map_row_to_detail,
        )
        .optional()
        .map_err(Error::from)
}

/// Create or update the detail of an expense.
///
/// # Errors
/// Returns [Error::NotFound] if the expense does not exist.
pub fn upsert_expense_detail(
    expense_id: ExpenseId,
    detail: ExpenseDetail,
    connection: &Connection,
) -> Result<ExpenseDetailRecord, Error> {
    get_expense(expense_id, connection)?;

    let fields = detail.normalize().into_fields()?;
    upsert_detail(connection, "expense_detail", "expense_id", expense_id, fields)?;

    get_expense_detail(expense_id, connection)?.ok_or(Error::NotFound)
}

pub async fn get_expense_detail_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> ApiResult<serde_json::Value> {
    let connection = lock_connection(&state.db_connection)?;

    let detail = match get_expense_detail(expense_id, &connection)? {
        Some(detail) => serde_json::to_value(detail)
            .map_err(|error| Error::JSONSerializationError(error.to_string()))?,
        None => json!({}),
    };

    Ok(ok(detail))
}

pub async fn upsert_expense_detail_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
    Json(detail): Json<ExpenseDetail>,
) -> ApiResult<ExpenseDetailRecord> {
    let connection = lock_connection(&state.db_connection)?;

    upsert_expense_detail(expense_id, detail, &connection).map(ok)
}

pub async fn delete_expense_detail_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    connection.execute(
        "DELETE FROM expense_detail WHERE expense_id = ?1",
        [expense_id],
    )?;

    Ok(acknowledged())
}
