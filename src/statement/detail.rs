use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::{Connection, OptionalExtension, Row, types::Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    Error,
    db::{date_value, lock_connection, non_empty, upsert_detail},
    response::{ApiResult, acknowledged, ok},
    statement::{StatementId, StatementState, get_statement},
};

/// Extra information printed on a card statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementDetail {
    pub issued_on: Option<Date>,
    pub due_on: Option<Date>,
    pub minimum_payment: Option<f64>,
    pub amount_paid: Option<f64>,
    pub statement_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementDetailRecord {
    pub statement_id: StatementId,
    #[serde(flatten)]
    pub detail: StatementDetail,
    pub updated_at: String,
}

impl StatementDetail {
    fn validate(&self) -> Result<(), Error> {
        let negative = [self.minimum_payment, self.amount_paid]
            .into_iter()
            .flatten()
            .any(|amount| !amount.is_finite() || amount < 0.0);

        if negative {
            return Err(Error::Validation(
                "statement amounts must not be negative".to_owned(),
            ));
        }

        Ok(())
    }

    fn into_fields(self) -> Vec<(&'static str, Value)> {
        vec![
            ("issued_on", date_value(self.issued_on)),
            ("due_on", date_value(self.due_on)),
            ("minimum_payment", self.minimum_payment.into()),
            ("amount_paid", self.amount_paid.into()),
            ("statement_number", non_empty(self.statement_number).into()),
            ("notes", non_empty(self.notes).into()),
        ]
    }
}

fn map_row_to_detail(row: &Row) -> Result<StatementDetailRecord, rusqlite::Error> {
    Ok(StatementDetailRecord {
        statement_id: row.get("statement_id")?,
        detail: StatementDetail {
            issued_on: row.get("issued_on")?,
            due_on: row.get("due_on")?,
            minimum_payment: row.get("minimum_payment")?,
            amount_paid: row.get("amount_paid")?,
            statement_number: row.get("statement_number")?,
            notes: row.get("notes")?,
        },
        updated_at: row.get("updated_at")?,
    })
}

pub fn get_statement_detail(
    statement_id: StatementId,
    connection: &Connection,
) -> Result<Option<StatementDetailRecord>, Error> {
    connection
        .query_row(
            "SELECT * FROM statement_detail WHERE statement_id = ?1",
            [statement_id],
            map_row_to_detail,
        )
        .optional()
        .map_err(Error::from)
}

/// Create or update the detail of a statement.
///
/// # Errors
/// Returns [Error::NotFound] if the statement does not exist.
pub fn upsert_statement_detail(
    statement_id: StatementId,
    detail: StatementDetail,
    connection: &Connection,
) -> Result<StatementDetailRecord, Error> {
    detail.validate()?;
    get_statement(statement_id, connection)?;

    upsert_detail(
        connection,
        "statement_detail",
        "statement_id",
        statement_id,
        detail.into_fields(),
    )?;

    get_statement_detail(statement_id, connection)?.ok_or(Error::NotFound)
}

pub async fn get_statement_detail_endpoint(
    State(state): State<StatementState>,
    Path(statement_id): Path<StatementId>,
) -> ApiResult<serde_json::Value> {
    let connection = lock_connection(&state.db_connection)?;

    let detail = match get_statement_detail(statement_id, &connection)? {
        Some(detail) => serde_json::to_value(detail)
            .map_err(|error| Error::JSONSerializationError(error.to_string()))?,
        None => json!({}),
    };

    Ok(ok(detail))
}

pub async fn upsert_statement_detail_endpoint(
    State(state): State<StatementState>,
    Path(statement_id): Path<StatementId>,
    Json(detail): Json<StatementDetail>,
) -> ApiResult<StatementDetailRecord> {
    let connection = lock_connection(&state.db_connection)?;

    upsert_statement_detail(statement_id, detail, &connection).map(ok)
}

pub async fn delete_statement_detail_endpoint(
    State(state): State<StatementState>,
    Path(statement_id): Path<StatementId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    connection.execute(
        "DELETE FROM statement_detail WHERE statement_id = ?1",
        [statement_id],
    )?;

    Ok(acknowledged())
}
