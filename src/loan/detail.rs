//! Optional contract details stored alongside a loan.

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
    loan::{LoanId, LoanState, get_loan},
    response::{ApiResult, acknowledged, ok},
};

/// Contract details for a loan. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanDetail {
    pub contract_number: Option<String>,
    pub granted_on: Option<Date>,
    pub original_amount: Option<f64>,
    pub currency: Option<String>,
    /// The loan term in months, 1 to 600.
    pub term_months: Option<u16>,
    pub annual_interest_rate: Option<f64>,
    pub rate_type: Option<String>,
    /// The index the rate is adjusted by, e.g. "UF".
    pub adjustment_index: Option<String>,
    pub first_installment_on: Option<Date>,
    pub executive_name: Option<String>,
    pub executive_email: Option<String>,
    pub executive_phone: Option<String>,
    pub credit_life_insurance: Option<bool>,
    pub unemployment_insurance: Option<bool>,
    pub monthly_insurance_cost: Option<f64>,
    pub administration_fee: Option<f64>,
    pub prepayment_allowed: Option<bool>,
    pub prepayment_cost: Option<f64>,
    pub collateral_type: Option<String>,
    pub collateral_description: Option<String>,
    pub collateral_until: Option<Date>,
    /// The amount actually received after upfront costs.
    pub net_received: Option<f64>,
    pub upfront_costs_total: Option<f64>,
    pub tags: Option<String>,
    pub notes: Option<String>,
}

/// A stored loan detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanDetailRecord {
    pub loan_id: LoanId,
    #[serde(flatten)]
    pub detail: LoanDetail,
    pub updated_at: String,
}

impl LoanDetail {
    fn validate(self) -> Result<Self, Error> {
        if self
            .term_months
            .is_some_and(|term| !(1..=600).contains(&term))
        {
            return Err(Error::Validation(
                "term_months must be between 1 and 600".to_owned(),
            ));
        }

        Ok(Self {
            contract_number: non_empty(self.contract_number),
            currency: non_empty(self.currency),
            rate_type: non_empty(self.rate_type),
            adjustment_index: non_empty(self.adjustment_index),
            executive_name: non_empty(self.executive_name),
            executive_email: non_empty(self.executive_email),
            executive_phone: non_empty(self.executive_phone),
            collateral_type: non_empty(self.collateral_type),
            collateral_description: non_empty(self.collateral_description),
            tags: non_empty(self.tags),
            notes: non_empty(self.notes),
            ..self
        })
    }

    fn into_fields(self) -> Vec<(&'static str, Value)> {
        vec![
            ("contract_number", self.contract_number.into()),
            ("granted_on", date_value(self.granted_on)),
            ("original_amount", self.original_amount.into()),
            ("currency", self.currency.into()),
            ("term_months", self.term_months.into()),
            ("annual_interest_rate", self.annual_interest_rate.into()),
            ("rate_type", self.rate_type.into()),
            ("adjustment_index", self.adjustment_index.into()),
            ("first_installment_on", date_value(self.first_installment_on)),
            ("executive_name", self.executive_name.into()),
            ("executive_email", self.executive_email.into()),
            ("executive_phone", self.executive_phone.into()),
            ("credit_life_insurance", self.credit_life_insurance.into()),
            ("unemployment_insurance", self.unemployment_insurance.into()),
            ("monthly_insurance_cost", self.monthly_insurance_cost.into()),
            ("administration_fee", self.administration_fee.into()),
            ("prepayment_allowed", self.prepayment_allowed.into()),
            ("prepayment_cost", self.prepayment_cost.into()),
            ("collateral_type", self.collateral_type.into()),
            ("collateral_description", self.collateral_description.into()),
            ("collateral_until", date_value(self.collateral_until)),
            ("net_received", self.net_received.into()),
            ("upfront_costs_total", self.upfront_costs_total.into()),
            ("tags", self.tags.into()),
            ("notes", self.notes.into()),
        ]
    }
}

fn map_row_to_detail(row: &Row) -> Result<LoanDetailRecord, rusqlite::Error> {
    Ok(LoanDetailRecord {
        loan_id: row.get("loan_id")?,
        detail: LoanDetail {
            contract_number: row.get("contract_number")?,
            granted_on: row.get("granted_on")?,
            original_amount: row.get("original_amount")?,
            currency: row.get("currency")?,
            term_months: row.get("term_months")?,
            annual_interest_rate: row.get("annual_interest_rate")?,
            rate_type: row.get("rate_type")?,
            adjustment_index: row.get("adjustment_index")?,
            first_installment_on: row.get("first_installment_on")?,
            executive_name: row.get("executive_name")?,
            executive_email: row.get("executive_email")?,
            executive_phone: row.get("executive_phone")?,
            credit_life_insurance: row.get("credit_life_insurance")?,
            unemployment_insurance: row.get("unemployment_insurance")?,
            monthly_insurance_cost: row.get("monthly_insurance_cost")?,
            administration_fee: row.get("administration_fee")?,
            prepayment_allowed: row.get("prepayment_allowed")?,
            prepayment_cost: row.get("prepayment_cost")?,
            collateral_type: row.get("collateral_type")?,
            collateral_description: row.get("collateral_description")?,
            collateral_until: row.get("collateral_until")?,
            net_received: row.get("net_received")?,
            upfront_costs_total: row.get("upfront_costs_total")?,
            tags: row.get("tags")?,
            notes: row.get("notes")?,
        },
        updated_at: row.get("updated_at")?,
    })
}

/// Get the detail of a loan, if one has been saved.
pub fn get_loan_detail(
    loan_id: LoanId,
    connection: &Connection,
) -> Result<Option<LoanDetailRecord>, Error> {
    connection
        .query_row(
            "SELECT * FROM loan_detail WHERE loan_id = ?1",
            [loan_id],
            map_row_to_detail,
        )
        .optional()
        .map_err(Error::from)
}

/// Create or update the detail of a loan.
///
/// Fields that are missing or empty keep their stored value.
///
/// # Errors
/// Returns [Error::NotFound] if the loan does not exist.
pub fn upsert_loan_detail(
    loan_id: LoanId,
    detail: LoanDetail,
    connection: &Connection,
) -> Result<LoanDetailRecord, Error> {
    let detail = detail.validate()?;
    get_loan(loan_id, connection)?;

    upsert_detail(connection, "loan_detail", "loan_id", loan_id, detail.into_fields())?;

    get_loan_detail(loan_id, connection)?.ok_or(Error::NotFound)
}

/// Get the detail of a loan, or an empty object if there is none.
pub async fn get_loan_detail_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
) -> ApiResult<serde_json::Value> {
    let connection = lock_connection(&state.db_connection)?;

    let detail = match get_loan_detail(loan_id, &connection)? {
        Some(detail) => serde_json::to_value(detail)
            .map_err(|error| Error::JSONSerializationError(error.to_string()))?,
        None => json!({}),
    };

    Ok(ok(detail))
}

/// Create or update the detail of a loan.
pub async fn upsert_loan_detail_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
    Json(detail): Json<LoanDetail>,
) -> ApiResult<LoanDetailRecord> {
    let connection = lock_connection(&state.db_connection)?;

    upsert_loan_detail(loan_id, detail, &connection).map(ok)
}

/// Delete the detail of a loan. Succeeds even if there was no detail.
pub async fn delete_loan_detail_endpoint(
    State(state): State<LoanState>,
    Path(loan_id): Path<LoanId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    connection.execute("DELETE FROM loan_detail WHERE loan_id = ?1", [loan_id])?;

    Ok(acknowledged())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        loan::{LoanForm, create_loan},
        test_utils::must_create_test_connection,
    };

    use super::{LoanDetail, get_loan_detail, upsert_loan_detail};

    fn must_create_loan(connection: &rusqlite::Connection) -> i64 {
        create_loan(
            &LoanForm {
                name: "Mortgage".to_owned(),
                installment_amount: 900.0,
                total_installments: 240,
                initial_paid_installments: None,
                first_month: None,
                first_year: None,
                due_day: None,
                bank: None,
            },
            connection,
        )
        .unwrap()
        .id
    }

    #[test]
    fn missing_detail_is_none() {
        let connection = must_create_test_connection();
        let loan_id = must_create_loan(&connection);

        assert_eq!(get_loan_detail(loan_id, &connection), Ok(None));
    }

    #[test]
    fn upsert_only_overwrites_given_fields() {
        let connection = must_create_test_connection();
        let loan_id = must_create_loan(&connection);
        upsert_loan_detail(
            loan_id,
            LoanDetail {
                contract_number: Some("ABC-123".to_owned()),
                granted_on: Some(date!(2020 - 06 - 01)),
                term_months: Some(240),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let record = upsert_loan_detail(
            loan_id,
            LoanDetail {
                contract_number: Some("  ".to_owned()),
                notes: Some("Fixed rate".to_owned()),
                credit_life_insurance: Some(true),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(record.loan_id, loan_id);
        assert_eq!(record.detail.contract_number.as_deref(), Some("ABC-123"));
        assert_eq!(record.detail.granted_on, Some(date!(2020 - 06 - 01)));
        assert_eq!(record.detail.term_months, Some(240));
        assert_eq!(record.detail.notes.as_deref(), Some("Fixed rate"));
        assert_eq!(record.detail.credit_life_insurance, Some(true));
    }

    #[test]
    fn upsert_stores_collateral_and_costs() {
        let connection = must_create_test_connection();
        let loan_id = must_create_loan(&connection);

        let record = upsert_loan_detail(
            loan_id,
            LoanDetail {
                adjustment_index: Some("UF".to_owned()),
                administration_fee: Some(1_500.0),
                collateral_type: Some("mortgage".to_owned()),
                collateral_description: Some("".to_owned()),
                collateral_until: Some(date!(2040 - 06 - 01)),
                net_received: Some(48_000_000.0),
                upfront_costs_total: Some(2_000_000.0),
                tags: Some("home, fixed".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(record.detail.adjustment_index.as_deref(), Some("UF"));
        assert_eq!(record.detail.administration_fee, Some(1_500.0));
        assert_eq!(record.detail.collateral_type.as_deref(), Some("mortgage"));
        assert_eq!(record.detail.collateral_description, None);
        assert_eq!(record.detail.collateral_until, Some(date!(2040 - 06 - 01)));
        assert_eq!(record.detail.net_received, Some(48_000_000.0));
        assert_eq!(record.detail.upfront_costs_total, Some(2_000_000.0));
        assert_eq!(record.detail.tags.as_deref(), Some("home, fixed"));
    }

    #[test]
    fn upsert_rejects_out_of_range_term() {
        let connection = must_create_test_connection();
        let loan_id = must_create_loan(&connection);

        let result = upsert_loan_detail(
            loan_id,
            LoanDetail {
                term_months: Some(601),
                ..Default::default()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn upsert_for_missing_loan_is_not_found() {
        let connection = must_create_test_connection();

        let result = upsert_loan_detail(3, LoanDetail::default(), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }
}
