//! Paying card statements and undoing those payments.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::{Connection, params};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    db::{lock_connection, upsert_detail},
    response::{ApiResult, ok},
    statement::{
        StatementState,
        db::get_statement,
        domain::{Statement, StatementId},
    },
    timezone::today,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayStatementForm {
    /// Saved in the statement detail when given.
    pub amount_paid: Option<f64>,
    pub paid_on: Option<Date>,
}

/// Mark a statement as paid on `paid_on`, or `today` if not given.
///
/// # Errors
/// Returns [Error::NotFound] if the statement does not exist or
/// [Error::AlreadyPaid] if it is already paid.
pub fn pay_statement(
    statement_id: StatementId,
    form: PayStatementForm,
    today: Date,
    connection: &Connection,
) -> Result<Statement, Error> {
    if form
        .amount_paid
        .is_some_and(|amount| !amount.is_finite() || amount < 0.0)
    {
        return Err(Error::Validation(
            "amount_paid must not be negative".to_owned(),
        ));
    }

    let transaction = connection.unchecked_transaction()?;

    let statement = get_statement(statement_id, &transaction)?;
    if statement.paid {
        return Err(Error::AlreadyPaid);
    }

    transaction.execute(
        "UPDATE statement SET paid = 1, paid_on = ?1 WHERE id = ?2",
        params![form.paid_on.unwrap_or(today), statement_id],
    )?;

    if let Some(amount_paid) = form.amount_paid {
        upsert_detail(
            &transaction,
            "statement_detail",
            "statement_id",
            statement_id,
            vec![("amount_paid", amount_paid.into())],
        )?;
    }

    transaction.commit()?;

    get_statement(statement_id, connection)
}

/// Mark a paid statement as unpaid and forget the amount paid.
///
/// # Errors
/// Returns [Error::NotFound] if the statement does not exist or
/// [Error::NotPaid] if it has not been paid.
pub fn undo_statement_payment(
    statement_id: StatementId,
    connection: &Connection,
) -> Result<Statement, Error> {
    let transaction = connection.unchecked_transaction()?;

    let statement = get_statement(statement_id, &transaction)?;
    if !statement.paid {
        return Err(Error::NotPaid);
    }

    transaction.execute(
        "UPDATE statement SET paid = 0, paid_on = NULL WHERE id = ?1",
        [statement_id],
    )?;
    transaction.execute(
        "UPDATE statement_detail
        SET amount_paid = NULL, updated_at = CURRENT_TIMESTAMP
        WHERE statement_id = ?1",
        [statement_id],
    )?;

    transaction.commit()?;

    get_statement(statement_id, connection)
}

pub async fn pay_statement_endpoint(
    State(state): State<StatementState>,
    Path(statement_id): Path<StatementId>,
    form: Option<Json<PayStatementForm>>,
) -> ApiResult<Statement> {
    let today = today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;
    let form = form.map(|Json(form)| form).unwrap_or_default();

    pay_statement(statement_id, form, today, &connection).map(ok)
}

pub async fn undo_statement_payment_endpoint(
    State(state): State<StatementState>,
    Path(statement_id): Path<StatementId>,
) -> ApiResult<Statement> {
    let connection = lock_connection(&state.db_connection)?;

    undo_statement_payment(statement_id, &connection).map(ok)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        card::{CardForm, CardKind, create_card},
        statement::{StatementForm, upsert_statement},
        test_utils::must_create_test_connection,
    };

    use super::{PayStatementForm, pay_statement, undo_statement_payment};

    #[track_caller]
    fn must_create_statement(connection: &Connection) -> i64 {
        let card = create_card(
            &CardForm {
                name: "Visa".to_owned(),
                bank: None,
                kind: CardKind::Credit,
                credit_limit: None,
                closing_day: None,
                due_day: None,
                active: true,
            },
            connection,
        )
        .unwrap();

        upsert_statement(
            &StatementForm {
                card_id: card.id,
                month: 7,
                year: 2025,
                total: 300_000.0,
            },
            connection,
        )
        .unwrap()
        .id
    }

    fn amount_paid(statement_id: i64, connection: &Connection) -> Option<f64> {
        connection
            .query_row(
                "SELECT amount_paid FROM statement_detail WHERE statement_id = ?1",
                [statement_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn pay_defaults_to_today() {
        let connection = must_create_test_connection();
        let statement_id = must_create_statement(&connection);

        let statement = pay_statement(
            statement_id,
            PayStatementForm::default(),
            date!(2025 - 08 - 05),
            &connection,
        )
        .unwrap();

        assert!(statement.paid);
        assert_eq!(statement.paid_on, Some(date!(2025 - 08 - 05)));
    }

    #[test]
    fn pay_records_amount_paid_in_detail() {
        let connection = must_create_test_connection();
        let statement_id = must_create_statement(&connection);

        pay_statement(
            statement_id,
            PayStatementForm {
                amount_paid: Some(150_000.0),
                paid_on: Some(date!(2025 - 08 - 01)),
            },
            date!(2025 - 08 - 05),
            &connection,
        )
        .unwrap();

        assert_eq!(amount_paid(statement_id, &connection), Some(150_000.0));
    }

    #[test]
    fn paying_twice_is_rejected() {
        let connection = must_create_test_connection();
        let statement_id = must_create_statement(&connection);
        let today = date!(2025 - 08 - 05);
        pay_statement(statement_id, PayStatementForm::default(), today, &connection).unwrap();

        let result = pay_statement(statement_id, PayStatementForm::default(), today, &connection);

        assert_eq!(result, Err(Error::AlreadyPaid));
    }

    #[test]
    fn undo_clears_payment_and_amount() {
        let connection = must_create_test_connection();
        let statement_id = must_create_statement(&connection);
        pay_statement(
            statement_id,
            PayStatementForm {
                amount_paid: Some(300_000.0),
                paid_on: None,
            },
            date!(2025 - 08 - 05),
            &connection,
        )
        .unwrap();

        let statement = undo_statement_payment(statement_id, &connection).unwrap();

        assert!(!statement.paid);
        assert_eq!(statement.paid_on, None);
        assert_eq!(amount_paid(statement_id, &connection), None);
    }

    #[test]
    fn undo_unpaid_statement_is_rejected() {
        let connection = must_create_test_connection();
        let statement_id = must_create_statement(&connection);

        assert_eq!(
            undo_statement_payment(statement_id, &connection),
            Err(Error::NotPaid)
        );
    }

    #[test]
    fn undo_missing_statement_is_not_found() {
        let connection = must_create_test_connection();

        assert_eq!(undo_statement_payment(3, &connection), Err(Error::NotFound));
    }
}
