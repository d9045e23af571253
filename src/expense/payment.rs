//! Paying expenses and undoing those payments.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    card::CardId,
    database_id::DatabaseId,
    db::{lock_connection, non_empty},
    expense::{
        ExpenseState,
        db::get_expense,
        domain::{ExpenseId, ExpensePayment},
    },
    response::{ApiResult, acknowledged, ok},
    timezone::today,
};

/// The payment method used when an expense was bought with a card.
pub const CREDIT_METHOD: &str = "credit";
/// The payment method used for everything else.
pub const CASH_OR_DEBIT_METHOD: &str = "cash/debit";

/// Overrides for the payment of an expense.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayExpenseForm {
    pub paid_on: Option<Date>,
    pub amount: Option<f64>,
    pub method: Option<String>,
    pub card_id: Option<CardId>,
    pub note: Option<String>,
}

fn map_row_to_payment(row: &Row) -> Result<ExpensePayment, rusqlite::Error> {
    Ok(ExpensePayment {
        id: row.get(0)?,
        expense_id: row.get(1)?,
        paid_on: row.get(2)?,
        amount: row.get(3)?,
        method: row.get(4)?,
        card_id: row.get(5)?,
        note: row.get(6)?,
    })
}

/// Record the payment of an expense and mark it as paid.
///
/// Missing fields default to `today`, the expense amount, a method based on
/// whether the expense was bought with a card, and the expense's card.
///
/// # Errors
/// Returns [Error::NotFound] if the expense does not exist or
/// [Error::AlreadyPaid] if it is already marked as paid.
pub fn pay_expense(
    expense_id: ExpenseId,
    form: PayExpenseForm,
    today: Date,
    connection: &Connection,
) -> Result<ExpensePayment, Error> {
    if form
        .amount
        .is_some_and(|amount| !amount.is_finite() || amount < 0.0)
    {
        return Err(Error::Validation("amount must not be negative".to_owned()));
    }

    let transaction = connection.unchecked_transaction()?;

    let expense = get_expense(expense_id, &transaction)?;
    if expense.paid {
        return Err(Error::AlreadyPaid);
    }

    let default_method = if expense.with_card {
        CREDIT_METHOD
    } else {
        CASH_OR_DEBIT_METHOD
    };
    let paid_on = form.paid_on.unwrap_or(today);
    let amount = form.amount.unwrap_or(expense.amount);
    let method = non_empty(form.method).unwrap_or_else(|| default_method.to_owned());
    let card_id = form.card_id.or(expense.card_id);
    let note = non_empty(form.note);

    transaction.execute(
        "INSERT INTO expense_payment (expense_id, paid_on, amount, method, card_id, note)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![expense_id, paid_on, amount, method, card_id, note],
    )?;
    let id = transaction.last_insert_rowid();
    transaction.execute("UPDATE expense SET paid = 1 WHERE id = ?1", [expense_id])?;

    transaction.commit()?;

    Ok(ExpensePayment {
        id,
        expense_id,
        paid_on,
        amount,
        method,
        card_id,
        note,
    })
}

/// Delete the latest payment of an expense.
///
/// The expense stays paid only if it still has other payments.
///
/// # Errors
/// Returns [Error::NotFound] if the expense does not exist or
/// [Error::NoPaymentsToUndo] if it has no payments.
pub fn undo_last_expense_payment(
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    get_expense(expense_id, &transaction)?;

    let latest_payment: Option<DatabaseId> = transaction
        .query_row(
            "SELECT id FROM expense_payment
            WHERE expense_id = ?1
            ORDER BY paid_on DESC, id DESC
            LIMIT 1",
            [expense_id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(payment_id) = latest_payment else {
        return Err(Error::NoPaymentsToUndo);
    };

    transaction.execute("DELETE FROM expense_payment WHERE id = ?1", [payment_id])?;
    transaction.execute(
        "UPDATE expense
        SET paid = EXISTS (SELECT 1 FROM expense_payment WHERE expense_id = ?1)
        WHERE id = ?1",
        [expense_id],
    )?;

    transaction.commit()?;

    Ok(())
}

/// Get the payments of an expense, newest first.
pub fn get_expense_payments(
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Vec<ExpensePayment>, Error> {
    get_expense(expense_id, connection)?;

    connection
        .prepare(
            "SELECT id, expense_id, paid_on, amount, method, card_id, note
            FROM expense_payment
            WHERE expense_id = ?1
            ORDER BY paid_on DESC, id DESC",
        )?
        .query_map([expense_id], map_row_to_payment)?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}

pub async fn pay_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
    form: Option<Json<PayExpenseForm>>,
) -> ApiResult<ExpensePayment> {
    let today = today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;
    let form = form.map(|Json(form)| form).unwrap_or_default();

    pay_expense(expense_id, form, today, &connection).map(ok)
}

pub async fn undo_expense_payment_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    undo_last_expense_payment(expense_id, &connection)?;

    Ok(acknowledged())
}

pub async fn get_expense_payments_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> ApiResult<Vec<ExpensePayment>> {
    let connection = lock_connection(&state.db_connection)?;

    get_expense_payments(expense_id, &connection).map(ok)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        card::{CardForm, CardKind, create_card},
        expense::{Expense, ExpenseForm, create_expense, get_expense},
        test_utils::must_create_test_connection,
    };

    use super::{
        CASH_OR_DEBIT_METHOD, CREDIT_METHOD, PayExpenseForm, get_expense_payments, pay_expense,
        undo_last_expense_payment,
    };

    #[track_caller]
    fn must_create_expense(
        with_card: bool,
        card_id: Option<i64>,
        connection: &Connection,
    ) -> Expense {
        create_expense(
            &ExpenseForm {
                name: "Groceries".to_owned(),
                amount: 80_000.0,
                month: 2,
                year: 2025,
                paid: None,
                card_id,
                installments: None,
                kind: None,
                with_card: Some(with_card),
                recurring: None,
                due_date: None,
            },
            connection,
        )
        .unwrap()
    }

    #[test]
    fn pay_uses_defaults() {
        let connection = must_create_test_connection();
        let expense = must_create_expense(false, None, &connection);

        let payment = pay_expense(
            expense.id,
            PayExpenseForm::default(),
            date!(2025 - 02 - 11),
            &connection,
        )
        .unwrap();

        assert_eq!(payment.paid_on, date!(2025 - 02 - 11));
        assert_eq!(payment.amount, 80_000.0);
        assert_eq!(payment.method, CASH_OR_DEBIT_METHOD);
        assert_eq!(payment.card_id, None);
        assert!(get_expense(expense.id, &connection).unwrap().paid);
    }

    #[test]
    fn card_purchases_default_to_credit_and_their_card() {
        let connection = must_create_test_connection();
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
            &connection,
        )
        .unwrap();
        let expense = must_create_expense(true, Some(card.id), &connection);

        let payment = pay_expense(
            expense.id,
            PayExpenseForm::default(),
            date!(2025 - 02 - 11),
            &connection,
        )
        .unwrap();

        assert_eq!(payment.method, CREDIT_METHOD);
        assert_eq!(payment.card_id, Some(card.id));
    }

    #[test]
    fn paying_twice_is_rejected() {
        let connection = must_create_test_connection();
        let expense = must_create_expense(false, None, &connection);
        let today = date!(2025 - 02 - 11);
        pay_expense(expense.id, PayExpenseForm::default(), today, &connection).unwrap();

        let result = pay_expense(expense.id, PayExpenseForm::default(), today, &connection);

        assert_eq!(result, Err(Error::AlreadyPaid));
    }

    #[test]
    fn paying_missing_expense_is_not_found() {
        let connection = must_create_test_connection();

        let result = pay_expense(1, PayExpenseForm::default(), date!(2025 - 02 - 11), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn undo_marks_expense_unpaid() {
        let connection = must_create_test_connection();
        let expense = must_create_expense(false, None, &connection);
        pay_expense(
            expense.id,
            PayExpenseForm::default(),
            date!(2025 - 02 - 11),
            &connection,
        )
        .unwrap();

        undo_last_expense_payment(expense.id, &connection).unwrap();

        assert!(!get_expense(expense.id, &connection).unwrap().paid);
        assert_eq!(get_expense_payments(expense.id, &connection), Ok(vec![]));
    }

    #[test]
    fn undo_without_payments_is_rejected() {
        let connection = must_create_test_connection();
        let expense = must_create_expense(false, None, &connection);

        assert_eq!(
            undo_last_expense_payment(expense.id, &connection),
            Err(Error::NoPaymentsToUndo)
        );
    }

    #[test]
    fn undo_keeps_paid_while_payments_remain() {
        let connection = must_create_test_connection();
        let expense = must_create_expense(false, None, &connection);
        pay_expense(
            expense.id,
            PayExpenseForm {
                amount: Some(40_000.0),
                ..Default::default()
            },
            date!(2025 - 02 - 01),
            &connection,
        )
        .unwrap();
        connection
            .execute("UPDATE expense SET paid = 0 WHERE id = ?1", [expense.id])
            .unwrap();
        pay_expense(
            expense.id,
            PayExpenseForm {
                amount: Some(40_000.0),
                ..Default::default()
            },
            date!(2025 - 02 - 15),
            &connection,
        )
        .unwrap();

        undo_last_expense_payment(expense.id, &connection).unwrap();

        let payments = get_expense_payments(expense.id, &connection).unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].paid_on, date!(2025 - 02 - 01));
        assert!(get_expense(expense.id, &connection).unwrap().paid);
    }
}
