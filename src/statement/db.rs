use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{
    Error,
    calendar::PeriodQuery,
    card::CardId,
    statement::domain::{Statement, StatementForm, StatementId, StatementUpdate},
};

pub fn create_statement_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS statement (
            id INTEGER PRIMARY KEY,
            card_id INTEGER NOT NULL REFERENCES card(id),
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL CHECK (year BETWEEN 2000 AND 2100),
            total REAL NOT NULL DEFAULT 0 CHECK (total >= 0),
            paid INTEGER NOT NULL DEFAULT 0,
            paid_on TEXT,
            UNIQUE (card_id, month, year)
        );

        CREATE TABLE IF NOT EXISTS statement_detail (
            id INTEGER PRIMARY KEY,
            statement_id INTEGER NOT NULL UNIQUE REFERENCES statement(id) ON DELETE CASCADE,
            issued_on TEXT,
            due_on TEXT,
            minimum_payment REAL,
            amount_paid REAL,
            statement_number TEXT,
            notes TEXT,
            updated_at TEXT NOT NULL
        );",
    )
}

const STATEMENT_QUERY: &str = "SELECT s.id, s.card_id, c.name, c.bank, s.month, s.year, \
    s.total, s.paid, s.paid_on
    FROM statement s
    LEFT JOIN card c ON c.id = s.card_id";

fn map_row_to_statement(row: &Row) -> Result<Statement, rusqlite::Error> {
    Ok(Statement {
        id: row.get(0)?,
        card_id: row.get(1)?,
        card_name: row.get(2)?,
        bank: row.get(3)?,
        month: row.get(4)?,
        year: row.get(5)?,
        total: row.get(6)?,
        paid: row.get(7)?,
        paid_on: row.get(8)?,
    })
}

/// Create the statement for a card and month, or replace the total of the
/// existing one.
///
/// # Errors
/// Returns [Error::InvalidForeignKey] if the card does not exist.
pub fn upsert_statement(form: &StatementForm, connection: &Connection) -> Result<Statement, Error> {
    let id: StatementId = connection.query_row(
        "INSERT INTO statement (card_id, month, year, total)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (card_id, month, year) DO UPDATE SET total = excluded.total
        RETURNING id",
        params![form.card_id, form.month, form.year, form.total],
        |row| row.get(0),
    )?;

    get_statement(id, connection)
}

/// # Errors
/// Returns [Error::NotFound] if there is no statement with `id`.
pub fn get_statement(id: StatementId, connection: &Connection) -> Result<Statement, Error> {
    connection
        .query_row(
            &format!("{STATEMENT_QUERY} WHERE s.id = ?1"),
            [id],
            map_row_to_statement,
        )
        .map_err(Error::from)
}

/// Get the statements matching the filters, newest period first.
pub fn get_statements(
    card_id: Option<CardId>,
    period: PeriodQuery,
    connection: &Connection,
) -> Result<Vec<Statement>, Error> {
    connection
        .prepare(&format!(
            "{STATEMENT_QUERY}
            WHERE (?1 IS NULL OR s.card_id = ?1)
                AND (?2 IS NULL OR s.month = ?2)
                AND (?3 IS NULL OR s.year = ?3)
            ORDER BY s.year DESC, s.month DESC, s.id DESC"
        ))?
        .query_map(
            params![card_id, period.month, period.year],
            map_row_to_statement,
        )?
        .map(|maybe_statement| maybe_statement.map_err(Error::from))
        .collect()
}

/// Change the fields given in `update`.
///
/// Setting `paid` to true without a date records `today`, setting it to false
/// clears the date.
///
/// # Errors
/// Returns [Error::NotFound] if there is no statement with `id`.
pub fn update_statement(
    id: StatementId,
    update: &StatementUpdate,
    today: Date,
    connection: &Connection,
) -> Result<Statement, Error> {
    let (paid_on, clear_paid_on) = match update.paid {
        Some(true) => (Some(update.paid_on.unwrap_or(today)), false),
        Some(false) => (None, true),
        None => (update.paid_on, false),
    };

    let rows_affected = connection.execute(
        "UPDATE statement
        SET card_id = COALESCE(?1, card_id),
            month = COALESCE(?2, month),
            year = COALESCE(?3, year),
            total = COALESCE(?4, total),
            paid = COALESCE(?5, paid),
            paid_on = CASE WHEN ?7 THEN NULL ELSE COALESCE(?6, paid_on) END
        WHERE id = ?8",
        params![
            update.card_id,
            update.month,
            update.year,
            update.total,
            update.paid,
            paid_on,
            clear_paid_on,
            id,
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_statement(id, connection)
}

/// Delete a statement and its detail.
///
/// # Errors
/// Returns [Error::NotFound] if there is no statement with `id`.
pub fn delete_statement(id: StatementId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "DELETE FROM statement_detail WHERE statement_id = ?1",
        [id],
    )?;
    let rows_affected = transaction.execute("DELETE FROM statement WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        calendar::PeriodQuery,
        card::{CardForm, CardKind, create_card},
        statement::domain::{StatementForm, StatementUpdate},
        test_utils::must_create_test_connection,
    };

    use super::{delete_statement, get_statement, get_statements, update_statement, upsert_statement};

    #[track_caller]
    fn must_create_card(name: &str, connection: &Connection) -> i64 {
        create_card(
            &CardForm {
                name: name.to_owned(),
                bank: Some("BCI".to_owned()),
                kind: CardKind::Credit,
                credit_limit: None,
                closing_day: None,
                due_day: None,
                active: true,
            },
            connection,
        )
        .unwrap()
        .id
    }

    fn form(card_id: i64, month: u8, total: f64) -> StatementForm {
        StatementForm {
            card_id,
            month,
            year: 2025,
            total,
        }
    }

    #[test]
    fn create_joins_card_name() {
        let connection = must_create_test_connection();
        let card_id = must_create_card("Visa", &connection);

        let statement = upsert_statement(&form(card_id, 3, 120_000.0), &connection).unwrap();

        assert_eq!(statement.card_name.as_deref(), Some("Visa"));
        assert_eq!(statement.bank.as_deref(), Some("BCI"));
        assert!(!statement.paid);
        assert_eq!(statement.paid_on, None);
    }

    #[test]
    fn create_for_existing_period_replaces_total() {
        let connection = must_create_test_connection();
        let card_id = must_create_card("Visa", &connection);
        let first = upsert_statement(&form(card_id, 3, 120_000.0), &connection).unwrap();

        let second = upsert_statement(&form(card_id, 3, 95_000.0), &connection).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.total, 95_000.0);
        assert_eq!(
            get_statements(None, PeriodQuery::default(), &connection)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn create_for_unknown_card_is_invalid() {
        let connection = must_create_test_connection();

        let result = upsert_statement(&form(42, 3, 10.0), &connection);

        assert_eq!(result, Err(Error::InvalidForeignKey));
    }

    #[test]
    fn list_filters_and_orders() {
        let connection = must_create_test_connection();
        let visa = must_create_card("Visa", &connection);
        let amex = must_create_card("Amex", &connection);
        upsert_statement(&form(visa, 1, 1.0), &connection).unwrap();
        upsert_statement(&form(visa, 2, 2.0), &connection).unwrap();
        upsert_statement(&form(amex, 2, 3.0), &connection).unwrap();

        let visa_statements: Vec<u8> = get_statements(Some(visa), PeriodQuery::default(), &connection)
            .unwrap()
            .into_iter()
            .map(|statement| statement.month)
            .collect();
        let february = get_statements(
            None,
            PeriodQuery {
                month: Some(2),
                year: Some(2025),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(visa_statements, vec![2, 1]);
        assert_eq!(february.len(), 2);
    }

    #[test]
    fn marking_paid_defaults_date_and_unpaid_clears_it() {
        let connection = must_create_test_connection();
        let card_id = must_create_card("Visa", &connection);
        let statement = upsert_statement(&form(card_id, 3, 10.0), &connection).unwrap();
        let today = date!(2025 - 04 - 05);

        let paid = update_statement(
            statement.id,
            &StatementUpdate {
                paid: Some(true),
                ..Default::default()
            },
            today,
            &connection,
        )
        .unwrap();
        let unpaid = update_statement(
            statement.id,
            &StatementUpdate {
                paid: Some(false),
                ..Default::default()
            },
            today,
            &connection,
        )
        .unwrap();

        assert!(paid.paid);
        assert_eq!(paid.paid_on, Some(today));
        assert!(!unpaid.paid);
        assert_eq!(unpaid.paid_on, None);
        assert_eq!(unpaid.total, 10.0);
    }

    #[test]
    fn update_missing_statement_is_not_found() {
        let connection = must_create_test_connection();

        let result = update_statement(
            1,
            &StatementUpdate::default(),
            date!(2025 - 04 - 05),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_statement_removes_it() {
        let connection = must_create_test_connection();
        let card_id = must_create_card("Visa", &connection);
        let statement = upsert_statement(&form(card_id, 3, 10.0), &connection).unwrap();

        delete_statement(statement.id, &connection).unwrap();

        assert_eq!(get_statement(statement.id, &connection), Err(Error::NotFound));
        assert_eq!(delete_statement(statement.id, &connection), Err(Error::NotFound));
    }
}
