use rusqlite::{Connection, Row, params};

use crate::{
    Error,
    card::domain::{Card, CardForm, CardId},
};

pub fn create_card_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS card (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            bank TEXT,
            kind TEXT NOT NULL DEFAULT 'credit' CHECK (kind IN ('credit', 'debit')),
            credit_limit REAL,
            closing_day INTEGER CHECK (closing_day BETWEEN 1 AND 31),
            due_day INTEGER CHECK (due_day BETWEEN 1 AND 31),
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS card_detail (
            id INTEGER PRIMARY KEY,
            card_id INTEGER NOT NULL UNIQUE REFERENCES card(id) ON DELETE CASCADE,
            alias TEXT,
            pan_last4 TEXT,
            expiry_month INTEGER CHECK (expiry_month BETWEEN 1 AND 12),
            expiry_year INTEGER CHECK (expiry_year BETWEEN 2000 AND 2100),
            delivered_on TEXT,
            network TEXT CHECK (network IN ('visa', 'mastercard', 'amex', 'other')),
            updated_at TEXT NOT NULL
        );",
    )
}

fn map_row_to_card(row: &Row) -> Result<Card, rusqlite::Error> {
    Ok(Card {
        id: row.get(0)?,
        name: row.get(1)?,
        bank: row.get(2)?,
        kind: row.get(3)?,
        credit_limit: row.get(4)?,
        closing_day: row.get(5)?,
        due_day: row.get(6)?,
        active: row.get(7)?,
    })
}

/// Create a card. The form should already be validated.
pub fn create_card(form: &CardForm, connection: &Connection) -> Result<Card, Error> {
    connection.execute(
        "INSERT INTO card (name, bank, kind, credit_limit, closing_day, due_day, active)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            form.name,
            form.bank,
            form.kind,
            form.credit_limit,
            form.closing_day,
            form.due_day,
            form.active,
        ],
    )?;

    get_card(connection.last_insert_rowid(), connection)
}

/// Get a card by ID, including inactive cards.
///
/// # Errors
/// Returns [Error::NotFound] if there is no card with `id`.
pub fn get_card(id: CardId, connection: &Connection) -> Result<Card, Error> {
    connection
        .query_row(
            "SELECT id, name, bank, kind, credit_limit, closing_day, due_day, active
            FROM card WHERE id = ?1",
            [id],
            map_row_to_card,
        )
        .map_err(Error::from)
}

/// Get the active cards, newest first.
pub fn get_active_cards(connection: &Connection) -> Result<Vec<Card>, Error> {
    connection
        .prepare(
            "SELECT id, name, bank, kind, credit_limit, closing_day, due_day, active
            FROM card WHERE active = 1 ORDER BY id DESC",
        )?
        .query_map([], map_row_to_card)?
        .map(|maybe_card| maybe_card.map_err(Error::from))
        .collect()
}

/// Replace every field of a card.
///
/// # Errors
/// Returns [Error::NotFound] if there is no card with `id`.
pub fn update_card(id: CardId, form: &CardForm, connection: &Connection) -> Result<Card, Error> {
    let rows_affected = connection.execute(
        "UPDATE card
        SET name = ?1, bank = ?2, kind = ?3, credit_limit = ?4, closing_day = ?5, \
            due_day = ?6, active = ?7
        WHERE id = ?8",
        params![
            form.name,
            form.bank,
            form.kind,
            form.credit_limit,
            form.closing_day,
            form.due_day,
            form.active,
            id,
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_card(id, connection)
}

/// Mark a card as inactive. Its statements and expenses are kept.
///
/// # Errors
/// Returns [Error::NotFound] if there is no card with `id`.
pub fn deactivate_card(id: CardId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("UPDATE card SET active = 0 WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
