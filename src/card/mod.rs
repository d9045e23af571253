//! Credit and debit cards, their billing days and optional card details.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod db;
mod detail;
mod domain;
mod handlers;

pub use db::{create_card, create_card_tables, get_card};
pub use detail::{
    delete_card_detail_endpoint, get_card_detail_endpoint, upsert_card_detail_endpoint,
};
pub use domain::{Card, CardForm, CardId, CardKind};
pub use handlers::{
    create_card_endpoint, delete_card_endpoint, get_cards_endpoint, update_card_endpoint,
};

/// The state needed by the card endpoints.
#[derive(Debug, Clone)]
pub struct CardState {
    /// The database connection for managing cards.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out the next closing and due dates.
    pub local_timezone: String,
}

impl FromRef<AppState> for CardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
