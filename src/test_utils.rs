//! Helpers shared by the unit tests.

use std::sync::{Arc, Mutex};

use axum::{body::Body, http::Response};
use rusqlite::Connection;
use serde_json::Value;

use crate::{AppState, db::initialize};

/// Create an in-memory database with all tables.
#[track_caller]
pub fn must_create_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");

    connection
}

/// Wrap a fresh in-memory database the way the app state shares it.
#[track_caller]
pub fn must_create_shared_connection() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(must_create_test_connection()))
}

/// Create an [AppState] backed by an in-memory database using UTC.
#[track_caller]
pub fn must_create_test_state() -> AppState {
    AppState::new(must_create_test_connection(), "Etc/UTC", Default::default())
        .expect("could not create app state")
}

/// Read the response body and parse it as JSON.
pub async fn parse_json_body(response: Response<Body>) -> Value {
    let body = response.into_body();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("could not get response body");

    serde_json::from_slice(&body).expect("response body is not valid JSON")
}
