//! Finanzas is a web API for tracking personal finances: loans, credit and
//! debit cards, monthly expenses and card statements.
//!
//! This library provides a JSON REST API backed by a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod bank;
mod calendar;
mod card;
mod concept;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod loan;
mod logging;
mod pagination;
mod payment_method;
mod response;
mod routing;
mod statement;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request contained a value outside of its allowed range, e.g. a
    /// month of 13 or a negative installment amount.
    #[error("{0}")]
    Validation(String),

    /// A UNIQUE constraint failed, e.g. a bank name that is already taken.
    #[error("{0}")]
    Duplicate(String),

    /// A query referenced a row that does not exist, e.g. a statement for a
    /// card ID that is not in the database.
    #[error("the request refers to a record that does not exist")]
    InvalidForeignKey,

    /// A loan already has a payment for the given accounting period.
    ///
    /// Each loan can only be paid once per month, this is enforced with a
    /// UNIQUE constraint on the loan ID and period.
    #[error("a payment for that month and year already exists")]
    DuplicatePeriodPayment,

    /// Tried to pay an expense or statement that is already marked as paid.
    #[error("already marked as paid")]
    AlreadyPaid,

    /// Tried to undo the payment of a statement that has not been paid.
    #[error("not marked as paid")]
    NotPaid,

    /// Tried to pay or close a loan whose installments are all paid.
    #[error("the loan is already paid off")]
    LoanPaidOff,

    /// Tried to undo a payment on a record without any payments.
    #[error("there are no payments to undo")]
    NoPaymentsToUndo,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not serialize or deserialize a JSON column.
    #[error("could not (de)serialize JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("loan_payment.") =>
            {
                Error::DuplicatePeriodPayment
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(desc))
                if sql_error.extended_code == 2067 =>
            {
                Error::Duplicate(desc)
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::InvalidForeignKey | Error::NoPaymentsToUndo => {
                StatusCode::BAD_REQUEST
            }
            Error::Duplicate(_)
            | Error::DuplicatePeriodPayment
            | Error::AlreadyPaid
            | Error::NotPaid
            | Error::LoanPaidOff => StatusCode::CONFLICT,
            Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "ok": false, "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{Error, test_utils::parse_json_body};

    #[test]
    fn unique_failure_on_loan_payment_maps_to_duplicate_period() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE loan_payment (loan_id INTEGER, month INTEGER, UNIQUE(loan_id, month));
                INSERT INTO loan_payment VALUES (1, 1);",
            )
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO loan_payment VALUES (1, 1)", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicatePeriodPayment);
    }

    #[test]
    fn other_unique_failures_map_to_duplicate() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE bank (name TEXT UNIQUE);
                INSERT INTO bank VALUES ('Foo');",
            )
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO bank VALUES ('Foo')", ())
            .unwrap_err()
            .into();

        assert!(matches!(error, Error::Duplicate(_)), "got {error:?}");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = parse_json_body(response).await;
        assert_eq!(body["ok"], false);
        assert!(!body["detail"].as_str().unwrap().contains("lock"));
    }

    #[tokio::test]
    async fn conflict_errors_are_409() {
        let response = Error::AlreadyPaid.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = parse_json_body(response).await;
        assert_eq!(body["detail"], "already marked as paid");
    }
}
