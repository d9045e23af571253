use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    calendar::PeriodQuery,
    card::CardId,
    db::lock_connection,
    response::{ApiResult, acknowledged, ok},
    statement::{
        StatementState,
        db::{delete_statement, get_statements, update_statement, upsert_statement},
        domain::{Statement, StatementForm, StatementId, StatementUpdate},
    },
    timezone::today,
};

#[derive(Debug, Default, Deserialize)]
pub struct StatementFilter {
    pub card_id: Option<CardId>,
    pub month: Option<u8>,
    pub year: Option<i32>,
}

pub async fn get_statements_endpoint(
    State(state): State<StatementState>,
    Query(filter): Query<StatementFilter>,
) -> ApiResult<Vec<Statement>> {
    let period = PeriodQuery {
        month: filter.month,
        year: filter.year,
    };
    period.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    get_statements(filter.card_id, period, &connection).map(ok)
}

pub async fn create_statement_endpoint(
    State(state): State<StatementState>,
    Json(form): Json<StatementForm>,
) -> ApiResult<Statement> {
    form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    upsert_statement(&form, &connection).map(ok)
}

pub async fn update_statement_endpoint(
    State(state): State<StatementState>,
    Path(statement_id): Path<StatementId>,
    Json(update): Json<StatementUpdate>,
) -> ApiResult<Statement> {
    update.validate()?;
    let today = today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    update_statement(statement_id, &update, today, &connection).map(ok)
}

pub async fn delete_statement_endpoint(
    State(state): State<StatementState>,
    Path(statement_id): Path<StatementId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    delete_statement(statement_id, &connection)?;

    Ok(acknowledged())
}

#[cfg(test)]
mod tests {
    use axum::{
        Json,
        extract::{Path, Query, State},
    };

    use crate::{
        Error,
        card::{CardForm, CardKind, create_card},
        statement::{StatementForm, StatementState},
        test_utils::must_create_shared_connection,
    };

    use super::{
        StatementFilter, create_statement_endpoint, delete_statement_endpoint,
        get_statements_endpoint,
    };

    fn get_state() -> StatementState {
        StatementState {
            db_connection: must_create_shared_connection(),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[track_caller]
    fn must_create_card(state: &StatementState) -> i64 {
        create_card(
            &CardForm {
                name: "Mastercard".to_owned(),
                bank: None,
                kind: CardKind::Credit,
                credit_limit: Some(1_000_000.0),
                closing_day: Some(20),
                due_day: Some(5),
                active: true,
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn create_then_list() {
        let state = get_state();
        let card_id = must_create_card(&state);

        create_statement_endpoint(
            State(state.clone()),
            Json(StatementForm {
                card_id,
                month: 6,
                year: 2025,
                total: 250_000.0,
            }),
        )
        .await
        .unwrap();

        let response = get_statements_endpoint(
            State(state),
            Query(StatementFilter {
                card_id: Some(card_id),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        let statements = response.0.data.unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].total, 250_000.0);
    }

    #[tokio::test]
    async fn create_rejects_negative_total() {
        let state = get_state();
        let card_id = must_create_card(&state);

        let result = create_statement_endpoint(
            State(state),
            Json(StatementForm {
                card_id,
                month: 6,
                year: 2025,
                total: -5.0,
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn delete_missing_statement_is_not_found() {
        let result = delete_statement_endpoint(State(get_state()), Path(7)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
