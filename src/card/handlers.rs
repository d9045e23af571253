//! Endpoints for listing, creating, updating and deleting cards.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    card::{
        CardState,
        db::{create_card, deactivate_card, get_active_cards, update_card},
        domain::{Card, CardForm, CardId, CardListing},
    },
    db::lock_connection,
    response::{ApiResult, acknowledged, ok},
    timezone::today,
};

/// List the active cards with their next closing and due dates.
pub async fn get_cards_endpoint(State(state): State<CardState>) -> ApiResult<Vec<CardListing>> {
    let today = today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    get_active_cards(&connection)?
        .into_iter()
        .map(|card| CardListing::new(card, today))
        .collect::<Result<Vec<_>, _>>()
        .map(ok)
}

pub async fn create_card_endpoint(
    State(state): State<CardState>,
    Json(form): Json<CardForm>,
) -> ApiResult<Card> {
    let form = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    create_card(&form, &connection).map(ok)
}

pub async fn update_card_endpoint(
    State(state): State<CardState>,
    Path(card_id): Path<CardId>,
    Json(form): Json<CardForm>,
) -> ApiResult<Card> {
    let form = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    update_card(card_id, &form, &connection).map(ok)
}

/// Deactivate a card. The card stays in the database for its statements.
pub async fn delete_card_endpoint(
    State(state): State<CardState>,
    Path(card_id): Path<CardId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    deactivate_card(card_id, &connection)?;
    tracing::info!("Deactivated card {card_id}");

    Ok(acknowledged())
}

#[cfg(test)]
mod tests {
    use axum::{
        Json,
        extract::{Path, State},
    };

    use crate::{
        Error,
        card::{CardForm, CardKind, CardState, create_card},
        test_utils::must_create_shared_connection,
    };

    use super::{create_card_endpoint, delete_card_endpoint, get_cards_endpoint};

    fn get_state() -> CardState {
        CardState {
            db_connection: must_create_shared_connection(),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn form() -> CardForm {
        CardForm {
            name: "Visa".to_owned(),
            bank: None,
            kind: CardKind::Credit,
            credit_limit: None,
            closing_day: Some(28),
            due_day: Some(10),
            active: true,
        }
    }

    #[tokio::test]
    async fn list_includes_next_dates() {
        let state = get_state();
        create_card(&form(), &state.db_connection.lock().unwrap()).unwrap();

        let response = get_cards_endpoint(State(state)).await.unwrap();

        let cards = response.0.data.unwrap();
        assert_eq!(cards.len(), 1);
        assert!(cards[0].next_closing_date.is_some());
        assert!(cards[0].next_due_date.is_some());
    }

    #[tokio::test]
    async fn deleted_cards_are_not_listed() {
        let state = get_state();
        let card = create_card_endpoint(State(state.clone()), Json(form()))
            .await
            .unwrap()
            .0
            .data
            .unwrap();

        delete_card_endpoint(State(state.clone()), Path(card.id))
            .await
            .unwrap();

        let cards = get_cards_endpoint(State(state)).await.unwrap().0.data.unwrap();
        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_card_is_not_found() {
        let result = delete_card_endpoint(State(get_state()), Path(4)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
