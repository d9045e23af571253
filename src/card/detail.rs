//! Optional details printed on a physical card.

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
    calendar::{validate_month, validate_year},
    card::{CardId, CardState, get_card},
    db::{date_value, lock_connection, non_empty, upsert_detail},
    response::{ApiResult, acknowledged, ok},
};

/// Details about a card. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardDetail {
    pub alias: Option<String>,
    /// The last four digits of the card number.
    pub pan_last4: Option<String>,
    pub expiry_month: Option<u8>,
    pub expiry_year: Option<i32>,
    pub delivered_on: Option<Date>,
    /// One of `visa`, `mastercard`, `amex` or `other`.
    pub network: Option<String>,
}

/// A stored card detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDetailRecord {
    pub card_id: CardId,
    #[serde(flatten)]
    pub detail: CardDetail,
    pub updated_at: String,
}

/// Keep only the digits of `pan` and at most four of them.
fn normalize_pan_last4(pan: Option<String>) -> Option<String> {
    let digits: String = pan?
        .chars()
        .filter(char::is_ascii_digit)
        .take(4)
        .collect();

    if digits.is_empty() { None } else { Some(digits) }
}

/// Map the many ways people write a card network to one of the known names.
///
/// Returns `None` for networks that are not recognised.
fn normalize_network(network: Option<String>) -> Option<String> {
    let network = network?.trim().to_lowercase();

    let normalized = match network.as_str() {
        "visa" => "visa",
        "mastercard" | "master" | "master-card" | "master card" | "mc" => "mastercard",
        "amex" | "american express" | "american-express" | "ax" => "amex",
        "other" | "otro" | "otra" => "other",
        _ => return None,
    };

    Some(normalized.to_owned())
}

impl CardDetail {
    fn normalize(self) -> Result<Self, Error> {
        if let Some(month) = self.expiry_month {
            validate_month(month)?;
        }

        if let Some(year) = self.expiry_year {
            validate_year(year)?;
        }

        Ok(Self {
            alias: non_empty(self.alias),
            pan_last4: normalize_pan_last4(self.pan_last4),
            network: normalize_network(self.network),
            ..self
        })
    }

    fn into_fields(self) -> Vec<(&'static str, Value)> {
        vec![
            ("alias", self.alias.into()),
            ("pan_last4", self.pan_last4.into()),
            ("expiry_month", self.expiry_month.into()),
            ("expiry_year", self.expiry_year.into()),
            ("delivered_on", date_value(self.delivered_on)),
            ("network", self.network.into()),
        ]
    }
}

fn map_row_to_detail(row: &Row) -> Result<CardDetailRecord, rusqlite::Error> {
    Ok(CardDetailRecord {
        card_id: row.get("card_id")?,
        detail: CardDetail {
            alias: row.get("alias")?,
            pan_last4: row.get("pan_last4")?,
            expiry_month: row.get("expiry_month")?,
            expiry_year: row.get("expiry_year")?,
            delivered_on: row.get("delivered_on")?,
            network: row.get("network")?,
        },
        updated_at: row.get("updated_at")?,
    })
}

pub fn get_card_detail(
    card_id: CardId,
    connection: &Connection,
) -> Result<Option<CardDetailRecord>, Error> {
    connection
        .query_row(
            "SELECT * FROM card_detail WHERE card_id = ?1",
            [card_id],
            map_row_to_detail,
        )
        .optional()
        .map_err(Error::from)
}

/// Create or update the detail of a card after normalising the card number
/// and network.
///
/// # Errors
/// Returns [Error::NotFound] if the card does not exist.
pub fn upsert_card_detail(
    card_id: CardId,
    detail: CardDetail,
    connection: &Connection,
) -> Result<CardDetailRecord, Error> {
    let detail = detail.normalize()?;
    get_card(card_id, connection)?;

    upsert_detail(connection, "card_detail", "card_id", card_id, detail.into_fields())?;

    get_card_detail(card_id, connection)?.ok_or(Error::NotFound)
}

pub async fn get_card_detail_endpoint(
    State(state): State<CardState>,
    Path(card_id): Path<CardId>,
) -> ApiResult<serde_json::Value> {
    let connection = lock_connection(&state.db_connection)?;

    let detail = match get_card_detail(card_id, &connection)? {
        Some(detail) => serde_json::to_value(detail)
            .map_err(|error| Error::JSONSerializationError(error.to_string()))?,
        None => json!({}),
    };

    Ok(ok(detail))
}

pub async fn upsert_card_detail_endpoint(
    State(state): State<CardState>,
    Path(card_id): Path<CardId>,
    Json(detail): Json<CardDetail>,
) -> ApiResult<CardDetailRecord> {
    let connection = lock_connection(&state.db_connection)?;

    upsert_card_detail(card_id, detail, &connection).map(ok)
}

pub async fn delete_card_detail_endpoint(
    State(state): State<CardState>,
    Path(card_id): Path<CardId>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    connection.execute("DELETE FROM card_detail WHERE card_id = ?1", [card_id])?;

    Ok(acknowledged())
}

#[cfg(test)]
mod tests {
    use crate::{
        card::{CardForm, CardKind, create_card},
        test_utils::must_create_test_connection,
    };

    use super::{CardDetail, normalize_network, normalize_pan_last4, upsert_card_detail};

    #[test]
    fn pan_keeps_first_four_digits() {
        assert_eq!(
            normalize_pan_last4(Some("12-34 56".to_owned())),
            Some("1234".to_owned())
        );
        assert_eq!(normalize_pan_last4(Some("**98".to_owned())), Some("98".to_owned()));
        assert_eq!(normalize_pan_last4(Some("abc".to_owned())), None);
        assert_eq!(normalize_pan_last4(None), None);
    }

    #[test]
    fn network_aliases() {
        let cases = [
            ("Visa", Some("visa")),
            ("MC", Some("mastercard")),
            ("master card", Some("mastercard")),
            (" American Express ", Some("amex")),
            ("ax", Some("amex")),
            ("otro", Some("other")),
            ("discover", None),
        ];

        for (input, want) in cases {
            assert_eq!(
                normalize_network(Some(input.to_owned())).as_deref(),
                want,
                "normalizing {input:?}"
            );
        }
    }

    #[test]
    fn upsert_normalizes_and_merges() {
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
        upsert_card_detail(
            card.id,
            CardDetail {
                alias: Some("Work".to_owned()),
                network: Some("master".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let record = upsert_card_detail(
            card.id,
            CardDetail {
                pan_last4: Some("4321".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(record.detail.alias.as_deref(), Some("Work"));
        assert_eq!(record.detail.network.as_deref(), Some("mastercard"));
        assert_eq!(record.detail.pan_last4.as_deref(), Some("4321"));
    }
}
