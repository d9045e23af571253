//! Concepts are the names that expenses are usually filed under, e.g. "Water"
//! or "Rent".

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    db::{fold_case, lock_connection, non_empty},
    pagination::{Page, PaginationConfig, Paged},
    response::{ApiResult, acknowledged, ok},
};

pub type ConceptId = DatabaseId;

/// The kind given to concepts created without one.
pub const DEFAULT_CONCEPT_KIND: &str = "normal";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Concept {
    pub id: ConceptId,
    pub name: String,
    pub category: Option<String>,
    pub kind: String,
    pub active: bool,
}

/// Which concepts to list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptStatus {
    #[default]
    Active,
    Inactive,
    All,
}

impl ConceptStatus {
    fn active_filter(self) -> Option<bool> {
        match self {
            ConceptStatus::Active => Some(true),
            ConceptStatus::Inactive => Some(false),
            ConceptStatus::All => None,
        }
    }
}

/// The state needed by the concept endpoints.
#[derive(Debug, Clone)]
pub struct ConceptState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ConceptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

pub fn create_concept_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS concept (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            category TEXT,
            kind TEXT NOT NULL DEFAULT 'normal',
            active INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_concept(row: &Row) -> Result<Concept, rusqlite::Error> {
    Ok(Concept {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        kind: row.get(3)?,
        active: row.get(4)?,
    })
}

/// Get one page of concepts ordered by name.
///
/// `search` matches any part of the name, ignoring case, accented letters
/// included.
pub fn get_concepts(
    search: Option<&str>,
    status: ConceptStatus,
    page: Page,
    connection: &Connection,
) -> Result<Paged<Concept>, Error> {
    let pattern = search
        .map(str::trim)
        .filter(|search| !search.is_empty())
        .map(|search| format!("%{}%", fold_case(search)));
    let active = status.active_filter();

    const FILTER: &str = "(?1 IS NULL OR active = ?1) AND (?2 IS NULL OR FOLD_CASE(name) LIKE ?2)";

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM concept WHERE {FILTER}"),
        params![active, pattern],
        |row| row.get(0),
    )?;

    let data = connection
        .prepare(&format!(
            "SELECT id, name, category, kind, active FROM concept
            WHERE {FILTER}
            ORDER BY name ASC
            LIMIT ?3 OFFSET ?4"
        ))?
        .query_map(
            params![active, pattern, page.size, page.offset()],
            map_row_to_concept,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paged {
        data,
        total,
        page: page.number,
        page_size: page.size,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConceptForm {
    pub name: String,
    pub category: Option<String>,
    pub kind: Option<String>,
}

/// # Errors
/// Returns [Error::Validation] for an empty name or [Error::Duplicate] if the
/// name is taken.
pub fn create_concept(form: ConceptForm, connection: &Connection) -> Result<Concept, Error> {
    let Some(name) = non_empty(Some(form.name)) else {
        return Err(Error::Validation("concept name is required".to_owned()));
    };
    let kind = non_empty(form.kind).unwrap_or_else(|| DEFAULT_CONCEPT_KIND.to_owned());

    connection
        .query_row(
            "INSERT INTO concept (name, category, kind) VALUES (?1, ?2, ?3)
            RETURNING id, name, category, kind, active",
            params![name, non_empty(form.category), kind],
            map_row_to_concept,
        )
        .map_err(|error| match Error::from(error) {
            Error::Duplicate(_) => {
                Error::Duplicate("a concept with that name already exists".to_owned())
            }
            error => error,
        })
}

/// # Errors
/// Returns [Error::NotFound] if there is no concept with `id`.
pub fn set_concept_active(id: ConceptId, active: bool, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE concept SET active = ?1 WHERE id = ?2",
        params![active, id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct ConceptQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub status: ConceptStatus,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ConceptActiveForm {
    pub active: bool,
}

/// List concepts. The page is returned as is, without the `ok` envelope.
pub async fn get_concepts_endpoint(
    State(state): State<ConceptState>,
    Query(query): Query<ConceptQuery>,
) -> Result<Json<Paged<Concept>>, Error> {
    let page = state
        .pagination_config
        .resolve(query.page, query.page_size)?;
    let connection = lock_connection(&state.db_connection)?;

    get_concepts(query.q.as_deref(), query.status, page, &connection).map(Json)
}

pub async fn create_concept_endpoint(
    State(state): State<ConceptState>,
    Json(form): Json<ConceptForm>,
) -> ApiResult<Concept> {
    let connection = lock_connection(&state.db_connection)?;

    create_concept(form, &connection).map(ok)
}

pub async fn set_concept_active_endpoint(
    State(state): State<ConceptState>,
    Path(concept_id): Path<ConceptId>,
    Json(form): Json<ConceptActiveForm>,
) -> ApiResult<()> {
    let connection = lock_connection(&state.db_connection)?;

    set_concept_active(concept_id, form.active, &connection)?;

    Ok(acknowledged())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, pagination::Page, test_utils::must_create_test_connection};

    use super::{
        ConceptForm, ConceptStatus, DEFAULT_CONCEPT_KIND, create_concept, get_concepts,
        set_concept_active,
    };

    #[track_caller]
    fn must_create_concept(name: &str, connection: &Connection) -> i64 {
        create_concept(
            ConceptForm {
                name: name.to_owned(),
                category: None,
                kind: None,
            },
            connection,
        )
        .unwrap()
        .id
    }

    const FIRST_PAGE: Page = Page {
        number: 1,
        size: 50,
    };

    #[test]
    fn create_defaults_kind() {
        let connection = must_create_test_connection();

        let concept = create_concept(
            ConceptForm {
                name: " Water ".to_owned(),
                category: Some("Utilities".to_owned()),
                kind: Some("".to_owned()),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(concept.name, "Water");
        assert_eq!(concept.kind, DEFAULT_CONCEPT_KIND);
        assert_eq!(concept.category.as_deref(), Some("Utilities"));
        assert!(concept.active);
    }

    #[test]
    fn create_requires_name() {
        let connection = must_create_test_connection();

        let result = create_concept(
            ConceptForm {
                name: "  ".to_owned(),
                category: None,
                kind: None,
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn create_rejects_duplicate() {
        let connection = must_create_test_connection();
        must_create_concept("Rent", &connection);

        let result = create_concept(
            ConceptForm {
                name: "Rent".to_owned(),
                category: None,
                kind: None,
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::Duplicate(_))));
    }

    #[test]
    fn search_ignores_case() {
        let connection = must_create_test_connection();
        must_create_concept("Water", &connection);
        must_create_concept("Hot water tank", &connection);
        must_create_concept("Electricity", &connection);

        let page = get_concepts(Some("WATER"), ConceptStatus::Active, FIRST_PAGE, &connection)
            .unwrap();

        let names: Vec<String> = page.data.into_iter().map(|concept| concept.name).collect();
        assert_eq!(names, vec!["Hot water tank", "Water"]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn search_ignores_case_of_accented_letters() {
        let connection = must_create_test_connection();
        must_create_concept("Calefacción", &connection);
        must_create_concept("Agua", &connection);

        for search in ["Calefacción", "calefacción", "CALEFACCIÓN", "ción"] {
            let page =
                get_concepts(Some(search), ConceptStatus::Active, FIRST_PAGE, &connection)
                    .unwrap();

            assert_eq!(page.total, 1, "search {search:?}");
            assert_eq!(page.data[0].name, "Calefacción");
        }
    }

    #[test]
    fn status_filters_concepts() {
        let connection = must_create_test_connection();
        let gym = must_create_concept("Gym", &connection);
        must_create_concept("Rent", &connection);
        set_concept_active(gym, false, &connection).unwrap();

        let active = get_concepts(None, ConceptStatus::Active, FIRST_PAGE, &connection).unwrap();
        let inactive =
            get_concepts(None, ConceptStatus::Inactive, FIRST_PAGE, &connection).unwrap();
        let all = get_concepts(None, ConceptStatus::All, FIRST_PAGE, &connection).unwrap();

        assert_eq!(active.total, 1);
        assert_eq!(inactive.data[0].name, "Gym");
        assert_eq!(all.total, 2);
    }

    #[test]
    fn pages_share_total() {
        let connection = must_create_test_connection();
        for name in ["A", "B", "C", "D", "E"] {
            must_create_concept(name, &connection);
        }

        let page = get_concepts(
            None,
            ConceptStatus::All,
            Page { number: 2, size: 2 },
            &connection,
        )
        .unwrap();

        let names: Vec<String> = page.data.into_iter().map(|concept| concept.name).collect();
        assert_eq!(names, vec!["C", "D"]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 2);
    }

    #[test]
    fn set_active_on_missing_concept_is_not_found() {
        let connection = must_create_test_connection();

        assert_eq!(set_concept_active(1, false, &connection), Err(Error::NotFound));
    }
}
