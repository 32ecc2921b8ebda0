use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};

use crate::{
    cache::LookupKey,
    errors::{AppError, Result},
    extract::{AppPath, AppQuery},
    models::{LookupItem, LookupKind, LookupParams, MaritalStatus},
    units::{self, HeightOption},
    AppState,
};

const MIN_HEIGHT_FEET: u32 = 4;
const MAX_HEIGHT_FEET: u32 = 7;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/heights", get(list_heights))
        .route("/marital-statuses", get(list_marital_statuses))
        .route("/:kind", get(list_lookup))
}

/// GET /api/lookups/:kind?parentId=
///
/// `parentId` narrows castes by religion, states by country and cities by
/// state; other kinds ignore it.
pub async fn list_lookup(
    State(state): State<AppState>,
    AppPath(kind): AppPath<String>,
    AppQuery(params): AppQuery<LookupParams>,
) -> Result<Json<Vec<LookupItem>>> {
    let kind: LookupKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown lookup '{}'", kind)))?;

    let Some(key) = lookup_key(kind, params.parent_id) else {
        return Ok(Json(Vec::new()));
    };

    if let Some(cached) = state.lookup_cache.get(&key) {
        tracing::debug!("🎯 CACHE HIT: {:?}", key);
        return Ok(Json(cached.to_vec()));
    }

    let items = match (kind.parent_column(), key.parent_id) {
        (Some(column), Some(parent_id)) => {
            let sql = format!(
                "SELECT id, name FROM {} WHERE {} = $1 ORDER BY name",
                kind.table(),
                column
            );
            sqlx::query_as::<_, LookupItem>(&sql)
                .bind(parent_id)
                .fetch_all(&state.db)
                .await?
        }
        _ => {
            let sql = format!("SELECT id, name FROM {} ORDER BY name", kind.table());
            sqlx::query_as::<_, LookupItem>(&sql)
                .fetch_all(&state.db)
                .await?
        }
    };

    let items = state.lookup_cache.insert(key, items);
    tracing::info!(
        "💾 LOOKUP: {:?} ({} items, {} cached lists)",
        key,
        items.len(),
        state.lookup_cache.len()
    );

    Ok(Json(items.to_vec()))
}

/// Cache key for a request. A parent id on a flat table is ignored; a
/// non-positive parent id can match nothing, so it yields no key at all.
fn lookup_key(kind: LookupKind, parent_id: Option<i32>) -> Option<LookupKey> {
    let parent_id = kind.parent_column().and(parent_id);
    match parent_id {
        Some(id) if id <= 0 => None,
        parent_id => Some(LookupKey { kind, parent_id }),
    }
}

/// GET /api/lookups/heights
pub async fn list_heights() -> Json<Vec<HeightOption>> {
    Json(units::height_options(MIN_HEIGHT_FEET, MAX_HEIGHT_FEET))
}

/// GET /api/lookups/marital-statuses
pub async fn list_marital_statuses() -> Json<Vec<&'static str>> {
    Json(MaritalStatus::ALL.iter().map(|status| status.as_str()).collect())
}
