use axum::{
    extract::State,
    response::Json,
    routing::post,
    Router,
};
use sqlx::Arguments;

use crate::{
    errors::Result,
    extract::AppJson,
    filters::{build_filters, compile, TargetGender, WhereClause},
    handlers::profiles::{caller_gender, PROFILE_COLUMNS, PROFILE_JOINS},
    middleware::AuthUser,
    models::{ProfileRow, ProfileSummary, SearchFilters, SearchResponse},
    pagination::Pagination,
    shaping::shape_profile,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(search_profiles))
}

/// POST /api/search
///
/// Every filter in the body is optional. Results are always restricted to
/// active profiles of the gender opposite to the caller's own.
pub async fn search_profiles(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(filters): AppJson<SearchFilters>,
) -> Result<Json<SearchResponse<ProfileSummary>>> {
    let pagination = Pagination::clamp(filters.page, filters.limit, state.config.default_page_size);

    tracing::debug!("🔍 SEARCH FILTERS: caller={}, filters={:?}", user.id, filters);

    let gender = caller_gender(&state.db, user.id).await?;
    let today = chrono::Utc::now().date_naive();
    let target = TargetGender::opposite_of(gender);
    let clause = compile(&build_filters(&filters, target, today));
    tracing::info!(
        "🔍 SEARCH REQUEST: caller={}, target={}, page={}, limit={}, {}",
        user.id,
        target.gender().as_str(),
        pagination.page,
        pagination.limit,
        clause_shape(&clause)
    );

    let query_start = std::time::Instant::now();
    let count = execute_count_query(&state, &clause).await?;
    tracing::info!("⏱️  COUNT QUERY: {}ms (result={})", query_start.elapsed().as_millis(), count);

    let search_start = std::time::Instant::now();
    let rows = execute_search_query(&state, &clause, pagination).await?;
    tracing::info!(
        "⏱️  SEARCH QUERY: {}ms (returned {} records)",
        search_start.elapsed().as_millis(),
        rows.len()
    );

    let results = rows
        .into_iter()
        .map(|row| shape_profile(row, today))
        .collect();

    Ok(Json(SearchResponse {
        page: pagination.page,
        limit: pagination.limit,
        count,
        results,
    }))
}

async fn execute_count_query(state: &AppState, clause: &WhereClause) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM profiles p WHERE p.is_active = TRUE AND {}",
        clause.sql()
    );

    let count = sqlx::query_scalar_with::<_, i64, _>(&sql, clause.arguments()?)
        .fetch_one(&state.db)
        .await?;

    Ok(count)
}

async fn execute_search_query(
    state: &AppState,
    clause: &WhereClause,
    pagination: Pagination,
) -> Result<Vec<ProfileRow>> {
    let sql = page_query_sql(clause);

    let mut args = clause.arguments()?;
    args.add(pagination.limit).map_err(sqlx::Error::Encode)?;
    args.add(pagination.offset()).map_err(sqlx::Error::Encode)?;

    let rows = sqlx::query_as_with::<_, ProfileRow, _>(&sql, args)
        .fetch_all(&state.db)
        .await?;

    Ok(rows)
}

/// Predicate and parameter counts; bound values stay out of info logs.
fn clause_shape(clause: &WhereClause) -> String {
    format!(
        "{} predicates, {} params",
        clause.predicates().len(),
        clause.params().len()
    )
}

/// Page query for `clause`, with limit and offset bound after its parameters.
fn page_query_sql(clause: &WhereClause) -> String {
    let limit_index = clause.next_placeholder();
    format!(
        "SELECT {PROFILE_COLUMNS} {PROFILE_JOINS} \
         WHERE p.is_active = TRUE AND {} \
         ORDER BY p.created_at DESC, p.user_id \
         LIMIT ${} OFFSET ${}",
        clause.sql(),
        limit_index,
        limit_index + 1
    )
}
