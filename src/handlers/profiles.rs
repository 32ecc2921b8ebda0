use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    extract::AppPath,
    middleware::AuthUser,
    models::{Gender, ProfileRow, ProfileSummary},
    shaping::shape_profile,
    AppState,
};

/// Columns read for every profile summary, joined names included.
pub(crate) const PROFILE_COLUMNS: &str = r#"
    p.user_id,
    p.first_name,
    p.last_name,
    p.gender,
    p.date_of_birth,
    p.height_cm,
    p.marital_status,
    p.religion_id,
    r.name AS religion_name,
    p.caste_id,
    ca.name AS caste_name,
    p.mother_tongue_id,
    lang.name AS mother_tongue_name,
    p.country_id,
    co.name AS country_name,
    p.state_id,
    st.name AS state_name,
    p.city_id,
    ci.name AS city_name,
    p.education_id,
    ed.name AS education_name,
    p.profession_id,
    pr.name AS profession_name,
    photo.path AS photo_path
"#;

/// Reference joins plus one photo per profile: the primary one, else the newest.
pub(crate) const PROFILE_JOINS: &str = r#"
    FROM profiles p
    LEFT JOIN religions r ON r.id = p.religion_id
    LEFT JOIN castes ca ON ca.id = p.caste_id
    LEFT JOIN languages lang ON lang.id = p.mother_tongue_id
    LEFT JOIN countries co ON co.id = p.country_id
    LEFT JOIN states st ON st.id = p.state_id
    LEFT JOIN cities ci ON ci.id = p.city_id
    LEFT JOIN educations ed ON ed.id = p.education_id
    LEFT JOIN professions pr ON pr.id = p.profession_id
    LEFT JOIN LATERAL (
        SELECT ph.path
        FROM photos ph
        WHERE ph.user_id = p.user_id
        ORDER BY ph.is_primary DESC, ph.created_at DESC, ph.id DESC
        LIMIT 1
    ) photo ON TRUE
"#;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_own_profile))
        .route("/:user_id", get(get_profile))
}

/// GET /api/profiles/me
pub async fn get_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileSummary>> {
    fetch_profile_summary(&state.db, user.id, false)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// GET /api/profiles/:user_id - active profiles only
pub async fn get_profile(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<ProfileSummary>> {
    fetch_profile_summary(&state.db, user_id, true)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

pub(crate) async fn fetch_profile_summary(
    db: &PgPool,
    user_id: Uuid,
    active_only: bool,
) -> Result<Option<ProfileSummary>> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} {PROFILE_JOINS} WHERE p.user_id = $1 AND (p.is_active OR NOT $2)"
    );

    let row = sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(user_id)
        .bind(active_only)
        .fetch_optional(db)
        .await?;

    let today = chrono::Utc::now().date_naive();
    Ok(row.map(|row| shape_profile(row, today)))
}

/// The caller's own recorded gender. A caller without a profile row is a
/// 404; a profile without a usable gender fails closed with a 422.
pub(crate) async fn caller_gender(db: &PgPool, user_id: Uuid) -> Result<Gender> {
    let gender = sqlx::query_scalar::<_, Option<String>>(
        "SELECT gender FROM profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    match gender {
        None => Err(AppError::NotFound("Profile not found".to_string())),
        Some(None) => Err(AppError::Unprocessable("Profile gender is not set".to_string())),
        Some(Some(raw)) => raw.parse::<Gender>().map_err(|_| {
            tracing::warn!("Profile {} has unrecognised gender {:?}", user_id, raw);
            AppError::Unprocessable("Profile gender is not set".to_string())
        }),
    }
}
