use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::{AppError, Result},
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
    models::{
        Interest, InterestDirection, InterestListParams, SendInterestRequest, STATUS_ACCEPTED,
        STATUS_PENDING,
    },
    AppState,
};

const INTEREST_COLUMNS: &str =
    "id, sender_id, receiver_id, status, message, created_at, updated_at";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_interests).post(send_interest))
        .route("/:id/accept", post(accept_interest))
}

/// GET /api/interests?direction=received|sent
pub async fn list_interests(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(params): AppQuery<InterestListParams>,
) -> Result<Json<Vec<Interest>>> {
    let column = match params.direction {
        InterestDirection::Received => "receiver_id",
        InterestDirection::Sent => "sender_id",
    };

    let sql = format!(
        "SELECT {INTEREST_COLUMNS} FROM interests WHERE {column} = $1 ORDER BY created_at DESC, id DESC"
    );
    let interests = sqlx::query_as::<_, Interest>(&sql)
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(interests))
}

/// POST /api/interests
///
/// Returns 201 for a newly created interest. An existing interest in the same
/// direction, or a reverse interest that this call turns mutual, comes back
/// with 200.
pub async fn send_interest(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<SendInterestRequest>,
) -> Result<(StatusCode, Json<Interest>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid interest: {}", e)))?;

    if request.receiver_id == user.id {
        return Err(AppError::BadRequest(
            "Cannot send an interest to yourself".to_string(),
        ));
    }

    if !profile_exists(&state.db, user.id, false).await? {
        return Err(AppError::NotFound("Profile not found".to_string()));
    }
    if !profile_exists(&state.db, request.receiver_id, true).await? {
        return Err(AppError::NotFound("Receiver profile not found".to_string()));
    }

    let mut tx = state.db.begin().await?;
    lock_pair(&mut tx, user.id, request.receiver_id).await?;

    if let Some(reverse) = find_interest(&mut tx, request.receiver_id, user.id).await? {
        let interest = if reverse.status == STATUS_PENDING {
            mark_accepted(&mut tx, reverse.id).await?
        } else {
            reverse
        };
        tx.commit().await?;
        tracing::info!(
            "💞 MUTUAL INTEREST: {} <-> {} (interest {})",
            user.id,
            request.receiver_id,
            interest.id
        );
        return Ok((StatusCode::OK, Json(interest)));
    }

    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    let insert_sql = format!(
        "INSERT INTO interests (sender_id, receiver_id, status, message) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (sender_id, receiver_id) DO NOTHING \
         RETURNING {INTEREST_COLUMNS}"
    );
    let inserted = sqlx::query_as::<_, Interest>(&insert_sql)
        .bind(user.id)
        .bind(request.receiver_id)
        .bind(STATUS_PENDING)
        .bind(message)
        .fetch_optional(&mut *tx)
        .await?;

    let (status, interest) = match inserted {
        Some(interest) => (StatusCode::CREATED, interest),
        None => {
            let existing = find_interest(&mut tx, user.id, request.receiver_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Interest not found".to_string()))?;
            (StatusCode::OK, existing)
        }
    };
    tx.commit().await?;

    if status == StatusCode::CREATED {
        tracing::info!(
            "💌 INTEREST SENT: {} -> {} (interest {})",
            user.id,
            request.receiver_id,
            interest.id
        );
    }

    Ok((status, Json(interest)))
}

/// POST /api/interests/:id/accept
pub async fn accept_interest(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Interest>> {
    let mut tx = state.db.begin().await?;

    let sql = format!("SELECT {INTEREST_COLUMNS} FROM interests WHERE id = $1 FOR UPDATE");
    let interest = sqlx::query_as::<_, Interest>(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Interest not found".to_string()))?;

    if interest.receiver_id != user.id {
        return Err(AppError::Forbidden(
            "Only the receiver can accept an interest".to_string(),
        ));
    }

    let interest = if interest.status == STATUS_ACCEPTED {
        interest
    } else {
        mark_accepted(&mut tx, interest.id).await?
    };
    tx.commit().await?;

    Ok(Json(interest))
}

async fn profile_exists(db: &PgPool, user_id: Uuid, active_only: bool) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM profiles WHERE user_id = $1 AND (is_active OR NOT $2))",
    )
    .bind(user_id)
    .bind(active_only)
    .fetch_one(db)
    .await?;

    Ok(exists)
}

/// Serialises sends between the same two people in either direction, so a
/// crossing A→B and B→A cannot both miss the reverse row.
async fn lock_pair(tx: &mut Transaction<'_, Postgres>, a: Uuid, b: Uuid) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(pair_lock_key(a, b))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn pair_lock_key(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("interest:{low}:{high}")
}

async fn find_interest(
    tx: &mut Transaction<'_, Postgres>,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> Result<Option<Interest>> {
    let sql = format!(
        "SELECT {INTEREST_COLUMNS} FROM interests \
         WHERE sender_id = $1 AND receiver_id = $2 FOR UPDATE"
    );
    let interest = sqlx::query_as::<_, Interest>(&sql)
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(interest)
}

async fn mark_accepted(tx: &mut Transaction<'_, Postgres>, id: i32) -> Result<Interest> {
    let sql = format!(
        "UPDATE interests SET status = $2, updated_at = NOW() \
         WHERE id = $1 RETURNING {INTEREST_COLUMNS}"
    );
    let interest = sqlx::query_as::<_, Interest>(&sql)
        .bind(id)
        .bind(STATUS_ACCEPTED)
        .fetch_one(&mut **tx)
        .await?;

    Ok(interest)
}
