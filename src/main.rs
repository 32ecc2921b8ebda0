use axum::{
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cache;
mod config;
mod database;
mod errors;
mod extract;
mod filters;
mod handlers;
mod middleware;
mod models;
mod pagination;
mod shaping;
mod units;

#[cfg(test)]
mod test_support;

use cache::LookupCache;
use config::AppConfig;
use handlers::{cards, interests, lookups, profiles, search};
use middleware::{keyed_limiter, write_rate_limit_middleware, KeyedLimiter};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub write_limiter: Arc<KeyedLimiter>,
    pub lookup_cache: Arc<LookupCache>,
}

/// Reference tables change only through migrations.
const LOOKUP_CACHE_TTL: Duration = Duration::from_secs(3600);
const LOOKUP_CACHE_CAPACITY: usize = 512;

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        let write_limiter = Arc::new(keyed_limiter(config.write_rate_limit_per_minute));
        Self {
            db,
            config: Arc::new(config),
            write_limiter,
            lookup_cache: Arc::new(LookupCache::new(LOOKUP_CACHE_TTL, LOOKUP_CACHE_CAPACITY)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reduced SQL verbosity unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matrimony_backend=info,sqlx=warn,info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = database::create_pool(&config.database_url).await?;
    info!("✅ Connected to PostgreSQL");

    if config.skip_migrations {
        warn!("⚠️ Skipping migrations due to SKIP_MIGRATIONS=true");
    } else {
        match sqlx::migrate!("./migrations").run(&pool).await {
            Ok(_) => info!("✅ Migrations completed successfully"),
            Err(sqlx::migrate::MigrateError::VersionMismatch(version)) => {
                warn!("⚠️  Migration version mismatch: {}", version);
                warn!("Database has different migration state than expected");
            }
            Err(e) => {
                warn!("❌ Failed to run migrations: {}", e);
                warn!("Continuing without migrations (set SKIP_MIGRATIONS=true to suppress this warning)");
            }
        }
    }

    let state = AppState::new(pool, config.clone());

    // Drop idle rate-limit buckets so the key store does not grow unbounded
    let limiter = state.write_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });

    let app = app(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("🚀 Server starting on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let upload_dir = state.config.upload_dir.clone();

    let interest_routes = interests::router().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        write_rate_limit_middleware,
    ));

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/search", search::router())
        .nest("/api/profiles", profiles::router())
        .nest("/api/lookups", lookups::router())
        .nest("/api/interests", interest_routes)
        .merge(cards::router())
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.debug_mode {
        info!("🔓 Development mode: Using permissive CORS");
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("⚠️ Ignoring invalid origin '{}': {}", origin, e);
                    None
                }
            })
            .collect();

        info!("🔒 Production mode: CORS configured for {} origins", origins.len());
        for origin in &origins {
            info!("  - Allowed origin: {:?}", origin);
        }

        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "matrimony-backend",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "search": "/api/search",
            "profiles": "/api/profiles",
            "lookups": "/api/lookups",
            "interests": "/api/interests",
            "health": "/api/health"
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use rstest::rstest;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = config::test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        app(AppState::new(pool, config))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn search_without_token_is_unauthorized() {
        let request = Request::post("/api/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["status"], 401);
    }

    #[tokio::test]
    async fn search_with_bad_token_is_unauthorized() {
        let request = Request::post("/api/search")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::from("{}"))
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = middleware::auth::issue_token(uuid::Uuid::new_v4(), "other-secret", 3600);
        let request = Request::get("/api/profiles/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_lookup_kind_is_not_found() {
        let response = test_app()
            .oneshot(Request::get("/api/lookups/planets").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn marital_statuses_are_served_without_database() {
        let response = test_app()
            .oneshot(
                Request::get("/api/lookups/marital-statuses")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0], "Never Married");
    }

    #[tokio::test]
    async fn interest_writes_require_auth() {
        let request = Request::post("/api/interests")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"receiverId":"00000000-0000-0000-0000-000000000000"}"#))
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    fn bearer() -> String {
        let token = middleware::auth::issue_token(uuid::Uuid::new_v4(), "test-secret", 3600);
        format!("Bearer {token}")
    }

    #[rstest]
    #[case::not_json(Some("application/json"), "not json", StatusCode::BAD_REQUEST)]
    #[case::empty_body(Some("application/json"), "", StatusCode::BAD_REQUEST)]
    #[case::wrong_shape(Some("application/json"), "[1, 2]", StatusCode::UNPROCESSABLE_ENTITY)]
    #[case::no_content_type(None, "{}", StatusCode::UNSUPPORTED_MEDIA_TYPE)]
    #[tokio::test]
    async fn unreadable_search_body_gets_json_error(
        #[case] content_type: Option<&str>,
        #[case] body: &'static str,
        #[case] expected: StatusCode,
    ) {
        let mut request = Request::post("/api/search").header(header::AUTHORIZATION, bearer());
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        let request = request.body(Body::from(body)).expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), expected);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        let json = body_json(response).await;
        assert_eq!(json["status"], expected.as_u16());
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn malformed_path_id_gets_json_error() {
        let request = Request::get("/api/profiles/not-a-uuid")
            .header(header::AUTHORIZATION, bearer())
            .body(Body::empty())
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], 400);
    }

    #[tokio::test]
    async fn unknown_interest_direction_gets_json_error() {
        let request = Request::get("/api/interests?direction=sideways")
            .header(header::AUTHORIZATION, bearer())
            .body(Body::empty())
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], 400);
    }

    #[tokio::test]
    async fn non_positive_parent_returns_empty_list_without_database() {
        let response = test_app()
            .oneshot(
                Request::get("/api/lookups/states?parentId=0")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
}
