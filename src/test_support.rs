//! Throwaway Postgres databases for tests that run real SQL.
//!
//! Each test gets its own freshly migrated database on the server named by
//! `TEST_DATABASE_URL` (or `DATABASE_URL`). Without a reachable server the
//! tests print `SKIP-TEST-DB` and return early.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, Executor, PgConnection, PgPool,
};
use uuid::Uuid;

use crate::{config, AppState};

pub struct TestDatabase {
    pub pool: PgPool,
    admin: PgConnectOptions,
    name: String,
}

impl TestDatabase {
    pub async fn provision() -> Option<Self> {
        match Self::try_provision().await {
            Ok(db) => Some(db),
            Err(reason) => {
                eprintln!("SKIP-TEST-DB: {reason}");
                None
            }
        }
    }

    async fn try_provision() -> Result<Self, String> {
        let url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| "TEST_DATABASE_URL is not set".to_string())?;
        let admin: PgConnectOptions = url.parse().map_err(|e| format!("bad url: {e}"))?;

        let name = format!("matrimony_test_{}", Uuid::new_v4().simple());
        let mut conn = PgConnection::connect_with(&admin)
            .await
            .map_err(|e| format!("connect: {e}"))?;
        conn.execute(format!("CREATE DATABASE \"{name}\"").as_str())
            .await
            .map_err(|e| format!("create database: {e}"))?;
        let _ = conn.close().await;

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(admin.clone().database(&name))
            .await
            .map_err(|e| format!("connect to {name}: {e}"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| format!("migrate: {e}"))?;

        Ok(Self { pool, admin, name })
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.pool.clone(), config::test_config())
    }

    pub async fn teardown(self) {
        self.pool.close().await;
        if let Ok(mut conn) = PgConnection::connect_with(&self.admin).await {
            let drop = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name);
            let _ = conn.execute(drop.as_str()).await;
            let _ = conn.close().await;
        }
    }
}

/// Profile row to seed; everything not set here keeps its column default.
#[derive(Debug, Clone)]
pub struct ProfileSeed {
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub gender: Option<&'static str>,
    pub date_of_birth: NaiveDate,
    pub height_cm: Option<i32>,
    pub marital_status: Option<&'static str>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl ProfileSeed {
    pub fn new(first_name: &'static str, gender: &'static str) -> Self {
        Self {
            first_name,
            last_name: "Test",
            gender: Some(gender),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1).expect("valid date"),
            height_cm: Some(170),
            marital_status: Some("Never Married"),
            is_active: true,
            created_at: timestamp(2024, 1, 1),
        }
    }

    pub fn height(mut self, cm: i32) -> Self {
        self.height_cm = Some(cm);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn created(mut self, at: NaiveDateTime) -> Self {
        self.created_at = at;
        self
    }
}

pub fn timestamp(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

pub async fn insert_user(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
        .bind(id)
        .bind(format!("{}@example.com", id.simple()))
        .execute(pool)
        .await
        .expect("insert user");
    id
}

pub async fn insert_profile(pool: &PgPool, seed: ProfileSeed) -> Uuid {
    let id = insert_user(pool).await;
    sqlx::query(
        "INSERT INTO profiles \
         (user_id, first_name, last_name, gender, date_of_birth, height_cm, marital_status, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(id)
    .bind(seed.first_name)
    .bind(seed.last_name)
    .bind(seed.gender)
    .bind(seed.date_of_birth)
    .bind(seed.height_cm)
    .bind(seed.marital_status)
    .bind(seed.is_active)
    .bind(seed.created_at)
    .execute(pool)
    .await
    .expect("insert profile");
    id
}

pub async fn insert_photo(
    pool: &PgPool,
    user_id: Uuid,
    path: &str,
    is_primary: bool,
    created_at: NaiveDateTime,
) {
    sqlx::query("INSERT INTO photos (user_id, path, is_primary, created_at) VALUES ($1, $2, $3, $4)")
        .bind(user_id)
        .bind(path)
        .bind(is_primary)
        .bind(created_at)
        .execute(pool)
        .await
        .expect("insert photo");
}
