use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{types::Json, Executor, Pool, Postgres, Row};
use uuid::Uuid;

use crate::entities::{DriverTrip, RiderSearch, SavedMatch};
use crate::error::Error;
use crate::store::MatchStore;

/// Postgres-backed store. Trips and searches live in JSONB KV tables owned
/// by the surrounding CRUD layer; the `matches` table's composite primary
/// key is what makes duplicate notifications impossible even when two
/// writers race the pre-check.
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        // TODO: move this to migrations
        pool.execute(
            "CREATE TABLE IF NOT EXISTS trips (id UUID PRIMARY KEY, status VARCHAR NOT NULL, data JSONB NOT NULL)",
        )
        .await?;
        pool.execute(
            "CREATE TABLE IF NOT EXISTS searches (id UUID PRIMARY KEY, status VARCHAR NOT NULL, data JSONB NOT NULL)",
        )
        .await?;
        pool.execute(
            "CREATE TABLE IF NOT EXISTS matches (search_id UUID NOT NULL, trip_id UUID NOT NULL, score INT4 NOT NULL, status VARCHAR NOT NULL, data JSONB NOT NULL, PRIMARY KEY (search_id, trip_id))",
        )
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MatchStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, id: Uuid) -> Result<Option<DriverTrip>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_row = conn
            .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1").bind(id))
            .await?;

        match maybe_row {
            Some(row) => {
                let Json(trip) = row.try_get("data")?;
                Ok(Some(trip))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn active_searches(&self) -> Result<Vec<RiderSearch>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM searches WHERE status = 'active'"))
            .await?;

        let mut searches = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(search) = row.try_get("data")?;
            searches.push(search);
        }

        Ok(searches)
    }

    #[tracing::instrument(skip(self))]
    async fn match_exists(&self, search_id: Uuid, trip_id: Uuid) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;

        let row = conn
            .fetch_optional(
                sqlx::query("SELECT 1 FROM matches WHERE search_id = $1 AND trip_id = $2")
                    .bind(search_id)
                    .bind(trip_id),
            )
            .await?;

        Ok(row.is_some())
    }

    #[tracing::instrument(skip(self, saved))]
    async fn insert_match(&self, saved: &SavedMatch) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "INSERT INTO matches (search_id, trip_id, score, status, data) VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING",
                )
                .bind(saved.search_id)
                .bind(saved.trip_id)
                .bind(saved.score)
                .bind(saved.status.name())
                .bind(Json(saved)),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
