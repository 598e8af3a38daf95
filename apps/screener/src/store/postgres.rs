use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::models::evaluation::{NewEvaluation, StoredEvaluation};
use crate::store::{validate_table, EvaluationStore, StoreError};

/// Evaluation table reached over a direct Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    table: String,
}

impl PgStore {
    /// Creates the connection pool. Connections are opened lazily on first use.
    pub fn connect(database_url: &str, table: &str) -> Result<Self, StoreError> {
        validate_table(table)?;
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)?;

        info!("PostgreSQL connection pool configured");
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Creates the evaluation table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&create_table_sql(&self.table))
            .execute(&self.pool)
            .await?;
        info!("Table '{}' is ready", self.table);
        Ok(())
    }
}

#[async_trait]
impl EvaluationStore for PgStore {
    async fn insert(&self, row: &NewEvaluation) -> Result<(), StoreError> {
        sqlx::query(&insert_sql(&self.table))
            .bind(&row.candidate_name)
            .bind(&row.candidate_data)
            .bind(row.score)
            .bind(&row.decision)
            .bind(&row.rationale)
            .execute(&self.pool)
            .await?;
        info!("Inserted evaluation for '{}'", row.candidate_name);
        Ok(())
    }

    async fn list_by_score(&self) -> Result<Vec<StoredEvaluation>, StoreError> {
        let rows = sqlx::query_as::<_, StoredEvaluation>(&select_sql(&self.table))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id             BIGSERIAL PRIMARY KEY,
            created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
            candidate_name TEXT NOT NULL,
            candidate_data JSONB NOT NULL,
            score          BIGINT NOT NULL,
            decision       TEXT NOT NULL,
            rationale      TEXT NOT NULL
        )
        "#
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (candidate_name, candidate_data, score, decision, rationale) \
         VALUES ($1, $2, $3, $4, $5)"
    )
}

fn select_sql(table: &str) -> String {
    format!(
        "SELECT id, created_at, candidate_name, candidate_data, score::BIGINT AS score, \
         decision, rationale FROM {table} ORDER BY score DESC"
    )
}
