//! Persistence Gateway: the only writer of evaluation rows.
//!
//! Two backends sit behind `EvaluationStore`: a PostgREST endpoint (hosted
//! Supabase and friends) and a direct Postgres pool. The backend is picked
//! from the scheme of `STORE_URL`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StoreConfig;
use crate::models::evaluation::{NewEvaluation, StoredEvaluation};

pub mod postgres;
pub mod postgrest;

pub use postgres::PgStore;
pub use postgrest::PostgrestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid table name '{0}'")]
    InvalidTable(String),
}

/// Insert-one and select-all over the evaluation table.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Inserts one new row. No upsert, no retry.
    async fn insert(&self, row: &NewEvaluation) -> Result<(), StoreError>;

    /// Returns every row, highest score first.
    async fn list_by_score(&self) -> Result<Vec<StoredEvaluation>, StoreError>;
}

/// Builds the store described by `config`.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn EvaluationStore>, StoreError> {
    match config {
        StoreConfig::Postgrest { url, key, table } => {
            Ok(Arc::new(PostgrestStore::new(url, key, table)?))
        }
        StoreConfig::Postgres { url, table } => Ok(Arc::new(PgStore::connect(url, table)?)),
    }
}

/// Table names are interpolated into URLs and SQL, so only plain identifiers pass.
pub(crate) fn validate_table(table: &str) -> Result<(), StoreError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}
