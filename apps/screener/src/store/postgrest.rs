use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::models::evaluation::{NewEvaluation, StoredEvaluation};
use crate::store::{validate_table, EvaluationStore, StoreError};

/// Evaluation table exposed through a PostgREST API (`/rest/v1/<table>`).
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    table_url: String,
    key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, key: &str, table: &str) -> Result<Self, StoreError> {
        validate_table(table)?;
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            table_url: format!("{}/rest/v1/{table}", base_url.trim_end_matches('/')),
            key: key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.table_url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

#[async_trait]
impl EvaluationStore for PostgrestStore {
    async fn insert(&self, row: &NewEvaluation) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        check_status(response).await?;
        info!("Inserted evaluation for '{}'", row.candidate_name);
        Ok(())
    }

    async fn list_by_score(&self) -> Result<Vec<StoredEvaluation>, StoreError> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*"), ("order", "score.desc")])
            .send()
            .await?;
        let rows: Vec<StoredEvaluation> = check_status(response).await?.json().await?;
        debug!("Fetched {} evaluation rows", rows.len());
        Ok(rows)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}
