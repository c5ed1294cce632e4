use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::CandidateMetadata,
    services::providers::Enricher,
};

/// Client for the display-metadata enrichment service
pub struct MetadataClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl MetadataClient {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            api_url,
        })
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    titles: Vec<ApiTitle>,
}

#[derive(Debug, Deserialize)]
struct ApiTitle {
    id: String,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    poster_url: Option<String>,
}

#[async_trait::async_trait]
impl Enricher for MetadataClient {
    async fn enrich(&self, item_ids: &[String]) -> AppResult<HashMap<String, CandidateMetadata>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/v1/titles/batch", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&BatchRequest { ids: item_ids })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Metadata service returned status {}",
                status
            )));
        }

        let parsed: BatchResponse = response.json().await?;

        let mut map = HashMap::with_capacity(parsed.titles.len());
        for title in parsed.titles {
            map.insert(
                title.id,
                CandidateMetadata {
                    title: title.title,
                    overview: title.overview,
                    year: title.year,
                    poster_url: title.poster_url,
                },
            );
        }

        tracing::debug!(
            requested = item_ids.len(),
            enriched = map.len(),
            "Metadata enrichment completed"
        );

        Ok(map)
    }
}
