use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{CandidateTraits, ScoredItem, SoftFilters},
    services::providers::SimilarityIndex,
};

/// Client for the vector similarity index service
///
/// The index owns its own embedding; we send text plus advisory filters and
/// take its ranking as-is.
pub struct VectorSearchClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl VectorSearchClient {
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
struct ApiSearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    filters: ApiFilters<'a>,
}

/// Advisory filter payload; the index may honor any subset
#[derive(Debug, Serialize)]
struct ApiFilters<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    year_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    genre: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exclude_genres: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_runtime: Option<u32>,
}

impl<'a> From<&'a SoftFilters> for ApiFilters<'a> {
    fn from(filters: &'a SoftFilters) -> Self {
        Self {
            year_min: filters.year_min,
            year_max: filters.year_max,
            genre: filters.genre_hint.as_deref(),
            exclude_genres: filters.exclude_genres.iter().map(String::as_str).collect(),
            min_rating: filters.min_rating,
            min_runtime: filters.min_runtime,
            max_runtime: filters.max_runtime,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    results: Vec<ApiSearchHit>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchHit {
    id: String,
    score: f32,
    #[serde(default)]
    payload: ApiHitPayload,
}

#[derive(Debug, Deserialize, Default)]
struct ApiHitPayload {
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    darkness: f32,
    #[serde(default)]
    energy: f32,
}

impl From<ApiSearchHit> for ScoredItem {
    fn from(hit: ApiSearchHit) -> Self {
        ScoredItem {
            item_id: hit.id,
            score: hit.score,
            traits: CandidateTraits {
                genres: hit.payload.genres,
                darkness: hit.payload.darkness,
                energy: hit.payload.energy,
            },
        }
    }
}

#[async_trait::async_trait]
impl SimilarityIndex for VectorSearchClient {
    async fn search(
        &self,
        text: &str,
        filters: &SoftFilters,
        top_k: usize,
    ) -> AppResult<Vec<ScoredItem>> {
        let url = format!("{}/v1/search", self.api_url);
        let body = ApiSearchRequest {
            query: text,
            top_k,
            filters: ApiFilters::from(filters),
        };

        let response = self
            .http_client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Vector search request failed");
            return Err(AppError::ExternalApi(format!(
                "Vector index returned status {}: {}",
                status, body
            )));
        }

        let parsed: ApiSearchResponse = response.json().await?;

        tracing::debug!(
            requested = top_k,
            returned = parsed.results.len(),
            "Vector search completed"
        );

        Ok(parsed.results.into_iter().map(ScoredItem::from).collect())
    }
}
