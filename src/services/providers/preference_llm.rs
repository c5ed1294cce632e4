use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::Answer,
    services::providers::PreferenceWriter,
};

/// Client for the LLM-backed preference-text service.
///
/// Output is best-effort and not reproducible; the synthesizer falls back
/// to its deterministic template whenever this client errors or times out.
pub struct PreferenceLlmClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl PreferenceLlmClient {
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
struct PreferenceRequest<'a> {
    domain: &'a str,
    answers: Vec<AnswerPair<'a>>,
}

#[derive(Debug, Serialize)]
struct AnswerPair<'a> {
    question_id: &'a str,
    option_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    text: String,
}

#[async_trait::async_trait]
impl PreferenceWriter for PreferenceLlmClient {
    async fn preference_text(&self, answers: &[Answer], domain: &str) -> AppResult<String> {
        let url = format!("{}/v1/preference-text", self.api_url);
        let body = PreferenceRequest {
            domain,
            answers: answers
                .iter()
                .map(|a| AnswerPair {
                    question_id: &a.question_id,
                    option_id: &a.option_id,
                })
                .collect(),
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
            return Err(AppError::ExternalApi(format!(
                "Preference-text service returned status {}",
                status
            )));
        }

        let parsed: PreferenceResponse = response.json().await?;

        if parsed.text.trim().is_empty() {
            return Err(AppError::ExternalApi(
                "Preference-text service returned an empty body".to_string(),
            ));
        }

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let answers = vec![Answer {
            question_id: "energy".to_string(),
            option_id: "wired".to_string(),
            answered_at: chrono::Utc::now(),
        }];
        let body = PreferenceRequest {
            domain: "movies",
            answers: answers
                .iter()
                .map(|a| AnswerPair {
                    question_id: &a.question_id,
                    option_id: &a.option_id,
                })
                .collect(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["domain"], "movies");
        assert_eq!(json["answers"][0]["question_id"], "energy");
    }
}
