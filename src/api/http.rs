use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use super::types::ErrorBody;
use super::{
    AuthToken, Backend, CatalogEntry, City, CreateChecklistPayload, CreatedChecklist,
    RecommendationRequest, RemoteRecommendation,
};
use crate::config::AppConfig;
use crate::errors::CheckOnError;

const CITIES_ENDPOINT: &str = "/cities";
const ITEMS_ENDPOINT: &str = "/items";
const RECOMMENDATIONS_ENDPOINT: &str = "/recommendations";
const CHECKLISTS_ENDPOINT: &str = "/checklists";

/// [`Backend`] implementation over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CheckOnError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckOnError::HttpClient { source: e })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CheckOnError> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_s),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, CheckOnError> {
        let response = request
            .send()
            .await
            .map_err(|e| CheckOnError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckOnError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        debug!("{} answered {} ({} bytes)", endpoint, status, body.len());

        if !status.is_success() {
            return Err(CheckOnError::Server {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| CheckOnError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

/// The `message` field of an error body, or the raw body when there is none.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|error| error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_cities(&self) -> Result<Vec<City>, CheckOnError> {
        let request = self.client.get(self.url(CITIES_ENDPOINT));
        self.send(CITIES_ENDPOINT, request).await
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, CheckOnError> {
        let request = self.client.get(self.url(ITEMS_ENDPOINT));
        self.send(ITEMS_ENDPOINT, request).await
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest,
        token: Option<&AuthToken>,
    ) -> Result<Vec<RemoteRecommendation>, CheckOnError> {
        let mut builder = self
            .client
            .post(self.url(RECOMMENDATIONS_ENDPOINT))
            .json(request);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.bearer());
        }
        self.send(RECOMMENDATIONS_ENDPOINT, builder).await
    }

    async fn create_checklist(
        &self,
        payload: &CreateChecklistPayload,
        token: &AuthToken,
    ) -> Result<CreatedChecklist, CheckOnError> {
        let builder = self
            .client
            .post(self.url(CHECKLISTS_ENDPOINT))
            .bearer_auth(token.bearer())
            .json(payload);
        self.send(CHECKLISTS_ENDPOINT, builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message": "title too short"}"#),
            "title too short"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"error": "x"}"#), r#"{"error": "x"}"#);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:4000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:4000");
        assert_eq!(backend.url(CITIES_ENDPOINT), "http://localhost:4000/cities");
    }
}
