use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{LauncherError, Result};
use crate::subsidy::backend::{
    ApplicationQuery, Assessment, CompleteAssessment, CriteriaQuery, CriteriaReply, SaveAck,
    SelectionEnvelope, SubsidyBackend,
};
use crate::subsidy::token::TokenSource;
use crate::subsidy::SubsidyResult;

const API_PREFIX: [&str; 2] = ["api", "subsidies"];

/// [`SubsidyBackend`] talking to the GovChat web backend over HTTP
pub struct HttpSubsidyBackend {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl HttpSubsidyBackend {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url, tokens)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            LauncherError::InvalidConfig(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(LauncherError::InvalidConfig(format!(
                "Base URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url: parsed,
            tokens,
        })
    }

    /// `{base}/api/subsidies/{segments...}` with each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                LauncherError::InvalidConfig(format!("Base URL '{}' cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self.tokens.token().unwrap_or_default();
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let url = response.url().clone();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LauncherError::Api(format!(
                "{} returned {}: {}",
                url.path(),
                status,
                error_text
            )));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Acknowledgements carry no data we use, but must still be JSON
    async fn send_ack(&self, request: RequestBuilder) -> Result<()> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        if !body.trim().is_empty() {
            serde_json::from_str::<serde_json::Value>(&body)?;
        }
        Ok(())
    }
}

#[async_trait]
impl SubsidyBackend for HttpSubsidyBackend {
    async fn list(&self) -> Result<Vec<SubsidyResult>> {
        let url = self.endpoint(&["list"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn save(&self, draft: &SubsidyResult) -> Result<SaveAck> {
        let url = self.endpoint(&["save"])?;
        let body = SubsidyResult {
            saved_id: None,
            ..draft.clone()
        };
        self.send_json(self.request(Method::POST, url).json(&body))
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&[id])?;
        self.send_ack(self.request(Method::DELETE, url)).await
    }

    async fn select(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["select", id])?;
        self.send_ack(self.request(Method::POST, url)).await
    }

    async fn last_selection(&self) -> Result<SelectionEnvelope> {
        let url = self.endpoint(&["selection"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn global_selection(&self) -> Result<SelectionEnvelope> {
        let url = self.endpoint(&["global"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn set_global_selection(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["global", "set", id])?;
        self.send_ack(self.request(Method::POST, url)).await
    }

    async fn extract_criteria(&self, query: &CriteriaQuery<'_>) -> Result<SubsidyResult> {
        let url = self.endpoint(&["query"])?;
        let reply: CriteriaReply = self
            .send_json(self.request(Method::POST, url).json(query))
            .await?;
        Ok(reply.into())
    }

    async fn assess(&self, query: &ApplicationQuery<'_>) -> Result<Assessment> {
        let url = self.endpoint(&["assess"])?;
        self.send_json(self.request(Method::POST, url).json(query))
            .await
    }

    async fn complete_assessment(&self, query: &ApplicationQuery<'_>) -> Result<CompleteAssessment> {
        let url = self.endpoint(&["complete_assessment"])?;
        self.send_json(self.request(Method::POST, url).json(query))
            .await
    }
}
