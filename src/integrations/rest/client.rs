// src/integrations/rest/client.rs
//
// REST gateway to the dashboard backend
//
// ARCHITECTURE:
// - One reqwest client, bearer auth, JSON in and out
// - Maps non-success responses to AppError::Gateway with the body's
//   `message` and `errors` kept for the user-facing message
// - Returns raw payloads; envelope handling happens in the normalizer
//
// The transport timeout is the only timeout in the list pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, IntoUrl, Method, RequestBuilder, Response, Url};
use serde_json::{json, Value};

use crate::config::DashboardConfig;
use crate::domain::ResourceProfile;
use crate::error::{AppError, AppResult};
use crate::repositories::{ListParams, ResourceGateway};

pub struct RestGateway {
    base_url: String,
    http_client: Client,
    auth_token: Option<String>,
}

impl RestGateway {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            auth_token: None,
        })
    }

    pub fn from_config(config: &DashboardConfig) -> AppResult<Self> {
        let gateway = Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(match &config.auth_token {
            Some(token) => gateway.with_auth(token.clone()),
            None => gateway,
        })
    }

    pub fn with_auth(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    fn collection_url(&self, profile: &ResourceProfile) -> String {
        format!("{}{}", self.base_url, profile.endpoint)
    }

    /// The id is pushed as one percent-encoded path segment
    fn record_url(&self, profile: &ResourceProfile, id: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.collection_url(profile))
            .map_err(|e| AppError::Config(format!("Invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("API base URL cannot take a path: {}", self.base_url))
            })?
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        let request = self
            .http_client
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        match &self.auth_token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    // ========================================================================
    // INTERNAL: response handling
    // ========================================================================

    async fn send(&self, request: RequestBuilder) -> AppResult<Value> {
        let response = request.send().await?;
        Self::read_response(response).await
    }

    async fn read_response(response: Response) -> AppResult<Value> {
        let status = response.status();
        let body = response.text().await?;
        let parsed = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };

        if status.is_success() {
            return Ok(parsed);
        }

        log::debug!("Gateway answered {}: {}", status, parsed);
        Err(match parsed {
            Value::Object(_) => AppError::from_response_body(Some(status.as_u16()), &parsed),
            Value::String(text) => AppError::Gateway {
                status: Some(status.as_u16()),
                message: Some(text),
                errors: Vec::new(),
            },
            _ => AppError::Gateway {
                status: Some(status.as_u16()),
                message: status.canonical_reason().map(str::to_string),
                errors: Vec::new(),
            },
        })
    }
}

#[async_trait]
impl ResourceGateway for RestGateway {
    async fn list(&self, profile: &ResourceProfile, params: &ListParams) -> AppResult<Value> {
        let request = self
            .request(Method::GET, &self.collection_url(profile))
            .query(&params.to_query_pairs());
        self.send(request).await
    }

    async fn get_by_id(&self, profile: &ResourceProfile, id: &str) -> AppResult<Value> {
        let request = self.request(Method::GET, self.record_url(profile, id)?);
        self.send(request).await
    }

    async fn create(&self, profile: &ResourceProfile, draft: &Value) -> AppResult<Value> {
        let request = self
            .request(Method::POST, &self.collection_url(profile))
            .json(draft);
        self.send(request).await
    }

    async fn update(
        &self,
        profile: &ResourceProfile,
        id: &str,
        patch: &Value,
    ) -> AppResult<Value> {
        let request = self
            .request(Method::PUT, self.record_url(profile, id)?)
            .json(patch);
        self.send(request).await
    }

    async fn delete(&self, profile: &ResourceProfile, id: &str) -> AppResult<()> {
        let request = self.request(Method::DELETE, self.record_url(profile, id)?);
        self.send(request).await.map(|_| ())
    }

    async fn bulk_assign(
        &self,
        profile: &ResourceProfile,
        ids: &[String],
        target: &str,
    ) -> AppResult<Value> {
        let url = format!("{}/bulk-assign", self.collection_url(profile));
        let request = self
            .request(Method::POST, &url)
            .json(&json!({ "ids": ids, "target": target }));
        self.send(request).await
    }
}
