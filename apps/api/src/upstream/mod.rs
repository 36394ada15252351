//! Upstream client — the single point of entry for all calls to the external
//! analysis API (text extraction, scoring, smart analysis, profile,
//! checkout).
//!
//! ARCHITECTURAL RULE: no other module may talk to the upstream directly.
//! All outbound HTTP goes through this module.

pub mod types;

use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::outline::edits::Suggestion;
use crate::outline::ResumeOutline;
use types::{
    CheckoutRequest, CheckoutSession, Envelope, ExtractResponse, Profile, ScoreReport,
    ScoreRequest, ScoreWire, SmartAnalysis, SmartAnalyzeRequest,
};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unrecognized upstream response shape for {endpoint}: {detail}")]
    Shape { endpoint: &'static str, detail: String },
}

/// Error body the upstream uses for failures: `{ "error": ... }` or
/// `{ "message": ... }`.
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request, retrying on connection failures, 429, and 5xx with
    /// exponential backoff (1s, 2s). Non-retryable error statuses are parsed
    /// into `UpstreamError::Api`.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, UpstreamError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error: Option<UpstreamError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "upstream call attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(UpstreamError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("upstream returned {}: {}", status, body);
                last_error = Some(UpstreamError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<UpstreamErrorBody>(&body)
                    .ok()
                    .and_then(|b| b.error.or(b.message))
                    .unwrap_or(body);
                return Err(UpstreamError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!("upstream call succeeded: {}", status);
            return Ok(response);
        }

        Err(last_error.unwrap_or(UpstreamError::Api {
            status: 0,
            message: format!("exhausted {MAX_RETRIES} retries"),
        }))
    }

    /// POST /extract — multipart file upload, returns the raw extracted text.
    pub async fn extract_text(
        &self,
        file_name: String,
        data: Bytes,
    ) -> Result<String, UpstreamError> {
        // multipart::Form is not Clone, so retries rebuild the form.
        let response = self
            .send_with_retry(|| {
                let part =
                    reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name.clone());
                let form = reqwest::multipart::Form::new().part("file", part);
                self.client.post(self.url("/extract")).multipart(form)
            })
            .await?;
        let body: ExtractResponse = response.json().await?;
        Ok(body.text)
    }

    /// POST /score — keyword fit score for resume text against a job text.
    pub async fn score(&self, req: &ScoreRequest) -> Result<ScoreReport, UpstreamError> {
        let response = self
            .send_with_retry(|| self.client.post(self.url("/score")).json(req))
            .await?;
        let body = response.text().await?;
        let wire: ScoreWire =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Shape {
                endpoint: "/score",
                detail: e.to_string(),
            })?;
        Ok(wire.into())
    }

    /// POST /smart/analyze — credit-charged AI analysis. The upstream deducts
    /// the credit; the envelope is unwrapped here.
    pub async fn smart_analyze(
        &self,
        token: Option<&str>,
        req: &SmartAnalyzeRequest,
    ) -> Result<SmartAnalysis, UpstreamError> {
        let response = self
            .send_with_retry(|| {
                authorize(self.client.post(self.url("/smart/analyze")), token).json(req)
            })
            .await?;
        let body = response.text().await?;
        let envelope: Envelope<SmartAnalysis> =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Shape {
                endpoint: "/smart/analyze",
                detail: e.to_string(),
            })?;
        Ok(envelope.into_inner())
    }

    /// POST /suggest — fallback suggestion generation from an outline when
    /// smart analysis returned none.
    pub async fn suggest(
        &self,
        token: Option<&str>,
        outline: &ResumeOutline,
        job_text: &str,
    ) -> Result<Vec<Suggestion>, UpstreamError> {
        let body = serde_json::json!({ "resume": outline, "jobText": job_text });
        let response = self
            .send_with_retry(|| {
                authorize(self.client.post(self.url("/suggest")), token).json(&body)
            })
            .await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| UpstreamError::Shape {
            endpoint: "/suggest",
            detail: e.to_string(),
        })
    }

    /// GET /me — the caller's profile. Missing or unauthenticated sessions
    /// yield `None`; anything else unexpected is an error.
    pub async fn fetch_profile(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Profile>, UpstreamError> {
        let result = self
            .send_with_retry(|| authorize(self.client.get(self.url("/me")), token))
            .await;
        match result {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(UpstreamError::Api { status, .. })
                if status == 401 || status == 403 || status == 404 =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// POST /profile — partial profile update, returns the updated profile.
    pub async fn update_profile(
        &self,
        token: Option<&str>,
        fields: &serde_json::Value,
    ) -> Result<Profile, UpstreamError> {
        let response = self
            .send_with_retry(|| {
                authorize(self.client.post(self.url("/profile")), token).json(fields)
            })
            .await?;
        Ok(response.json().await?)
    }

    /// POST /payments/checkout — creates a billing checkout session.
    pub async fn create_checkout(
        &self,
        token: Option<&str>,
        req: &CheckoutRequest,
    ) -> Result<CheckoutSession, UpstreamError> {
        let response = self
            .send_with_retry(|| {
                authorize(self.client.post(self.url("/payments/checkout")), token).json(req)
            })
            .await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Shape {
            endpoint: "/payments/checkout",
            detail: e.to_string(),
        })
    }
}

fn authorize(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(t) => builder.bearer_auth(t),
        None => builder,
    }
}
