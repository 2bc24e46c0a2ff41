//! HTTP client for the prediction endpoint.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    error::{PredictionError, TransportCause},
    protocol::{PredictionRequest, PredictionResponse, ServiceErrorBody, PREDICT_PATH},
};
use tracing::{debug, warn};
use url::Url;

use crate::PredictionService;

pub struct HttpPredictionService {
    http: Client,
    endpoint: Url,
}

impl HttpPredictionService {
    pub fn new(server_url: &Url, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint_url(server_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build prediction HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Resolves the prediction endpoint below `server_url`, keeping any path
/// prefix the service is mounted under.
pub fn endpoint_url(server_url: &Url) -> Result<Url> {
    if !matches!(server_url.scheme(), "http" | "https") {
        bail!(
            "prediction service url must use http or https, got '{}'",
            server_url.scheme()
        );
    }

    let mut base = server_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(PREDICT_PATH)
        .with_context(|| format!("failed to resolve prediction endpoint below '{server_url}'"))
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError> {
        debug!(endpoint = %self.endpoint, "posting lyrics for prediction");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_request_error)?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ServiceErrorBody>(&body)
                .ok()
                .and_then(|body| body.summary().map(str::to_string))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                });
            return Err(PredictionError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let value: Value =
            serde_json::from_slice(&body).map_err(|err| PredictionError::Malformed {
                message: err.to_string(),
            })?;

        PredictionResponse::from_value(value).map_err(|violation| {
            warn!(%violation, "prediction response violates contract");
            PredictionError::from(violation)
        })
    }
}

fn map_request_error(err: reqwest::Error) -> PredictionError {
    let cause = if err.is_timeout() {
        TransportCause::Timeout
    } else if err.is_connect() {
        TransportCause::Connect
    } else {
        TransportCause::Other
    };
    PredictionError::transport(cause, error_chain(&err))
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
