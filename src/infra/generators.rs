//! Upstream content-generator client.
//!
//! One generation cycle posts the same request to both fixed endpoints (a
//! production and a test deployment of the automation service) and keeps
//! the first successful response in production→test priority order. The
//! endpoints settle together before the pick — a join-then-select, not a
//! first-to-complete race.
//!
//! Requests carry a timeout from settings. The system this replaces issued
//! unbounded calls; bounding them turns a hung upstream into a failed cycle
//! instead of a stalled one.

use std::future::Future;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::application::ingest::{
    ContentGenerator, GeneratorError, GeneratorRequest, payload_items,
};
use crate::config::GeneratorSettings;
use crate::infra::error::InfraError;

/// Settle every attempt, then return the first success in the order given.
/// When none succeeds, all failures come back in the same order.
pub async fn select_by_priority<F, T, E>(attempts: Vec<F>) -> Result<T, Vec<E>>
where
    F: Future<Output = Result<T, E>>,
{
    let results = join_all(attempts).await;

    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(value) => return Ok(value),
            Err(err) => errors.push(err),
        }
    }
    Err(errors)
}

pub struct HttpGenerators {
    client: Client,
    production_url: Url,
    test_url: Url,
}

impl HttpGenerators {
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build generator client: {err}"))
            })?;

        Ok(Self {
            client,
            production_url: settings.production_url.clone(),
            test_url: settings.test_url.clone(),
        })
    }

    /// One endpoint attempt: success is a 2xx response, and the body comes
    /// back raw so the winner alone gets parsed.
    async fn call(&self, url: &Url, request: &GeneratorRequest) -> Result<String, String> {
        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| format!("transport error: {err}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {status}"));
        }

        response
            .text()
            .await
            .map_err(|err| format!("body read failed: {err}"))
    }
}

#[async_trait]
impl ContentGenerator for HttpGenerators {
    async fn generate(&self, request: &GeneratorRequest) -> Result<Vec<Value>, GeneratorError> {
        let attempts = vec![
            self.call(&self.production_url, request),
            self.call(&self.test_url, request),
        ];

        let body = match select_by_priority(attempts).await {
            Ok(body) => body,
            Err(errors) => {
                let mut errors = errors.into_iter();
                return Err(GeneratorError::AllEndpointsFailed {
                    production: errors.next().unwrap_or_else(|| "no attempt made".into()),
                    test: errors.next().unwrap_or_else(|| "no attempt made".into()),
                });
            }
        };

        debug!(
            target = "canastra::generators",
            bytes = body.len(),
            "generator response received"
        );

        let value: Value = serde_json::from_str(&body)
            .map_err(|err| GeneratorError::MalformedResponse(err.to_string()))?;
        payload_items(value).map_err(|err| GeneratorError::MalformedResponse(err.to_string()))
    }
}
