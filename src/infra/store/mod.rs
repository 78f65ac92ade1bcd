//! Managed-store client (PostgREST-style REST API addressed by URL +
//! service key).
//!
//! When credentials are absent the store runs in degraded mode: every
//! operation short-circuits into a logged no-op so the service still serves
//! (empty) responses during local development. Reads return empty results;
//! writes surface [`RepoError::Unconfigured`].

mod posts;
mod rows;
mod schedule;
mod uploads;

pub use rows::{post_to_row, row_to_post};

use metrics::counter;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use tracing::warn;
use url::Url;

use crate::application::repos::RepoError;
use crate::config::StoreSettings;
use crate::infra::error::InfraError;

const POSTS_TABLE: &str = "posts";
const SCHEDULE_TABLE: &str = "blog_schedule_config";

pub struct RestStore {
    backend: Option<RestBackend>,
}

struct RestBackend {
    client: Client,
    base: Url,
    key: String,
    upload_bucket: String,
}

impl RestStore {
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, InfraError> {
        let backend = match (&settings.url, &settings.key) {
            (Some(url), Some(key)) => {
                if url.cannot_be_a_base() {
                    return Err(InfraError::configuration(format!(
                        "store.url `{url}` cannot be used as a base URL"
                    )));
                }
                Some(RestBackend {
                    client: Client::new(),
                    base: url.clone(),
                    key: key.clone(),
                    upload_bucket: settings.upload_bucket.clone(),
                })
            }
            _ => {
                warn!(
                    target = "canastra::store",
                    "store credentials missing; running in degraded mode"
                );
                None
            }
        };

        Ok(Self { backend })
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Backend handle, or `None` after recording one degraded operation.
    fn backend(&self, operation: &'static str) -> Option<&RestBackend> {
        if self.backend.is_none() {
            warn!(
                target = "canastra::store",
                operation, "store not configured, operation is a no-op"
            );
            counter!("canastra_store_degraded_ops_total").increment(1);
        }
        self.backend.as_ref()
    }
}

impl RestBackend {
    fn table_url(&self, table: &str) -> Result<Url, RepoError> {
        self.base
            .join(&format!("rest/v1/{table}"))
            .map_err(RepoError::from_persistence)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("apikey", &self.key).bearer_auth(&self.key)
    }

    async fn select(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Map<String, Value>>, RepoError> {
        let url = self.table_url(table)?;
        let response = self
            .authed(self.client.get(url).query(query))
            .send()
            .await
            .map_err(RepoError::from_persistence)?;

        rows_from_response(table, response).await
    }

    async fn insert(
        &self,
        table: &str,
        body: &Map<String, Value>,
    ) -> Result<Map<String, Value>, RepoError> {
        let url = self.table_url(table)?;
        let response = self
            .authed(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(RepoError::from_persistence)?;

        let mut rows = rows_from_response(table, response).await?;
        rows.pop()
            .ok_or_else(|| RepoError::from_persistence(format!("{table} insert returned no row")))
    }

    async fn update_by_id(
        &self,
        table: &str,
        id: i64,
        body: &Map<String, Value>,
    ) -> Result<Option<Map<String, Value>>, RepoError> {
        let url = self.table_url(table)?;
        let response = self
            .authed(
                self.client
                    .patch(url)
                    .query(&[("id", format!("eq.{id}"))]),
            )
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(RepoError::from_persistence)?;

        let mut rows = rows_from_response(table, response).await?;
        Ok(rows.pop())
    }

    async fn delete_by_id(&self, table: &str, id: i64) -> Result<bool, RepoError> {
        let url = self.table_url(table)?;
        let response = self
            .authed(
                self.client
                    .delete(url)
                    .query(&[("id", format!("eq.{id}"))]),
            )
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(RepoError::from_persistence)?;

        let rows = rows_from_response(table, response).await?;
        Ok(!rows.is_empty())
    }
}

async fn rows_from_response(
    table: &str,
    response: reqwest::Response,
) -> Result<Vec<Map<String, Value>>, RepoError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(status_error(table, status, &detail));
    }

    let value: Value = response.json().await.map_err(RepoError::from_persistence)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(RepoError::from_persistence(format!(
                    "{table} returned a non-object row: {other}"
                ))),
            })
            .collect(),
        Value::Object(row) => Ok(vec![row]),
        other => Err(RepoError::from_persistence(format!(
            "{table} returned an unexpected body: {other}"
        ))),
    }
}

fn status_error(table: &str, status: StatusCode, detail: &str) -> RepoError {
    if status == StatusCode::NOT_FOUND {
        return RepoError::NotFound;
    }
    let detail = detail.trim();
    if detail.is_empty() {
        RepoError::Persistence(format!("{table} request failed with status {status}"))
    } else {
        RepoError::Persistence(format!(
            "{table} request failed with status {status}: {detail}"
        ))
    }
}
