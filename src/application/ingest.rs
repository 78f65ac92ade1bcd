//! Ingestion orchestration: webhook and scheduled triggers.
//!
//! Both paths funnel heterogeneous generator payloads through the
//! normalizer and into the post store, accounting for every item
//! individually — one item's persistence failure never aborts the batch,
//! and one cycle's generation failure never aborts later cycles.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::application::normalizer::{self, NormalizeContext};
use crate::application::repos::PostsWriteRepo;
use crate::application::schedule::{Eligibility, ScheduleService};
use crate::domain::types::GenerationMode;

/// Request body forwarded to the upstream generator endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorRequest {
    pub modo: GenerationMode,
    pub quantidade: u32,
    pub atraso: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publico_alvo: Option<String>,
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("all generator endpoints failed (produção: {production}, teste: {test})")]
    AllEndpointsFailed { production: String, test: String },
    #[error("generator returned a malformed payload: {0}")]
    MalformedResponse(String),
}

/// One generation cycle against the upstream service. Implementations fan
/// out to their endpoints and hand back the post-shaped payload items of
/// the first successful response.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GeneratorRequest) -> Result<Vec<Value>, GeneratorError>;
}

/// Scheduled-trigger parameters; gaps fall back to the stored schedule
/// config's hints.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledTrigger {
    pub modo: Option<GenerationMode>,
    #[serde(default = "default_quantity")]
    pub quantidade: u32,
    /// Seconds to wait between generation cycles.
    #[serde(default = "default_cycle_delay")]
    pub atraso: u64,
    pub tema: Option<String>,
    pub publico_alvo: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

fn default_cycle_delay() -> u64 {
    30
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("payload must be a post object or an array of post objects")]
    MalformedPayload,
}

/// Per-item (or per-failed-cycle) result entry.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub success: bool,
    pub message: String,
    pub created_posts: usize,
    pub results: Vec<ItemOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    Disabled,
    OutsideSchedule,
}

/// Soft rejection from the schedule gate; carries what a caller needs to
/// explain the refusal to a human.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRejection {
    pub success: bool,
    pub reason: RejectionReason,
    pub current_time: String,
    pub allowed_window: String,
}

#[derive(Debug)]
pub enum ScheduledOutcome {
    Completed(IngestReport),
    Rejected(ScheduleRejection),
}

pub struct IngestService {
    posts: Arc<dyn PostsWriteRepo>,
    generator: Arc<dyn ContentGenerator>,
    schedule: Arc<ScheduleService>,
    site_base_url: Url,
}

impl IngestService {
    pub fn new(
        posts: Arc<dyn PostsWriteRepo>,
        generator: Arc<dyn ContentGenerator>,
        schedule: Arc<ScheduleService>,
        site_base_url: Url,
    ) -> Self {
        Self {
            posts,
            generator,
            schedule,
            site_base_url,
        }
    }

    /// Ingest an inbound webhook payload: one post object or an array of
    /// them. A single object is treated as a one-element array.
    pub async fn ingest_webhook(
        &self,
        payload: Value,
        default_modo: GenerationMode,
    ) -> Result<IngestReport, IngestError> {
        let items = payload_items(payload)?;
        let run_id = Uuid::new_v4();
        info!(
            target = "canastra::ingest",
            %run_id,
            items = items.len(),
            "webhook ingestion started"
        );

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let index = outcomes.len();
            outcomes.push(self.persist_item(index, item, default_modo).await);
        }

        Ok(self.build_report(outcomes))
    }

    /// Run a scheduled generation: gate check first, then `quantidade`
    /// sequential cycles with a fixed delay in between (skipped after the
    /// last). Each cycle fans out to the generator endpoints; a failed
    /// cycle is recorded and the remaining cycles still run.
    pub async fn ingest_scheduled(&self, trigger: ScheduledTrigger) -> ScheduledOutcome {
        let config = match self.schedule.eligibility().await {
            Eligibility::Eligible(config) => config,
            Eligibility::Disabled {
                config,
                current_time,
            } => {
                return ScheduledOutcome::Rejected(ScheduleRejection {
                    success: false,
                    reason: RejectionReason::Disabled,
                    current_time,
                    allowed_window: config.window_label(),
                });
            }
            Eligibility::OutsideWindow {
                config,
                current_time,
            } => {
                return ScheduledOutcome::Rejected(ScheduleRejection {
                    success: false,
                    reason: RejectionReason::OutsideSchedule,
                    current_time,
                    allowed_window: config.window_label(),
                });
            }
        };

        let modo = trigger.modo.unwrap_or(config.modo);
        let request = GeneratorRequest {
            modo,
            quantidade: trigger.quantidade,
            atraso: trigger.atraso,
            tema: trigger.tema.or(config.tema),
            publico_alvo: trigger.publico_alvo.or(config.publico_alvo),
        };

        let run_id = Uuid::new_v4();
        let cycles = trigger.quantidade.max(1);
        info!(
            target = "canastra::ingest",
            %run_id,
            cycles,
            modo = modo.as_str(),
            "scheduled ingestion started"
        );

        let mut outcomes = Vec::new();
        for cycle in 1..=cycles {
            match self.generator.generate(&request).await {
                Ok(items) => {
                    for item in items {
                        let index = outcomes.len();
                        outcomes.push(self.persist_item(index, item, modo).await);
                    }
                }
                Err(err) => {
                    warn!(
                        target = "canastra::ingest",
                        %run_id,
                        cycle,
                        error = %err,
                        "generation cycle failed"
                    );
                    counter!("canastra_ingest_cycles_failed_total").increment(1);
                    outcomes.push(ItemOutcome {
                        index: outcomes.len(),
                        success: false,
                        titulo: None,
                        slug: None,
                        post_id: None,
                        error: Some(err.to_string()),
                    });
                }
            }

            if cycle < cycles {
                tokio::time::sleep(std::time::Duration::from_secs(request.atraso)).await;
            }
        }

        ScheduledOutcome::Completed(self.build_report(outcomes))
    }

    async fn persist_item(
        &self,
        index: usize,
        item: Value,
        default_modo: GenerationMode,
    ) -> ItemOutcome {
        let raw = match item.as_object() {
            Some(raw) => raw,
            None => {
                return ItemOutcome {
                    index,
                    success: false,
                    titulo: None,
                    slug: None,
                    post_id: None,
                    error: Some("item is not a post object".to_string()),
                };
            }
        };

        let post = normalizer::normalize(
            raw,
            &NormalizeContext {
                modo: default_modo,
                site_base_url: &self.site_base_url,
            },
        );
        let titulo = post.titulo.clone();
        let slug = post.slug.clone();

        match self.posts.insert_post(post).await {
            Ok(record) => {
                counter!("canastra_ingest_posts_created_total").increment(1);
                ItemOutcome {
                    index,
                    success: true,
                    titulo: Some(titulo),
                    slug: Some(slug),
                    post_id: Some(record.id),
                    error: None,
                }
            }
            Err(err) => {
                warn!(
                    target = "canastra::ingest",
                    slug,
                    error = %err,
                    "post insert failed"
                );
                counter!("canastra_ingest_items_failed_total").increment(1);
                ItemOutcome {
                    index,
                    success: false,
                    titulo: Some(titulo),
                    slug: Some(slug),
                    post_id: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn build_report(&self, outcomes: Vec<ItemOutcome>) -> IngestReport {
        let created_posts = outcomes.iter().filter(|outcome| outcome.success).count();
        let failed = outcomes.len() - created_posts;
        let message = if failed == 0 {
            format!("{created_posts} post(s) criados")
        } else {
            format!("{created_posts} post(s) criados, {failed} falha(s)")
        };

        IngestReport {
            success: failed == 0,
            message,
            created_posts,
            results: outcomes,
        }
    }
}

/// Normalize the inbound payload shape: a single object becomes a
/// one-element array; anything that is neither object nor array is
/// malformed.
pub fn payload_items(payload: Value) -> Result<Vec<Value>, IngestError> {
    match payload {
        Value::Object(_) => Ok(vec![payload]),
        Value::Array(items) => Ok(items),
        _ => Err(IngestError::MalformedPayload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_object_becomes_one_element_array() {
        let items = payload_items(json!({"titulo": "X"})).expect("items");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn arrays_pass_through() {
        let items = payload_items(json!([{"titulo": "A"}, {"titulo": "B"}])).expect("items");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn scalars_are_malformed() {
        assert!(payload_items(json!("nope")).is_err());
        assert!(payload_items(json!(42)).is_err());
        assert!(payload_items(Value::Null).is_err());
    }

    #[test]
    fn generator_request_omits_absent_hints() {
        let request = GeneratorRequest {
            modo: GenerationMode::Automatico,
            quantidade: 2,
            atraso: 30,
            tema: None,
            publico_alvo: None,
        };

        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(body["modo"], "automático");
        assert_eq!(body["quantidade"], 2);
        assert!(body.get("tema").is_none());
    }
}
