//! Schedule gate service: config CRUD with a process-local cache mirrored
//! from the durable store.
//!
//! The cache is a convenience read-through copy for the admin surface; the
//! durable store stays authoritative. Local writes always succeed even when
//! the durable write fails — that is deliberate policy, so the
//! caller-visible config reflects the latest intent — and the periodic
//! reconciliation pass will overwrite the cache with whatever the store
//! holds once it is reachable again.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::application::repos::ScheduleRepo;
use crate::domain::error::DomainError;
use crate::domain::schedule::{Clock, ScheduleConfig};
use crate::domain::types::GenerationMode;

/// Partial update merged over the current config by [`ScheduleService::update`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleConfigPatch {
    pub is_enabled: Option<bool>,
    pub start_hour: Option<u8>,
    pub end_hour: Option<u8>,
    pub modo: Option<GenerationMode>,
    pub tema: Option<String>,
    pub publico_alvo: Option<String>,
}

/// Gate verdict for a scheduled generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    Eligible(ScheduleConfig),
    Disabled {
        config: ScheduleConfig,
        current_time: String,
    },
    OutsideWindow {
        config: ScheduleConfig,
        current_time: String,
    },
}

#[derive(Debug, Clone)]
struct CachedConfig {
    value: ScheduleConfig,
    last_synced_at: Option<DateTime<Utc>>,
}

pub struct ScheduleService {
    repo: Arc<dyn ScheduleRepo>,
    clock: Arc<dyn Clock>,
    cached: RwLock<CachedConfig>,
}

impl ScheduleService {
    pub fn new(repo: Arc<dyn ScheduleRepo>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            cached: RwLock::new(CachedConfig {
                value: ScheduleConfig::fallback(),
                last_synced_at: None,
            }),
        }
    }

    /// Current cached config without touching the durable store.
    pub fn current(&self) -> ScheduleConfig {
        self.cached.read().expect("schedule cache lock").value.clone()
    }

    /// Latest config from durable storage, falling back to the fixed
    /// default when no row exists or the store is unavailable. A successful
    /// read refreshes the cache.
    pub async fn load(&self) -> ScheduleConfig {
        match self.repo.load_latest().await {
            Ok(Some(config)) => {
                self.store_cached(config.clone(), Some(Utc::now()));
                config
            }
            Ok(None) => ScheduleConfig::fallback(),
            Err(err) => {
                warn!(
                    target = "canastra::schedule",
                    error = %err,
                    "failed to load schedule config, using fallback"
                );
                ScheduleConfig::fallback()
            }
        }
    }

    /// Validate and persist a full config. The cache is updated even when
    /// the durable write fails; the failure is logged, not surfaced.
    pub async fn save(&self, mut config: ScheduleConfig) -> Result<ScheduleConfig, DomainError> {
        config.validate()?;
        config.updated_at = Utc::now();

        match self.repo.save(&config).await {
            Ok(()) => self.store_cached(config.clone(), Some(Utc::now())),
            Err(err) => {
                warn!(
                    target = "canastra::schedule",
                    error = %err,
                    "durable schedule config write failed, keeping local copy"
                );
                self.store_cached(config.clone(), None);
            }
        }

        Ok(config)
    }

    /// Read-merge-save partial update.
    pub async fn update(&self, patch: ScheduleConfigPatch) -> Result<ScheduleConfig, DomainError> {
        let mut config = self.load().await;

        if let Some(is_enabled) = patch.is_enabled {
            config.is_enabled = is_enabled;
        }
        if let Some(start_hour) = patch.start_hour {
            config.start_hour = start_hour;
        }
        if let Some(end_hour) = patch.end_hour {
            config.end_hour = end_hour;
        }
        if let Some(modo) = patch.modo {
            config.modo = modo;
        }
        if let Some(tema) = patch.tema {
            config.tema = Some(tema);
        }
        if let Some(publico_alvo) = patch.publico_alvo {
            config.publico_alvo = Some(publico_alvo);
        }

        self.save(config).await
    }

    /// Refetch from durable storage and overwrite the cache. Transient
    /// failures keep the previous cached value.
    pub async fn reconcile(&self) {
        match self.repo.load_latest().await {
            Ok(Some(config)) => self.store_cached(config, Some(Utc::now())),
            Ok(None) => {}
            Err(err) => {
                warn!(
                    target = "canastra::schedule",
                    error = %err,
                    "schedule config reconciliation failed, keeping cached value"
                );
            }
        }
    }

    /// Gate check for a scheduled generation attempt, against the durable
    /// config and the process-local wall clock.
    pub async fn eligibility(&self) -> Eligibility {
        let config = self.load().await;
        let now = self.clock.now_local();
        let current_time = now.format("%H:%M").to_string();

        if !config.is_enabled {
            return Eligibility::Disabled {
                config,
                current_time,
            };
        }
        if !config.window_contains(now.time()) {
            return Eligibility::OutsideWindow {
                config,
                current_time,
            };
        }
        Eligibility::Eligible(config)
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.cached.read().expect("schedule cache lock").last_synced_at
    }

    fn store_cached(&self, value: ScheduleConfig, synced_at: Option<DateTime<Utc>>) {
        let mut cached = self.cached.write().expect("schedule cache lock");
        cached.value = value;
        if synced_at.is_some() {
            cached.last_synced_at = synced_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::Mutex;

    use crate::application::repos::RepoError;

    struct FixedClock(NaiveDateTime);

    impl Clock for FixedClock {
        fn now_local(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn clock_at(hour: u32, minute: u32) -> Arc<dyn Clock> {
        let now = chrono::NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        Arc::new(FixedClock(now))
    }

    #[derive(Default)]
    struct MemoryScheduleRepo {
        rows: Mutex<Vec<ScheduleConfig>>,
        fail_writes: bool,
        fail_reads: bool,
    }

    #[async_trait]
    impl ScheduleRepo for MemoryScheduleRepo {
        async fn load_latest(&self) -> Result<Option<ScheduleConfig>, RepoError> {
            if self.fail_reads {
                return Err(RepoError::Persistence("read refused".into()));
            }
            Ok(self.rows.lock().unwrap().last().cloned())
        }

        async fn save(&self, config: &ScheduleConfig) -> Result<(), RepoError> {
            if self.fail_writes {
                return Err(RepoError::Persistence("write refused".into()));
            }
            self.rows.lock().unwrap().push(config.clone());
            Ok(())
        }
    }

    fn enabled_config(start_hour: u8, end_hour: u8) -> ScheduleConfig {
        ScheduleConfig {
            is_enabled: true,
            start_hour,
            end_hour,
            ..ScheduleConfig::fallback()
        }
    }

    #[tokio::test]
    async fn load_returns_fallback_when_store_is_empty() {
        let service = ScheduleService::new(
            Arc::new(MemoryScheduleRepo::default()),
            clock_at(8, 0),
        );

        let config = service.load().await;
        assert!(!config.is_enabled);
        assert_eq!((config.start_hour, config.end_hour), (7, 10));
    }

    #[tokio::test]
    async fn save_keeps_local_cache_when_durable_write_fails() {
        let repo = Arc::new(MemoryScheduleRepo {
            fail_writes: true,
            ..MemoryScheduleRepo::default()
        });
        let service = ScheduleService::new(repo.clone(), clock_at(8, 0));

        let saved = service
            .save(enabled_config(6, 12))
            .await
            .expect("save succeeds despite durable failure");

        assert!(saved.is_enabled);
        assert!(service.current().is_enabled);
        assert!(repo.rows.lock().unwrap().is_empty());
        assert_eq!(service.last_synced_at(), None);
    }

    #[tokio::test]
    async fn save_rejects_invalid_hours_before_any_write() {
        let repo = Arc::new(MemoryScheduleRepo::default());
        let service = ScheduleService::new(repo.clone(), clock_at(8, 0));

        let mut config = enabled_config(7, 10);
        config.end_hour = 24;

        assert!(service.save(config).await.is_err());
        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_over_the_stored_config() {
        let repo = Arc::new(MemoryScheduleRepo::default());
        let service = ScheduleService::new(repo, clock_at(8, 0));
        service.save(enabled_config(7, 10)).await.expect("seed");

        let updated = service
            .update(ScheduleConfigPatch {
                end_hour: Some(14),
                tema: Some("cafés especiais".to_string()),
                ..ScheduleConfigPatch::default()
            })
            .await
            .expect("update");

        assert_eq!(updated.start_hour, 7);
        assert_eq!(updated.end_hour, 14);
        assert_eq!(updated.tema.as_deref(), Some("cafés especiais"));
        assert!(updated.is_enabled);
    }

    #[tokio::test]
    async fn reconcile_keeps_previous_cache_on_fetch_failure() {
        let repo = Arc::new(MemoryScheduleRepo {
            fail_writes: true,
            fail_reads: true,
            ..MemoryScheduleRepo::default()
        });
        let service = ScheduleService::new(repo, clock_at(8, 0));
        service.save(enabled_config(5, 9)).await.expect("local save");

        service.reconcile().await;

        let cached = service.current();
        assert!(cached.is_enabled);
        assert_eq!((cached.start_hour, cached.end_hour), (5, 9));
    }

    #[tokio::test]
    async fn eligibility_distinguishes_disabled_from_outside_window() {
        let repo = Arc::new(MemoryScheduleRepo::default());
        let service = ScheduleService::new(repo.clone(), clock_at(11, 0));
        service.save(enabled_config(7, 10)).await.expect("seed");

        match service.eligibility().await {
            Eligibility::OutsideWindow { current_time, .. } => {
                assert_eq!(current_time, "11:00");
            }
            other => panic!("expected outside-window, got {other:?}"),
        }

        let mut disabled = enabled_config(7, 10);
        disabled.is_enabled = false;
        service.save(disabled).await.expect("disable");

        assert!(matches!(
            service.eligibility().await,
            Eligibility::Disabled { .. }
        ));
    }
}
