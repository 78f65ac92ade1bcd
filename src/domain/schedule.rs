//! Schedule configuration and the generation time-window predicate.

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::types::GenerationMode;

pub const DEFAULT_START_HOUR: u8 = 7;
pub const DEFAULT_END_HOUR: u8 = 10;

/// Singleton-like configuration for automated generation. Saves append a new
/// row; reads take the latest by `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub is_enabled: bool,
    pub start_hour: u8,
    pub end_hour: u8,
    pub modo: GenerationMode,
    pub tema: Option<String>,
    pub publico_alvo: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleConfig {
    /// Fixed default used when no config row exists or storage is
    /// unavailable: disabled, 07:00–10:00, automatic mode.
    pub fn fallback() -> Self {
        Self {
            is_enabled: false,
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
            modo: GenerationMode::Automatico,
            tema: None,
            publico_alvo: None,
            updated_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.start_hour > 23 {
            return Err(DomainError::validation(
                "start_hour",
                "must be between 0 and 23",
            ));
        }
        if self.end_hour > 23 {
            return Err(DomainError::validation(
                "end_hour",
                "must be between 0 and 23",
            ));
        }
        if self.start_hour > self.end_hour {
            return Err(DomainError::validation(
                "start_hour",
                "must not be later than end_hour",
            ));
        }
        Ok(())
    }

    /// Whether `time` falls inside the allowed window. The window is
    /// inclusive on both ends: eligible at exactly `start_hour:00` and at
    /// exactly `end_hour:00`, compared in minutes since midnight.
    pub fn window_contains(&self, time: NaiveTime) -> bool {
        let minutes = time.hour() * 60 + time.minute();
        let start = u32::from(self.start_hour) * 60;
        let end = u32::from(self.end_hour) * 60;
        (start..=end).contains(&minutes)
    }

    pub fn is_eligible_at(&self, time: NaiveTime) -> bool {
        self.is_enabled && self.window_contains(time)
    }

    /// Human-readable window label for soft-rejection responses,
    /// e.g. `07:00-10:00`.
    pub fn window_label(&self) -> String {
        format!("{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

/// Wall-clock seam so the window predicate stays testable. The serving
/// process's local time is authoritative for the window check.
pub trait Clock: Send + Sync {
    fn now_local(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
