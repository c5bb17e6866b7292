//! Simulated upload progress.
//!
//! The storage call exposes no byte-level progress, so the display advances
//! on a timer instead: a fixed step per interval, held below 100 until the
//! real outcome is known.

use std::future::Future;
use std::time::Duration;

use aprova_core::constants::{PROGRESS_CAP_PERCENT, PROGRESS_INTERVAL_MS, PROGRESS_STEP_PERCENT};
use aprova_core::Config;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Cadence of the simulated progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    pub step: u8,
    pub interval: Duration,
    pub cap: u8,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            step: PROGRESS_STEP_PERCENT,
            interval: Duration::from_millis(PROGRESS_INTERVAL_MS),
            cap: PROGRESS_CAP_PERCENT,
        }
    }
}

impl ProgressSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            step: config.progress_step_percent(),
            interval: config.progress_interval(),
            cap: config.progress_cap_percent(),
        }
    }
}

/// Timer-driven progress for one upload.
///
/// Only 100 means done, and only the orchestrator sets it, so the ticker
/// never goes past 99 whatever the configured cap.
#[derive(Debug, Clone)]
pub struct ProgressTicker {
    settings: ProgressSettings,
    percent: u8,
}

impl ProgressTicker {
    pub fn start(settings: &ProgressSettings) -> Self {
        Self {
            settings: *settings,
            percent: 0,
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    fn cap(&self) -> u8 {
        self.settings.cap.min(99)
    }

    fn is_capped(&self) -> bool {
        self.percent >= self.cap()
    }

    /// Advance one step. Returns the new value when it changed.
    pub fn tick(&mut self) -> Option<u8> {
        let next = self
            .percent
            .saturating_add(self.settings.step)
            .min(self.cap());
        if next == self.percent {
            return None;
        }
        self.percent = next;
        Some(next)
    }

    /// Drive `operation` to completion, calling `on_tick` with each new
    /// progress value while it runs.
    ///
    /// Both run on the current task. When a tick and the operation's
    /// completion are ready together, the operation wins, and no tick is
    /// delivered after it settles.
    pub async fn run_until<F, T>(mut self, operation: F, mut on_tick: impl FnMut(u8)) -> T
    where
        F: Future<Output = T>,
    {
        let period = self.settings.interval.max(Duration::from_millis(1));
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(operation);

        while !self.is_capped() {
            tokio::select! {
                biased;
                output = &mut operation => return output,
                _ = interval.tick() => {
                    if let Some(percent) = self.tick() {
                        on_tick(percent);
                    }
                }
            }
        }

        operation.await
    }
}
