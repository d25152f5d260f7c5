//! Auto-advance timer: a percentage counter that moves a step on by itself.
//!
//! The counter is pure (`AutoAdvanceCounter`) so progress can be tested
//! without delays. `spawn_auto_advance` drives it on the tokio runtime and
//! reports back over a channel; every event carries the ticket it was started
//! with so a cancelled timer's late events can be told apart.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

fn default_ceiling() -> u8 {
    100
}

fn default_step() -> u8 {
    1
}

fn default_tick_ms() -> u64 {
    30
}

/// Timer configuration for an `auto_advance` step or the splash screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAdvanceConfig {
    /// Percentage at which the step is finished (1..=100).
    #[serde(default = "default_ceiling")]
    pub ceiling: u8,
    /// Percentage points added per tick.
    #[serde(default = "default_step")]
    pub step: u8,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Pause between reaching the ceiling and advancing.
    #[serde(default)]
    pub settle_ms: u64,
}

impl Default for AutoAdvanceConfig {
    fn default() -> Self {
        Self {
            ceiling: default_ceiling(),
            step: default_step(),
            tick_ms: default_tick_ms(),
            settle_ms: 0,
        }
    }
}

impl AutoAdvanceConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Number of ticks needed to reach the ceiling.
    pub fn ticks(&self) -> u32 {
        let ceiling = u32::from(self.ceiling.clamp(1, 100));
        ceiling.div_ceil(u32::from(self.step.max(1)))
    }
}

/// Monotonic 0 → ceiling counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAdvanceCounter {
    percent: u8,
    ceiling: u8,
    step: u8,
}

impl AutoAdvanceCounter {
    pub fn new(config: &AutoAdvanceConfig) -> Self {
        Self {
            percent: 0,
            ceiling: config.ceiling.clamp(1, 100),
            step: config.step.max(1),
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_finished(&self) -> bool {
        self.percent >= self.ceiling
    }

    /// Advance one tick and return the new percentage. Saturates at the ceiling.
    pub fn tick(&mut self) -> u8 {
        self.percent = self.percent.saturating_add(self.step).min(self.ceiling);
        self.percent
    }
}

/// Identifies one timer run. Sessions issue tickets from a generation bumped
/// on every position change; the manager numbers each spawned timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerTicket(pub u64);

impl std::fmt::Display for TimerTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Progress { ticket: TimerTicket, percent: u8 },
    Finished { ticket: TimerTicket },
}

impl TimerEvent {
    pub fn ticket(&self) -> TimerTicket {
        match self {
            Self::Progress { ticket, .. } | Self::Finished { ticket } => *ticket,
        }
    }
}

/// A running timer. Dropping the handle cancels it.
#[derive(Debug)]
pub struct AutoAdvanceHandle {
    ticket: TimerTicket,
    handle: JoinHandle<()>,
}

impl AutoAdvanceHandle {
    pub fn ticket(&self) -> TimerTicket {
        self.ticket
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {
        debug!(ticket = %self.ticket, "Auto-advance timer cancelled");
        // Drop aborts the task.
    }
}

impl Drop for AutoAdvanceHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a timer that reports progress and completion on `tx`.
pub fn spawn_auto_advance(
    config: AutoAdvanceConfig,
    ticket: TimerTicket,
    tx: mpsc::UnboundedSender<TimerEvent>,
) -> AutoAdvanceHandle {
    let handle = tokio::spawn(async move {
        let mut counter = AutoAdvanceCounter::new(&config);
        let mut interval = tokio::time::interval(config.tick());
        // The first tick completes immediately.
        interval.tick().await;

        while !counter.is_finished() {
            interval.tick().await;
            let percent = counter.tick();
            if tx.send(TimerEvent::Progress { ticket, percent }).is_err() {
                return;
            }
        }

        if config.settle_ms > 0 {
            tokio::time::sleep(config.settle()).await;
        }
        debug!(ticket = %ticket, "Auto-advance timer finished");
        let _ = tx.send(TimerEvent::Finished { ticket });
    });

    AutoAdvanceHandle { ticket, handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_saturates_at_ceiling() {
        let config = AutoAdvanceConfig {
            ceiling: 100,
            step: 30,
            ..Default::default()
        };
        let mut counter = AutoAdvanceCounter::new(&config);
        let seen: Vec<u8> = std::iter::from_fn(|| {
            (!counter.is_finished()).then(|| counter.tick())
        })
        .collect();
        assert_eq!(seen, vec![30, 60, 90, 100]);
        assert_eq!(config.ticks(), 4);
    }

    #[test]
    fn zero_step_still_progresses() {
        let config = AutoAdvanceConfig {
            ceiling: 3,
            step: 0,
            ..Default::default()
        };
        let mut counter = AutoAdvanceCounter::new(&config);
        counter.tick();
        counter.tick();
        counter.tick();
        assert!(counter.is_finished());
        assert_eq!(counter.percent(), 3);
    }

    #[test]
    fn config_defaults_from_empty_json() {
        let config: AutoAdvanceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AutoAdvanceConfig::default());
        assert_eq!(config.ticks(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_reports_progress_then_finishes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = AutoAdvanceConfig {
            ceiling: 100,
            step: 50,
            tick_ms: 10,
            settle_ms: 5,
        };
        let _handle = spawn_auto_advance(config, TimerTicket(7), tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
            if matches!(event, TimerEvent::Finished { .. }) {
                break;
            }
        }
        assert_eq!(
            events,
            vec![
                TimerEvent::Progress {
                    ticket: TimerTicket(7),
                    percent: 50
                },
                TimerEvent::Progress {
                    ticket: TimerTicket(7),
                    percent: 100
                },
                TimerEvent::Finished {
                    ticket: TimerTicket(7)
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_finishes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_auto_advance(AutoAdvanceConfig::default(), TimerTicket(1), tx);
        handle.cancel();

        // The sender is dropped with the aborted task, so the channel closes.
        let mut finished = false;
        while let Some(event) = rx.recv().await {
            finished |= matches!(event, TimerEvent::Finished { .. });
        }
        assert!(!finished);
    }
}
