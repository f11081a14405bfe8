use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::reveal::{ease_out, Pose};

pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotatorError {
    #[error("rotator needs at least one label")]
    NoLabels,
    #[error("rotation interval must be greater than zero")]
    ZeroInterval,
}

/// Cycles an index over a fixed, non-empty label list.
#[derive(Debug, Clone)]
pub struct PeriodicTextRotator {
    labels: Arc<[String]>,
    index: usize,
}

impl PeriodicTextRotator {
    pub fn new<I, S>(labels: I) -> Result<Self, RotatorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(Into::into).collect::<Arc<[String]>>();
        if labels.is_empty() {
            return Err(RotatorError::NoLabels);
        }
        Ok(Self { labels, index: 0 })
    }

    pub fn tick(&mut self) -> usize {
        self.index = (self.index + 1) % self.labels.len();
        self.index
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &str {
        &self.labels[self.index]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Fade-and-slide swap between consecutive labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleTransition {
    pub duration: Duration,
    pub enter_offset: f64,
    pub exit_offset: f64,
}

impl Default for RoleTransition {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(500),
            enter_offset: 20.0,
            exit_offset: -20.0,
        }
    }
}

impl RoleTransition {
    fn progress(&self, since_change: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        ease_out(since_change.as_secs_f64() / self.duration.as_secs_f64())
    }

    pub fn incoming_pose(&self, since_change: Duration) -> Pose {
        let from = Pose {
            opacity: 0.0,
            offset_y: self.enter_offset,
        };
        Pose::lerp(from, Pose::VISIBLE, self.progress(since_change))
    }

    pub fn outgoing_pose(&self, since_change: Duration) -> Pose {
        let to = Pose {
            opacity: 0.0,
            offset_y: self.exit_offset,
        };
        Pose::lerp(Pose::VISIBLE, to, self.progress(since_change))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorSnapshot {
    pub index: usize,
    pub label: String,
    pub changed_at: Instant,
}

/// Rotator driven by a repeating timer until unmounted.
pub struct MountedRotator {
    state: watch::Receiver<RotatorSnapshot>,
    timer_task: Option<JoinHandle<()>>,
}

impl MountedRotator {
    /// Must be called from within a tokio runtime. The first tick fires one
    /// full `period` after mounting.
    pub fn mount(mut rotator: PeriodicTextRotator, period: Duration) -> Result<Self, RotatorError> {
        if period.is_zero() {
            return Err(RotatorError::ZeroInterval);
        }

        let mounted_at = Instant::now();
        let (tx, state) = watch::channel(RotatorSnapshot {
            index: rotator.index(),
            label: rotator.current().to_string(),
            changed_at: mounted_at,
        });

        let timer_task = tokio::spawn(async move {
            let mut ticker = interval_at(mounted_at + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let fired_at = ticker.tick().await;
                let index = rotator.tick();
                let snapshot = RotatorSnapshot {
                    index,
                    label: rotator.current().to_string(),
                    changed_at: fired_at,
                };
                if tx.send(snapshot).is_err() {
                    debug!("rotator: no readers left, stopping timer");
                    break;
                }
            }
        });

        Ok(Self {
            state,
            timer_task: Some(timer_task),
        })
    }

    pub fn current(&self) -> RotatorSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RotatorSnapshot> {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.timer_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub async fn unmount(mut self) {
        if let Some(task) = self.timer_task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for MountedRotator {
    fn drop(&mut self) {
        if let Some(task) = self.timer_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/rotator_tests.rs"]
mod tests;
