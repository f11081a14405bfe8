use std::time::Duration;

use futures::StreamExt;
use shared::domain::SectionId;
use tokio::{sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, info};

use crate::visibility::{ObserveConfig, VisibilityObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Pending,
    Triggered,
}

/// Cascade timing for the children of a revealed container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaggerTimings {
    pub initial_delay: Duration,
    pub stagger: Duration,
    pub child_duration: Duration,
}

impl Default for StaggerTimings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            stagger: Duration::from_millis(200),
            child_duration: Duration::from_millis(600),
        }
    }
}

/// Progress bars and stat counters fill from zero once triggered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterTimings {
    pub delay: Duration,
    pub duration: Duration,
}

impl Default for CounterTimings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            duration: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub opacity: f64,
    pub offset_y: f64,
}

impl Pose {
    pub const HIDDEN: Pose = Pose {
        opacity: 0.0,
        offset_y: 50.0,
    };
    pub const VISIBLE: Pose = Pose {
        opacity: 1.0,
        offset_y: 0.0,
    };

    pub fn lerp(from: Pose, to: Pose, t: f64) -> Pose {
        let t = t.clamp(0.0, 1.0);
        Pose {
            opacity: from.opacity + (to.opacity - from.opacity) * t,
            offset_y: from.offset_y + (to.offset_y - from.offset_y) * t,
        }
    }
}

/// Cubic ease-out; `t` is clamped to `0..=1`.
pub(crate) fn ease_out(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

fn progress_between(start: Instant, duration: Duration, now: Instant) -> f64 {
    if now < start {
        return 0.0;
    }
    if duration.is_zero() {
        return 1.0;
    }
    (now.duration_since(start).as_secs_f64() / duration.as_secs_f64()).min(1.0)
}

/// One-shot reveal latch for a single element.
#[derive(Debug, Clone)]
pub struct ViewportRevealController {
    element: SectionId,
    config: ObserveConfig,
    stagger: StaggerTimings,
    counter: CounterTimings,
    triggered_at: Option<Instant>,
}

impl ViewportRevealController {
    pub fn new(element: SectionId) -> Self {
        Self {
            element,
            config: ObserveConfig::default(),
            stagger: StaggerTimings::default(),
            counter: CounterTimings::default(),
            triggered_at: None,
        }
    }

    pub fn with_config(mut self, config: ObserveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_timings(mut self, stagger: StaggerTimings, counter: CounterTimings) -> Self {
        self.stagger = stagger;
        self.counter = counter;
        self
    }

    pub fn element(&self) -> &SectionId {
        &self.element
    }

    pub fn config(&self) -> ObserveConfig {
        self.config
    }

    /// Feeds one predicate result. Returns `true` only on the transition.
    pub fn observe(&mut self, satisfied: bool, now: Instant) -> bool {
        if !satisfied {
            return false;
        }
        self.trigger(now)
    }

    /// Latches without consulting visibility.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.triggered_at.is_some() {
            return false;
        }
        self.triggered_at = Some(now);
        true
    }

    pub fn state(&self) -> RevealState {
        match self.triggered_at {
            Some(_) => RevealState::Triggered,
            None => RevealState::Pending,
        }
    }

    pub fn triggered_at(&self) -> Option<Instant> {
        self.triggered_at
    }

    /// Linear progress of the `index`-th child's entrance, `0..=1`.
    pub fn child_progress(&self, index: usize, now: Instant) -> f64 {
        let Some(at) = self.triggered_at else {
            return 0.0;
        };
        progress_between(self.child_start(at, index), self.stagger.child_duration, now)
    }

    pub fn child_pose(&self, index: usize, now: Instant) -> Pose {
        Pose::lerp(
            Pose::HIDDEN,
            Pose::VISIBLE,
            ease_out(self.child_progress(index, now)),
        )
    }

    /// Current value of a bar or counter heading for `target`.
    pub fn counter_value(&self, target: f64, now: Instant) -> f64 {
        let Some(at) = self.triggered_at else {
            return 0.0;
        };
        target * progress_between(at + self.counter.delay, self.counter.duration, now)
    }

    /// When the last of `child_count` children finishes, if triggered.
    pub fn settled_at(&self, child_count: usize) -> Option<Instant> {
        let at = self.triggered_at?;
        let last = child_count.saturating_sub(1);
        Some(self.child_start(at, last) + self.stagger.child_duration)
    }

    fn child_start(&self, at: Instant, index: usize) -> Instant {
        let offset = u32::try_from(index)
            .map(|index| self.stagger.stagger.saturating_mul(index))
            .unwrap_or(Duration::MAX);
        at.checked_add(self.stagger.initial_delay.saturating_add(offset))
            .unwrap_or(at)
    }
}

/// Reveal controller observing its element for one page lifetime.
///
/// The observer subscription is released as soon as the latch fires, on
/// [`MountedReveal::unmount`], or on drop.
pub struct MountedReveal {
    state: watch::Receiver<ViewportRevealController>,
    observer_task: Option<JoinHandle<()>>,
}

impl MountedReveal {
    /// Must be called from within a tokio runtime.
    pub fn mount(mut controller: ViewportRevealController, observer: &dyn VisibilityObserver) -> Self {
        let mut stream = match observer.observe(controller.element(), controller.config()) {
            Ok(stream) => stream,
            Err(err) => {
                debug!(element = %controller.element(), error = %err, "reveal: observer unavailable, revealing immediately");
                controller.trigger(Instant::now());
                let (_, state) = watch::channel(controller);
                return Self {
                    state,
                    observer_task: None,
                };
            }
        };

        let (tx, state) = watch::channel(controller.clone());
        let observer_task = tokio::spawn(async move {
            while let Some(satisfied) = stream.next().await {
                if controller.observe(satisfied, Instant::now()) {
                    info!(element = %controller.element(), "reveal: triggered");
                    let _ = tx.send(controller);
                    return;
                }
            }
            // Observation ended before the threshold was met.
            debug!(element = %controller.element(), "reveal: observation ended, revealing immediately");
            controller.trigger(Instant::now());
            let _ = tx.send(controller);
        });

        Self {
            state,
            observer_task: Some(observer_task),
        }
    }

    pub fn current(&self) -> ViewportRevealController {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> RevealState {
        self.state.borrow().state()
    }

    pub fn element(&self) -> SectionId {
        self.state.borrow().element().clone()
    }

    /// Resolves once the element has been revealed.
    pub async fn triggered(&mut self) {
        let _ = self
            .state
            .wait_for(|controller| controller.state() == RevealState::Triggered)
            .await;
    }

    pub async fn unmount(mut self) {
        if let Some(task) = self.observer_task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for MountedReveal {
    fn drop(&mut self) {
        if let Some(task) = self.observer_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/reveal_tests.rs"]
mod tests;
