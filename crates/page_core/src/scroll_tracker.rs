use std::sync::Arc;

use shared::domain::{SectionId, SectionRegistry};
use tokio::{
    sync::{broadcast::error::RecvError, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::viewport::{SectionLayout, Viewport};

/// Offset below the viewport top that decides the current section. Sits
/// under the fixed navigation bar.
pub const DEFAULT_ACTIVATION_LINE: f64 = 100.0;
/// Scroll offset past which the navigation bar switches to its solid style.
pub const DEFAULT_SCROLLED_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveSection {
    /// Nothing has crossed the activation line yet (hero area).
    #[default]
    Top,
    Section(SectionId),
}

impl ActiveSection {
    pub fn section(&self) -> Option<&SectionId> {
        match self {
            Self::Top => None,
            Self::Section(id) => Some(id),
        }
    }

    pub fn is(&self, id: &SectionId) -> bool {
        self.section() == Some(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub activation_line: f64,
    pub scrolled_threshold: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            activation_line: DEFAULT_ACTIVATION_LINE,
            scrolled_threshold: DEFAULT_SCROLLED_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerSnapshot {
    pub active: ActiveSection,
    pub scrolled: bool,
}

pub struct ScrollActiveSectionTracker {
    registry: Arc<SectionRegistry>,
    config: TrackerConfig,
    active: ActiveSection,
    scrolled: bool,
}

impl ScrollActiveSectionTracker {
    pub fn new(registry: Arc<SectionRegistry>, config: TrackerConfig) -> Self {
        Self {
            registry,
            config,
            active: ActiveSection::Top,
            scrolled: false,
        }
    }

    pub fn registry(&self) -> &Arc<SectionRegistry> {
        &self.registry
    }

    /// Re-derives state for a scroll offset. Returns whether anything changed.
    ///
    /// The first section in registry order straddling the activation line
    /// wins. With no match the previous section is kept, which avoids
    /// flicker in gaps and above the first section.
    pub fn evaluate(&mut self, scroll_y: f64, layout: &dyn SectionLayout) -> bool {
        let scrolled = scroll_y > self.config.scrolled_threshold;
        let mut changed = scrolled != self.scrolled;
        self.scrolled = scrolled;

        let line = self.config.activation_line;
        let hit = self.registry.iter().find(|id| {
            layout
                .bounds(id, scroll_y)
                .is_some_and(|bounds| bounds.contains_line(line))
        });

        if let Some(id) = hit {
            if !self.active.is(id) {
                debug!(section = %id, scroll_y, "nav: active section changed");
                self.active = ActiveSection::Section(id.clone());
                changed = true;
            }
        }
        changed
    }

    /// Navigation click: takes effect immediately, no scroll tick needed.
    pub fn select(&mut self, id: &SectionId) -> bool {
        if !self.registry.contains(id) {
            warn!(section = %id, "nav: ignoring selection of unregistered section");
            return false;
        }
        if self.active.is(id) {
            return false;
        }
        self.active = ActiveSection::Section(id.clone());
        true
    }

    pub fn active(&self) -> &ActiveSection {
        &self.active
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            active: self.active.clone(),
            scrolled: self.scrolled,
        }
    }
}

/// Tracker attached to a viewport for one page lifetime.
///
/// Holds one scroll listener until [`MountedScrollTracker::unmount`] or drop.
pub struct MountedScrollTracker {
    tracker: Arc<Mutex<ScrollActiveSectionTracker>>,
    snapshot: Arc<watch::Sender<TrackerSnapshot>>,
    listener_task: Option<JoinHandle<()>>,
}

impl MountedScrollTracker {
    /// Must be called from within a tokio runtime.
    pub fn mount(
        mut tracker: ScrollActiveSectionTracker,
        viewport: &Arc<Viewport>,
        layout: Arc<dyn SectionLayout>,
    ) -> Self {
        let mut events = viewport.subscribe();
        tracker.evaluate(viewport.position().scroll_y, layout.as_ref());

        let (snapshot_tx, _) = watch::channel(tracker.snapshot());
        let snapshot = Arc::new(snapshot_tx);
        let tracker = Arc::new(Mutex::new(tracker));

        let task_tracker = Arc::clone(&tracker);
        let task_snapshot = Arc::clone(&snapshot);
        let task_viewport = Arc::clone(viewport);
        let listener_task = tokio::spawn(async move {
            loop {
                let scroll_y = match events.recv().await {
                    Ok(event) => event.scroll_y,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "nav: scroll listener lagged, using latest position");
                        task_viewport.position().scroll_y
                    }
                    Err(RecvError::Closed) => break,
                };
                let mut guard = task_tracker.lock().await;
                if guard.evaluate(scroll_y, layout.as_ref()) {
                    publish(&task_snapshot, guard.snapshot());
                }
            }
        });

        Self {
            tracker,
            snapshot,
            listener_task: Some(listener_task),
        }
    }

    pub async fn select(&self, id: &SectionId) -> bool {
        let mut guard = self.tracker.lock().await;
        let changed = guard.select(id);
        if changed {
            publish(&self.snapshot, guard.snapshot());
        }
        changed
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn active(&self) -> ActiveSection {
        self.snapshot.borrow().active.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot.subscribe()
    }

    /// Stops the listener and waits until its registration is released.
    pub async fn unmount(mut self) {
        if let Some(task) = self.listener_task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for MountedScrollTracker {
    fn drop(&mut self) {
        if let Some(task) = self.listener_task.take() {
            task.abort();
        }
    }
}

fn publish(tx: &watch::Sender<TrackerSnapshot>, next: TrackerSnapshot) {
    tx.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

#[cfg(test)]
#[path = "tests/scroll_tracker_tests.rs"]
mod tests;
