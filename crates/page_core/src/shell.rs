use std::{sync::Arc, time::Duration};

use shared::domain::{SectionId, SectionRegistry};
use tracing::info;

use crate::{
    contact::{ContactMessages, ContactSubmissionController, MessageSender},
    error::PageError,
    gallery::ProjectGallery,
    navigation::NavigationShell,
    notify::Notifier,
    reveal::{CounterTimings, MountedReveal, StaggerTimings, ViewportRevealController},
    rotator::{MountedRotator, PeriodicTextRotator, DEFAULT_ROTATION_INTERVAL},
    scroll_tracker::{MountedScrollTracker, ScrollActiveSectionTracker, TrackerConfig},
    viewport::{SectionLayout, Viewport},
    visibility::{ObserveConfig, VisibilityObserver},
};

#[derive(Debug, Clone)]
pub struct PageConfig {
    pub registry: Arc<SectionRegistry>,
    pub tracker: TrackerConfig,
    pub observe: ObserveConfig,
    pub stagger: StaggerTimings,
    pub counter: CounterTimings,
    pub roles: Vec<String>,
    pub rotation_interval: Duration,
    pub project_count: usize,
    pub messages: ContactMessages,
}

impl PageConfig {
    pub fn new(registry: Arc<SectionRegistry>, roles: Vec<String>) -> Self {
        Self {
            registry,
            tracker: TrackerConfig::default(),
            observe: ObserveConfig::default(),
            stagger: StaggerTimings::default(),
            counter: CounterTimings::default(),
            roles,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            project_count: 0,
            messages: ContactMessages::default(),
        }
    }
}

/// Environment the page is mounted into.
pub struct PageServices {
    pub viewport: Arc<Viewport>,
    pub layout: Arc<dyn SectionLayout>,
    pub observer: Arc<dyn VisibilityObserver>,
    pub sender: Arc<dyn MessageSender>,
    pub notifier: Arc<dyn Notifier>,
}

/// Everything attached for one page lifetime.
pub struct PageShell {
    registry: Arc<SectionRegistry>,
    navigation: NavigationShell,
    reveals: Vec<MountedReveal>,
    rotator: MountedRotator,
    contact: Arc<ContactSubmissionController>,
    gallery: ProjectGallery,
}

impl PageShell {
    /// Must be called from within a tokio runtime.
    pub fn mount(config: PageConfig, services: PageServices) -> Result<Self, PageError> {
        let rotator = MountedRotator::mount(
            PeriodicTextRotator::new(config.roles)?,
            config.rotation_interval,
        )?;

        let registry = config.registry;
        let tracker = MountedScrollTracker::mount(
            ScrollActiveSectionTracker::new(Arc::clone(&registry), config.tracker),
            &services.viewport,
            Arc::clone(&services.layout),
        );
        let navigation = NavigationShell::new(Arc::clone(&registry), tracker);

        let reveals = registry
            .iter()
            .map(|id| {
                let controller = ViewportRevealController::new(id.clone())
                    .with_config(config.observe)
                    .with_timings(config.stagger, config.counter);
                MountedReveal::mount(controller, services.observer.as_ref())
            })
            .collect::<Vec<_>>();

        let contact = ContactSubmissionController::with_messages(
            services.sender,
            services.notifier,
            config.messages,
        );

        info!(
            sections = registry.len(),
            listeners = services.viewport.listener_count(),
            "page: mounted"
        );

        Ok(Self {
            registry,
            navigation,
            reveals,
            rotator,
            contact,
            gallery: ProjectGallery::new(config.project_count),
        })
    }

    pub fn registry(&self) -> &Arc<SectionRegistry> {
        &self.registry
    }

    pub fn navigation(&self) -> &NavigationShell {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationShell {
        &mut self.navigation
    }

    pub fn reveal(&self, id: &SectionId) -> Option<&MountedReveal> {
        self.registry
            .position(id)
            .and_then(|index| self.reveals.get(index))
    }

    pub fn reveal_mut(&mut self, id: &SectionId) -> Option<&mut MountedReveal> {
        let index = self.registry.position(id)?;
        self.reveals.get_mut(index)
    }

    pub fn rotator(&self) -> &MountedRotator {
        &self.rotator
    }

    pub fn contact(&self) -> &Arc<ContactSubmissionController> {
        &self.contact
    }

    pub fn gallery(&self) -> &ProjectGallery {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut ProjectGallery {
        &mut self.gallery
    }

    /// Releases every listener and timer registered by [`PageShell::mount`].
    pub async fn unmount(self) {
        self.navigation.unmount().await;
        for reveal in self.reveals {
            reveal.unmount().await;
        }
        self.rotator.unmount().await;
        info!("page: unmounted");
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
