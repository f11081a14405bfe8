//! Header state: nav items, mobile menu and theme toggle around the tracker.

use std::sync::Arc;

use shared::domain::{SectionId, SectionRegistry};

use crate::scroll_tracker::{ActiveSection, MountedScrollTracker, TrackerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MobileMenu {
    open: bool,
}

impl MobileMenu {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub id: SectionId,
    pub href: String,
    pub is_active: bool,
}

pub struct NavigationShell {
    registry: Arc<SectionRegistry>,
    tracker: MountedScrollTracker,
    menu: MobileMenu,
    theme: Theme,
}

impl NavigationShell {
    pub fn new(registry: Arc<SectionRegistry>, tracker: MountedScrollTracker) -> Self {
        Self {
            registry,
            tracker,
            menu: MobileMenu::default(),
            theme: Theme::default(),
        }
    }

    /// A nav link was tapped: highlight it now and close the mobile overlay.
    pub async fn click(&mut self, id: &SectionId) {
        self.tracker.select(id).await;
        self.menu.close();
    }

    pub fn toggle_menu(&mut self) {
        self.menu.toggle();
    }

    pub fn menu(&self) -> MobileMenu {
        self.menu
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.tracker.snapshot()
    }

    pub fn active(&self) -> ActiveSection {
        self.tracker.active()
    }

    pub fn tracker(&self) -> &MountedScrollTracker {
        &self.tracker
    }

    pub fn items(&self) -> Vec<NavItem> {
        let active = self.tracker.active();
        self.registry
            .iter()
            .map(|id| NavItem {
                id: id.clone(),
                href: id.anchor(),
                is_active: active.is(id),
            })
            .collect()
    }

    pub async fn unmount(self) {
        self.tracker.unmount().await;
    }
}
