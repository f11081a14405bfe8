//! Scroll and viewport orchestration for the profile page.
//!
//! Four independent state machines live here: the active-section tracker
//! behind the navigation bar, the one-shot reveal controllers, the role
//! rotator and the contact form submission controller. [`shell::PageShell`]
//! mounts all of them for one page lifetime and tears them down together.

pub mod contact;
pub mod error;
pub mod gallery;
pub mod navigation;
pub mod notify;
pub mod reveal;
pub mod rotator;
pub mod scroll_tracker;
pub mod shell;
pub mod viewport;
pub mod visibility;

pub use contact::{
    ContactMessages, ContactSubmissionController, MessageSender, MissingMessageSender,
    SubmissionState, SubmitOutcome,
};
pub use error::PageError;
pub use gallery::ProjectGallery;
pub use navigation::{MobileMenu, NavItem, NavigationShell, Theme};
pub use notify::{BroadcastNotifier, Notifier, TracingNotifier};
pub use reveal::{CounterTimings, MountedReveal, Pose, RevealState, StaggerTimings, ViewportRevealController};
pub use rotator::{MountedRotator, PeriodicTextRotator, RoleTransition, RotatorError, RotatorSnapshot};
pub use scroll_tracker::{
    ActiveSection, MountedScrollTracker, ScrollActiveSectionTracker, TrackerConfig, TrackerSnapshot,
};
pub use shell::{PageConfig, PageServices, PageShell};
pub use viewport::{ScrollEvent, SectionLayout, StaticLayout, Viewport};
pub use visibility::{
    GeometryObserver, MissingVisibilityObserver, ObserveConfig, ObserverUnavailable,
    VisibilityObserver, VisibilityStream,
};
