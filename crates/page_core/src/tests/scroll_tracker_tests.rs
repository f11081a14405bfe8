use super::*;
use std::time::Duration;

use shared::domain::SectionExtent;
use tokio::time::timeout;

use crate::viewport::StaticLayout;

fn id(raw: &str) -> SectionId {
    SectionId::new(raw).expect("section id")
}

fn extent(raw: &str, top: f64, height: f64) -> SectionExtent {
    SectionExtent {
        id: id(raw),
        top,
        height,
    }
}

fn registry() -> Arc<SectionRegistry> {
    Arc::new(
        SectionRegistry::new(["about", "skills", "projects", "experience", "contact"])
            .expect("registry"),
    )
}

/// Hero occupies 0..900, then the sections follow back to back.
fn contiguous_layout() -> StaticLayout {
    StaticLayout::new([
        extent("about", 900.0, 600.0),
        extent("skills", 1500.0, 800.0),
        extent("projects", 2300.0, 700.0),
        extent("experience", 3000.0, 600.0),
        extent("contact", 3600.0, 600.0),
    ])
}

fn tracker() -> ScrollActiveSectionTracker {
    ScrollActiveSectionTracker::new(registry(), TrackerConfig::default())
}

#[test]
fn starts_at_top_until_a_section_crosses_the_line() {
    let mut tracker = tracker();
    let layout = contiguous_layout();

    assert!(!tracker.evaluate(0.0, &layout));
    assert_eq!(tracker.active(), &ActiveSection::Top);
    assert!(!tracker.is_scrolled());

    tracker.evaluate(799.0, &layout);
    assert_eq!(tracker.active(), &ActiveSection::Top);

    assert!(tracker.evaluate(800.0, &layout));
    assert_eq!(tracker.active(), &ActiveSection::Section(id("about")));
}

#[test]
fn follows_sections_while_scrolling_down() {
    let mut tracker = tracker();
    let layout = contiguous_layout();

    let expected = [
        (850.0, "about"),
        (1600.0, "skills"),
        (2500.0, "projects"),
        (3000.0, "experience"),
        (3900.0, "contact"),
    ];
    for (scroll_y, section) in expected {
        tracker.evaluate(scroll_y, &layout);
        assert_eq!(
            tracker.active(),
            &ActiveSection::Section(id(section)),
            "scroll_y={scroll_y}"
        );
    }
}

#[test]
fn boundary_tie_prefers_earlier_section() {
    let mut tracker = tracker();
    let layout = contiguous_layout();

    // about ends exactly where skills starts; both straddle the line.
    tracker.evaluate(1400.0, &layout);
    assert_eq!(tracker.active(), &ActiveSection::Section(id("about")));

    tracker.evaluate(1401.0, &layout);
    assert_eq!(tracker.active(), &ActiveSection::Section(id("skills")));
}

#[test]
fn keeps_previous_section_when_nothing_matches() {
    let mut tracker = tracker();
    let layout = StaticLayout::new([
        extent("about", 900.0, 300.0),
        extent("skills", 1500.0, 800.0),
    ]);

    tracker.evaluate(900.0, &layout);
    assert_eq!(tracker.active(), &ActiveSection::Section(id("about")));

    // Line falls in the gap between about and skills.
    assert!(!tracker.evaluate(1150.0, &layout));
    assert_eq!(tracker.active(), &ActiveSection::Section(id("about")));

    // Back above the first section: still no reset to Top.
    tracker.evaluate(0.0, &layout);
    assert_eq!(tracker.active(), &ActiveSection::Section(id("about")));
    assert!(!tracker.is_scrolled());
}

#[test]
fn skips_sections_without_rendered_elements() {
    let registry = Arc::new(SectionRegistry::new(["blog", "about"]).expect("registry"));
    let mut tracker = ScrollActiveSectionTracker::new(registry, TrackerConfig::default());
    tracker.evaluate(850.0, &contiguous_layout());
    assert_eq!(tracker.active(), &ActiveSection::Section(id("about")));
}

#[test]
fn scrolled_flag_is_a_plain_threshold() {
    let mut tracker = tracker();
    let layout = contiguous_layout();

    assert!(!tracker.evaluate(50.0, &layout));
    assert!(!tracker.is_scrolled());
    assert!(tracker.evaluate(50.5, &layout));
    assert!(tracker.is_scrolled());
    assert!(tracker.evaluate(49.0, &layout));
    assert!(!tracker.is_scrolled());
}

#[test]
fn active_state_is_always_top_or_a_registered_section() {
    let mut tracker = tracker();
    let layout = contiguous_layout();
    let registry = registry();

    let mut scroll_y = 0.0;
    while scroll_y < 5000.0 {
        tracker.evaluate(scroll_y, &layout);
        match tracker.active() {
            ActiveSection::Top => {}
            ActiveSection::Section(section) => assert!(registry.contains(section)),
        }
        scroll_y += 37.0;
    }
    assert_eq!(tracker.active(), &ActiveSection::Section(id("contact")));
}

#[test]
fn selection_is_immediate_and_ignores_unknown_sections() {
    let mut tracker = tracker();

    assert!(tracker.select(&id("projects")));
    assert_eq!(tracker.active(), &ActiveSection::Section(id("projects")));
    assert!(!tracker.select(&id("projects")));

    assert!(!tracker.select(&id("blog")));
    assert_eq!(tracker.active(), &ActiveSection::Section(id("projects")));
}

async fn wait_for_listeners(viewport: &Viewport, expected: usize) {
    for _ in 0..50 {
        if viewport.listener_count() == expected {
            return;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(viewport.listener_count(), expected);
}

#[tokio::test]
async fn mount_evaluates_current_position_immediately() {
    let viewport = Viewport::new(800.0);
    viewport.scroll_to(1600.0);

    let mounted =
        MountedScrollTracker::mount(tracker(), &viewport, Arc::new(contiguous_layout()));

    let snapshot = mounted.snapshot();
    assert_eq!(snapshot.active, ActiveSection::Section(id("skills")));
    assert!(snapshot.scrolled);
    mounted.unmount().await;
}

#[tokio::test]
async fn mounted_tracker_follows_scroll_events() {
    let viewport = Viewport::new(800.0);
    let mounted =
        MountedScrollTracker::mount(tracker(), &viewport, Arc::new(contiguous_layout()));
    let mut rx = mounted.subscribe();
    assert_eq!(viewport.listener_count(), 1);

    viewport.scroll_to(2500.0);
    timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("timely update")
        .expect("sender alive");
    assert_eq!(
        rx.borrow().active,
        ActiveSection::Section(id("projects"))
    );

    assert!(mounted.select(&id("contact")).await);
    assert_eq!(mounted.active(), ActiveSection::Section(id("contact")));

    mounted.unmount().await;
    assert_eq!(viewport.listener_count(), 0);
}

#[tokio::test]
async fn dropping_mounted_tracker_releases_listener() {
    let viewport = Viewport::new(800.0);
    let mounted =
        MountedScrollTracker::mount(tracker(), &viewport, Arc::new(contiguous_layout()));
    assert_eq!(viewport.listener_count(), 1);

    drop(mounted);
    wait_for_listeners(&viewport, 0).await;
}
