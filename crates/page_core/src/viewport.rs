use std::{collections::HashMap, sync::Arc};

use shared::domain::{Bounds, SectionExtent, SectionId};
use tokio::sync::{broadcast, watch};

const SCROLL_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub scroll_y: f64,
    pub viewport_height: f64,
}

/// Where each section sits relative to the viewport at a given scroll offset.
pub trait SectionLayout: Send + Sync {
    /// `None` when the section has no rendered element.
    fn bounds(&self, id: &SectionId, scroll_y: f64) -> Option<Bounds>;
}

/// Layout with fixed document offsets per section.
#[derive(Debug, Clone, Default)]
pub struct StaticLayout {
    extents: HashMap<SectionId, SectionExtent>,
}

impl StaticLayout {
    pub fn new(extents: impl IntoIterator<Item = SectionExtent>) -> Self {
        Self {
            extents: extents
                .into_iter()
                .map(|extent| (extent.id.clone(), extent))
                .collect(),
        }
    }
}

impl SectionLayout for StaticLayout {
    fn bounds(&self, id: &SectionId, scroll_y: f64) -> Option<Bounds> {
        self.extents.get(id).map(|extent| extent.bounds_at(scroll_y))
    }
}

/// Page scroll source.
///
/// Every subscriber holds one scroll listener; [`Viewport::listener_count`]
/// reports how many are still registered, so teardown can be checked.
pub struct Viewport {
    events: broadcast::Sender<ScrollEvent>,
    position: watch::Sender<ScrollEvent>,
}

impl Viewport {
    pub fn new(viewport_height: f64) -> Arc<Self> {
        let (events, _) = broadcast::channel(SCROLL_EVENT_CAPACITY);
        let (position, _) = watch::channel(ScrollEvent {
            scroll_y: 0.0,
            viewport_height: viewport_height.max(0.0),
        });
        Arc::new(Self { events, position })
    }

    pub fn position(&self) -> ScrollEvent {
        *self.position.borrow()
    }

    pub fn scroll_to(&self, scroll_y: f64) {
        let current = self.position();
        self.publish(ScrollEvent {
            scroll_y: scroll_y.max(0.0),
            ..current
        });
    }

    pub fn resize(&self, viewport_height: f64) {
        let current = self.position();
        self.publish(ScrollEvent {
            viewport_height: viewport_height.max(0.0),
            ..current
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScrollEvent> {
        self.events.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn publish(&self, event: ScrollEvent) {
        self.position.send_replace(event);
        // No listeners is fine: nothing is mounted yet.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_layout_shifts_with_scroll() {
        let about = SectionId::new("about").expect("id");
        let layout = StaticLayout::new([SectionExtent {
            id: about.clone(),
            top: 900.0,
            height: 600.0,
        }]);
        assert_eq!(
            layout.bounds(&about, 850.0),
            Some(Bounds {
                top: 50.0,
                bottom: 650.0
            })
        );
        let missing = SectionId::new("blog").expect("id");
        assert_eq!(layout.bounds(&missing, 0.0), None);
    }

    #[tokio::test]
    async fn scroll_events_reach_listeners_and_update_position() {
        let viewport = Viewport::new(800.0);
        let mut rx = viewport.subscribe();
        assert_eq!(viewport.listener_count(), 1);

        viewport.scroll_to(-20.0);
        viewport.scroll_to(420.0);

        assert_eq!(rx.recv().await.expect("event").scroll_y, 0.0);
        let event = rx.recv().await.expect("event");
        assert_eq!(event.scroll_y, 420.0);
        assert_eq!(event.viewport_height, 800.0);
        assert_eq!(viewport.position().scroll_y, 420.0);

        drop(rx);
        assert_eq!(viewport.listener_count(), 0);
    }
}
