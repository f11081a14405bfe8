use std::sync::Arc;

use futures::{future, stream::BoxStream, StreamExt};
use shared::domain::SectionId;
use thiserror::Error;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::viewport::{SectionLayout, Viewport};

pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveConfig {
    threshold: f64,
}

impl ObserveConfig {
    /// Threshold is the visible fraction of the element, clamped to `0..=1`.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            DEFAULT_VISIBILITY_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_satisfied(&self, visible_fraction: f64) -> bool {
        if self.threshold == 0.0 {
            visible_fraction > 0.0
        } else {
            visible_fraction >= self.threshold
        }
    }
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

#[derive(Debug, Clone, Error)]
#[error("visibility observation unavailable for {element}: {reason}")]
pub struct ObserverUnavailable {
    pub element: SectionId,
    pub reason: String,
}

/// Predicate results for one observed element. Dropping it stops observing.
pub type VisibilityStream = BoxStream<'static, bool>;

pub trait VisibilityObserver: Send + Sync {
    fn observe(
        &self,
        element: &SectionId,
        config: ObserveConfig,
    ) -> Result<VisibilityStream, ObserverUnavailable>;
}

/// Runtime with no observation primitive at all.
pub struct MissingVisibilityObserver;

impl VisibilityObserver for MissingVisibilityObserver {
    fn observe(
        &self,
        element: &SectionId,
        _config: ObserveConfig,
    ) -> Result<VisibilityStream, ObserverUnavailable> {
        Err(ObserverUnavailable {
            element: element.clone(),
            reason: "no visibility observer in this environment".to_string(),
        })
    }
}

/// Computes visibility from the viewport's scroll events and the layout.
pub struct GeometryObserver {
    viewport: Arc<Viewport>,
    layout: Arc<dyn SectionLayout>,
}

impl GeometryObserver {
    pub fn new(viewport: Arc<Viewport>, layout: Arc<dyn SectionLayout>) -> Self {
        Self { viewport, layout }
    }
}

impl VisibilityObserver for GeometryObserver {
    fn observe(
        &self,
        element: &SectionId,
        config: ObserveConfig,
    ) -> Result<VisibilityStream, ObserverUnavailable> {
        let initial = self.viewport.position();
        if self.layout.bounds(element, initial.scroll_y).is_none() {
            return Err(ObserverUnavailable {
                element: element.clone(),
                reason: "element is not part of the layout".to_string(),
            });
        }

        let viewport = Arc::clone(&self.viewport);
        let updates = BroadcastStream::new(self.viewport.subscribe()).map(move |item| match item {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(_)) => viewport.position(),
        });

        let layout = Arc::clone(&self.layout);
        let element = element.clone();
        let stream = futures::stream::once(future::ready(initial))
            .chain(updates)
            .map(move |event| {
                layout
                    .bounds(&element, event.scroll_y)
                    .map(|bounds| config.is_satisfied(bounds.visible_fraction(event.viewport_height)))
                    .unwrap_or(false)
            });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::SectionExtent;

    use crate::viewport::StaticLayout;

    #[test]
    fn threshold_is_clamped_and_zero_means_any_overlap() {
        assert_eq!(ObserveConfig::default().threshold(), 0.1);
        assert_eq!(ObserveConfig::new(3.0).threshold(), 1.0);
        assert_eq!(ObserveConfig::new(-1.0).threshold(), 0.0);
        assert!(!ObserveConfig::new(0.0).is_satisfied(0.0));
        assert!(ObserveConfig::new(0.0).is_satisfied(0.01));
        assert!(ObserveConfig::default().is_satisfied(0.1));
        assert!(!ObserveConfig::default().is_satisfied(0.09));
    }

    #[tokio::test]
    async fn geometry_observer_reports_initial_and_scrolled_visibility() {
        let viewport = Viewport::new(800.0);
        let skills = SectionId::new("skills").expect("id");
        let layout = Arc::new(StaticLayout::new([SectionExtent {
            id: skills.clone(),
            top: 1500.0,
            height: 1000.0,
        }]));
        let observer = GeometryObserver::new(Arc::clone(&viewport), layout);

        let mut stream = observer
            .observe(&skills, ObserveConfig::default())
            .expect("observe");
        assert_eq!(viewport.listener_count(), 1);
        assert_eq!(stream.next().await, Some(false));

        // 50 of 1000 units visible: below 10%.
        viewport.scroll_to(750.0);
        assert_eq!(stream.next().await, Some(false));

        // 100 of 1000 units visible: exactly 10%.
        viewport.scroll_to(800.0);
        assert_eq!(stream.next().await, Some(true));

        drop(stream);
        assert_eq!(viewport.listener_count(), 0);
    }

    #[test]
    fn missing_layout_entry_is_unavailable() {
        let viewport = Viewport::new(800.0);
        let observer = GeometryObserver::new(viewport, Arc::new(StaticLayout::default()));
        let err = match observer.observe(&SectionId::new("about").expect("id"), ObserveConfig::default()) {
            Ok(_) => panic!("observation should be unavailable"),
            Err(err) => err,
        };
        assert_eq!(err.element.as_str(), "about");
    }
}
