//! Routes pointer events to the comparison slider being dragged.
//!
//! Presses are scoped to a container, while moves and releases are delivered
//! document-wide. The dispatcher keeps a registry of [`SliderController`]s and
//! remembers which one (if any) is currently dragging, so a drag that leaves
//! its container and ends elsewhere still finishes cleanly.

use std::collections::BTreeMap;

use tracing::trace;

use crate::page::Rect;
use crate::slider::{
    ContainerId, SliderController, SliderPresentation, SliderState, reveal_percentage,
};

/// Geometry source and presentation sink for sliders.
///
/// The page implements this; tests use an in-memory fake.
pub trait SliderHost {
    /// Current viewport-relative bounds of a container, if it exists.
    fn container_rect(&self, id: ContainerId) -> Option<Rect>;
    /// Apply new presentation values to a container.
    fn apply(&mut self, id: ContainerId, presentation: SliderPresentation);
}

/// Registry of slider state machines plus the active drag.
#[derive(Debug, Default)]
pub struct SliderDispatcher {
    sliders: BTreeMap<ContainerId, SliderController>,
    dragging: Option<ContainerId>,
}

impl SliderDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container. Returns `false` if it was already known.
    pub fn register(&mut self, id: ContainerId) -> bool {
        if self.sliders.contains_key(&id) {
            return false;
        }
        self.sliders.insert(id, SliderController::new(id));
        true
    }

    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }

    /// The container currently being dragged.
    pub fn dragging(&self) -> Option<ContainerId> {
        self.dragging
    }

    pub fn state(&self, id: ContainerId) -> Option<SliderState> {
        self.sliders.get(&id).map(SliderController::state)
    }

    /// Press inside `id`. Any other drag in progress is ended first.
    ///
    /// Returns the new percentage, or `None` for unknown or unlaid-out containers.
    pub fn press(&mut self, id: ContainerId, x: f32, host: &mut dyn SliderHost) -> Option<f32> {
        if !self.sliders.contains_key(&id) {
            return None;
        }
        let rect = host.container_rect(id)?;
        reveal_percentage(x, rect)?;

        if let Some(previous) = self.dragging.take() {
            if let Some(slider) = self.sliders.get_mut(&previous) {
                slider.release();
            }
        }

        let presentation = self.sliders.get_mut(&id)?.press(x, rect)?;
        self.dragging = Some(id);
        trace!(container = id.0, percentage = presentation.percentage(), "slider pressed");
        host.apply(id, presentation);
        Some(presentation.percentage())
    }

    /// Document-wide pointer move.
    pub fn pointer_move(&mut self, x: f32, host: &mut dyn SliderHost) -> Option<f32> {
        let id = self.dragging?;
        let rect = host.container_rect(id)?;
        let presentation = self.sliders.get_mut(&id)?.drag(x, rect)?;
        host.apply(id, presentation);
        Some(presentation.percentage())
    }

    /// Document-wide release: ends the active drag, if any.
    pub fn release(&mut self) -> Option<ContainerId> {
        let id = self.dragging.take()?;
        if let Some(slider) = self.sliders.get_mut(&id) {
            slider.release();
        }
        trace!(container = id.0, "slider released");
        Some(id)
    }

    /// One-shot click inside `id`.
    pub fn click(
        &mut self,
        id: ContainerId,
        x: f32,
        on_handle: bool,
        host: &mut dyn SliderHost,
    ) -> Option<f32> {
        let rect = host.container_rect(id)?;
        let presentation = self.sliders.get_mut(&id)?.click(x, rect, on_handle)?;
        host.apply(id, presentation);
        Some(presentation.percentage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeHost {
        rects: HashMap<ContainerId, Rect>,
        applied: Vec<(ContainerId, SliderPresentation)>,
    }

    impl FakeHost {
        fn with(containers: &[(usize, Rect)]) -> Self {
            Self {
                rects: containers
                    .iter()
                    .map(|(id, rect)| (ContainerId(*id), *rect))
                    .collect(),
                applied: Vec::new(),
            }
        }
    }

    impl SliderHost for FakeHost {
        fn container_rect(&self, id: ContainerId) -> Option<Rect> {
            self.rects.get(&id).copied()
        }

        fn apply(&mut self, id: ContainerId, presentation: SliderPresentation) {
            self.applied.push((id, presentation));
        }
    }

    const A: ContainerId = ContainerId(0);
    const B: ContainerId = ContainerId(1);

    fn two_containers() -> (SliderDispatcher, FakeHost) {
        let mut dispatcher = SliderDispatcher::new();
        dispatcher.register(A);
        dispatcher.register(B);
        let host = FakeHost::with(&[
            (0, Rect::new(100.0, 0.0, 200.0, 100.0)),
            (1, Rect::new(100.0, 300.0, 400.0, 100.0)),
        ]);
        (dispatcher, host)
    }

    #[test]
    fn register_is_idempotent() {
        let mut dispatcher = SliderDispatcher::new();
        assert!(dispatcher.register(A));
        assert!(!dispatcher.register(A));
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn drag_scenario_through_dispatcher() {
        let (mut dispatcher, mut host) = two_containers();

        assert_relative_eq!(dispatcher.press(A, 150.0, &mut host).unwrap(), 25.0);
        assert_eq!(dispatcher.pointer_move(400.0, &mut host), Some(100.0));
        assert_eq!(host.applied.len(), 2);
        assert!(host.applied.iter().all(|(id, _)| *id == A));
    }

    #[test]
    fn release_outside_container_ends_drag() {
        let (mut dispatcher, mut host) = two_containers();

        dispatcher.press(A, 150.0, &mut host);
        dispatcher.pointer_move(-500.0, &mut host);
        assert_eq!(dispatcher.release(), Some(A));

        assert_eq!(dispatcher.dragging(), None);
        assert!(!dispatcher.state(A).unwrap().is_dragging());

        let applied = host.applied.len();
        assert!(dispatcher.pointer_move(200.0, &mut host).is_none());
        assert_eq!(host.applied.len(), applied);
        assert_eq!(dispatcher.state(A).unwrap().percentage, 0.0);
    }

    #[test]
    fn moves_route_only_to_dragging_container() {
        let (mut dispatcher, mut host) = two_containers();

        dispatcher.press(B, 300.0, &mut host);
        dispatcher.pointer_move(200.0, &mut host);

        assert_eq!(dispatcher.state(A).unwrap().percentage, 50.0);
        assert_relative_eq!(dispatcher.state(B).unwrap().percentage, 25.0);
    }

    #[test]
    fn pressing_another_container_ends_previous_drag() {
        let (mut dispatcher, mut host) = two_containers();

        dispatcher.press(A, 150.0, &mut host);
        dispatcher.press(B, 500.0, &mut host);

        assert_eq!(dispatcher.dragging(), Some(B));
        assert!(!dispatcher.state(A).unwrap().is_dragging());
        assert!(dispatcher.state(B).unwrap().is_dragging());
    }

    #[test]
    fn click_updates_without_starting_drag() {
        let (mut dispatcher, mut host) = two_containers();

        assert_relative_eq!(dispatcher.click(A, 250.0, false, &mut host).unwrap(), 75.0);
        assert_eq!(dispatcher.dragging(), None);
        assert!(dispatcher.click(A, 120.0, true, &mut host).is_none());
        assert_relative_eq!(dispatcher.state(A).unwrap().percentage, 75.0);
    }

    #[test]
    fn unknown_container_is_ignored() {
        let (mut dispatcher, mut host) = two_containers();
        assert!(dispatcher.press(ContainerId(9), 10.0, &mut host).is_none());
        assert_eq!(dispatcher.dragging(), None);
        assert!(host.applied.is_empty());
    }

    #[test]
    fn press_on_zero_width_container_changes_nothing() {
        let (mut dispatcher, mut host) = two_containers();
        host.rects.insert(B, Rect::new(100.0, 300.0, 0.0, 100.0));

        dispatcher.press(A, 150.0, &mut host);
        assert!(dispatcher.press(B, 100.0, &mut host).is_none());

        assert_eq!(dispatcher.dragging(), Some(A));
        assert!(dispatcher.state(A).unwrap().is_dragging());
        assert!(!dispatcher.state(B).unwrap().is_dragging());
        assert_eq!(host.applied.len(), 1);
    }

    #[test]
    fn release_without_drag_is_harmless() {
        let (mut dispatcher, _) = two_containers();
        assert_eq!(dispatcher.release(), None);
    }
}
