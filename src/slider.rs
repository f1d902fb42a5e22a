//! Before/after comparison slider state machine.
//!
//! Each comparison container owns one [`SliderController`]. The controller
//! moves between [`DragPhase::Idle`] and [`DragPhase::Dragging`] and converts a
//! horizontal pointer coordinate into a reveal percentage:
//!
//! ```text
//! percentage = clamp((x - rect.left) / rect.width * 100, 0, 100)
//! ```
//!
//! Every accepted update yields a [`SliderPresentation`] whose three values
//! are derived from the same percentage, so the handle, the divider line and
//! the clip edge of the "after" image never drift apart.
//!
//! Routing of document-wide move and release events between controllers is
//! the job of [`SliderDispatcher`](crate::SliderDispatcher).

use crate::page::Rect;

/// Reveal percentage shown before the user touches a slider.
pub const INITIAL_PERCENTAGE: f32 = 50.0;

/// Identity of a comparison container on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub usize);

/// Drag phase of a single slider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
}

/// Current state of one slider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderState {
    /// Reveal percentage in `[0, 100]`.
    pub percentage: f32,
    pub phase: DragPhase,
}

impl Default for SliderState {
    fn default() -> Self {
        Self {
            percentage: INITIAL_PERCENTAGE,
            phase: DragPhase::Idle,
        }
    }
}

impl SliderState {
    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }
}

/// Presentation values applied to a comparison widget.
///
/// All three fields are percentages of the container width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderPresentation {
    /// Left offset of the drag handle.
    pub handle_left: f32,
    /// Left offset of the divider line.
    pub line_left: f32,
    /// Right clip inset of the "after" image.
    pub clip_inset_right: f32,
}

impl SliderPresentation {
    pub fn from_percentage(percentage: f32) -> Self {
        Self {
            handle_left: percentage,
            line_left: percentage,
            clip_inset_right: 100.0 - percentage,
        }
    }

    /// The reveal percentage these values were derived from.
    pub fn percentage(&self) -> f32 {
        self.handle_left
    }
}

impl Default for SliderPresentation {
    fn default() -> Self {
        Self::from_percentage(INITIAL_PERCENTAGE)
    }
}

/// Map a pointer x coordinate to a reveal percentage within `rect`.
///
/// Returns `None` when the container has no usable width.
pub fn reveal_percentage(x: f32, rect: Rect) -> Option<f32> {
    if rect.width.is_nan() || rect.width <= 0.0 || x.is_nan() {
        return None;
    }
    let offset = x - rect.left;
    Some((offset / rect.width * 100.0).clamp(0.0, 100.0))
}

/// State machine for one comparison container.
#[derive(Clone, Debug)]
pub struct SliderController {
    id: ContainerId,
    state: SliderState,
}

impl SliderController {
    pub fn new(id: ContainerId) -> Self {
        Self {
            id,
            state: SliderState::default(),
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn state(&self) -> SliderState {
        self.state
    }

    /// Press inside the container: start dragging and position once.
    ///
    /// A container without usable width leaves the state untouched.
    pub fn press(&mut self, x: f32, rect: Rect) -> Option<SliderPresentation> {
        let presentation = self.position(x, rect)?;
        self.state.phase = DragPhase::Dragging;
        Some(presentation)
    }

    /// Pointer moved anywhere on the page. Ignored unless dragging.
    pub fn drag(&mut self, x: f32, rect: Rect) -> Option<SliderPresentation> {
        if !self.state.is_dragging() {
            return None;
        }
        self.position(x, rect)
    }

    /// Pointer released anywhere on the page.
    pub fn release(&mut self) {
        self.state.phase = DragPhase::Idle;
    }

    /// Plain click: a one-shot update that leaves the phase untouched.
    ///
    /// Clicks landing on the handle itself are ignored.
    pub fn click(&mut self, x: f32, rect: Rect, on_handle: bool) -> Option<SliderPresentation> {
        if on_handle {
            return None;
        }
        self.position(x, rect)
    }

    fn position(&mut self, x: f32, rect: Rect) -> Option<SliderPresentation> {
        let percentage = reveal_percentage(x, rect)?;
        self.state.percentage = percentage;
        Some(SliderPresentation::from_percentage(percentage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn container() -> Rect {
        Rect::new(100.0, 0.0, 200.0, 120.0)
    }

    #[test]
    fn percentage_stays_in_range_for_any_x() {
        let rect = container();
        for i in -200..=200 {
            let x = i as f32 * 37.5;
            let p = reveal_percentage(x, rect).unwrap();
            assert!((0.0..=100.0).contains(&p), "x={x} gave {p}");
        }
        assert_eq!(reveal_percentage(f32::NEG_INFINITY, rect), Some(0.0));
        assert_eq!(reveal_percentage(f32::INFINITY, rect), Some(100.0));
    }

    #[test]
    fn zero_width_container_is_ignored() {
        assert_eq!(reveal_percentage(10.0, Rect::new(0.0, 0.0, 0.0, 50.0)), None);
    }

    #[test]
    fn press_on_zero_width_container_stays_idle() {
        let mut slider = SliderController::new(ContainerId(0));
        assert!(slider.press(10.0, Rect::new(0.0, 0.0, 0.0, 50.0)).is_none());
        assert!(!slider.state().is_dragging());
        assert_eq!(slider.state().percentage, INITIAL_PERCENTAGE);
    }

    #[test]
    fn drag_scenario() {
        let mut slider = SliderController::new(ContainerId(0));

        let pressed = slider.press(150.0, container()).unwrap();
        assert_relative_eq!(pressed.percentage(), 25.0);
        assert!(slider.state().is_dragging());

        let moved = slider.drag(400.0, container()).unwrap();
        assert_eq!(moved.percentage(), 100.0);
        assert_eq!(slider.state().percentage, 100.0);
    }

    #[test]
    fn moves_are_ignored_while_idle() {
        let mut slider = SliderController::new(ContainerId(0));
        assert!(slider.drag(150.0, container()).is_none());
        assert_eq!(slider.state().percentage, INITIAL_PERCENTAGE);
    }

    #[test]
    fn release_returns_to_idle() {
        let mut slider = SliderController::new(ContainerId(0));
        slider.press(120.0, container());
        slider.release();
        assert_eq!(slider.state().phase, DragPhase::Idle);
        assert!(slider.drag(290.0, container()).is_none());
    }

    #[test]
    fn click_positions_without_dragging() {
        let mut slider = SliderController::new(ContainerId(0));
        let clicked = slider.click(250.0, container(), false).unwrap();
        assert_relative_eq!(clicked.percentage(), 75.0);
        assert_eq!(slider.state().phase, DragPhase::Idle);
    }

    #[test]
    fn click_on_handle_is_ignored() {
        let mut slider = SliderController::new(ContainerId(0));
        assert!(slider.click(250.0, container(), true).is_none());
        assert_eq!(slider.state().percentage, INITIAL_PERCENTAGE);
    }

    #[test]
    fn presentation_values_share_one_percentage() {
        let p = SliderPresentation::from_percentage(31.25);
        assert_eq!(p.handle_left, p.line_left);
        assert_eq!(p.handle_left + p.clip_inset_right, 100.0);
    }
}
