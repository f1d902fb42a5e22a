//! Translates winit input into page actions.
//!
//! [`PointerTracker`] follows one primary pointer (the mouse, or the first
//! finger down) and turns it into [`PointerAction`]s for the slider
//! dispatcher. Wheel, keyboard and touches that miss every container become
//! [`ScrollCommand`]s. Positions are logical pixels.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::slider::ContainerId;

/// Maximum pointer travel, in logical pixels, for a press and release to
/// count as a click.
pub const CLICK_SLOP: f32 = 4.0;

/// Share of the viewport scrolled by PageUp / PageDown.
pub const PAGE_STEP: f32 = 0.9;

/// Slider-relevant pointer events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerAction {
    /// Primary pointer went down inside `container`.
    Press { container: ContainerId, x: f32, y: f32 },
    /// Document-wide movement of the primary pointer.
    Move { x: f32, y: f32 },
    /// Document-wide release of the primary pointer.
    Release { x: f32, y: f32 },
    /// Press and release in the same container without dragging.
    Click { container: ContainerId, x: f32, y: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollCommand {
    /// Scroll by a number of logical pixels; positive moves down the page.
    By(f32),
    ToTop,
    ToBottom,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputAction {
    Pointer(PointerAction),
    Scroll(ScrollCommand),
}

/// Which device a pointer event came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

#[derive(Clone, Copy, Debug)]
struct ActivePress {
    pointer: PointerId,
    container: Option<ContainerId>,
    origin: Vec2,
}

/// Primary-pointer state machine.
#[derive(Debug)]
pub struct PointerTracker {
    scale_factor: f64,
    line_height: f32,
    viewport_height: f32,
    cursor: Vec2,
    pressed: Option<ActivePress>,
    /// Touch that started outside every container: (id, last y).
    touch_scroll: Option<(u64, f32)>,
}

impl PointerTracker {
    pub fn new(scale_factor: f64, line_height: f32, viewport_height: f32) -> Self {
        Self {
            scale_factor,
            line_height,
            viewport_height,
            cursor: Vec2::ZERO,
            pressed: None,
            touch_scroll: None,
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height;
    }

    /// Last known cursor position.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Whether the primary pointer is currently down.
    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }

    fn to_logical(&self, x: f64, y: f64) -> Vec2 {
        Vec2::new((x / self.scale_factor) as f32, (y / self.scale_factor) as f32)
    }

    /// Translate one window event. `hit` maps a logical point to the
    /// comparison container under it.
    pub fn handle_event(
        &mut self,
        event: &WindowEvent,
        hit: impl Fn(f32, f32) -> Option<ContainerId>,
    ) -> Vec<InputAction> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let pos = self.to_logical(position.x, position.y);
                self.moved(PointerId::Mouse, pos)
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let pos = self.cursor;
                let container = hit(pos.x, pos.y);
                match state {
                    ElementState::Pressed => self.press(PointerId::Mouse, pos, container),
                    ElementState::Released => self.release(PointerId::Mouse, pos, container),
                }
            }
            WindowEvent::Touch(Touch {
                phase, location, id, ..
            }) => {
                let pos = self.to_logical(location.x, location.y);
                let pointer = PointerId::Touch(*id);
                match phase {
                    TouchPhase::Started => self.press(pointer, pos, hit(pos.x, pos.y)),
                    TouchPhase::Moved => self.moved(pointer, pos),
                    TouchPhase::Ended => self.release(pointer, pos, hit(pos.x, pos.y)),
                    // A cancelled touch never clicks.
                    TouchPhase::Cancelled => self.release(pointer, pos, None),
                }
            }
            WindowEvent::Focused(false) => self.focus_lost(),
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -*y * self.line_height,
                    MouseScrollDelta::PixelDelta(p) => -(p.y / self.scale_factor) as f32,
                };
                if dy == 0.0 {
                    Vec::new()
                } else {
                    vec![InputAction::Scroll(ScrollCommand::By(dy))]
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(key) => self.key(key).into_iter().collect(),
                    PhysicalKey::Unidentified(_) => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    /// Scroll command for a page key.
    pub fn key(&self, key: KeyCode) -> Option<InputAction> {
        let command = match key {
            KeyCode::ArrowDown => ScrollCommand::By(self.line_height),
            KeyCode::ArrowUp => ScrollCommand::By(-self.line_height),
            KeyCode::PageDown => ScrollCommand::By(self.viewport_height * PAGE_STEP),
            KeyCode::PageUp => ScrollCommand::By(-self.viewport_height * PAGE_STEP),
            KeyCode::Home => ScrollCommand::ToTop,
            KeyCode::End => ScrollCommand::ToBottom,
            _ => return None,
        };
        Some(InputAction::Scroll(command))
    }

    /// Forget any press in flight. The OS may never deliver the matching
    /// release once the window loses focus, so an active drag is ended here.
    pub fn focus_lost(&mut self) -> Vec<InputAction> {
        self.touch_scroll = None;
        match self.pressed.take() {
            Some(_) => vec![InputAction::Pointer(PointerAction::Release {
                x: self.cursor.x,
                y: self.cursor.y,
            })],
            None => Vec::new(),
        }
    }

    pub fn press(
        &mut self,
        pointer: PointerId,
        pos: Vec2,
        container: Option<ContainerId>,
    ) -> Vec<InputAction> {
        if pointer == PointerId::Mouse {
            self.cursor = pos;
        }
        if self.pressed.is_some() || self.touch_scroll.is_some() {
            return Vec::new();
        }

        match (pointer, container) {
            (PointerId::Touch(id), None) => {
                self.touch_scroll = Some((id, pos.y));
                Vec::new()
            }
            (_, container) => {
                self.pressed = Some(ActivePress {
                    pointer,
                    container,
                    origin: pos,
                });
                container
                    .map(|container| {
                        InputAction::Pointer(PointerAction::Press {
                            container,
                            x: pos.x,
                            y: pos.y,
                        })
                    })
                    .into_iter()
                    .collect()
            }
        }
    }

    pub fn moved(&mut self, pointer: PointerId, pos: Vec2) -> Vec<InputAction> {
        if let (PointerId::Touch(id), Some((scroll_id, last_y))) = (pointer, self.touch_scroll) {
            if id == scroll_id {
                self.touch_scroll = Some((id, pos.y));
                let dy = last_y - pos.y;
                return if dy == 0.0 {
                    Vec::new()
                } else {
                    vec![InputAction::Scroll(ScrollCommand::By(dy))]
                };
            }
        }

        let is_primary = match pointer {
            PointerId::Mouse => {
                self.cursor = pos;
                self.pressed.is_none_or(|p| p.pointer == PointerId::Mouse)
            }
            PointerId::Touch(_) => self.pressed.is_some_and(|p| p.pointer == pointer),
        };
        if !is_primary {
            return Vec::new();
        }
        vec![InputAction::Pointer(PointerAction::Move { x: pos.x, y: pos.y })]
    }

    pub fn release(
        &mut self,
        pointer: PointerId,
        pos: Vec2,
        container: Option<ContainerId>,
    ) -> Vec<InputAction> {
        if let (PointerId::Touch(id), Some((scroll_id, _))) = (pointer, self.touch_scroll) {
            if id == scroll_id {
                self.touch_scroll = None;
                return Vec::new();
            }
        }

        let press = match self.pressed {
            Some(press) if press.pointer == pointer => self.pressed.take(),
            // Not the primary pointer.
            Some(_) => return Vec::new(),
            None if pointer != PointerId::Mouse => return Vec::new(),
            // Mouse released after being pressed outside the window.
            None => None,
        };

        let mut actions = vec![InputAction::Pointer(PointerAction::Release {
            x: pos.x,
            y: pos.y,
        })];
        if let Some(press) = press {
            let same_container = press.container.is_some() && press.container == container;
            if same_container && press.origin.distance(pos) < CLICK_SLOP {
                if let Some(container) = press.container {
                    actions.push(InputAction::Pointer(PointerAction::Click {
                        container,
                        x: pos.x,
                        y: pos.y,
                    }));
                }
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ContainerId = ContainerId(0);
    const B: ContainerId = ContainerId(1);

    fn tracker() -> PointerTracker {
        PointerTracker::new(1.0, 40.0, 800.0)
    }

    fn clicks(actions: &[InputAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, InputAction::Pointer(PointerAction::Click { .. })))
            .count()
    }

    #[test]
    fn press_and_release_in_place_clicks() {
        let mut t = tracker();
        let pressed = t.press(PointerId::Mouse, Vec2::new(10.0, 10.0), Some(A));
        assert_eq!(
            pressed,
            vec![InputAction::Pointer(PointerAction::Press {
                container: A,
                x: 10.0,
                y: 10.0
            })]
        );

        let released = t.release(PointerId::Mouse, Vec2::new(12.0, 11.0), Some(A));
        assert!(matches!(
            released[0],
            InputAction::Pointer(PointerAction::Release { .. })
        ));
        assert_eq!(clicks(&released), 1);
        assert!(!t.is_pressed());
    }

    #[test]
    fn drag_does_not_click() {
        let mut t = tracker();
        t.press(PointerId::Mouse, Vec2::new(10.0, 10.0), Some(A));
        t.moved(PointerId::Mouse, Vec2::new(60.0, 10.0));
        let released = t.release(PointerId::Mouse, Vec2::new(60.0, 10.0), Some(A));
        assert_eq!(clicks(&released), 0);
    }

    #[test]
    fn release_in_other_container_does_not_click() {
        let mut t = tracker();
        t.press(PointerId::Mouse, Vec2::new(10.0, 10.0), Some(A));
        let released = t.release(PointerId::Mouse, Vec2::new(11.0, 10.0), Some(B));
        assert_eq!(released.len(), 1);
    }

    #[test]
    fn mouse_moves_and_releases_are_document_wide() {
        let mut t = tracker();
        assert_eq!(
            t.moved(PointerId::Mouse, Vec2::new(5.0, 5.0)),
            vec![InputAction::Pointer(PointerAction::Move { x: 5.0, y: 5.0 })]
        );
        assert_eq!(t.cursor(), Vec2::new(5.0, 5.0));

        // press outside any container still produces a release later
        assert!(t.press(PointerId::Mouse, Vec2::ZERO, None).is_empty());
        let released = t.release(PointerId::Mouse, Vec2::ZERO, None);
        assert_eq!(released.len(), 1);
    }

    #[test]
    fn only_the_first_touch_is_tracked() {
        let mut t = tracker();
        t.press(PointerId::Touch(1), Vec2::new(10.0, 10.0), Some(A));
        assert!(t.press(PointerId::Touch(2), Vec2::new(50.0, 10.0), Some(A)).is_empty());
        assert!(t.moved(PointerId::Touch(2), Vec2::new(70.0, 10.0)).is_empty());
        assert!(t.release(PointerId::Touch(2), Vec2::new(70.0, 10.0), Some(A)).is_empty());

        assert_eq!(t.moved(PointerId::Touch(1), Vec2::new(20.0, 10.0)).len(), 1);
        assert_eq!(t.release(PointerId::Touch(1), Vec2::new(20.0, 10.0), Some(A)).len(), 1);
    }

    #[test]
    fn touch_outside_containers_scrolls_the_page() {
        let mut t = tracker();
        assert!(t.press(PointerId::Touch(3), Vec2::new(0.0, 500.0), None).is_empty());
        assert_eq!(
            t.moved(PointerId::Touch(3), Vec2::new(0.0, 420.0)),
            vec![InputAction::Scroll(ScrollCommand::By(80.0))]
        );
        assert!(t.release(PointerId::Touch(3), Vec2::new(0.0, 420.0), None).is_empty());
        assert!(!t.is_pressed());
    }

    #[test]
    fn page_keys_scroll() {
        let t = tracker();
        assert_eq!(
            t.key(KeyCode::ArrowDown),
            Some(InputAction::Scroll(ScrollCommand::By(40.0)))
        );
        assert_eq!(
            t.key(KeyCode::PageUp),
            Some(InputAction::Scroll(ScrollCommand::By(-720.0)))
        );
        assert_eq!(t.key(KeyCode::End), Some(InputAction::Scroll(ScrollCommand::ToBottom)));
        assert_eq!(t.key(KeyCode::KeyA), None);
    }

    #[test]
    fn scale_factor_converts_to_logical() {
        let mut t = PointerTracker::new(2.0, 40.0, 800.0);
        let pos = t.to_logical(200.0, 100.0);
        assert_eq!(pos, Vec2::new(100.0, 50.0));
        t.set_scale_factor(0.0);
        assert_eq!(t.to_logical(2.0, 2.0), Vec2::ONE);
    }

    #[test]
    fn focus_loss_ends_press_so_next_press_is_seen() {
        let mut t = tracker();
        t.press(PointerId::Mouse, Vec2::new(10.0, 10.0), Some(A));
        assert!(t.is_pressed());

        let actions = t.focus_lost();
        assert!(matches!(
            actions.as_slice(),
            [InputAction::Pointer(PointerAction::Release { .. })]
        ));
        assert!(!t.is_pressed());
        assert_eq!(clicks(&actions), 0);

        let actions = t.press(PointerId::Mouse, Vec2::new(20.0, 20.0), Some(B));
        assert!(matches!(
            actions.as_slice(),
            [InputAction::Pointer(PointerAction::Press { container: B, .. })]
        ));
    }

    #[test]
    fn focus_loss_without_press_is_silent() {
        let mut t = tracker();
        assert!(t.focus_lost().is_empty());
    }
}
