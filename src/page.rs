//! Virtual page layout: sections stacked vertically under a scroll offset.
//!
//! The page is what the scroll driver and the comparison sliders measure.
//! Sections are laid out top to bottom at the full viewport width; every
//! rectangle it reports is relative to the viewport, like a DOM bounding
//! client rect.

use std::collections::BTreeMap;

use crate::config::SectionConfig;
use crate::dispatcher::SliderHost;
use crate::draw2d::Color;
use crate::scroll_driver::ScrollState;
use crate::slider::{ContainerId, SliderPresentation};

/// Horizontal margin around comparison containers, in logical pixels.
const CONTAINER_MARGIN: f32 = 32.0;
/// Vertical padding inside a comparison section.
const CONTAINER_PADDING: f32 = 40.0;
/// Widest a comparison container may grow.
const CONTAINER_MAX_WIDTH: f32 = 960.0;
/// Side length of the square slider handle.
pub const HANDLE_SIZE: f32 = 44.0;
/// Width of the divider line.
pub const LINE_WIDTH: f32 = 3.0;

/// An axis-aligned rectangle in viewport coordinates (logical pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Whether any part of the rectangle lies within `0..height` vertically.
    pub fn intersects_viewport(&self, viewport_height: f32) -> bool {
        self.bottom() > 0.0 && self.top < viewport_height
    }
}

/// What a section shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    Hero,
    /// Transparent window onto the 3D scene; drives the animation.
    Showcase,
    Comparison(ContainerId),
    Spacer,
}

#[derive(Clone, Debug)]
pub struct Section {
    pub kind: SectionKind,
    pub height: f32,
    pub background: Color,
}

/// Scrollable page made of stacked sections.
#[derive(Debug)]
pub struct Page {
    sections: Vec<Section>,
    scroll_offset: f32,
    viewport_width: f32,
    viewport_height: f32,
    presentations: BTreeMap<ContainerId, SliderPresentation>,
}

impl Page {
    pub fn new(sections: Vec<Section>, viewport_width: f32, viewport_height: f32) -> Self {
        let presentations = sections
            .iter()
            .filter_map(|s| match s.kind {
                SectionKind::Comparison(id) => Some((id, SliderPresentation::default())),
                _ => None,
            })
            .collect();

        Self {
            sections,
            scroll_offset: 0.0,
            viewport_width,
            viewport_height,
            presentations,
        }
    }

    /// Build the page from configured sections. Comparison containers are
    /// numbered in page order.
    pub fn from_config(sections: &[SectionConfig], viewport_width: f32, viewport_height: f32) -> Self {
        let mut next_container = 0;
        let sections = sections
            .iter()
            .map(|section| {
                let kind = match section {
                    SectionConfig::Hero { .. } => SectionKind::Hero,
                    SectionConfig::Showcase { .. } => SectionKind::Showcase,
                    SectionConfig::Comparison { .. } => {
                        let id = ContainerId(next_container);
                        next_container += 1;
                        SectionKind::Comparison(id)
                    }
                    SectionConfig::Spacer { .. } => SectionKind::Spacer,
                };
                Section {
                    kind,
                    height: section.height().max(0.0),
                    background: Color::from_rgba_array(section.background()),
                }
            })
            .collect();

        Self::new(sections, viewport_width, viewport_height)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn content_height(&self) -> f32 {
        self.sections.iter().map(|s| s.height).sum()
    }

    pub fn max_scroll(&self) -> f32 {
        (self.content_height() - self.viewport_height).max(0.0)
    }

    /// Scroll by `delta` pixels (positive scrolls down). Returns whether the
    /// offset changed.
    pub fn scroll_by(&mut self, delta: f32) -> bool {
        self.scroll_to(self.scroll_offset + delta)
    }

    pub fn scroll_to(&mut self, offset: f32) -> bool {
        let clamped = if offset.is_nan() {
            self.scroll_offset
        } else {
            offset.clamp(0.0, self.max_scroll())
        };
        let changed = clamped != self.scroll_offset;
        self.scroll_offset = clamped;
        changed
    }

    /// Update the viewport size, keeping the scroll offset in range.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.scroll_to(self.scroll_offset);
    }

    /// Viewport-relative bounds of section `index`.
    pub fn section_rect(&self, index: usize) -> Option<Rect> {
        let section = self.sections.get(index)?;
        let document_top: f32 = self.sections[..index].iter().map(|s| s.height).sum();
        Some(Rect::new(
            0.0,
            document_top - self.scroll_offset,
            self.viewport_width,
            section.height,
        ))
    }

    /// Bounds of the first showcase section, if the page has one.
    pub fn showcase_rect(&self) -> Option<Rect> {
        let index = self
            .sections
            .iter()
            .position(|s| s.kind == SectionKind::Showcase)?;
        self.section_rect(index)
    }

    /// Scroll geometry of the showcase section for the animation driver.
    pub fn showcase_scroll_state(&self) -> Option<ScrollState> {
        let rect = self.showcase_rect()?;
        Some(ScrollState::new(rect.top, rect.height, self.viewport_height))
    }

    /// Ids of all comparison containers in page order.
    pub fn containers(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.sections.iter().filter_map(|s| match s.kind {
            SectionKind::Comparison(id) => Some(id),
            _ => None,
        })
    }

    fn container_section(&self, id: ContainerId) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.kind == SectionKind::Comparison(id))
    }

    /// Viewport-relative bounds of a comparison container.
    pub fn container_bounds(&self, id: ContainerId) -> Option<Rect> {
        let section = self.section_rect(self.container_section(id)?)?;
        let width = (section.width - 2.0 * CONTAINER_MARGIN)
            .min(CONTAINER_MAX_WIDTH)
            .max(0.0);
        let height = (section.height - 2.0 * CONTAINER_PADDING).max(0.0);
        Some(Rect::new(
            section.left + (section.width - width) * 0.5,
            section.top + (section.height - height) * 0.5,
            width,
            height,
        ))
    }

    /// Container under the given viewport point.
    pub fn container_at(&self, x: f32, y: f32) -> Option<ContainerId> {
        self.containers().find(|id| {
            self.container_bounds(*id)
                .is_some_and(|rect| rect.contains(x, y))
        })
    }

    pub fn presentation(&self, id: ContainerId) -> Option<SliderPresentation> {
        self.presentations.get(&id).copied()
    }

    /// Bounds of the drag handle for a container at its current position.
    pub fn handle_rect(&self, id: ContainerId) -> Option<Rect> {
        let container = self.container_bounds(id)?;
        let presentation = self.presentation(id)?;
        let center_x = container.left + container.width * presentation.handle_left / 100.0;
        let center_y = container.top + container.height * 0.5;
        Some(Rect::new(
            center_x - HANDLE_SIZE * 0.5,
            center_y - HANDLE_SIZE * 0.5,
            HANDLE_SIZE,
            HANDLE_SIZE,
        ))
    }

    /// Whether a point lands on the container's drag handle.
    pub fn handle_hit(&self, id: ContainerId, x: f32, y: f32) -> bool {
        self.handle_rect(id).is_some_and(|rect| rect.contains(x, y))
    }
}

impl SliderHost for Page {
    fn container_rect(&self, id: ContainerId) -> Option<Rect> {
        self.container_bounds(id)
    }

    fn apply(&mut self, id: ContainerId, presentation: SliderPresentation) {
        if let Some(slot) = self.presentations.get_mut(&id) {
            *slot = presentation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::SliderDispatcher;

    fn section(kind: SectionKind, height: f32) -> Section {
        Section {
            kind,
            height,
            background: Color::BLACK,
        }
    }

    fn sample_page() -> Page {
        Page::new(
            vec![
                section(SectionKind::Hero, 600.0),
                section(SectionKind::Showcase, 1200.0),
                section(SectionKind::Comparison(ContainerId(0)), 500.0),
                section(SectionKind::Spacer, 400.0),
            ],
            1280.0,
            800.0,
        )
    }

    #[test]
    fn section_rects_follow_scroll() {
        let mut page = sample_page();
        assert_eq!(page.showcase_rect().unwrap().top, 600.0);

        page.scroll_by(250.0);
        let rect = page.showcase_rect().unwrap();
        assert_eq!(rect.top, 350.0);
        assert_eq!(rect.height, 1200.0);
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut page = sample_page();
        assert!(!page.scroll_by(-100.0));
        assert_eq!(page.scroll_offset(), 0.0);

        page.scroll_by(1.0e6);
        assert_eq!(page.scroll_offset(), 2700.0 - 800.0);
    }

    #[test]
    fn shrinking_content_reclamps_on_resize() {
        let mut page = sample_page();
        page.scroll_to(1900.0);
        page.set_viewport(1280.0, 2000.0);
        assert_eq!(page.scroll_offset(), 700.0);
    }

    #[test]
    fn showcase_scroll_state_uses_viewport_height() {
        let page = sample_page();
        let state = page.showcase_scroll_state().unwrap();
        assert_eq!(state, ScrollState::new(600.0, 1200.0, 800.0));
    }

    #[test]
    fn page_without_showcase_has_no_scroll_state() {
        let page = Page::new(vec![section(SectionKind::Hero, 600.0)], 800.0, 600.0);
        assert!(page.showcase_scroll_state().is_none());
    }

    #[test]
    fn container_is_centered_and_padded() {
        let page = sample_page();
        let rect = page.container_bounds(ContainerId(0)).unwrap();
        assert_eq!(rect.width, 960.0);
        assert_eq!(rect.left, 160.0);
        assert_eq!(rect.top, 1800.0 + 40.0);
        assert_eq!(rect.height, 420.0);
    }

    #[test]
    fn hit_testing_finds_container_and_handle() {
        let mut page = sample_page();
        page.scroll_to(1500.0);
        let rect = page.container_bounds(ContainerId(0)).unwrap();
        let mid_y = rect.top + rect.height * 0.5;

        assert_eq!(page.container_at(rect.left + 10.0, mid_y), Some(ContainerId(0)));
        assert_eq!(page.container_at(rect.left - 10.0, mid_y), None);

        let handle_x = rect.left + rect.width * 0.5;
        assert!(page.handle_hit(ContainerId(0), handle_x, mid_y));
        assert!(!page.handle_hit(ContainerId(0), rect.left + 5.0, mid_y));
    }

    #[test]
    fn dispatcher_updates_page_presentation() {
        let mut page = sample_page();
        let mut dispatcher = SliderDispatcher::new();
        for id in page.containers().collect::<Vec<_>>() {
            dispatcher.register(id);
        }

        let rect = page.container_bounds(ContainerId(0)).unwrap();
        dispatcher.press(ContainerId(0), rect.left + rect.width * 0.25, &mut page);

        let presentation = page.presentation(ContainerId(0)).unwrap();
        assert_eq!(presentation.handle_left, 25.0);
        assert_eq!(presentation.line_left, 25.0);
        assert_eq!(presentation.clip_inset_right, 75.0);
    }
}
