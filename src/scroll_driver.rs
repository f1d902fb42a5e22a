//! Scroll-position to animation-time mapping.
//!
//! The [`ScrollAnimationDriver`] turns the on-screen geometry of a tracked
//! page section into a playhead time on a single animation clip. It is a pure
//! function of the current geometry and is called on every scroll and resize
//! event, once at start-up, and once when the model finishes loading.
//!
//! # Mapping
//!
//! ```text
//! scroll_start = viewport_height * lead_in
//! adjusted_top = section_top - scroll_start
//! progress     = clamp(-adjusted_top / (section_height + scroll_start), 0, 1)
//! target_time  = progress * duration
//! ```
//!
//! With the default `lead_in` of 0.8 the animation starts while the section is
//! still 80% of a viewport below the fold, and reaches its last frame once the
//! section has scrolled completely past the top edge.
//!
//! # Example
//!
//! ```
//! use vitrine::{ScrollAnimationDriver, ScrollState};
//!
//! let driver = ScrollAnimationDriver::new();
//! let state = ScrollState::new(640.0, 400.0, 800.0);
//! assert_eq!(driver.progress(state), 0.0);
//! ```

/// Default fraction of the viewport height used as lead-in.
pub const DEFAULT_LEAD_IN: f32 = 0.8;

/// Geometry of the tracked section relative to the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollState {
    /// Distance from the viewport top to the section top (negative once the
    /// section has scrolled above the viewport).
    pub section_top: f32,
    pub section_height: f32,
    pub viewport_height: f32,
}

impl ScrollState {
    pub fn new(section_top: f32, section_height: f32, viewport_height: f32) -> Self {
        Self {
            section_top,
            section_height,
            viewport_height,
        }
    }
}

/// Result of one mapping step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationProgress {
    /// Normalized scroll progress in `[0, 1]`.
    pub progress: f32,
    /// Playhead time in `[0, duration]` seconds.
    pub target_time: f32,
}

/// A time-parameterized playback unit the driver can scrub.
///
/// Implemented by [`AnimationAction`](crate::AnimationAction); tests use
/// lightweight fakes.
pub trait PlaybackHandle {
    /// Clip length in seconds.
    fn duration(&self) -> f32;
    /// Current playhead position in seconds.
    fn time(&self) -> f32;
    /// Move the playhead.
    fn set_time(&mut self, time: f32);
    fn is_paused(&self) -> bool;
    fn set_paused(&mut self, paused: bool);
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    /// Return to the initial playback state.
    fn reset(&mut self);
    /// Schedule the handle for playback.
    fn play(&mut self);
}

/// Maps section scroll geometry to a playhead time.
#[derive(Clone, Copy, Debug)]
pub struct ScrollAnimationDriver {
    lead_in: f32,
}

impl Default for ScrollAnimationDriver {
    fn default() -> Self {
        Self {
            lead_in: DEFAULT_LEAD_IN,
        }
    }
}

impl ScrollAnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom lead-in fraction of the viewport height.
    pub fn with_lead_in(mut self, lead_in: f32) -> Self {
        self.lead_in = lead_in.max(0.0);
        self
    }

    pub fn lead_in(&self) -> f32 {
        self.lead_in
    }

    /// Distance below the viewport top at which the animation starts.
    pub fn scroll_start(&self, viewport_height: f32) -> f32 {
        viewport_height * self.lead_in
    }

    /// Normalized progress through the section, always in `[0, 1]`.
    pub fn progress(&self, state: ScrollState) -> f32 {
        let scroll_start = self.scroll_start(state.viewport_height);
        let adjusted_top = state.section_top - scroll_start;
        let span = state.section_height + scroll_start;

        // A degenerate span has no interior: the section is either ahead or past.
        if span <= 0.0 {
            return if adjusted_top < 0.0 { 1.0 } else { 0.0 };
        }

        let raw = -adjusted_top / span;
        if raw.is_nan() {
            return 0.0;
        }
        raw.clamp(0.0, 1.0)
    }

    /// Progress and playhead time for a clip of the given duration.
    pub fn map(&self, state: ScrollState, duration: f32) -> AnimationProgress {
        let progress = self.progress(state);
        AnimationProgress {
            progress,
            target_time: progress * duration.max(0.0),
        }
    }

    /// Scrub `handle` to match the current scroll geometry.
    ///
    /// Returns `None` without touching anything when either the section or
    /// the handle is absent. A paused handle, or one sitting exactly on its
    /// last frame, is re-armed before the time is set.
    pub fn drive<H>(
        &self,
        state: Option<ScrollState>,
        handle: Option<&mut H>,
    ) -> Option<AnimationProgress>
    where
        H: PlaybackHandle + ?Sized,
    {
        let (state, handle) = (state?, handle?);
        let duration = handle.duration();
        let mapped = self.map(state, duration);

        if handle.is_paused() || handle.time() == duration {
            handle.set_paused(false);
            handle.set_enabled(true);
            handle.reset();
            handle.play();
        }

        handle.set_time(mapped.target_time);
        Some(mapped)
    }
}
