//! Keyframe animation clips and playback.
//!
//! An [`AnimationClip`] is a set of channels, each animating the translation,
//! rotation or scale of one scene node. An [`AnimationAction`] plays a clip
//! and implements [`PlaybackHandle`] so the scroll driver can scrub it. The
//! [`AnimationMixer`] owns the actions and writes the sampled pose into the
//! [`SceneGraph`].
//!
//! # Playback semantics
//!
//! Actions play once and clamp when finished. Setting the time restarts the action at zero and advances it by the requested
//! amount, but only while it is running, enabled and not paused. Reaching the
//! end clamps the time to the clip duration and pauses the action, which is
//! why the scroll driver re-arms paused actions before scrubbing.

use glam::{Quat, Vec3};

use crate::scene_graph::SceneGraph;
use crate::scroll_driver::PlaybackHandle;

/// Keyframe interpolation mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
    /// Hermite spline; each keyframe stores in-tangent, value, out-tangent.
    CubicSpline,
}

/// Keyframe values for one animated property.
#[derive(Clone, Debug)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// A sampled property value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PoseValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// Animates one property of one node.
#[derive(Clone, Debug)]
pub struct Channel {
    /// Import index of the target node.
    pub target: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

impl Channel {
    /// Evaluate the channel at `time`. Times outside the keyframe range hold
    /// the first or last key.
    pub fn sample(&self, time: f32) -> Option<PoseValue> {
        let stride = match self.interpolation {
            Interpolation::CubicSpline => 3,
            _ => 1,
        };
        let key_count = self.times.len();
        if key_count == 0 {
            return None;
        }

        let (i0, i1, t) = keyframe_span(&self.times, time);
        let dt = self.times[i1] - self.times[i0];

        Some(match &self.values {
            ChannelValues::Translation(values) => {
                PoseValue::Translation(self.interpolate_vec3(values, stride, i0, i1, t, dt)?)
            }
            ChannelValues::Scale(values) => {
                PoseValue::Scale(self.interpolate_vec3(values, stride, i0, i1, t, dt)?)
            }
            ChannelValues::Rotation(values) => {
                let q = match self.interpolation {
                    Interpolation::Step => *values.get(i0)?,
                    Interpolation::Linear => values.get(i0)?.slerp(*values.get(i1)?, t),
                    Interpolation::CubicSpline => {
                        let p0 = *values.get(i0 * 3 + 1)?;
                        let m0 = *values.get(i0 * 3 + 2)?;
                        let m1 = *values.get(i1 * 3)?;
                        let p1 = *values.get(i1 * 3 + 1)?;
                        let v = hermite(
                            glam::Vec4::from(p0),
                            glam::Vec4::from(m0) * dt,
                            glam::Vec4::from(m1) * dt,
                            glam::Vec4::from(p1),
                            t,
                        );
                        Quat::from_vec4(v)
                    }
                };
                PoseValue::Rotation(q.normalize())
            }
        })
    }

    fn interpolate_vec3(
        &self,
        values: &[Vec3],
        stride: usize,
        i0: usize,
        i1: usize,
        t: f32,
        dt: f32,
    ) -> Option<Vec3> {
        match self.interpolation {
            Interpolation::Step => values.get(i0 * stride).copied(),
            Interpolation::Linear => Some(values.get(i0)?.lerp(*values.get(i1)?, t)),
            Interpolation::CubicSpline => {
                let p0 = *values.get(i0 * 3 + 1)?;
                let m0 = *values.get(i0 * 3 + 2)? * dt;
                let m1 = *values.get(i1 * 3)? * dt;
                let p1 = *values.get(i1 * 3 + 1)?;
                Some(hermite(p0, m0, m1, p1, t))
            }
        }
    }
}

/// Locate the keyframes around `time`; returns `(i0, i1, t)` with `t` the
/// normalized position between them.
fn keyframe_span(times: &[f32], time: f32) -> (usize, usize, f32) {
    let last = times.len() - 1;
    if time <= times[0] {
        return (0, 0, 0.0);
    }
    if time >= times[last] {
        return (last, last, 0.0);
    }
    let i1 = times.partition_point(|&k| k <= time).min(last);
    let i0 = i1 - 1;
    let span = times[i1] - times[i0];
    let t = if span > 0.0 {
        (time - times[i0]) / span
    } else {
        0.0
    };
    (i0, i1, t)
}

fn hermite<T>(p0: T, m0: T, m1: T, p1: T, t: f32) -> T
where
    T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    p0 * (2.0 * t3 - 3.0 * t2 + 1.0)
        + m0 * (t3 - 2.0 * t2 + t)
        + p1 * (-2.0 * t3 + 3.0 * t2)
        + m1 * (t3 - t2)
}

/// A named, fixed-duration set of channels.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    /// Create a clip whose duration is the latest keyframe time.
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    /// Sample every channel at `time`.
    pub fn sample(&self, time: f32) -> impl Iterator<Item = (usize, PoseValue)> + '_ {
        self.channels
            .iter()
            .filter_map(move |c| c.sample(time).map(|v| (c.target, v)))
    }
}

/// Playback state of one clip.
#[derive(Clone, Debug)]
pub struct AnimationAction {
    clip: AnimationClip,
    time: f32,
    paused: bool,
    enabled: bool,
    running: bool,
}

impl AnimationAction {
    pub fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            paused: false,
            enabled: true,
            running: false,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the action currently contributes to the pose.
    pub fn is_active(&self) -> bool {
        self.running && self.enabled
    }

    /// Advance the playhead by `dt` seconds. Reaching the end clamps to the
    /// clip duration and pauses.
    pub fn advance(&mut self, dt: f32) {
        if !self.running || !self.enabled || self.paused {
            return;
        }
        let duration = self.clip.duration;
        let time = self.time + dt;

        if time >= duration {
            self.time = duration;
            self.paused = true;
        } else {
            self.time = time.max(0.0);
        }
    }
}

impl PlaybackHandle for AnimationAction {
    fn duration(&self) -> f32 {
        self.clip.duration
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn set_time(&mut self, time: f32) {
        self.time = 0.0;
        self.advance(time);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn reset(&mut self) {
        self.enabled = true;
        self.paused = false;
        self.time = 0.0;
    }

    fn play(&mut self) {
        self.running = true;
    }
}

/// Owns the actions of a scene and applies their pose.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self {
            actions: clips.into_iter().map(AnimationAction::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The action for clip `index`.
    pub fn clip_action(&mut self, index: usize) -> Option<&mut AnimationAction> {
        self.actions.get_mut(index)
    }

    /// Advance every action on the frame clock.
    pub fn update(&mut self, dt: f32) {
        for action in &mut self.actions {
            action.advance(dt);
        }
    }

    /// Write the current pose of all active actions into `graph`.
    pub fn apply(&self, graph: &mut SceneGraph) {
        for action in self.actions.iter().filter(|a| a.is_active()) {
            for (node, value) in action.clip.sample(action.time) {
                match value {
                    PoseValue::Translation(v) => graph.set_translation(node, v),
                    PoseValue::Rotation(q) => graph.set_rotation(node, q),
                    PoseValue::Scale(s) => graph.set_scale(node, s),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slide_clip() -> AnimationClip {
        AnimationClip::new(
            "slide",
            vec![Channel {
                target: 0,
                times: vec![0.0, 1.0, 2.0],
                values: ChannelValues::Translation(vec![
                    Vec3::ZERO,
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(1.0, 2.0, 0.0),
                ]),
                interpolation: Interpolation::Linear,
            }],
        )
    }

    fn playing(clip: AnimationClip) -> AnimationAction {
        let mut action = AnimationAction::new(clip);
        action.play();
        action
    }

    #[test]
    fn duration_is_last_keyframe() {
        assert_eq!(slide_clip().duration, 2.0);
    }

    #[test]
    fn linear_sampling_interpolates_between_keys() {
        let clip = slide_clip();
        let (_, value) = clip.sample(1.5).next().unwrap();
        assert_eq!(value, PoseValue::Translation(Vec3::new(1.0, 1.0, 0.0)));

        let (_, before) = clip.sample(-3.0).next().unwrap();
        assert_eq!(before, PoseValue::Translation(Vec3::ZERO));
        let (_, after) = clip.sample(9.0).next().unwrap();
        assert_eq!(after, PoseValue::Translation(Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn step_sampling_holds_previous_key() {
        let channel = Channel {
            target: 3,
            times: vec![0.0, 1.0],
            values: ChannelValues::Scale(vec![Vec3::ONE, Vec3::splat(2.0)]),
            interpolation: Interpolation::Step,
        };
        assert_eq!(channel.sample(0.99), Some(PoseValue::Scale(Vec3::ONE)));
        assert_eq!(channel.sample(1.0), Some(PoseValue::Scale(Vec3::splat(2.0))));
    }

    #[test]
    fn rotation_is_slerped() {
        let channel = Channel {
            target: 0,
            times: vec![0.0, 1.0],
            values: ChannelValues::Rotation(vec![
                Quat::IDENTITY,
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ]),
            interpolation: Interpolation::Linear,
        };
        let Some(PoseValue::Rotation(q)) = channel.sample(0.5) else {
            panic!("expected rotation");
        };
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert_relative_eq!(q.angle_between(expected), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn cubic_spline_passes_through_keys() {
        let channel = Channel {
            target: 0,
            times: vec![0.0, 1.0],
            values: ChannelValues::Translation(vec![
                Vec3::ZERO,
                Vec3::ZERO,
                Vec3::ZERO,
                Vec3::ZERO,
                Vec3::X,
                Vec3::ZERO,
            ]),
            interpolation: Interpolation::CubicSpline,
        };
        assert_eq!(channel.sample(0.0), Some(PoseValue::Translation(Vec3::ZERO)));
        assert_eq!(channel.sample(1.0), Some(PoseValue::Translation(Vec3::X)));
        let Some(PoseValue::Translation(mid)) = channel.sample(0.5) else {
            panic!("expected translation");
        };
        assert_relative_eq!(mid.x, 0.5);
    }

    #[test]
    fn set_time_scrubs_running_action() {
        let mut action = playing(slide_clip());
        action.set_time(0.75);
        assert_relative_eq!(action.time(), 0.75);
        action.set_time(0.25);
        assert_relative_eq!(action.time(), 0.25);
    }

    #[test]
    fn reaching_the_end_clamps_and_pauses() {
        let mut action = playing(slide_clip());
        action.set_time(5.0);
        assert_eq!(action.time(), 2.0);
        assert!(action.is_paused());

        // A paused action ignores further scrubbing until re-armed.
        action.set_time(1.0);
        assert_eq!(action.time(), 0.0);
    }

    #[test]
    fn idle_action_does_not_advance() {
        let mut action = AnimationAction::new(slide_clip());
        action.set_time(1.0);
        assert_eq!(action.time(), 0.0);
    }

    #[test]
    fn scroll_driver_rearms_finished_action() {
        use crate::scroll_driver::{ScrollAnimationDriver, ScrollState};

        let mut action = playing(slide_clip());
        action.set_time(2.0);
        assert!(action.is_paused());
        assert_eq!(action.time(), action.duration());

        let driver = ScrollAnimationDriver::new();
        driver.drive(Some(ScrollState::new(120.0, 400.0, 800.0)), Some(&mut action));

        assert!(!action.is_paused());
        assert!(action.is_enabled());
        assert_relative_eq!(action.time(), 1.0);
    }

    #[test]
    fn mixer_applies_pose_to_graph() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn_node("slider", crate::mesh::Transform::new(), None);
        assert_eq!(node, 0);

        let mut mixer = AnimationMixer::new(vec![slide_clip()]);
        let action = mixer.clip_action(0).unwrap();
        action.play();
        action.set_time(1.0);
        mixer.apply(&mut graph);

        let world = graph.world_matrix(0).unwrap();
        assert_relative_eq!(world.w_axis.x, 1.0);
    }
}
