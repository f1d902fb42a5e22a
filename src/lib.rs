//! # Vitrine
//!
//! **A scroll-driven 3D product showcase.**
//!
//! A window shows a vertically scrolling page. One section is a transparent
//! window onto a 3D model whose first animation clip is scrubbed by the scroll
//! position; other sections hold before/after image comparisons with a
//! draggable divider.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vitrine::ShowcaseConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ShowcaseConfig::load_or_default("vitrine.toml")?;
//!     vitrine::run(config)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Core pieces
//!
//! - [`ScrollAnimationDriver`] maps section geometry to a playhead time.
//! - [`SliderController`] and [`SliderDispatcher`] turn pointer input into
//!   reveal percentages.
//! - [`AssetLoader`] reads models in the background and reports
//!   [`LoadEvent`]s.
//!
//! None of these touch the GPU, so they can be driven from tests with plain
//! values.

mod animation;
mod app;
mod camera;
mod config;
mod dispatcher;
mod draw2d;
mod error;
mod geometry;
mod gpu;
mod import;
mod input;
mod lighting;
mod loader;
mod mesh;
mod mesh_pass;
mod page;
mod scene_graph;
mod scroll_driver;
mod slider;
mod texture;

pub use animation::{
    AnimationAction, AnimationClip, AnimationMixer, Channel, ChannelValues, Interpolation,
    PoseValue,
};
pub use app::run;
pub use camera::{ImportedCamera, PerspectiveCamera, ResizeParams};
pub use config::{
    CameraConfig, ModelConfig, RendererConfig, ScrollConfig, SectionConfig, ShowcaseConfig,
    ToneMapping, WindowConfig,
};
pub use dispatcher::{SliderDispatcher, SliderHost};
pub use draw2d::{Color, Draw2d, ImageId, clip_left, cover_uv};
pub use error::{AppError, ConfigError, GpuError, LoadError};
pub use geometry::{Aabb, RawGeometry, parse_stl, parse_stl_bytes};
pub use gpu::GpuContext;
pub use import::{LoadedScene, ModelFormat, Primitive, import_bytes};
pub use input::{InputAction, PointerAction, PointerId, PointerTracker, ScrollCommand};
pub use lighting::{Light, LightRig, LightUniforms};
pub use loader::{AssetLoader, LoadEvent, LoadHandle};
pub use mesh::{Material, Mesh, Transform, Vertex3d};
pub use mesh_pass::{DrawItem, GpuScene, MeshPass, collect_draws};
pub use page::{Page, Rect, Section, SectionKind};
pub use scene_graph::SceneGraph;
pub use scroll_driver::{
    AnimationProgress, DEFAULT_LEAD_IN, PlaybackHandle, ScrollAnimationDriver, ScrollState,
};
pub use slider::{
    ContainerId, DragPhase, INITIAL_PERCENTAGE, SliderController, SliderPresentation,
    SliderState, reveal_percentage,
};
pub use texture::{ImageData, Texture};

// Re-export math types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
