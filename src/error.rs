//! Error types for configuration, asset loading and GPU setup.
//!
//! Only start-up failures are fatal. A failed model load is reported through
//! [`LoadEvent::Failure`](crate::LoadEvent::Failure) and leaves the showcase
//! running without a model.

use std::path::PathBuf;

/// Errors raised while reading the showcase configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors that can occur when loading a model.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File format could not be determined from extension.
    #[error("unknown model format: '{0}'")]
    UnknownFormat(String),
    #[error("STL parse error: {0}")]
    Stl(String),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    /// The file parsed but contained no drawable geometry.
    #[error("model contains no meshes")]
    EmptyScene,
    /// The worker thread went away without reporting an outcome.
    #[error("loader thread exited before finishing")]
    Disconnected,
}

/// Errors raised while creating the GPU context.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Fatal errors that stop the showcase.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
}
