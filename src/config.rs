//! Showcase configuration.
//!
//! Everything tunable lives here and is read from a TOML file. Every field has
//! a default, so a partial file (or no file at all) still produces a working
//! showcase with the stock camera, light rig and page layout.
//!
//! ```toml
//! log_level = "debug"
//!
//! [model]
//! path = "assets/phone.glb"
//!
//! [[sections]]
//! kind = "showcase"
//! height = 1400
//!
//! [[sections]]
//! kind = "comparison"
//! height = 520
//! before = "assets/before.jpg"
//! after = "assets/after.jpg"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::lighting::Light;
use crate::scroll_driver::DEFAULT_LEAD_IN;

/// Top-level configuration, deserializable from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShowcaseConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default = "default_lights")]
    pub lights: Vec<Light>,
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionConfig>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            model: ModelConfig::default(),
            camera: CameraConfig::default(),
            renderer: RendererConfig::default(),
            scroll: ScrollConfig::default(),
            lights: default_lights(),
            sections: default_sections(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vitrine".to_string(),
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Play the clip on the frame clock instead of scrubbing it by scroll.
    pub autoplay: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/showcase.glb"),
            autoplay: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Multiplier on the fit-to-view distance when framing a loaded model.
    pub framing_margin: f32,
    /// Camera height above the model centre, as a fraction of its largest extent.
    pub elevation: f32,
    pub loaded_near: f32,
    pub loaded_far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 1.0, 5.0],
            framing_margin: 2.2,
            elevation: 0.3,
            loaded_near: 0.01,
            loaded_far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ToneMapping {
    None,
    #[default]
    Aces,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Upper bound on the device pixel ratio used for the 3D scene.
    pub max_pixel_ratio: f32,
    pub exposure: f32,
    pub tone_mapping: ToneMapping,
    /// Page background behind all sections (RGBA, 0..1).
    pub background: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            exposure: 1.2,
            tone_mapping: ToneMapping::Aces,
            background: [0.04, 0.04, 0.06, 1.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Fraction of the viewport height at which the animation starts.
    pub lead_in: f32,
    /// Pixels scrolled per mouse-wheel line.
    pub line_height: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            lead_in: DEFAULT_LEAD_IN,
            line_height: 40.0,
        }
    }
}

/// One section of the page, top to bottom.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SectionConfig {
    Hero {
        height: f32,
        #[serde(default = "hero_background")]
        background: [f32; 4],
    },
    Showcase {
        height: f32,
    },
    Comparison {
        height: f32,
        before: PathBuf,
        after: PathBuf,
        #[serde(default = "comparison_background")]
        background: [f32; 4],
    },
    Spacer {
        height: f32,
        #[serde(default = "spacer_background")]
        background: [f32; 4],
    },
}

impl SectionConfig {
    pub fn height(&self) -> f32 {
        match self {
            SectionConfig::Hero { height, .. }
            | SectionConfig::Showcase { height }
            | SectionConfig::Comparison { height, .. }
            | SectionConfig::Spacer { height, .. } => *height,
        }
    }

    /// Background colour; the showcase is transparent so the scene shows through.
    pub fn background(&self) -> [f32; 4] {
        match self {
            SectionConfig::Showcase { .. } => [0.0; 4],
            SectionConfig::Hero { background, .. }
            | SectionConfig::Comparison { background, .. }
            | SectionConfig::Spacer { background, .. } => *background,
        }
    }
}

fn hero_background() -> [f32; 4] {
    [0.07, 0.07, 0.1, 1.0]
}

fn comparison_background() -> [f32; 4] {
    [0.09, 0.09, 0.12, 1.0]
}

fn spacer_background() -> [f32; 4] {
    [0.05, 0.05, 0.07, 1.0]
}

fn default_lights() -> Vec<Light> {
    crate::lighting::LightRig::cinematic().lights
}

fn default_sections() -> Vec<SectionConfig> {
    vec![
        SectionConfig::Hero {
            height: 600.0,
            background: hero_background(),
        },
        SectionConfig::Showcase { height: 1200.0 },
        SectionConfig::Comparison {
            height: 500.0,
            before: PathBuf::from("assets/before.jpg"),
            after: PathBuf::from("assets/after.jpg"),
            background: comparison_background(),
        },
        SectionConfig::Spacer {
            height: 400.0,
            background: spacer_background(),
        },
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ShowcaseConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Config not found; using defaults");
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        info!(path = %path.display(), sections = config.sections.len(), "Using config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::Light;

    #[test]
    fn defaults_match_stock_showcase() {
        let config = ShowcaseConfig::default();
        assert_eq!(config.camera.fov, 45.0);
        assert_eq!(config.camera.position, [0.0, 1.0, 5.0]);
        assert_eq!(config.renderer.max_pixel_ratio, 2.0);
        assert_eq!(config.renderer.exposure, 1.2);
        assert_eq!(config.scroll.lead_in, 0.8);
        assert_eq!(config.lights.len(), 6);
        assert_eq!(config.sections.len(), 4);
        assert!(!config.model.autoplay);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ShowcaseConfig::from_toml_str("").unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.sections.len(), 4);
    }

    #[test]
    fn parses_sections_and_lights() {
        let config = ShowcaseConfig::from_toml_str(
            r#"
            log_level = "debug"

            [model]
            path = "phone.glb"
            autoplay = true

            [renderer]
            tone_mapping = "none"

            [[lights]]
            kind = "ambient"
            color = 0x404060
            intensity = 0.3

            [[sections]]
            kind = "showcase"
            height = 900

            [[sections]]
            kind = "comparison"
            height = 480
            before = "a.png"
            after = "b.png"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.model.path, PathBuf::from("phone.glb"));
        assert!(config.model.autoplay);
        assert_eq!(config.renderer.tone_mapping, ToneMapping::None);
        assert!(matches!(
            config.lights.as_slice(),
            [Light::Ambient { color: 0x404060, .. }]
        ));
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[0].background(), [0.0; 4]);
        assert_eq!(config.sections[1].height(), 480.0);
    }

    #[test]
    fn rejects_unknown_section_kind() {
        let result = ShowcaseConfig::from_toml_str(
            r#"
            [[sections]]
            kind = "carousel"
            height = 100
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("vitrine-config-that-does-not-exist.toml");
        let config = ShowcaseConfig::load_or_default(&path).unwrap();
        assert_eq!(config.window.title, "Vitrine");
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let path = std::env::temp_dir().join("vitrine-config-that-does-not-exist.toml");
        assert!(matches!(
            ShowcaseConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}
