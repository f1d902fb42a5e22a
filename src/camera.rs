//! Perspective camera, model framing and resize parameters.

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;
use crate::geometry::Aabb;

/// A perspective camera looking at a target point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1.0)
    }
}

impl PerspectiveCamera {
    /// The initial camera before any model is loaded.
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from(config.position),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: config.fov,
            near: config.near,
            far: config.far,
            aspect,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Frame `bounds` from the front, slightly above centre.
    ///
    /// The distance fits the largest extent into the vertical field of view
    /// and is then widened by `framing_margin`.
    pub fn frame_bounds(&mut self, bounds: Aabb, config: &CameraConfig) {
        if bounds.is_empty() {
            return;
        }
        let center = bounds.center();
        let max_dim = bounds.max_dim();
        let half_fov = (self.fov.to_radians() / 2.0).tan();
        let distance = if half_fov > 0.0 {
            (max_dim / 2.0 / half_fov).abs() * config.framing_margin
        } else {
            max_dim * config.framing_margin
        };

        self.position = Vec3::new(
            center.x,
            center.y + max_dim * config.elevation,
            center.z + distance,
        );
        self.look_at(center);
    }

    /// Adopt a camera exported with the model.
    pub fn adopt(&mut self, imported: &ImportedCamera) {
        self.position = imported.world.transform_point3(Vec3::ZERO);
        let forward = imported.world.transform_vector3(Vec3::NEG_Z).normalize_or(Vec3::NEG_Z);
        self.up = imported.world.transform_vector3(Vec3::Y).normalize_or(Vec3::Y);
        self.target = self.position + forward;
        self.fov = imported.yfov.to_degrees();
        self.near = imported.znear;
        if let Some(far) = imported.zfar {
            self.far = far;
        }
    }

    /// Camera placement after a model has loaded: the file's first camera if
    /// it has one, otherwise a framing of its bounds. Clip planes are then
    /// widened for close-up detail.
    pub fn place_for_model(
        &mut self,
        cameras: &[ImportedCamera],
        bounds: Aabb,
        config: &CameraConfig,
    ) {
        match cameras.first() {
            Some(imported) => {
                tracing::info!(name = imported.name.as_deref().unwrap_or("<unnamed>"), "Using exported camera");
                self.adopt(imported);
            }
            None => self.frame_bounds(bounds, config),
        }
        self.near = config.loaded_near;
        self.far = config.loaded_far;
    }
}

/// A perspective camera found in a model file, with its world placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedCamera {
    pub name: Option<String>,
    pub world: Mat4,
    /// Vertical field of view in radians.
    pub yfov: f32,
    pub znear: f32,
    pub zfar: Option<f32>,
}

/// Everything derived from the window size on resize.
///
/// A pure function of its inputs, so recomputing with unchanged dimensions
/// yields identical results.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeParams {
    pub aspect: f32,
    pub pixel_ratio: f32,
    /// Size of the surface in physical pixels.
    pub surface_width: u32,
    pub surface_height: u32,
    /// Size of the 3D render target in pixels, after capping the pixel ratio.
    pub scene_width: u32,
    pub scene_height: u32,
}

impl ResizeParams {
    /// Returns `None` for zero-sized (minimised) windows.
    pub fn compute(
        logical_width: f32,
        logical_height: f32,
        scale_factor: f32,
        max_pixel_ratio: f32,
    ) -> Option<Self> {
        if !(logical_width >= 1.0 && logical_height >= 1.0) {
            return None;
        }
        let scale_factor = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        let pixel_ratio = scale_factor.min(max_pixel_ratio.max(0.1));
        let to_pixels = |logical: f32, ratio: f32| ((logical * ratio).round() as u32).max(1);

        Some(Self {
            aspect: logical_width / logical_height,
            pixel_ratio,
            surface_width: to_pixels(logical_width, scale_factor),
            surface_height: to_pixels(logical_height, scale_factor),
            scene_width: to_pixels(logical_width, pixel_ratio),
            scene_height: to_pixels(logical_height, pixel_ratio),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_camera_matches_config() {
        let camera = PerspectiveCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(camera.fov, 45.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn frames_bounds_from_front_and_above() {
        let config = CameraConfig::default();
        let mut camera = PerspectiveCamera::default();
        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));

        camera.place_for_model(&[], bounds, &config);

        let distance = (2.0 / 2.0 / (22.5f32).to_radians().tan()) * 2.2;
        assert_relative_eq!(camera.position.x, 0.0);
        assert_relative_eq!(camera.position.y, 1.0 + 2.0 * 0.3);
        assert_relative_eq!(camera.position.z, distance, epsilon = 1e-4);
        assert_eq!(camera.target, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.near, 0.01);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn exported_camera_wins_over_framing() {
        let config = CameraConfig::default();
        let mut camera = PerspectiveCamera::default();
        let imported = ImportedCamera {
            name: Some("Shot".into()),
            world: Mat4::from_translation(Vec3::new(0.0, 3.0, 10.0)),
            yfov: 0.5,
            znear: 0.5,
            zfar: Some(50.0),
        };

        camera.place_for_model(&[imported], Aabb::new(Vec3::ZERO, Vec3::ONE), &config);

        assert_relative_eq!(camera.position.y, 3.0);
        assert_relative_eq!(camera.target.z, 9.0);
        assert_relative_eq!(camera.fov, 0.5f32.to_degrees());
        // clip planes still follow the loaded-model settings
        assert_eq!(camera.near, 0.01);
    }

    #[test]
    fn resize_is_idempotent() {
        let first = ResizeParams::compute(1280.0, 800.0, 1.5, 2.0).unwrap();
        let second = ResizeParams::compute(1280.0, 800.0, 1.5, 2.0).unwrap();
        assert_eq!(first, second);

        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(first.aspect);
        let projection = camera.projection_matrix();
        camera.set_aspect(second.aspect);
        assert_eq!(camera.projection_matrix(), projection);
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let params = ResizeParams::compute(1000.0, 500.0, 3.0, 2.0).unwrap();
        assert_eq!(params.pixel_ratio, 2.0);
        assert_eq!((params.surface_width, params.surface_height), (3000, 1500));
        assert_eq!((params.scene_width, params.scene_height), (2000, 1000));
        assert_eq!(params.aspect, 2.0);
    }

    #[test]
    fn zero_sized_window_is_ignored() {
        assert!(ResizeParams::compute(0.0, 800.0, 1.0, 2.0).is_none());
        assert!(ResizeParams::compute(800.0, 0.0, 1.0, 2.0).is_none());
    }

    #[test]
    fn invalid_aspect_is_rejected() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 1.0);
    }
}
