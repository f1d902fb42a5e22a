//! Light rig for the showcase scene.
//!
//! The default [`LightRig::cinematic`] is a classic three-point setup (key,
//! fill, rim) plus a faint ambient term and two coloured accent point lights.
//! Lights are packed into [`LightUniforms`] for the mesh shader.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::ToneMapping;

/// Maximum number of non-ambient lights the mesh shader evaluates.
pub const MAX_LIGHTS: usize = 8;

/// A light source. Colours are `0xRRGGBB` in sRGB.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Light {
    /// Parallel light shining from `position` towards the origin.
    Directional {
        color: u32,
        intensity: f32,
        position: [f32; 3],
    },
    Ambient {
        color: u32,
        intensity: f32,
    },
    /// Omni light whose contribution fades to zero at `distance`
    /// (0 means unlimited range).
    Point {
        color: u32,
        intensity: f32,
        position: [f32; 3],
        distance: f32,
    },
}

/// Convert a packed sRGB hex colour to linear RGB.
pub fn hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(16), channel(8), channel(0))
}

/// GPU layout of a single light.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    /// xyz = direction towards the light (directional) or position (point);
    /// w = 0 for directional, 1 for point.
    pub position: [f32; 4],
    /// rgb = linear colour pre-multiplied by intensity; w = range (0 = none).
    pub color: [f32; 4],
}

/// Lighting block uploaded once per frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    pub lights: [GpuLight; MAX_LIGHTS],
    /// rgb = ambient colour times intensity.
    pub ambient: [f32; 4],
    /// x = light count, y = exposure, z = tone mapping (0 none, 1 ACES).
    pub params: [f32; 4],
}

/// A collection of lights.
#[derive(Clone, Debug, Default)]
pub struct LightRig {
    pub lights: Vec<Light>,
}

impl LightRig {
    pub fn new(lights: Vec<Light>) -> Self {
        Self { lights }
    }

    /// Key, fill, rim, ambient and two accent lights.
    pub fn cinematic() -> Self {
        Self::new(vec![
            // key: bright, from upper front right
            Light::Directional {
                color: 0xffffff,
                intensity: 1.5,
                position: [5.0, 8.0, 5.0],
            },
            // fill: softer and cooler, from the left
            Light::Directional {
                color: 0xb3d9ff,
                intensity: 0.6,
                position: [-5.0, 3.0, 2.0],
            },
            // rim: edge light from behind
            Light::Directional {
                color: 0x9d6fff,
                intensity: 0.8,
                position: [-3.0, 4.0, -8.0],
            },
            Light::Ambient {
                color: 0x404060,
                intensity: 0.3,
            },
            Light::Point {
                color: 0xff6b9d,
                intensity: 0.5,
                position: [3.0, 2.0, -2.0],
                distance: 10.0,
            },
            Light::Point {
                color: 0x6b9dff,
                intensity: 0.4,
                position: [-2.0, 1.0, 3.0],
                distance: 10.0,
            },
        ])
    }

    /// Pack the rig for the GPU. Lights beyond [`MAX_LIGHTS`] are dropped and
    /// ambient lights are summed.
    pub fn uniforms(&self, exposure: f32, tone_mapping: ToneMapping) -> LightUniforms {
        let mut lights = [GpuLight::default(); MAX_LIGHTS];
        let mut ambient = Vec3::ZERO;
        let mut count = 0;
        let mut dropped = 0;

        for light in &self.lights {
            let packed = match *light {
                Light::Ambient { color, intensity } => {
                    ambient += hex_to_linear(color) * intensity;
                    continue;
                }
                Light::Directional {
                    color,
                    intensity,
                    position,
                } => GpuLight {
                    position: Vec3::from(position).normalize_or(Vec3::Y).extend(0.0).into(),
                    color: (hex_to_linear(color) * intensity).extend(0.0).into(),
                },
                Light::Point {
                    color,
                    intensity,
                    position,
                    distance,
                } => GpuLight {
                    position: Vec3::from(position).extend(1.0).into(),
                    color: (hex_to_linear(color) * intensity)
                        .extend(distance.max(0.0))
                        .into(),
                },
            };

            if count == MAX_LIGHTS {
                dropped += 1;
                continue;
            }
            lights[count] = packed;
            count += 1;
        }

        if dropped > 0 {
            tracing::warn!(
                max = MAX_LIGHTS,
                dropped,
                "Light rig exceeds shader limit; extra lights ignored"
            );
        }

        let tone = match tone_mapping {
            ToneMapping::None => 0.0,
            ToneMapping::Aces => 1.0,
        };

        LightUniforms {
            lights,
            ambient: ambient.extend(0.0).into(),
            params: [count as f32, exposure, tone, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hex_conversion_is_linear() {
        assert_eq!(hex_to_linear(0xffffff), Vec3::ONE);
        assert_eq!(hex_to_linear(0x000000), Vec3::ZERO);
        // sRGB mid-grey is about 0.216 linear
        assert_relative_eq!(hex_to_linear(0x808080).x, 0.2158605, epsilon = 1e-4);
    }

    #[test]
    fn cinematic_rig_packs_five_lights_and_ambient() {
        let uniforms = LightRig::cinematic().uniforms(1.2, ToneMapping::Aces);
        assert_eq!(uniforms.params[0], 5.0);
        assert_eq!(uniforms.params[1], 1.2);
        assert_eq!(uniforms.params[2], 1.0);
        assert!(uniforms.ambient[2] > uniforms.ambient[0]);

        // key light points from (5, 8, 5) with full white intensity 1.5
        let key = uniforms.lights[0];
        assert_eq!(key.position[3], 0.0);
        assert_relative_eq!(key.color[0], 1.5);
        let dir = Vec3::new(key.position[0], key.position[1], key.position[2]);
        assert_relative_eq!(dir.length(), 1.0, epsilon = 1e-6);

        // accent lights keep their range
        assert_eq!(uniforms.lights[3].position[3], 1.0);
        assert_eq!(uniforms.lights[3].color[3], 10.0);
    }

    #[test]
    fn excess_lights_are_dropped() {
        let rig = LightRig::new(vec![
            Light::Point {
                color: 0xffffff,
                intensity: 1.0,
                position: [0.0; 3],
                distance: 0.0,
            };
            MAX_LIGHTS + 3
        ]);
        let uniforms = rig.uniforms(1.0, ToneMapping::None);
        assert_eq!(uniforms.params[0], MAX_LIGHTS as f32);
        assert_eq!(uniforms.params[2], 0.0);
    }

    #[test]
    fn ambient_after_excess_lights_is_still_summed() {
        let mut lights = vec![
            Light::Point {
                color: 0xffffff,
                intensity: 1.0,
                position: [0.0; 3],
                distance: 0.0,
            };
            MAX_LIGHTS + 1
        ];
        lights.push(Light::Ambient {
            color: 0xffffff,
            intensity: 0.5,
        });

        let uniforms = LightRig::new(lights).uniforms(1.0, ToneMapping::None);
        assert_eq!(uniforms.params[0], MAX_LIGHTS as f32);
        assert_relative_eq!(uniforms.ambient[0], 0.5);
        assert_relative_eq!(uniforms.ambient[1], 0.5);
        assert_relative_eq!(uniforms.ambient[2], 0.5);
    }
}
