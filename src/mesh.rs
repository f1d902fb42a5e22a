//! Mesh vertices, GPU meshes, materials and node transforms.
//!
//! Everything an imported model needs between parsing and drawing:
//!
//! - [`Vertex3d`]: the vertex format shared by every mesh and `mesh.wgsl`
//! - [`Mesh`]: GPU-resident vertex and index buffers
//! - [`Material`]: surface parameters, with the showcase fix-ups applied at import
//! - [`Transform`]: translation, rotation and scale of a scene node
//!
//! # Transforms
//!
//! [`Transform`] uses a builder pattern:
//!
//! ```
//! use vitrine::{Quat, Transform, Vec3};
//!
//! let transform = Transform::new()
//!     .position(Vec3::new(0.0, 2.0, -5.0))
//!     .rotation(Quat::from_rotation_y(0.5))
//!     .uniform_scale(2.0);
//!
//! // The origin only moves by the translation.
//! let origin = transform.matrix().transform_point3(Vec3::ZERO);
//! assert_eq!(origin, Vec3::new(0.0, 2.0, -5.0));
//! ```
//!
//! # Vertex Layout
//!
//! The [`Vertex3d`] struct uses the following GPU layout (32 bytes per vertex):
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//!
//! This layout is exposed via [`Vertex3d::LAYOUT`] for pipeline creation.

use glam::{Mat4, Quat, Vec3};

use crate::gpu::GpuContext;

/// A vertex with position, normal and texture coordinates.
///
/// `#[repr(C)]` with [`bytemuck::Pod`] so vertex slices can be uploaded as
/// bytes without copying. Each vertex occupies 32 bytes.
///
/// Imported geometry always fills all three attributes: missing normals are
/// recomputed and missing UVs are zero.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// GPU-resident geometry with vertex and index buffers.
///
/// Indices are always `u32`. A mesh does not know its material or placement;
/// the draw list pairs it with both each frame.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Upload vertex and index data. An empty mesh is valid and draws nothing.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// Surface parameters of an imported primitive.
///
/// Texture fields index into the scene's decoded images. Defaults match the
/// glTF metallic-roughness defaults.
///
/// ```
/// use vitrine::Material;
///
/// let mut material = Material {
///     base_color_texture: Some(0),
///     ..Default::default()
/// };
/// material.apply_showcase_fixups();
///
/// assert_eq!(material.base_color, [1.0, 1.0, 1.0, 1.0]);
/// assert_eq!(material.roughness, 0.4);
/// assert!(material.double_sided);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGBA.
    pub base_color: [f32; 4],
    pub base_color_texture: Option<usize>,
    pub metalness: f32,
    pub roughness: f32,
    /// Linear RGB.
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub emissive_texture: Option<usize>,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0; 4],
            base_color_texture: None,
            metalness: 1.0,
            roughness: 1.0,
            emissive: [0.0; 3],
            emissive_intensity: 1.0,
            emissive_texture: None,
            double_sided: false,
        }
    }
}

impl Material {
    /// Emissive colour applied to textured surfaces (sRGB 0x111111).
    pub const TEXTURED_EMISSIVE: [f32; 3] = [0.005_605, 0.005_605, 0.005_605];

    /// Showcase look: textured surfaces render matte-ish and unlit-dark areas
    /// keep a faint glow so baked textures read well under the light rig.
    pub fn apply_showcase_fixups(&mut self) {
        if self.base_color_texture.is_some() {
            self.base_color = [1.0, 1.0, 1.0, self.base_color[3]];
            self.metalness = 0.0;
            self.roughness = 0.4;
            self.emissive = Self::TEXTURED_EMISSIVE;
            self.emissive_intensity = 0.2;
        }
        if self.emissive_texture.is_some() {
            self.emissive_intensity = 1.0;
        }
        self.double_sided = true;
    }

    /// Pack for the material bind group. The emissive colour is pre-scaled
    /// by its intensity.
    pub fn uniforms(&self) -> MaterialUniforms {
        let e = Vec3::from(self.emissive) * self.emissive_intensity;
        MaterialUniforms {
            base_color: self.base_color,
            emissive: e.extend(0.0).into(),
            params: [
                self.metalness,
                self.roughness,
                if self.base_color_texture.is_some() { 1.0 } else { 0.0 },
                if self.emissive_texture.is_some() { 1.0 } else { 0.0 },
            ],
        }
    }
}

/// GPU layout of a [`Material`].
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
    /// rgb = emissive colour times intensity.
    pub emissive: [f32; 4],
    /// x = metalness, y = roughness, z = has base texture, w = has emissive texture.
    pub params: [f32; 4],
}

/// Position, rotation and scale of a scene node.
///
/// Converted to a matrix in SRT order: scale, then rotate, then translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}
