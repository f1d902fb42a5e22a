//! 3D scene rendering with depth testing, lighting and offscreen compositing.
//!
//! [`MeshPass`] renders the loaded model into its own colour target sized by
//! [`ResizeParams`], cleared to transparent, and then composites that target
//! over whatever is already in the frame with premultiplied-alpha blending.
//! Page sections drawn afterwards with [`Draw2d`](crate::Draw2d) cover the
//! scene everywhere except the transparent showcase section.
//!
//! # Bind groups
//!
//! - **Group 0**: camera uniforms and the light rig
//! - **Group 1**: per-draw model uniforms, one dynamic-offset buffer for the frame
//! - **Group 2**: material uniforms, base colour texture and emissive texture
//!
//! # Frame
//!
//! ```ignore
//! mesh_pass.ensure_target_size(&gpu, &params);
//! let draws = collect_draws(&loaded.graph);
//! mesh_pass.prepare(&gpu, &camera, &lights, &draws);
//! mesh_pass.render_scene(&mut encoder, Some(&gpu_scene), &draws);
//! // ... in the surface pass:
//! mesh_pass.composite(&mut render_pass);
//! ```

use glam::Mat4;
use tracing::debug;

use crate::camera::{PerspectiveCamera, ResizeParams};
use crate::gpu::GpuContext;
use crate::import::LoadedScene;
use crate::lighting::LightUniforms;
use crate::mesh::{Mesh, Vertex3d};
use crate::scene_graph::SceneGraph;
use crate::texture::Texture;

/// Camera uniforms for 3D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = camera position in world space.
    pub camera_pos: [f32; 4],
}

/// Per-draw model uniforms.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    /// Object to world transformation.
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals under non-uniform scale.
    pub normal_matrix: [[f32; 4]; 4],
}

impl ModelUniforms {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

/// Format of the offscreen scene target.
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Round `size` up to the next multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// One primitive to draw, with its world matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    /// Index into the scene's primitives.
    pub primitive: usize,
    pub world: Mat4,
}

/// Flatten the scene graph into draw items in node order.
pub fn collect_draws(graph: &SceneGraph) -> Vec<DrawItem> {
    graph
        .mesh_instances()
        .into_iter()
        .flat_map(|(_, instance, world)| {
            instance
                .primitives
                .into_iter()
                .map(move |primitive| DrawItem { primitive, world })
        })
        .collect()
}

/// GPU copy of a [`LoadedScene`]'s meshes, materials and textures.
pub struct GpuScene {
    meshes: Vec<(Mesh, usize)>,
    material_bind_groups: Vec<wgpu::BindGroup>,
    _material_buffers: Vec<wgpu::Buffer>,
    _textures: Vec<Texture>,
}

impl GpuScene {
    pub fn primitive_count(&self) -> usize {
        self.meshes.len()
    }
}

/// Colour and depth attachments the scene renders into.
struct SceneTarget {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

/// Renders the model offscreen and composites it into the frame.
///
/// - Depth testing with a 32-bit float depth buffer
/// - No face culling, since showcase materials are double-sided
/// - Alpha blending within the scene, premultiplied blending on composite
pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_bind_group_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: u64,
    model_capacity: usize,
    material_bind_group_layout: wgpu::BindGroupLayout,
    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    default_texture: Texture,
    target: SceneTarget,
}

impl MeshPass {
    /// Creates the pipelines, uniform buffers and an initial target matching
    /// the surface size.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        // Camera and light uniform buffers (group 0)
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Uniforms"),
            size: std::mem::size_of::<LightUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding: u32, dynamic: bool, min_size: Option<u64>| {
            wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: dynamic,
                    min_binding_size: min_size.and_then(wgpu::BufferSize::new),
                },
                count: None,
            }
        };
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[uniform_entry(0, false, None), uniform_entry(1, false, None)],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        // Model uniforms (group 1), one slot per draw
        let model_size = std::mem::size_of::<ModelUniforms>() as u64;
        let model_stride = aligned_stride(
            model_size,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Model Bind Group Layout"),
                entries: &[uniform_entry(0, true, Some(model_size))],
            });
        let model_capacity = 64;
        let (model_buffer, model_bind_group) =
            Self::create_model_buffer(gpu, &model_bind_group_layout, model_stride, model_capacity);

        // Material (group 2)
        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Material Bind Group Layout"),
                entries: &[
                    uniform_entry(0, false, None),
                    texture_entry(1),
                    sampler_entry(2),
                    texture_entry(3),
                    sampler_entry(4),
                ],
            });

        let default_texture = Texture::white(gpu);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                &model_bind_group_layout,
                &material_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        // Blit pipeline for compositing the scene target into the frame
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[texture_entry(0), sampler_entry(1)],
            });

        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&blit_bind_group_layout],
            push_constant_ranges: &[],
        });

        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SCENE_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let target = Self::create_target(
            gpu,
            &blit_bind_group_layout,
            &blit_sampler,
            (gpu.width(), gpu.height()),
        );

        Self {
            pipeline,
            camera_buffer,
            light_buffer,
            camera_bind_group,
            model_bind_group_layout,
            model_buffer,
            model_bind_group,
            model_stride,
            model_capacity,
            material_bind_group_layout,
            blit_pipeline,
            blit_bind_group_layout,
            blit_sampler,
            default_texture,
            target,
        }
    }

    fn create_model_buffer(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_target(
        gpu: &GpuContext,
        blit_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: (u32, u32),
    ) -> SceneTarget {
        let extent = wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        };
        let color = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Color Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCENE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let blit_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Blit Bind Group"),
            layout: blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        SceneTarget {
            color_view,
            depth_view,
            blit_bind_group,
            size: (extent.width, extent.height),
        }
    }

    /// Size of the offscreen target in pixels.
    pub fn target_size(&self) -> (u32, u32) {
        self.target.size
    }

    /// Resize the offscreen target. Unchanged sizes are a no-op.
    pub fn ensure_target_size(&mut self, gpu: &GpuContext, params: &ResizeParams) {
        let size = (params.scene_width.max(1), params.scene_height.max(1));
        if self.target.size == size {
            return;
        }
        debug!(width = size.0, height = size.1, "Resizing scene target");
        self.target =
            Self::create_target(gpu, &self.blit_bind_group_layout, &self.blit_sampler, size);
    }

    /// Upload a loaded model's geometry, materials and textures.
    pub fn upload_scene(&self, gpu: &GpuContext, scene: &LoadedScene) -> GpuScene {
        use wgpu::util::DeviceExt;

        let textures: Vec<Texture> = scene
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| Texture::from_image(gpu, image, &format!("Model Texture {i}")))
            .collect();

        let mut material_buffers = Vec::with_capacity(scene.materials.len());
        let mut material_bind_groups = Vec::with_capacity(scene.materials.len());
        for material in &scene.materials {
            let buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Material Uniforms"),
                    contents: bytemuck::cast_slice(&[material.uniforms()]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            let texture_or_white = |index: Option<usize>| {
                index
                    .and_then(|i| textures.get(i))
                    .unwrap_or(&self.default_texture)
            };
            let base = texture_or_white(material.base_color_texture);
            let emissive = texture_or_white(material.emissive_texture);

            let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Material Bind Group"),
                layout: &self.material_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&base.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&base.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&emissive.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&emissive.sampler),
                    },
                ],
            });
            material_buffers.push(buffer);
            material_bind_groups.push(bind_group);
        }

        let meshes = scene
            .primitives
            .iter()
            .map(|p| (p.geometry.upload(gpu), p.material))
            .collect::<Vec<_>>();

        debug!(
            meshes = meshes.len(),
            materials = material_bind_groups.len(),
            textures = textures.len(),
            "Scene uploaded"
        );

        GpuScene {
            meshes,
            material_bind_groups,
            _material_buffers: material_buffers,
            _textures: textures,
        }
    }

    /// Write camera, light and per-draw model uniforms for this frame.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        camera: &PerspectiveCamera,
        lights: &LightUniforms,
        draws: &[DrawItem],
    ) {
        let camera_uniforms = CameraUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
        };
        gpu.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniforms]));
        gpu.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[*lights]));

        if draws.len() > self.model_capacity {
            self.model_capacity = draws.len().next_power_of_two();
            debug!(capacity = self.model_capacity, "Growing model uniform buffer");
            let (buffer, bind_group) = Self::create_model_buffer(
                gpu,
                &self.model_bind_group_layout,
                self.model_stride,
                self.model_capacity,
            );
            self.model_buffer = buffer;
            self.model_bind_group = bind_group;
        }

        let stride = self.model_stride as usize;
        let mut staging = vec![0u8; stride * draws.len()];
        for (slot, draw) in staging.chunks_exact_mut(stride).zip(draws) {
            let uniforms = ModelUniforms::new(draw.world);
            let bytes = bytemuck::bytes_of(&uniforms);
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        if !staging.is_empty() {
            gpu.queue.write_buffer(&self.model_buffer, 0, &staging);
        }
    }

    /// Render the scene into the offscreen target. Without a scene the
    /// target is only cleared.
    pub fn render_scene(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        scene: Option<&GpuScene>,
        draws: &[DrawItem],
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target.color_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(scene) = scene else {
            return;
        };

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        for (slot, draw) in draws.iter().enumerate().take(self.model_capacity) {
            let Some((mesh, material)) = scene.meshes.get(draw.primitive) else {
                continue;
            };
            let Some(material_bind_group) = scene.material_bind_groups.get(*material) else {
                continue;
            };
            let offset = (slot as u64 * self.model_stride) as u32;
            render_pass.set_bind_group(1, &self.model_bind_group, &[offset]);
            render_pass.set_bind_group(2, material_bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    /// Composite the scene target over the current render target.
    pub fn composite(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_pipeline(&self.blit_pipeline);
        render_pass.set_bind_group(0, &self.target.blit_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Aabb;
    use crate::mesh::Transform;
    use crate::scene_graph::MeshInstance;
    use glam::Vec3;

    #[test]
    fn model_slots_respect_offset_alignment() {
        let size = std::mem::size_of::<ModelUniforms>() as u64;
        assert_eq!(size, 128);
        assert_eq!(aligned_stride(size, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(300, 256), 512);
        assert_eq!(aligned_stride(size, 0), 128);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let uniforms = ModelUniforms::new(Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        assert_eq!(uniforms.normal_matrix[0][0], 0.5);
        assert_eq!(uniforms.normal_matrix[1][1], 1.0);
    }

    #[test]
    fn draws_follow_node_order_and_world_matrices() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn_node("root", Transform::from_position(Vec3::Y), None);
        let child = graph.spawn_node("child", Transform::from_position(Vec3::X), Some(root));
        graph.attach_mesh(
            root,
            MeshInstance {
                primitives: vec![0, 1],
                bounds: Aabb::EMPTY,
            },
        );
        graph.attach_mesh(
            child,
            MeshInstance {
                primitives: vec![2],
                bounds: Aabb::EMPTY,
            },
        );

        let draws = collect_draws(&graph);
        let primitives: Vec<_> = draws.iter().map(|d| d.primitive).collect();
        assert_eq!(primitives, vec![0, 1, 2]);
        assert_eq!(
            draws[2].world.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 1.0, 0.0)
        );
    }
}
