//! Immediate-mode 2D drawing for the page overlay.
//!
//! Coordinates are logical pixels with the origin at the top-left of the
//! window. Quads are batched into one vertex buffer; consecutive quads that
//! share a texture (or none) are drawn with a single call.

use tracing::warn;

use crate::gpu::GpuContext;
use crate::page::Rect;
use crate::texture::Texture;

/// Linear RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn from_rgba_array(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    /// Shadow ring drawn around the slider handle.
    pub const HANDLE_RING: Color = Color::rgba(0.0, 0.0, 0.0, 0.35);
}

/// Handle to a texture registered with [`Draw2d::add_texture`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub(crate) usize);

/// Texture coordinates of a quad: `[u0, v0, u1, v1]`.
pub type UvRect = [f32; 4];

/// Full texture.
pub const FULL_UV: UvRect = [0.0, 0.0, 1.0, 1.0];

/// Fit an image of `image_aspect` over `rect` like CSS `object-fit: cover`,
/// returning the cropped texture coordinates.
pub fn cover_uv(rect: Rect, image_aspect: f32) -> UvRect {
    if rect.width <= 0.0 || rect.height <= 0.0 || image_aspect <= 0.0 {
        return FULL_UV;
    }
    let rect_aspect = rect.width / rect.height;
    if image_aspect > rect_aspect {
        // Image is wider: crop left and right.
        let visible = rect_aspect / image_aspect;
        let margin = (1.0 - visible) * 0.5;
        [margin, 0.0, 1.0 - margin, 1.0]
    } else {
        let visible = image_aspect / rect_aspect;
        let margin = (1.0 - visible) * 0.5;
        [0.0, margin, 1.0, 1.0 - margin]
    }
}

/// Clip a quad to the left `percentage` of its width, keeping the texture
/// mapping of the unclipped quad. Mirrors `clip-path: inset(0 (100 - p)% 0 0)`.
pub fn clip_left(rect: Rect, uv: UvRect, percentage: f32) -> (Rect, UvRect) {
    let fraction = percentage.clamp(0.0, 100.0) / 100.0;
    let clipped = Rect::new(rect.left, rect.top, rect.width * fraction, rect.height);
    let u1 = uv[0] + (uv[2] - uv[0]) * fraction;
    (clipped, [uv[0], uv[1], u1, uv[3]])
}

/// Vertex for 2D quads.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Uniforms for 2D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const MAX_VERTICES: usize = 16384;

/// A run of vertices drawn with one pipeline and texture.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Batch {
    texture: Option<ImageId>,
    start: u32,
    count: u32,
}

/// Batched quad renderer.
pub struct Draw2d {
    colored_pipeline: wgpu::RenderPipeline,
    textured_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_groups: Vec<wgpu::BindGroup>,

    vertices: Vec<Vertex2d>,
    batches: Vec<Batch>,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/draw2d.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // group 0
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // group 1
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let colored_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Draw2d Colored Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let textured_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Draw2d Textured Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
                push_constant_ranges: &[],
            });

        let blend_state = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let make_pipeline = |label: &str, layout: &wgpu::PipelineLayout, fs: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex2d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(blend_state),
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
            })
        };

        let colored_pipeline = make_pipeline(
            "Draw2d Colored Pipeline",
            &colored_pipeline_layout,
            "fs_colored",
        );
        let textured_pipeline = make_pipeline(
            "Draw2d Textured Pipeline",
            &textured_pipeline_layout,
            "fs_textured",
        );

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            colored_pipeline,
            textured_pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            texture_bind_groups: Vec::new(),
            vertices: Vec::with_capacity(1024),
            batches: Vec::new(),
        }
    }

    /// Make a texture drawable with [`image`](Self::image).
    pub fn add_texture(&mut self, gpu: &GpuContext, texture: &Texture) -> ImageId {
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Image Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });
        self.texture_bind_groups.push(bind_group);
        ImageId(self.texture_bind_groups.len() - 1)
    }

    /// Clear all draw calls for the new frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.batches.clear();
    }

    pub fn rect(&mut self, rect: Rect, color: Color) {
        self.quad(rect, [0.0; 4], color, None);
    }

    /// Draw a texture into `rect`, sampling the `uv` sub-rectangle.
    pub fn image(&mut self, id: ImageId, rect: Rect, uv: UvRect, tint: Color) {
        self.quad(rect, uv, tint, Some(id));
    }

    fn quad(&mut self, rect: Rect, uv: UvRect, color: Color, texture: Option<ImageId>) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        if self.vertices.len() + 6 > MAX_VERTICES {
            warn!(max = MAX_VERTICES, "Draw2d vertex budget exhausted; quad dropped");
            return;
        }

        let c = color.to_array();
        let (x0, y0, x1, y1) = (rect.left, rect.top, rect.right(), rect.bottom());
        let [u0, v0, u1, v1] = uv;
        let vertex = |x, y, u, v| Vertex2d {
            position: [x, y],
            uv: [u, v],
            color: c,
        };

        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            vertex(x0, y0, u0, v0),
            vertex(x1, y0, u1, v0),
            vertex(x0, y1, u0, v1),
            vertex(x1, y0, u1, v0),
            vertex(x1, y1, u1, v1),
            vertex(x0, y1, u0, v1),
        ]);

        match self.batches.last_mut() {
            Some(batch) if batch.texture == texture => batch.count += 6,
            _ => self.batches.push(Batch {
                texture,
                start,
                count: 6,
            }),
        }
    }

    /// Render all batched quads. `resolution` is the logical viewport size.
    pub fn render(&self, gpu: &GpuContext, render_pass: &mut wgpu::RenderPass, resolution: [f32; 2]) {
        if self.vertices.is_empty() {
            return;
        }

        let uniforms = Draw2dUniforms {
            resolution,
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        gpu.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));

        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

        for batch in &self.batches {
            match batch.texture {
                None => render_pass.set_pipeline(&self.colored_pipeline),
                Some(id) => {
                    let Some(bind_group) = self.texture_bind_groups.get(id.0) else {
                        continue;
                    };
                    render_pass.set_pipeline(&self.textured_pipeline);
                    render_pass.set_bind_group(1, bind_group, &[]);
                }
            }
            render_pass.draw(batch.start..batch.start + batch.count, 0..1);
        }
    }
}
