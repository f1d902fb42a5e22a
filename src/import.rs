//! Model import: glTF 2.0 (`.gltf` / `.glb`) and STL.
//!
//! Parsing happens on the loader thread and produces a [`LoadedScene`], a
//! GPU-free description of everything the renderer needs.

use std::collections::HashMap;
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use tracing::{debug, warn};

use crate::animation::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::camera::ImportedCamera;
use crate::error::LoadError;
use crate::geometry::{Aabb, RawGeometry, parse_stl_bytes};
use crate::mesh::{Material, Transform, Vertex3d};
use crate::scene_graph::{MeshInstance, SceneGraph};
use crate::texture::ImageData;

/// One drawable piece of geometry with its material.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub geometry: RawGeometry,
    /// Index into [`LoadedScene::materials`].
    pub material: usize,
}

/// A fully parsed model, ready for GPU upload.
#[derive(Debug, Default)]
pub struct LoadedScene {
    pub graph: SceneGraph,
    pub primitives: Vec<Primitive>,
    pub materials: Vec<Material>,
    pub images: Vec<ImageData>,
    pub cameras: Vec<ImportedCamera>,
    pub animations: Vec<AnimationClip>,
    /// World-space bounds in the bind pose.
    pub bounds: Aabb,
}

/// Supported model formats, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Gltf,
    Stl,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "gltf" | "glb" => Ok(Self::Gltf),
            "stl" => Ok(Self::Stl),
            _ => Err(LoadError::UnknownFormat(ext)),
        }
    }
}

/// Parse model bytes. `base_dir` resolves external glTF buffers and images.
pub fn import_bytes(
    bytes: &[u8],
    format: ModelFormat,
    base_dir: Option<&Path>,
) -> Result<LoadedScene, LoadError> {
    let scene = match format {
        ModelFormat::Gltf => import_gltf(bytes, base_dir)?,
        ModelFormat::Stl => import_stl(bytes)?,
    };
    if scene.primitives.is_empty() {
        return Err(LoadError::EmptyScene);
    }
    Ok(scene)
}

fn import_stl(bytes: &[u8]) -> Result<LoadedScene, LoadError> {
    let geometry = parse_stl_bytes(bytes)?;
    let bounds = geometry.bounds();

    let mut graph = SceneGraph::new();
    let root = graph.spawn_node("stl", Transform::new(), None);
    graph.attach_mesh(
        root,
        MeshInstance {
            primitives: vec![0],
            bounds,
        },
    );

    let mut material = Material {
        metalness: 0.0,
        roughness: 0.5,
        ..Default::default()
    };
    material.apply_showcase_fixups();

    Ok(LoadedScene {
        graph,
        primitives: vec![Primitive {
            geometry,
            material: 0,
        }],
        materials: vec![material],
        bounds,
        ..Default::default()
    })
}

fn import_gltf(bytes: &[u8], base_dir: Option<&Path>) -> Result<LoadedScene, LoadError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base_dir, blob)?;
    let images = gltf::import_images(&document, base_dir, &buffers)?
        .into_iter()
        .map(convert_image)
        .collect::<Vec<_>>();

    let mut materials: Vec<Material> = document.materials().map(convert_material).collect();
    // Primitives without a material share a trailing default.
    let default_material = materials.len();
    let mut fallback = Material::default();
    fallback.apply_showcase_fixups();
    materials.push(fallback);

    let mut primitives = Vec::new();
    let mut mesh_primitives: Vec<Vec<usize>> = Vec::new();
    for mesh in document.meshes() {
        let mut indices = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!(mesh = mesh.index(), mode = ?primitive.mode(), "Skipping non-triangle primitive");
                continue;
            }
            let material = primitive.material().index().unwrap_or(default_material);
            let textured = materials
                .get(material)
                .is_some_and(|m| m.base_color_texture.is_some() || m.emissive_texture.is_some());
            let Some(geometry) = read_primitive(&primitive, &buffers, textured) else {
                warn!(mesh = mesh.index(), "Skipping primitive without positions");
                continue;
            };
            indices.push(primitives.len());
            primitives.push(Primitive { geometry, material });
        }
        debug!(
            mesh = mesh.name().unwrap_or("<unnamed>"),
            primitives = indices.len(),
            "Imported mesh"
        );
        mesh_primitives.push(indices);
    }

    let mut graph = SceneGraph::new();
    let mut node_map: HashMap<usize, usize> = HashMap::new();
    let mut cameras = Vec::new();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    let roots: Vec<gltf::Node> = match &scene {
        Some(scene) => scene.nodes().collect(),
        None => Vec::new(),
    };

    let mut context = NodeContext {
        primitives: &primitives,
        mesh_primitives: &mesh_primitives,
        graph: &mut graph,
        node_map: &mut node_map,
        cameras: &mut cameras,
    };
    for root in roots {
        context.spawn(&root, None, Mat4::IDENTITY);
    }

    let animations = document
        .animations()
        .filter_map(|animation| convert_animation(&animation, &buffers, &node_map))
        .collect();

    let bounds = graph.bounds();
    Ok(LoadedScene {
        graph,
        primitives,
        materials,
        images,
        cameras,
        animations,
        bounds,
    })
}

struct NodeContext<'a> {
    primitives: &'a [Primitive],
    mesh_primitives: &'a [Vec<usize>],
    graph: &'a mut SceneGraph,
    node_map: &'a mut HashMap<usize, usize>,
    cameras: &'a mut Vec<ImportedCamera>,
}

impl NodeContext<'_> {
    fn spawn(&mut self, node: &gltf::Node, parent: Option<usize>, parent_world: Mat4) {
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform::new()
            .position(Vec3::from(translation))
            .rotation(Quat::from_array(rotation))
            .scale(Vec3::from(scale));
        let world = parent_world * transform.matrix();

        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index()));
        let index = self.graph.spawn_node(name, transform, parent);
        self.node_map.insert(node.index(), index);

        if let Some(mesh) = node.mesh() {
            if let Some(primitives) = self.mesh_primitives.get(mesh.index()) {
                let bounds = primitives
                    .iter()
                    .filter_map(|&p| self.primitives.get(p))
                    .fold(Aabb::EMPTY, |acc, p| acc.union(p.geometry.bounds()));
                self.graph.attach_mesh(
                    index,
                    MeshInstance {
                        primitives: primitives.clone(),
                        bounds,
                    },
                );
            }
        }

        if let Some(camera) = node.camera() {
            if let gltf::camera::Projection::Perspective(perspective) = camera.projection() {
                self.cameras.push(ImportedCamera {
                    name: camera.name().map(str::to_string),
                    world,
                    yfov: perspective.yfov(),
                    znear: perspective.znear(),
                    zfar: perspective.zfar(),
                });
            }
        }

        for child in node.children() {
            self.spawn(&child, Some(index), world);
        }
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    textured: bool,
) -> Option<RawGeometry> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    let uvs = read_uvs(&reader, textured);

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = normals
                .as_ref()
                .and_then(|n| n.get(i).copied())
                .unwrap_or([0.0; 3]);
            let uv = uvs.get(i).copied().unwrap_or([0.0; 2]);
            Vertex3d::new(position, normal, uv)
        })
        .collect::<Vec<_>>();

    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };

    let mut geometry = RawGeometry::new(vertices, indices);
    if normals.is_none() {
        debug!("Primitive has no normals; computing smooth normals");
        geometry.recalculate_normals();
    }
    Some(geometry)
}

/// UV set 0, falling back to the first of sets 1 to 3 for textured surfaces.
fn read_uvs<'a, 's, F>(reader: &gltf::mesh::Reader<'a, 's, F>, textured: bool) -> Vec<[f32; 2]>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    if let Some(uvs) = reader.read_tex_coords(0) {
        return uvs.into_f32().collect();
    }
    if !textured {
        return Vec::new();
    }
    for set in 1..=3 {
        if let Some(uvs) = reader.read_tex_coords(set) {
            debug!(set, "Copying UV set into set 0");
            return uvs.into_f32().collect();
        }
    }
    warn!("Textured primitive has no UVs; texture will sample a single texel");
    Vec::new()
}

fn convert_material(material: gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let mut converted = Material {
        name: material.name().map(str::to_string),
        base_color: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(|t| t.texture().source().index()),
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: material.emissive_factor(),
        emissive_intensity: 1.0,
        emissive_texture: material.emissive_texture().map(|t| t.texture().source().index()),
        double_sided: material.double_sided(),
    };
    converted.apply_showcase_fixups();
    debug!(
        material = converted.name.as_deref().unwrap_or("<unnamed>"),
        textured = converted.base_color_texture.is_some(),
        "Material fixed up"
    );
    converted
}

fn convert_image(data: gltf::image::Data) -> ImageData {
    use gltf::image::Format;

    let pixel_count = (data.width * data.height) as usize;
    let pixels: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels,
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[1], 0, 255])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&r| [r, r, r, 255]).collect(),
        other => {
            warn!(format = ?other, "Unsupported image format; substituting white");
            vec![255; pixel_count * 4]
        }
    };

    ImageData {
        width: data.width,
        height: data.height,
        pixels,
    }
}

fn convert_animation(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    node_map: &HashMap<usize, usize>,
) -> Option<AnimationClip> {
    use gltf::animation::util::ReadOutputs;

    let mut channels = Vec::new();
    for channel in animation.channels() {
        let Some(&target) = node_map.get(&channel.target().node().index()) else {
            continue;
        };
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        let Some(times) = reader.read_inputs().map(Iterator::collect::<Vec<f32>>) else {
            continue;
        };
        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(v)) => {
                ChannelValues::Translation(v.map(Vec3::from).collect())
            }
            Some(ReadOutputs::Rotations(v)) => {
                ChannelValues::Rotation(v.into_f32().map(Quat::from_array).collect())
            }
            Some(ReadOutputs::Scales(v)) => ChannelValues::Scale(v.map(Vec3::from).collect()),
            // Morph targets are not rendered.
            _ => continue,
        };
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };
        channels.push(Channel {
            target,
            times,
            values,
            interpolation,
        });
    }

    if channels.is_empty() {
        return None;
    }
    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation{}", animation.index()));
    let clip = AnimationClip::new(name, channels);
    debug!(clip = %clip.name, duration = clip.duration, channels = clip.channels.len(), "Imported animation");
    Some(clip)
}
