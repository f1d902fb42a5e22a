//! Node hierarchy of a loaded model, stored in a `hecs` world.
//!
//! Each node is an entity carrying a [`NodeName`], a [`LocalTransform`], an
//! optional [`Parent`] and an optional [`MeshInstance`]. Nodes are addressed
//! by the index they had in the source file, which is also what animation
//! channels target.

use glam::{Mat4, Quat, Vec3};
use hecs::{Entity, World};

use crate::geometry::Aabb;
use crate::mesh::Transform;

/// Human-readable node name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeName(pub String);

/// Transform relative to the parent node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform(pub Transform);

/// Index of the parent node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub usize);

/// A renderable primitive attached to a node.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshInstance {
    /// Indices into the scene's primitives.
    pub primitives: Vec<usize>,
    /// Union of the primitives' local bounds.
    pub bounds: Aabb,
}

/// Node hierarchy addressed by import index.
#[derive(Default)]
pub struct SceneGraph {
    world: World,
    nodes: Vec<Entity>,
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node and return its index. Parents must be spawned first.
    pub fn spawn_node(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        parent: Option<usize>,
    ) -> usize {
        let entity = self
            .world
            .spawn((NodeName(name.into()), LocalTransform(transform)));
        if let Some(parent) = parent.filter(|p| *p < self.nodes.len()) {
            // Insert cannot fail: the entity was spawned above.
            let _ = self.world.insert_one(entity, Parent(parent));
        }
        self.nodes.push(entity);
        self.nodes.len() - 1
    }

    pub fn attach_mesh(&mut self, node: usize, instance: MeshInstance) {
        if let Some(&entity) = self.nodes.get(node) {
            let _ = self.world.insert_one(entity, instance);
        }
    }

    pub fn name(&self, node: usize) -> Option<String> {
        let entity = *self.nodes.get(node)?;
        self.world
            .get::<&NodeName>(entity)
            .ok()
            .map(|n| n.0.clone())
    }

    pub fn local_transform(&self, node: usize) -> Option<Transform> {
        let entity = *self.nodes.get(node)?;
        self.world.get::<&LocalTransform>(entity).ok().map(|t| t.0)
    }

    fn update_local(&mut self, node: usize, f: impl FnOnce(&mut Transform)) {
        let Some(&entity) = self.nodes.get(node) else {
            return;
        };
        if let Ok(mut local) = self.world.get::<&mut LocalTransform>(entity) {
            f(&mut local.0);
        }
    }

    pub fn set_translation(&mut self, node: usize, translation: Vec3) {
        self.update_local(node, |t| t.position = translation);
    }

    pub fn set_rotation(&mut self, node: usize, rotation: Quat) {
        self.update_local(node, |t| t.rotation = rotation);
    }

    pub fn set_scale(&mut self, node: usize, scale: Vec3) {
        self.update_local(node, |t| t.scale = scale);
    }

    fn parent(&self, node: usize) -> Option<usize> {
        let entity = *self.nodes.get(node)?;
        self.world.get::<&Parent>(entity).ok().map(|p| p.0)
    }

    /// World matrix of `node`, composed through its ancestors.
    pub fn world_matrix(&self, node: usize) -> Option<Mat4> {
        let mut matrix = self.local_transform(node)?.matrix();
        let mut current = node;
        // Parents always have lower indices, so the walk terminates.
        while let Some(parent) = self.parent(current).filter(|p| *p < current) {
            matrix = self.local_transform(parent)?.matrix() * matrix;
            current = parent;
        }
        Some(matrix)
    }

    /// All world matrices, computed in one pass over the hierarchy.
    fn world_matrices(&self) -> Vec<Mat4> {
        let mut worlds: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in 0..self.nodes.len() {
            let local = self
                .local_transform(node)
                .map(|t| t.matrix())
                .unwrap_or(Mat4::IDENTITY);
            let world = match self.parent(node).and_then(|p| worlds.get(p)) {
                Some(parent) => *parent * local,
                None => local,
            };
            worlds.push(world);
        }
        worlds
    }

    /// Every mesh-carrying node with its world matrix.
    pub fn mesh_instances(&self) -> Vec<(usize, MeshInstance, Mat4)> {
        let worlds = self.world_matrices();
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(node, &entity)| {
                let instance = self.world.get::<&MeshInstance>(entity).ok()?;
                Some((node, (*instance).clone(), worlds[node]))
            })
            .collect()
    }

    /// World-space bounds of all mesh instances.
    pub fn bounds(&self) -> Aabb {
        self.mesh_instances()
            .into_iter()
            .fold(Aabb::EMPTY, |acc, (_, instance, world)| {
                acc.union(instance.bounds.transformed(world))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> MeshInstance {
        MeshInstance {
            primitives: vec![0],
            bounds: Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
        }
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn_node("root", Transform::from_position(Vec3::new(1.0, 0.0, 0.0)), None);
        let child = graph.spawn_node(
            "child",
            Transform::from_position(Vec3::new(0.0, 2.0, 0.0)),
            Some(root),
        );

        let world = graph.world_matrix(child).unwrap();
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(graph.name(child).as_deref(), Some("child"));
    }

    #[test]
    fn setters_update_local_transform() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn_node("n", Transform::new(), None);
        graph.set_translation(node, Vec3::X);
        graph.set_scale(node, Vec3::splat(2.0));
        graph.set_rotation(node, Quat::from_rotation_z(1.0));

        let local = graph.local_transform(node).unwrap();
        assert_eq!(local.position, Vec3::X);
        assert_eq!(local.scale, Vec3::splat(2.0));
        assert_relative_eq!(local.rotation.z, Quat::from_rotation_z(1.0).z);
    }

    #[test]
    fn unknown_nodes_are_ignored() {
        let mut graph = SceneGraph::new();
        graph.set_translation(7, Vec3::ONE);
        assert!(graph.world_matrix(7).is_none());
        assert!(graph.bounds().is_empty());
    }

    #[test]
    fn bounds_cover_all_instances_in_world_space() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn_node("root", Transform::new().uniform_scale(2.0), None);
        let a = graph.spawn_node("a", Transform::new(), Some(root));
        let b = graph.spawn_node(
            "b",
            Transform::from_position(Vec3::new(3.0, 0.0, 0.0)),
            Some(root),
        );
        graph.attach_mesh(a, unit_box());
        graph.attach_mesh(b, unit_box());

        let instances = graph.mesh_instances();
        assert_eq!(instances.len(), 2);

        let bounds = graph.bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(7.0, 1.0, 1.0));
    }
}
