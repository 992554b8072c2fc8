use crate::collision::{Collider, ColliderShape};
use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::mesh::Mode;
use std::path::Path;

/// Loaded scene object: a named node with its local transform, triangle geometry and children.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub local: Mat4,
    /// Triangles in node-local space.
    pub triangles: Vec<[Vec3; 3]>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, local: Mat4) -> Self {
        Self { name: name.into(), local, triangles: Vec::new(), children: Vec::new() }
    }

    pub fn with_triangles(mut self, triangles: Vec<[Vec3; 3]>) -> Self {
        self.triangles = triangles;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Imports the default scene (or the first one) of a glTF/GLB file under a synthetic root.
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let (document, buffers, _images) = gltf::import(path_ref)
            .with_context(|| format!("Failed to import glTF from {}", path_ref.display()))?;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| anyhow!("No scenes found in {}", path_ref.display()))?;

        let root_name = scene
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| path_ref.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default());
        let mut root = SceneNode::new(root_name, Mat4::IDENTITY);
        for node in scene.nodes() {
            root.children.push(import_node(&node, &buffers));
        }
        tracing::info!(
            target: "scene",
            path = %path_ref.display(),
            nodes = root.node_count(),
            "scene loaded"
        );
        Ok(root)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Every node whose name contains `tag` (case-insensitive) becomes a collider with its world
    /// transform; the node's whole subtree comes along as nested colliders.
    pub fn collect_colliders(&self, tag: &str) -> Vec<Collider> {
        let needle = tag.to_lowercase();
        let mut out = Vec::new();
        self.collect_into(Mat4::IDENTITY, &needle, &mut out);
        tracing::debug!(target: "scene", tag, count = out.len(), "colliders collected");
        out
    }

    fn collect_into(&self, parent: Mat4, needle: &str, out: &mut Vec<Collider>) {
        let world = parent * self.local;
        if !needle.is_empty() && self.name.to_lowercase().contains(needle) {
            out.push(self.to_collider(world));
            return;
        }
        for child in &self.children {
            child.collect_into(world, needle, out);
        }
    }

    fn to_collider(&self, world: Mat4) -> Collider {
        let shape = (!self.triangles.is_empty()).then(|| ColliderShape::Triangles(self.triangles.clone()));
        let mut collider = Collider::new(self.name.clone(), world, shape);
        collider.children = self.children.iter().map(|child| child.to_collider(world * child.local)).collect();
        collider
    }
}

fn import_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let local = Mat4::from_scale_rotation_translation(
        Vec3::from_array(scale),
        Quat::from_array(rotation),
        Vec3::from_array(translation),
    );
    let name = node.name().map(str::to_string).unwrap_or_else(|| format!("node_{}", node.index()));
    let mut scene_node = SceneNode::new(name, local);

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));
            let Some(positions) = reader.read_positions() else {
                tracing::warn!(target: "scene", node = %scene_node.name, "primitive without POSITION skipped");
                continue;
            };
            let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|read| read.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());
            scene_node.triangles.extend(indices.chunks_exact(3).filter_map(|tri| {
                Some([
                    *positions.get(tri[0] as usize)?,
                    *positions.get(tri[1] as usize)?,
                    *positions.get(tri[2] as usize)?,
                ])
            }));
        }
    }

    for child in node.children() {
        scene_node.children.push(import_node(&child, buffers));
    }
    scene_node
}
