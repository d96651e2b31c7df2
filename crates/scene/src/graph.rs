use std::collections::BTreeMap;

use blockworld_common::{NodeId, Transform};

use crate::node::{NodeKind, SceneNode};

/// Holds every node the renderer draws.
///
/// Uses BTreeMap so renderers walk nodes in the same order on every frame.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
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

    /// Add a node and return its id.
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId::new();
        tracing::trace!(node = %id.short(), kind = ?node.kind, "scene node added");
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node. Returns it if it existed.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id);
        if node.is_some() {
            tracing::trace!(node = %id.short(), "scene node removed");
        }
        node
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Move a node in place. Returns false when the id is unknown.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.transform = transform;
                true
            }
            None => false,
        }
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, SceneNode> {
        &self.nodes
    }

    /// Mesh nodes only, in deterministic order.
    pub fn meshes(&self) -> impl Iterator<Item = (&NodeId, &SceneNode)> {
        self.nodes.iter().filter(|(_, n)| n.is_mesh())
    }

    /// Sum of all ambient light colours, clamped per channel.
    pub fn ambient_light(&self) -> [f32; 3] {
        let mut total = [0.0_f32; 3];
        for node in self.nodes.values() {
            if let NodeKind::AmbientLight { color } = node.kind {
                let c = color.to_rgba_f32();
                for (t, v) in total.iter_mut().zip(c) {
                    *t = (*t + v).min(1.0);
                }
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Geometry, Material};
    use blockworld_common::Rgb;
    use glam::Vec3;

    fn cube() -> SceneNode {
        SceneNode::mesh(
            Geometry::Cuboid {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
            Material::lambert(Rgb(0xD4AF37)),
            Transform::default(),
        )
    }

    #[test]
    fn graph_starts_empty() {
        let g = SceneGraph::new();
        assert!(g.is_empty());
        assert_eq!(g.ambient_light(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn add_and_remove() {
        let mut g = SceneGraph::new();
        let id = g.add(cube());
        assert_eq!(g.len(), 1);
        assert!(g.get(id).is_some());

        assert!(g.remove(id).is_some());
        assert!(g.remove(id).is_none());
        assert!(g.is_empty());
    }

    #[test]
    fn meshes_skip_lights_and_anchors() {
        let mut g = SceneGraph::new();
        g.add(cube());
        g.add(SceneNode::ambient_light(Rgb::WHITE));
        g.add(SceneNode::rig_anchor(Transform::default()));
        assert_eq!(g.len(), 3);
        assert_eq!(g.meshes().count(), 1);
    }

    #[test]
    fn set_transform_moves_in_place() {
        let mut g = SceneGraph::new();
        let id = g.add(cube());

        let moved = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(g.set_transform(id, moved));
        assert_eq!(g.get(id).unwrap().transform.position, moved.position);

        assert!(!g.set_transform(NodeId::new(), moved));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn repeated_moves_keep_the_graph_the_same_size() {
        let mut g = SceneGraph::new();
        let id = g.add(cube());
        for step in 0..10_000 {
            let t = Transform::from_position(Vec3::new(0.0, 0.0, -(step as f32)));
            assert!(g.set_transform(id, t));
        }
        assert_eq!(g.len(), 1);
        assert_eq!(g.nodes().keys().copied().collect::<Vec<_>>(), vec![id]);
        assert_eq!(g.get(id).unwrap().transform.position.z, -9_999.0);
    }

    #[test]
    fn ambient_light_saturates() {
        let mut g = SceneGraph::new();
        g.add(SceneNode::ambient_light(Rgb::WHITE));
        g.add(SceneNode::ambient_light(Rgb(0x808080)));
        assert_eq!(g.ambient_light(), [1.0, 1.0, 1.0]);
    }
}
