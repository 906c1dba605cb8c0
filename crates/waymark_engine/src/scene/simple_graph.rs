//! In-memory scene graph
//!
//! Plain node records in a slot map: transform, parent/children links, an
//! optional renderable and an optional orientation behavior. World transforms
//! are computed on demand by walking the parent chain, which is fine for the
//! handful of anchors and markers an AR scene holds.

use super::scene_graph::{SceneError, SceneGraph};
use crate::assets::Renderable;
use crate::foundation::collections::{NodeHandle, NodeMap};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::orientation::OrientationBehavior;

/// Node record
#[derive(Debug, Clone, Default)]
struct SceneNode {
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    local: Transform,
    renderable: Option<Renderable>,
    behavior: Option<OrientationBehavior>,
}

/// Simple slot-map backed scene graph with a single camera
#[derive(Debug)]
pub struct SimpleSceneGraph {
    nodes: NodeMap<SceneNode>,
    root: NodeHandle,
    camera: Option<Vec3>,
}

impl SimpleSceneGraph {
    /// Create an empty scene with only a root node and no camera
    pub fn new() -> Self {
        let mut nodes = NodeMap::with_key();
        let root = nodes.insert(SceneNode::default());
        Self {
            nodes,
            root,
            camera: None,
        }
    }

    /// Move the camera; `None` removes it
    pub fn set_camera_position(&mut self, position: Option<Vec3>) {
        self.camera = position;
    }

    /// Number of live nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live nodes that carry a renderable
    pub fn renderable_count(&self) -> usize {
        self.nodes.values().filter(|node| node.renderable.is_some()).count()
    }

    /// Renderable attached to a node
    pub fn renderable(&self, node: NodeHandle) -> Option<&Renderable> {
        self.nodes.get(node)?.renderable.as_ref()
    }

    /// Behavior attached to a node
    pub fn behavior(&self, node: NodeHandle) -> Option<OrientationBehavior> {
        self.nodes.get(node)?.behavior
    }

    /// Local transform of a node
    pub fn local_transform(&self, node: NodeHandle) -> Option<&Transform> {
        self.nodes.get(node).map(|node| &node.local)
    }

    /// Parent of a node, `None` for the root and detached nodes
    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(node)?.parent
    }

    /// All live descendants of a node, depth first
    pub fn descendants(&self, node: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = self.children(node);
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current));
        }
        out
    }

    /// World transform of a node
    pub fn world_transform(&self, node: NodeHandle) -> Option<Transform> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(handle) = current {
            let record = self.nodes.get(handle)?;
            chain.push(&record.local);
            current = record.parent;
        }

        Some(
            chain
                .iter()
                .rev()
                .fold(Transform::identity(), |world, local| world.combine(local)),
        )
    }

    fn node_mut(&mut self, node: NodeHandle) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))
    }

    fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|record| record.parent);
        }
        false
    }

    fn unlink_from_parent(&mut self, node: NodeHandle) {
        let parent = self.nodes.get_mut(node).and_then(|record| record.parent.take());
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|child| *child != node);
        }
    }
}

impl Default for SimpleSceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for SimpleSceneGraph {
    fn root(&self) -> NodeHandle {
        self.root
    }

    fn create_node(&mut self) -> NodeHandle {
        self.nodes.insert(SceneNode::default())
    }

    fn contains(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(node)
    }

    fn is_in_scene(&self, node: NodeHandle) -> bool {
        self.contains(node) && self.is_ancestor(self.root, node)
    }

    fn set_parent(&mut self, node: NodeHandle, parent: NodeHandle) -> Result<(), SceneError> {
        if node == self.root {
            return Err(SceneError::RootNode);
        }
        if !self.contains(node) {
            return Err(SceneError::NodeNotFound(node));
        }
        if !self.contains(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        if self.is_ancestor(node, parent) {
            return Err(SceneError::Cycle { parent, node });
        }

        self.unlink_from_parent(node);
        self.node_mut(parent)?.children.push(node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeHandle, node: NodeHandle) -> Result<(), SceneError> {
        let record = self.nodes.get(node).ok_or(SceneError::NodeNotFound(node))?;
        if record.parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, node });
        }
        self.unlink_from_parent(node);
        Ok(())
    }

    fn destroy_node(&mut self, node: NodeHandle) -> Result<(), SceneError> {
        if node == self.root {
            return Err(SceneError::RootNode);
        }
        if !self.contains(node) {
            return Err(SceneError::NodeNotFound(node));
        }

        self.unlink_from_parent(node);
        let mut doomed = self.descendants(node);
        doomed.push(node);
        for handle in doomed {
            self.nodes.remove(handle);
        }
        Ok(())
    }

    fn children(&self, node: NodeHandle) -> Vec<NodeHandle> {
        self.nodes
            .get(node)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    fn set_local_position(&mut self, node: NodeHandle, position: Vec3) -> Result<(), SceneError> {
        self.node_mut(node)?.local.position = position;
        Ok(())
    }

    fn set_local_rotation(&mut self, node: NodeHandle, rotation: Quat) -> Result<(), SceneError> {
        self.node_mut(node)?.local.rotation = rotation;
        Ok(())
    }

    fn set_local_scale(&mut self, node: NodeHandle, scale: Vec3) -> Result<(), SceneError> {
        self.node_mut(node)?.local.scale = scale;
        Ok(())
    }

    fn set_world_rotation(&mut self, node: NodeHandle, rotation: Quat) -> Result<(), SceneError> {
        let parent = self.nodes.get(node).ok_or(SceneError::NodeNotFound(node))?.parent;
        let parent_rotation = parent
            .and_then(|parent| self.world_rotation(parent))
            .unwrap_or_else(Quat::identity);
        self.node_mut(node)?.local.rotation = parent_rotation.inverse() * rotation;
        Ok(())
    }

    fn world_position(&self, node: NodeHandle) -> Option<Vec3> {
        self.world_transform(node).map(|transform| transform.position)
    }

    fn world_rotation(&self, node: NodeHandle) -> Option<Quat> {
        self.world_transform(node).map(|transform| transform.rotation)
    }

    fn camera_world_position(&self) -> Option<Vec3> {
        self.camera
    }

    fn set_renderable(&mut self, node: NodeHandle, renderable: Renderable) -> Result<(), SceneError> {
        self.node_mut(node)?.renderable = Some(renderable);
        Ok(())
    }

    fn attach_behavior(&mut self, node: NodeHandle, behavior: OrientationBehavior) -> Result<(), SceneError> {
        self.node_mut(node)?.behavior = Some(behavior);
        Ok(())
    }

    fn collect_behaviors(&self, out: &mut Vec<(NodeHandle, OrientationBehavior)>) {
        out.extend(
            self.nodes
                .iter()
                .filter_map(|(handle, node)| node.behavior.map(|behavior| (handle, behavior))),
        );
    }
}
