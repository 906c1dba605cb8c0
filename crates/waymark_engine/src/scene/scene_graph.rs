//! Scene graph trait

use thiserror::Error;

use crate::assets::Renderable;
use crate::foundation::collections::NodeHandle;
use crate::foundation::math::{Quat, Vec3};
use crate::orientation::OrientationBehavior;

/// Scene graph mutation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    /// Handle does not refer to a live node (never created or destroyed)
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeHandle),

    /// Node is not a direct child of the given parent
    #[error("Node {node:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent
        parent: NodeHandle,
        /// Node that was to be removed
        node: NodeHandle,
    },

    /// Parenting would make a node its own ancestor
    #[error("Parenting {node:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Requested parent
        parent: NodeHandle,
        /// Node being re-parented
        node: NodeHandle,
    },

    /// The scene root cannot be re-parented or destroyed
    #[error("Operation not allowed on the scene root")]
    RootNode,
}

/// Scene graph operations consumed by the anchoring core
///
/// Every call happens on the render thread. Implementations own their nodes;
/// callers only hold [`NodeHandle`]s.
pub trait SceneGraph {
    /// Root node of the live scene
    fn root(&self) -> NodeHandle;

    /// Create a detached node with an identity transform
    fn create_node(&mut self) -> NodeHandle;

    /// Whether the handle refers to a live node
    fn contains(&self, node: NodeHandle) -> bool;

    /// Whether the node is live and reachable from the scene root
    fn is_in_scene(&self, node: NodeHandle) -> bool;

    /// Parent `node` under `parent`, detaching it from any previous parent
    fn set_parent(&mut self, node: NodeHandle, parent: NodeHandle) -> Result<(), SceneError>;

    /// Detach `node` from `parent`; the node and its subtree stay alive
    fn remove_child(&mut self, parent: NodeHandle, node: NodeHandle) -> Result<(), SceneError>;

    /// Destroy `node` and all of its descendants
    fn destroy_node(&mut self, node: NodeHandle) -> Result<(), SceneError>;

    /// Direct children of a node
    fn children(&self, node: NodeHandle) -> Vec<NodeHandle>;

    /// Set position relative to the parent
    fn set_local_position(&mut self, node: NodeHandle, position: Vec3) -> Result<(), SceneError>;

    /// Set rotation relative to the parent
    fn set_local_rotation(&mut self, node: NodeHandle, rotation: Quat) -> Result<(), SceneError>;

    /// Set scale relative to the parent
    fn set_local_scale(&mut self, node: NodeHandle, scale: Vec3) -> Result<(), SceneError>;

    /// Set rotation in world space
    fn set_world_rotation(&mut self, node: NodeHandle, rotation: Quat) -> Result<(), SceneError>;

    /// World-space position, `None` for dead handles
    fn world_position(&self, node: NodeHandle) -> Option<Vec3>;

    /// World-space rotation, `None` for dead handles
    fn world_rotation(&self, node: NodeHandle) -> Option<Quat>;

    /// World-space position of the active camera, if there is one
    fn camera_world_position(&self) -> Option<Vec3>;

    /// Attach the drawable for a node
    fn set_renderable(&mut self, node: NodeHandle, renderable: Renderable) -> Result<(), SceneError>;

    /// Attach a per-frame orientation behavior to a node
    fn attach_behavior(&mut self, node: NodeHandle, behavior: OrientationBehavior) -> Result<(), SceneError>;

    /// Append every node carrying a behavior to `out`
    ///
    /// Takes an output buffer so the per-frame caller can reuse its allocation.
    fn collect_behaviors(&self, out: &mut Vec<(NodeHandle, OrientationBehavior)>);
}
