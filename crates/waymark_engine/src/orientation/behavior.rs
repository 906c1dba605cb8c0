//! Facing rotation calculations

use serde::{Deserialize, Serialize};

use crate::foundation::math::{self, Quat, Vec3};

/// Orientation mode attached to a marker node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OrientationBehavior {
    /// Stays upright and turns about the world up axis to face the viewer
    ///
    /// The camera height is ignored, so looking down on a marker never tilts it.
    Billboard,

    /// Faces the viewer with one world axis collapsed
    ///
    /// `vertical` collapses the height axis and faces away from the camera,
    /// which is upright signage and matches [`OrientationBehavior::Billboard`].
    /// Otherwise the depth axis is collapsed and the node faces toward the
    /// camera, for flat-on-ground arrows.
    #[serde(rename = "directional")]
    AxisConstrainedDirectional {
        /// Collapse height (upright) instead of depth (flat)
        vertical: bool,
    },
}

impl Default for OrientationBehavior {
    fn default() -> Self {
        Self::AxisConstrainedDirectional { vertical: true }
    }
}

impl OrientationBehavior {
    /// Direction the node's forward axis should point this frame
    pub fn facing_direction(self, camera: Vec3, node: Vec3) -> Vec3 {
        let mut camera = camera;
        match self {
            Self::Billboard | Self::AxisConstrainedDirectional { vertical: true } => {
                camera.y = node.y;
                node - camera
            }
            Self::AxisConstrainedDirectional { vertical: false } => {
                camera.z = node.z;
                camera - node
            }
        }
    }

    /// World rotation for a node at `node` seen from `camera`
    ///
    /// `None` when the constrained direction is degenerate (camera straight
    /// above the node, for instance); the node should keep its rotation.
    pub fn facing_rotation(self, camera: Vec3, node: Vec3) -> Option<Quat> {
        math::look_rotation(self.facing_direction(camera, node), math::up())
    }
}
