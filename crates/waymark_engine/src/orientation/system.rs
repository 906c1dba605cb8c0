//! Per-frame orientation update

use crate::foundation::collections::NodeHandle;
use crate::orientation::OrientationBehavior;
use crate::scene::SceneGraph;

/// Turns every behavior-carrying node toward the camera once per frame
#[derive(Debug, Default)]
pub struct OrientationSystem {
    scratch: Vec<(NodeHandle, OrientationBehavior)>,
}

impl OrientationSystem {
    /// Create the system
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick, returning how many nodes had their rotation written
    ///
    /// Does nothing without a camera. Nodes that are detached from the scene
    /// root, or whose facing direction is degenerate this frame, keep their
    /// current rotation.
    pub fn update(&mut self, scene: &mut dyn SceneGraph) -> usize {
        let Some(camera) = scene.camera_world_position() else {
            log::trace!("No camera, orientation tick skipped");
            return 0;
        };

        self.scratch.clear();
        scene.collect_behaviors(&mut self.scratch);

        let mut updated = 0;
        for &(node, behavior) in &self.scratch {
            if !scene.is_in_scene(node) {
                continue;
            }
            let Some(position) = scene.world_position(node) else {
                continue;
            };
            let Some(rotation) = behavior.facing_rotation(camera, position) else {
                log::trace!("Degenerate facing direction for {:?}, keeping rotation", node);
                continue;
            };
            match scene.set_world_rotation(node, rotation) {
                Ok(()) => updated += 1,
                Err(e) => log::debug!("Orientation write skipped: {}", e),
            }
        }
        updated
    }
}
