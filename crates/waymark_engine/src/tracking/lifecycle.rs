//! Image anchor lifecycle
//!
//! Per-image state machine:
//!
//! ```text
//! Unseen ──PAUSED──▶ Detected ──TRACKING──▶ Anchored ──STOPPED──▶ Gone
//!                       ▲                                          │
//!                       └──────────────────PAUSED──────────────────┘
//! ```
//!
//! An image owns at most one [`AnchorRecord`] at a time. The record is created
//! on the first TRACKING update and removed, together with its anchor, subtree
//! and composition, on STOPPED.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    AnchorHandle, AnchorProvider, Pose, TrackedImageId, TrackedImageUpdate, TrackingFrame, TrackingMethod,
    TrackingState, UiListener,
};
use crate::assets::AssetLoader;
use crate::catalog::MarkerCatalog;
use crate::core::config::AnchoringConfig;
use crate::foundation::collections::{CompositionId, NodeHandle};
use crate::foundation::math::Vec3;
use crate::pipeline::ResourceJoinPipeline;
use crate::scene::{SceneError, SceneGraph};

/// Lifecycle state of one tracked image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageState {
    /// Never reported
    #[default]
    Unseen,
    /// Reported, not anchored
    Detected,
    /// Anchored with composed content
    Anchored,
    /// Tracking stopped and content removed
    Gone,
}

/// Anchored content of one tracked image
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorRecord {
    image: TrackedImageId,
    anchor: AnchorHandle,
    pose: Pose,
    extent_x: f32,
    extent_z: f32,
    marker_scale: f32,
    subtree: NodeHandle,
    composition: CompositionId,
}

impl AnchorRecord {
    /// Tracked image
    pub fn image(&self) -> TrackedImageId {
        self.image
    }

    /// World anchor
    pub fn anchor(&self) -> AnchorHandle {
        self.anchor
    }

    /// Pose the anchor was created at
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Image extents at anchoring time
    pub fn extents(&self) -> (f32, f32) {
        (self.extent_x, self.extent_z)
    }

    /// Image size relative to the reference artwork
    pub fn marker_scale(&self) -> f32 {
        self.marker_scale
    }

    /// Root node of the marker subtree
    pub fn subtree(&self) -> NodeHandle {
        self.subtree
    }

    /// Pipeline composition feeding the subtree
    pub fn composition(&self) -> CompositionId {
        self.composition
    }
}

/// Maps tracked images to their anchored marker subtrees
pub struct ImageAnchorLifecycle {
    config: AnchoringConfig,
    catalog: Arc<MarkerCatalog>,
    pipeline: ResourceJoinPipeline,
    anchors: Box<dyn AnchorProvider>,
    ui: Box<dyn UiListener>,
    records: HashMap<TrackedImageId, AnchorRecord>,
    states: HashMap<TrackedImageId, ImageState>,
}

impl ImageAnchorLifecycle {
    /// Create a lifecycle anchoring `catalog` through the given collaborators
    pub fn new(
        config: AnchoringConfig,
        catalog: Arc<MarkerCatalog>,
        loader: Arc<dyn AssetLoader>,
        anchors: Box<dyn AnchorProvider>,
        ui: Box<dyn UiListener>,
    ) -> Self {
        Self {
            config,
            catalog,
            pipeline: ResourceJoinPipeline::new(loader),
            anchors,
            ui,
            records: HashMap::new(),
            states: HashMap::new(),
        }
    }

    /// Handle every image update of a camera frame
    ///
    /// The frame is skipped entirely while the camera itself is not tracking.
    pub fn on_frame(&mut self, frame: &TrackingFrame, scene: &mut dyn SceneGraph) {
        if frame.camera_state != TrackingState::Tracking {
            log::trace!("Camera is {:?}, frame skipped", frame.camera_state);
            return;
        }
        for update in &frame.updates {
            self.on_tracked_image_update(update, scene);
        }
    }

    /// Handle one image update
    pub fn on_tracked_image_update(&mut self, update: &TrackedImageUpdate, scene: &mut dyn SceneGraph) {
        match update.state {
            TrackingState::Paused => self.on_paused(update.image),
            TrackingState::Tracking => self.on_tracking(update, scene),
            TrackingState::Stopped => self.on_stopped(update.image, scene),
        }
    }

    /// Show scanning guidance again if nothing is anchored
    pub fn on_resume(&mut self) {
        if self.records.is_empty() {
            self.ui.on_scanning_guidance_visible(true);
        }
    }

    /// Tear down every anchored image, as if each had stopped tracking
    pub fn dismiss_all(&mut self, scene: &mut dyn SceneGraph) {
        let records: Vec<AnchorRecord> = self.records.drain().map(|(_, record)| record).collect();
        if !records.is_empty() {
            log::info!("Dismissing {} anchored image(s)", records.len());
        }
        for record in records {
            self.states.insert(record.image, ImageState::Gone);
            self.teardown(record, scene);
        }
    }

    /// Apply loader completions; returns the number of markers attached
    pub fn process_completions(&mut self, scene: &mut dyn SceneGraph) -> usize {
        self.pipeline.process_completions(scene)
    }

    /// Catalog used for images anchored from now on
    pub fn set_catalog(&mut self, catalog: Arc<MarkerCatalog>) {
        self.catalog = catalog;
    }

    /// Current catalog
    pub fn catalog(&self) -> &Arc<MarkerCatalog> {
        &self.catalog
    }

    /// Lifecycle state of an image
    pub fn state(&self, image: TrackedImageId) -> ImageState {
        self.states.get(&image).copied().unwrap_or_default()
    }

    /// Anchor record of an image, while anchored
    pub fn record(&self, image: TrackedImageId) -> Option<&AnchorRecord> {
        self.records.get(&image)
    }

    /// All current anchor records
    pub fn records(&self) -> impl Iterator<Item = &AnchorRecord> {
        self.records.values()
    }

    /// Number of anchored images
    pub fn anchored_count(&self) -> usize {
        self.records.len()
    }

    /// Composition pipeline, for progress queries
    pub fn pipeline(&self) -> &ResourceJoinPipeline {
        &self.pipeline
    }

    fn on_paused(&mut self, image: TrackedImageId) {
        let state = self.states.entry(image).or_default();
        if *state != ImageState::Anchored {
            *state = ImageState::Detected;
        }
        log::debug!("Detected {}", image);
        self.ui.on_image_detected(image);
    }

    fn on_tracking(&mut self, update: &TrackedImageUpdate, scene: &mut dyn SceneGraph) {
        let image = update.image;
        if self.records.contains_key(&image) {
            log::trace!("{} already anchored", image);
            return;
        }

        self.states.insert(image, ImageState::Detected);
        if self.config.require_full_tracking && update.method != TrackingMethod::FullTracking {
            log::debug!("{} tracked via {:?}, waiting for full tracking", image, update.method);
            return;
        }

        let anchor = match self.anchors.create_anchor(&update.center_pose) {
            Ok(anchor) => anchor,
            Err(e) => {
                log::warn!("Could not anchor {}: {}", image, e);
                return;
            }
        };

        let marker_scale = self.config.marker_scale(update.extent_x, update.extent_z);
        let subtree_scale = self.config.subtree_scale(update.extent_x, update.extent_z);
        if self.config.scale_to_image && subtree_scale.is_none() {
            log::warn!("{} has no usable extents (scale {}), content left unscaled", image, marker_scale);
        }
        let subtree = match Self::create_subtree(scene, &update.center_pose, subtree_scale) {
            Ok(subtree) => subtree,
            Err(e) => {
                log::warn!("Could not attach content for {}: {}", image, e);
                self.anchors.detach_anchor(anchor);
                return;
            }
        };

        log::info!(
            "Anchored {} ({:.3} x {:.3}, marker scale {:.4})",
            image,
            update.extent_x,
            update.extent_z,
            marker_scale
        );

        let composition = self.pipeline.compose(Arc::clone(&self.catalog), subtree);
        self.records.insert(
            image,
            AnchorRecord {
                image,
                anchor,
                pose: update.center_pose,
                extent_x: update.extent_x,
                extent_z: update.extent_z,
                marker_scale,
                subtree,
                composition,
            },
        );
        self.states.insert(image, ImageState::Anchored);
        self.ui.on_scanning_guidance_visible(false);
    }

    fn on_stopped(&mut self, image: TrackedImageId, scene: &mut dyn SceneGraph) {
        match self.records.remove(&image) {
            Some(record) => {
                log::info!("{} stopped tracking, removing its markers", image);
                self.states.insert(image, ImageState::Gone);
                self.teardown(record, scene);
            }
            None => log::trace!("{} stopped without an anchor", image),
        }
    }

    fn create_subtree(scene: &mut dyn SceneGraph, pose: &Pose, scale: Option<f32>) -> Result<NodeHandle, SceneError> {
        let subtree = scene.create_node();
        let root = scene.root();
        let mut result = scene
            .set_local_position(subtree, pose.translation)
            .and_then(|()| scene.set_local_rotation(subtree, pose.rotation));
        if let Some(scale) = scale {
            result = result.and_then(|()| scene.set_local_scale(subtree, Vec3::repeat(scale)));
        }

        match result.and_then(|()| scene.set_parent(subtree, root)) {
            Ok(()) => Ok(subtree),
            Err(e) => {
                if let Err(cleanup) = scene.destroy_node(subtree) {
                    log::debug!("Could not destroy unattached subtree {:?}: {}", subtree, cleanup);
                }
                Err(e)
            }
        }
    }

    fn teardown(&mut self, record: AnchorRecord, scene: &mut dyn SceneGraph) {
        self.pipeline.discard(record.composition);

        if scene.contains(record.subtree) {
            let root = scene.root();
            if let Err(e) = scene.remove_child(root, record.subtree) {
                log::debug!("Subtree of {} was not under the root: {}", record.image, e);
            }
            if let Err(e) = scene.destroy_node(record.subtree) {
                log::debug!("Subtree of {} could not be destroyed: {}", record.image, e);
            }
        } else {
            log::debug!("Subtree of {} already gone", record.image);
        }

        self.anchors.detach_anchor(record.anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MarkerDescriptor;
    use crate::foundation::math::Quat;
    use crate::scene::SimpleSceneGraph;
    use crate::tests::{FakeAnchors, RecordingUi, ScriptedLoader, UiEvent};

    const IMAGE: TrackedImageId = TrackedImageId(3);

    struct Harness {
        lifecycle: ImageAnchorLifecycle,
        scene: SimpleSceneGraph,
        anchors: FakeAnchors,
        ui: RecordingUi,
    }

    fn harness(config: AnchoringConfig, catalog: MarkerCatalog) -> Harness {
        let anchors = FakeAnchors::new();
        let ui = RecordingUi::new();
        let lifecycle = ImageAnchorLifecycle::new(
            config,
            Arc::new(catalog),
            ScriptedLoader::immediate(),
            Box::new(anchors.clone()),
            Box::new(ui.clone()),
        );
        Harness {
            lifecycle,
            scene: SimpleSceneGraph::new(),
            anchors,
            ui,
        }
    }

    fn update(state: TrackingState) -> TrackedImageUpdate {
        TrackedImageUpdate::new(IMAGE, state, TrackingMethod::FullTracking)
    }

    #[test]
    fn test_paused_only_notifies() {
        let mut h = harness(AnchoringConfig::default(), MarkerCatalog::venue_default());

        h.lifecycle.on_tracked_image_update(&update(TrackingState::Paused), &mut h.scene);
        h.lifecycle.on_tracked_image_update(&update(TrackingState::Paused), &mut h.scene);

        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Detected);
        assert_eq!(h.scene.node_count(), 1);
        assert_eq!(h.ui.events(), vec![UiEvent::Detected(IMAGE), UiEvent::Detected(IMAGE)]);
    }

    #[test]
    fn test_tracking_anchors_at_pose() {
        let mut h = harness(AnchoringConfig::default(), MarkerCatalog::venue_default());
        let pose = Pose::new(
            Vec3::new(0.5, -0.2, -1.5),
            Quat::from_axis_angle(&Vec3::x_axis(), -std::f32::consts::FRAC_PI_2),
        );

        h.lifecycle
            .on_tracked_image_update(&update(TrackingState::Tracking).with_pose(pose), &mut h.scene);

        let record = h.lifecycle.record(IMAGE).expect("anchored").clone();
        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Anchored);
        assert_eq!(h.anchors.created(), vec![(record.anchor(), pose)]);
        assert_eq!(record.pose(), &pose);
        assert_eq!(h.scene.parent(record.subtree()), Some(h.scene.root()));
        assert_eq!(h.scene.local_transform(record.subtree()).unwrap().position, pose.translation);
        assert_eq!(h.ui.events(), vec![UiEvent::GuidanceVisible(false)]);

        h.lifecycle.process_completions(&mut h.scene);
        assert_eq!(h.scene.children(record.subtree()).len(), 9);
    }

    #[test]
    fn test_anchor_failure_leaves_image_detected_and_retries() {
        let mut h = harness(AnchoringConfig::default(), MarkerCatalog::venue_default());
        h.anchors.fail_next(1);

        h.lifecycle.on_tracked_image_update(&update(TrackingState::Tracking), &mut h.scene);
        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Detected);
        assert!(h.lifecycle.record(IMAGE).is_none());
        assert_eq!(h.scene.node_count(), 1);
        assert!(h.ui.events().is_empty());

        h.lifecycle.on_tracked_image_update(&update(TrackingState::Tracking), &mut h.scene);
        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Anchored);
        assert_eq!(h.anchors.created().len(), 1);
    }

    #[test]
    fn test_require_full_tracking_ignores_last_known_pose() {
        let config = AnchoringConfig {
            require_full_tracking: true,
            ..AnchoringConfig::default()
        };
        let mut h = harness(config, MarkerCatalog::venue_default());
        let stale = TrackedImageUpdate::new(IMAGE, TrackingState::Tracking, TrackingMethod::LastKnownPose);

        h.lifecycle.on_tracked_image_update(&stale, &mut h.scene);
        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Detected);
        assert!(h.anchors.created().is_empty());

        h.lifecycle.on_tracked_image_update(&update(TrackingState::Tracking), &mut h.scene);
        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Anchored);
    }

    #[test]
    fn test_stopped_without_record_is_a_no_op() {
        let mut h = harness(AnchoringConfig::default(), MarkerCatalog::venue_default());

        h.lifecycle.on_tracked_image_update(&update(TrackingState::Stopped), &mut h.scene);

        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Unseen);
        assert!(h.anchors.detached().is_empty());
        assert!(h.ui.events().is_empty());
    }

    #[test]
    fn test_scale_to_image_scales_subtree() {
        let config = AnchoringConfig {
            reference_edge_size: 2.0,
            scale_to_image: true,
            ..AnchoringConfig::default()
        };
        let mut h = harness(config, MarkerCatalog::default());

        h.lifecycle.on_tracked_image_update(
            &update(TrackingState::Tracking).with_extents(0.5, 1.0),
            &mut h.scene,
        );

        let record = h.lifecycle.record(IMAGE).unwrap();
        assert_eq!(record.marker_scale(), 0.5);
        assert_eq!(record.extents(), (0.5, 1.0));
        assert_eq!(
            h.scene.local_transform(record.subtree()).unwrap().scale,
            Vec3::new(0.5, 0.5, 0.5)
        );
    }

    #[test]
    fn test_scale_to_image_with_zero_extents_keeps_unit_scale() {
        let config = AnchoringConfig {
            scale_to_image: true,
            ..AnchoringConfig::default()
        };
        let mut h = harness(config, MarkerCatalog::default());

        h.lifecycle
            .on_tracked_image_update(&update(TrackingState::Tracking).with_extents(0.0, 0.0), &mut h.scene);

        let record = h.lifecycle.record(IMAGE).unwrap();
        assert_eq!(record.marker_scale(), 0.0);
        assert_eq!(
            h.scene.local_transform(record.subtree()).unwrap().scale,
            Vec3::new(1.0, 1.0, 1.0)
        );
    }

    #[test]
    fn test_set_catalog_applies_to_later_anchors_only() {
        let old = Arc::new(MarkerCatalog::new(vec![
            MarkerDescriptor::new("room1.png", Vec3::new(1.0, 0.0, 0.0)),
            MarkerDescriptor::new("room2.png", Vec3::new(2.0, 0.0, 0.0)),
            MarkerDescriptor::new("room3.png", Vec3::new(3.0, 0.0, 0.0)),
        ]));
        let new = Arc::new(MarkerCatalog::new(vec![MarkerDescriptor::new(
            "upstairs.png",
            Vec3::new(0.0, 1.0, 0.0),
        )]));
        let loader = ScriptedLoader::deferred();
        let mut lifecycle = ImageAnchorLifecycle::new(
            AnchoringConfig::default(),
            Arc::clone(&old),
            loader.clone(),
            Box::new(FakeAnchors::new()),
            Box::new(RecordingUi::new()),
        );
        let mut scene = SimpleSceneGraph::new();

        lifecycle.on_tracked_image_update(&update(TrackingState::Tracking), &mut scene);
        lifecycle.set_catalog(Arc::clone(&new));
        assert!(Arc::ptr_eq(lifecycle.catalog(), &new));

        loader.release_textures();
        lifecycle.process_completions(&mut scene);
        loader.release_materials();
        assert_eq!(lifecycle.process_completions(&mut scene), old.len());

        let first = lifecycle.record(IMAGE).unwrap().clone();
        assert_eq!(scene.children(first.subtree()).len(), 3);
        assert!(Arc::ptr_eq(lifecycle.pipeline().catalog(first.composition()).unwrap(), &old));

        let second_image = TrackedImageId(IMAGE.0 + 1);
        let second_update = TrackedImageUpdate::new(second_image, TrackingState::Tracking, TrackingMethod::FullTracking);
        lifecycle.on_tracked_image_update(&second_update, &mut scene);
        loader.release_textures();
        lifecycle.process_completions(&mut scene);
        loader.release_materials();
        assert_eq!(lifecycle.process_completions(&mut scene), new.len());

        let second = lifecycle.record(second_image).unwrap();
        assert!(Arc::ptr_eq(lifecycle.pipeline().catalog(second.composition()).unwrap(), &new));
        let markers = scene.children(second.subtree());
        assert_eq!(markers.len(), 1);
        assert_eq!(scene.local_transform(markers[0]).unwrap().position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(scene.children(first.subtree()).len(), 3);
    }

    #[test]
    fn test_frame_skipped_while_camera_not_tracking() {
        let mut h = harness(AnchoringConfig::default(), MarkerCatalog::venue_default());
        let frame = TrackingFrame {
            camera_state: TrackingState::Paused,
            updates: vec![update(TrackingState::Tracking)],
        };

        h.lifecycle.on_frame(&frame, &mut h.scene);
        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Unseen);

        let frame = TrackingFrame {
            camera_state: TrackingState::Tracking,
            ..frame
        };
        h.lifecycle.on_frame(&frame, &mut h.scene);
        assert_eq!(h.lifecycle.state(IMAGE), ImageState::Anchored);
    }

    #[test]
    fn test_resume_shows_guidance_only_when_nothing_is_anchored() {
        let mut h = harness(AnchoringConfig::default(), MarkerCatalog::venue_default());

        h.lifecycle.on_resume();
        h.lifecycle.on_tracked_image_update(&update(TrackingState::Tracking), &mut h.scene);
        h.lifecycle.on_resume();

        assert_eq!(
            h.ui.events(),
            vec![UiEvent::GuidanceVisible(true), UiEvent::GuidanceVisible(false)]
        );
    }

    #[test]
    fn test_dismiss_all_tears_everything_down() {
        let mut h = harness(AnchoringConfig::default(), MarkerCatalog::venue_default());
        for index in 0..3 {
            let other = TrackedImageUpdate::new(TrackedImageId(index), TrackingState::Tracking, TrackingMethod::FullTracking);
            h.lifecycle.on_tracked_image_update(&other, &mut h.scene);
        }
        h.lifecycle.process_completions(&mut h.scene);
        assert_eq!(h.lifecycle.anchored_count(), 3);
        let mut anchored: Vec<u32> = h.lifecycle.records().map(|record| record.image().0).collect();
        anchored.sort_unstable();
        assert_eq!(anchored, vec![0, 1, 2]);

        h.lifecycle.dismiss_all(&mut h.scene);

        assert_eq!(h.lifecycle.records().count(), 0);
        assert_eq!(h.lifecycle.anchored_count(), 0);
        assert_eq!(h.scene.node_count(), 1);
        assert_eq!(h.anchors.detached().len(), 3);
        assert_eq!(h.lifecycle.pipeline().active_count(), 0);
        assert_eq!(h.lifecycle.state(TrackedImageId(1)), ImageState::Gone);
    }
}
