//! Anchoring through the threaded loader
//!
//! Stages complete on worker threads while the test plays the render thread,
//! draining completions once per simulated frame.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{FakeAnchors, RecordingUi};
use crate::assets::WorkerPoolLoader;
use crate::catalog::{MarkerCatalog, MarkerDescriptor};
use crate::core::config::{AnchoringConfig, LoaderConfig};
use crate::foundation::math::Vec3;
use crate::scene::{SceneGraph, SimpleSceneGraph};
use crate::tracking::{ImageAnchorLifecycle, TrackedImageId, TrackedImageUpdate, TrackingMethod, TrackingState};

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: TrackedImageId = TrackedImageId(1);

    fn run_frames_until(lifecycle: &mut ImageAnchorLifecycle, scene: &mut SimpleSceneGraph, done: impl Fn(&ImageAnchorLifecycle) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(lifecycle) {
            assert!(Instant::now() < deadline, "composition did not finish");
            lifecycle.process_completions(scene);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn composed(lifecycle: &ImageAnchorLifecycle) -> bool {
        lifecycle
            .record(IMAGE)
            .and_then(|record| lifecycle.pipeline().composition_status(record.composition()))
            .map_or(false, |stats| stats.composed)
    }

    #[test]
    fn test_worker_pool_composes_solid_markers() {
        let loader = WorkerPoolLoader::new(LoaderConfig {
            search_paths: Vec::new(),
            worker_threads: 3,
            missing_texture_color: None,
        })
        .unwrap();
        let catalog = MarkerCatalog::new(vec![
            MarkerDescriptor::new("solid:ff0000", Vec3::new(1.0, 0.0, 0.0)),
            MarkerDescriptor::new("solid:00ff00", Vec3::new(0.0, 1.0, 0.0)),
            MarkerDescriptor::new("missing.png", Vec3::new(0.0, 0.0, 1.0)),
            MarkerDescriptor::new("solid:0000ff", Vec3::new(-1.0, 0.0, 0.0)),
        ]);
        let mut lifecycle = ImageAnchorLifecycle::new(
            AnchoringConfig::default(),
            Arc::new(catalog),
            Arc::new(loader),
            Box::new(FakeAnchors::new()),
            Box::new(RecordingUi::new()),
        );
        let mut scene = SimpleSceneGraph::new();

        let update = TrackedImageUpdate::new(IMAGE, TrackingState::Tracking, TrackingMethod::FullTracking);
        lifecycle.on_tracked_image_update(&update, &mut scene);
        run_frames_until(&mut lifecycle, &mut scene, composed);

        let record = lifecycle.record(IMAGE).unwrap();
        assert_eq!(scene.children(record.subtree()).len(), 3);
        let stats = lifecycle.pipeline().composition_status(record.composition()).unwrap();
        assert_eq!((stats.attached, stats.failed), (3, 1));
    }

    #[test]
    fn test_stop_during_threaded_load_leaves_scene_clean() {
        let loader = WorkerPoolLoader::new(LoaderConfig {
            missing_texture_color: Some([255, 0, 255, 255]),
            ..LoaderConfig::default()
        })
        .unwrap();
        let mut lifecycle = ImageAnchorLifecycle::new(
            AnchoringConfig::default(),
            Arc::new(MarkerCatalog::venue_default()),
            Arc::new(loader),
            Box::new(FakeAnchors::new()),
            Box::new(RecordingUi::new()),
        );
        let mut scene = SimpleSceneGraph::new();

        let tracking = TrackedImageUpdate::new(IMAGE, TrackingState::Tracking, TrackingMethod::FullTracking);
        let stopped = TrackedImageUpdate::new(IMAGE, TrackingState::Stopped, TrackingMethod::NotTracking);
        lifecycle.on_tracked_image_update(&tracking, &mut scene);
        lifecycle.on_tracked_image_update(&stopped, &mut scene);

        // Let every worker finish, then drain whatever they delivered
        std::thread::sleep(Duration::from_millis(50));
        for _ in 0..10 {
            assert_eq!(lifecycle.process_completions(&mut scene), 0);
        }
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.children(scene.root()).len(), 0);
    }
}
