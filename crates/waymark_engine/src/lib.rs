//! # Waymark Engine
//!
//! Anchors camera-facing markers to reference images tracked by an AR session.
//!
//! ## Features
//!
//! - **Anchor Lifecycle**: One anchored subtree per tracked image, created on
//!   first tracking and torn down when tracking stops
//! - **Resource Join Pipeline**: Texture, material and renderable stages joined
//!   per marker before anything reaches the scene
//! - **Orientation Behaviors**: Upright billboards and flat directional arrows
//!   re-aimed at the camera every frame
//! - **Pluggable Collaborators**: Tracking, scene graph, asset loading and UI
//!   are traits with in-memory reference implementations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use waymark_engine::prelude::*;
//!
//! struct NoAnchors;
//!
//! impl AnchorProvider for NoAnchors {
//!     fn create_anchor(&mut self, _pose: &Pose) -> Result<AnchorHandle, TrackingError> {
//!         Ok(AnchorHandle(0))
//!     }
//!     fn detach_anchor(&mut self, _anchor: AnchorHandle) {}
//! }
//!
//! struct QuietUi;
//!
//! impl UiListener for QuietUi {
//!     fn on_image_detected(&mut self, _image: TrackedImageId) {}
//!     fn on_scanning_guidance_visible(&mut self, _visible: bool) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WaymarkConfig::default();
//!     let loader = Arc::new(WorkerPoolLoader::new(config.loader.clone())?);
//!     let mut lifecycle = ImageAnchorLifecycle::new(
//!         config.anchoring.clone(),
//!         config.catalog(),
//!         loader,
//!         Box::new(NoAnchors),
//!         Box::new(QuietUi),
//!     );
//!     let mut scene = SimpleSceneGraph::new();
//!     let mut orientation = OrientationSystem::new();
//!
//!     // Once per camera frame
//!     let frame = TrackingFrame { camera_state: TrackingState::Tracking, updates: Vec::new() };
//!     lifecycle.on_frame(&frame, &mut scene);
//!     lifecycle.process_completions(&mut scene);
//!     orientation.update(&mut scene);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core configuration
pub mod core;
pub mod config;

pub mod foundation;
pub mod assets;
pub mod catalog;
pub mod orientation;
pub mod pipeline;
pub mod scene;
pub mod tracking;

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, AssetLoader, LoadStageHandle, Material, Mesh, Renderable, Texture, WorkerPoolLoader},
        catalog::{MarkerCatalog, MarkerDescriptor},
        config::{Config, ConfigError},
        core::config::{AnchoringConfig, LoaderConfig, WaymarkConfig},
        foundation::{
            collections::{CompositionId, NodeHandle},
            math::{Quat, Transform, Vec2, Vec3},
        },
        orientation::{OrientationBehavior, OrientationSystem},
        pipeline::{ComposeStats, ResourceJoinPipeline},
        scene::{SceneError, SceneGraph, SimpleSceneGraph},
        tracking::{
            AnchorHandle, AnchorProvider, ImageAnchorLifecycle, ImageState, Pose, TrackedImageId,
            TrackedImageUpdate, TrackingError, TrackingFrame, TrackingMethod, TrackingState, UiListener,
        },
    };
}
