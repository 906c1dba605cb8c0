//! Scene graph seam
//!
//! The renderer owns the real scene graph. This crate only issues
//! create/attach/detach/transform calls through the [`SceneGraph`] trait and
//! reads world positions back. [`SimpleSceneGraph`] is an in-memory
//! implementation used by the demo application and the tests.
//!
//! ## Architecture
//!
//! ```text
//! ImageAnchorLifecycle / ResourceJoinPipeline / OrientationSystem
//!      ↓ (SceneGraph trait)
//! Renderer scene graph (external)
//! ```

mod scene_graph;
mod simple_graph;

pub use scene_graph::{SceneError, SceneGraph};
pub use simple_graph::SimpleSceneGraph;
pub use crate::foundation::collections::NodeHandle;
