//! Marker composition pipeline
//!
//! Turns a [`MarkerCatalog`](crate::catalog::MarkerCatalog) into attached
//! scene nodes. Every marker loads through texture → material → renderable;
//! the [`ResourceJoinPipeline`] waits for all of them through a
//! [`CompletionJoin`] and only then touches the scene.

pub mod join;
pub mod resource_join;

pub use join::CompletionJoin;
pub use resource_join::{ComposeStats, MarkerInstance, PipelineError, ResourceJoinPipeline};
