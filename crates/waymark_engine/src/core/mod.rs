//! Core module
//!
//! Provides the unified configuration types shared by the tracking layer,
//! the asset loader and the demo application.

pub mod config;

pub use config::{AnchoringConfig, LoaderConfig, WaymarkConfig};
