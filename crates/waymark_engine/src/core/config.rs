//! # Unified Configuration System
//!
//! Configuration for anchoring behavior, the reference asset loader and an
//! optional marker catalog. Every section has defaults, so a config file only
//! needs the values it changes.
//!
//! ```toml
//! [anchoring]
//! require_full_tracking = true
//!
//! [loader]
//! search_paths = ["assets/markers"]
//! worker_threads = 2
//!
//! [[catalog.markers]]
//! asset = "room1.png"
//! offset = [2.0, -2.0, 1.0]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::MarkerCatalog;
pub use crate::config::{Config, ConfigError};

/// Edge length of the reference artwork the venue offsets were authored against
///
/// This is a pixel-space figure. Tracked image extents arrive in session
/// units (meters), so with this default a 0.5 m poster yields a marker scale
/// of about 0.001. Deployments that enable `scale_to_image` set
/// `reference_edge_size` to the printed edge length in meters instead.
pub const DEFAULT_REFERENCE_EDGE_SIZE: f32 = 492.65;

/// # Anchoring Configuration
///
/// Controls when a tracked image gets an anchor and how its marker subtree is
/// scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchoringConfig {
    /// Only anchor on full tracking, not on a last-known pose
    pub require_full_tracking: bool,
    /// Image edge size that maps to a marker scale of 1.0, in the same unit
    /// as the tracked image extents
    pub reference_edge_size: f32,
    /// Apply the image-derived scale to the anchor subtree
    pub scale_to_image: bool,
}

impl Default for AnchoringConfig {
    fn default() -> Self {
        Self {
            require_full_tracking: false,
            reference_edge_size: DEFAULT_REFERENCE_EDGE_SIZE,
            scale_to_image: false,
        }
    }
}

impl AnchoringConfig {
    /// Marker scale for a tracked image of the given extents
    pub fn marker_scale(&self, extent_x: f32, extent_z: f32) -> f32 {
        extent_x.max(extent_z) / self.reference_edge_size
    }

    /// Uniform scale to apply to an anchor subtree, if any
    ///
    /// `None` when `scale_to_image` is off, or when the extents give a scale
    /// that is not positive and finite (an image reported with no size).
    pub fn subtree_scale(&self, extent_x: f32, extent_z: f32) -> Option<f32> {
        if !self.scale_to_image {
            return None;
        }
        let scale = self.marker_scale(extent_x, extent_z);
        (scale.is_finite() && scale > 0.0).then_some(scale)
    }

    /// Reject values that would produce a degenerate scale
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.reference_edge_size.is_finite() && self.reference_edge_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reference_edge_size must be positive, got {}",
                self.reference_edge_size
            )));
        }
        Ok(())
    }
}

/// # Loader Configuration
///
/// Settings for the worker-pool asset loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directories searched, in order, for file asset references
    pub search_paths: Vec<PathBuf>,
    /// Number of worker threads
    pub worker_threads: usize,
    /// RGBA color substituted for textures that cannot be found
    pub missing_texture_color: Option<[u8; 4]>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![
                PathBuf::from("assets/markers"),
                PathBuf::from("resources/markers"),
                PathBuf::from("../assets/markers"),
            ],
            worker_threads: 2,
            missing_texture_color: None,
        }
    }
}

/// # Top-level Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaymarkConfig {
    /// Anchoring behavior
    pub anchoring: AnchoringConfig,
    /// Asset loader settings
    pub loader: LoaderConfig,
    /// Marker catalog; the built-in venue map when absent
    pub catalog: Option<MarkerCatalog>,
}

impl Config for WaymarkConfig {}

impl WaymarkConfig {
    /// Catalog to anchor, shared read-only
    pub fn catalog(&self) -> Arc<MarkerCatalog> {
        Arc::new(self.catalog.clone().unwrap_or_else(MarkerCatalog::venue_default))
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.anchoring.validate()?;
        if self.loader.worker_threads == 0 {
            return Err(ConfigError::Invalid("loader.worker_threads must be at least 1".to_string()));
        }
        if let Some(catalog) = &self.catalog {
            catalog.validate().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }
}
