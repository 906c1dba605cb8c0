//! Asset management system
//!
//! Marker content goes through three load stages: a texture, a material
//! composed from that texture, and a renderable built from the material and a
//! quad mesh. The first two are asynchronous and surface as
//! [`LoadStageHandle`]s; the last is synchronous once its material is ready.

pub mod image_loader;
pub mod mesh;
pub mod stage;
pub mod worker_loader;

pub use image_loader::ImageData;
pub use mesh::{Mesh, Vertex};
pub use stage::{LoadStageHandle, StageCompleter, StageStatus};
pub use worker_loader::WorkerPoolLoader;

use std::sync::Arc;
use thiserror::Error;

/// Decoded texture ready for material composition
#[derive(Debug, Clone)]
pub struct Texture {
    /// Asset reference the texture was loaded from
    pub name: String,
    /// Shared pixel data
    pub image: Arc<ImageData>,
}

impl Texture {
    /// Wrap decoded image data
    pub fn new(name: impl Into<String>, image: ImageData) -> Self {
        Self {
            name: name.into(),
            image: Arc::new(image),
        }
    }
}

/// Surface parameters of a marker material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    /// Multiplied with the texture color
    pub base_color: [f32; 4],
    /// Ignore scene lighting
    pub unlit: bool,
    /// Render both faces of the quad
    pub double_sided: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            unlit: true,
            double_sided: true,
        }
    }
}

/// Material composed from a loaded texture
#[derive(Debug, Clone)]
pub struct Material {
    /// Color texture
    pub texture: Texture,
    /// Surface parameters
    pub params: MaterialParams,
}

impl Material {
    /// Textured material with default marker parameters
    pub fn textured(texture: Texture) -> Self {
        Self {
            texture,
            params: MaterialParams::default(),
        }
    }
}

/// Mesh plus material, attachable to a scene node
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Geometry
    pub mesh: Arc<Mesh>,
    /// Surface
    pub material: Material,
}

impl Renderable {
    /// Pair a mesh with a material
    pub fn new(mesh: Mesh, material: Material) -> Self {
        Self {
            mesh: Arc::new(mesh),
            material,
        }
    }
}

/// Asynchronous asset loading consumed by the composition pipeline
///
/// `load_texture` and `compose_material` must return immediately; the work
/// may run on any thread and finishes by completing the returned handle.
pub trait AssetLoader: Send + Sync {
    /// Start loading the texture named by an asset reference
    fn load_texture(&self, asset: &str) -> LoadStageHandle<Texture>;

    /// Start composing a material around a loaded texture
    fn compose_material(&self, texture: &Texture) -> LoadStageHandle<Material>;

    /// Build the drawable for a marker once its material is ready
    fn build_renderable(&self, mesh: &Mesh, material: &Material) -> Result<Renderable, AssetError>;
}

/// Asset loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The loader went away before finishing the stage
    #[error("Loader dropped stage before completion: {0}")]
    Abandoned(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AssetError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
