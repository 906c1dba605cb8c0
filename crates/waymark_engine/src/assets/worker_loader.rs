//! Thread-pool asset loader
//!
//! Texture decoding and material composition run on a fixed set of worker
//! threads fed through a crossbeam channel. Each job completes its stage
//! handle when it finishes; the caller never waits on a worker.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};

use super::{AssetError, AssetLoader, ImageData, LoadStageHandle, Material, Mesh, Renderable, Texture};
use crate::core::config::LoaderConfig;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Asset loader backed by a pool of worker threads
pub struct WorkerPoolLoader {
    config: Arc<LoaderConfig>,
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPoolLoader {
    /// Spawn the worker threads
    pub fn new(config: LoaderConfig) -> Result<Self, AssetError> {
        let thread_count = config.worker_threads.max(1);
        let (sender, receiver) = channel::unbounded::<Job>();

        let mut workers = Vec::with_capacity(thread_count);
        for index in 0..thread_count {
            let receiver = receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("asset-loader-{}", index))
                .spawn(move || {
                    for job in receiver.iter() {
                        job();
                    }
                })
                .map_err(|e| AssetError::LoadFailed(format!("Failed to spawn loader thread: {}", e)))?;
            workers.push(worker);
        }

        log::info!("Asset loader started with {} worker thread(s)", thread_count);

        Ok(Self {
            config: Arc::new(config),
            jobs: Some(sender),
            workers,
        })
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn submit(&self, job: Job) {
        // A rejected job is dropped with its completer, which fails the stage
        match &self.jobs {
            Some(jobs) => {
                if jobs.send(job).is_err() {
                    log::warn!("Asset loader workers are gone, job dropped");
                }
            }
            None => log::warn!("Asset loader is shutting down, job dropped"),
        }
    }
}

impl AssetLoader for WorkerPoolLoader {
    fn load_texture(&self, asset: &str) -> LoadStageHandle<Texture> {
        let (handle, completer) = LoadStageHandle::pending(asset);
        let config = Arc::clone(&self.config);
        let asset = asset.to_string();
        self.submit(Box::new(move || {
            completer.complete(load_texture(&config, &asset));
        }));
        handle
    }

    fn compose_material(&self, texture: &Texture) -> LoadStageHandle<Material> {
        let (handle, completer) = LoadStageHandle::pending(format!("material:{}", texture.name));
        let texture = texture.clone();
        self.submit(Box::new(move || {
            let result = if texture.image.is_empty() {
                Err(AssetError::InvalidData(format!("Texture '{}' has no pixels", texture.name)))
            } else {
                Ok(Material::textured(texture))
            };
            completer.complete(result);
        }));
        handle
    }

    fn build_renderable(&self, mesh: &Mesh, material: &Material) -> Result<Renderable, AssetError> {
        mesh.validate().map_err(AssetError::InvalidData)?;
        if mesh.is_empty() {
            return Err(AssetError::InvalidData("Mesh has no triangles".to_string()));
        }
        Ok(Renderable::new(mesh.clone(), material.clone()))
    }
}

impl Drop for WorkerPoolLoader {
    fn drop(&mut self) {
        // Closing the channel lets every worker finish its queue and exit
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Asset loader worker panicked");
            }
        }
    }
}

/// Resolve and decode one texture reference
///
/// `solid:` references are generated; anything else is looked up in the
/// configured search paths, then as a plain path.
fn load_texture(config: &LoaderConfig, asset: &str) -> Result<Texture, AssetError> {
    if let Some(generated) = ImageData::from_solid_reference(asset) {
        return generated.map(|image| Texture::new(asset, image));
    }

    match resolve_path(&config.search_paths, asset) {
        Some(path) => ImageData::from_file(path).map(|image| Texture::new(asset, image)),
        None => match config.missing_texture_color {
            Some(color) => {
                log::warn!("Texture '{}' not found, using placeholder color", asset);
                Ok(Texture::new(asset, ImageData::solid_color(1, 1, color)))
            }
            None => Err(AssetError::NotFound(asset.to_string())),
        },
    }
}

fn resolve_path(search_paths: &[PathBuf], asset: &str) -> Option<PathBuf> {
    search_paths
        .iter()
        .map(|dir| dir.join(asset))
        .chain(std::iter::once(PathBuf::from(asset)))
        .find(|candidate| candidate.is_file())
}
