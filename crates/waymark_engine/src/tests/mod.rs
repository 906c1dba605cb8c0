//! Shared test doubles and cross-module scenarios

mod loader_integration;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::assets::{
    AssetError, AssetLoader, ImageData, LoadStageHandle, Material, Mesh, Renderable, StageCompleter, Texture,
};
use crate::tracking::{AnchorHandle, AnchorProvider, Pose, TrackedImageId, TrackingError, UiListener};

#[derive(Default)]
struct LoaderState {
    deferred: bool,
    failing_textures: HashSet<String>,
    failing_renderables: HashSet<String>,
    pending_textures: Vec<(String, StageCompleter<Texture>)>,
    pending_materials: Vec<(Texture, StageCompleter<Material>)>,
    texture_requests: usize,
    material_requests: usize,
}

/// Asset loader whose stages complete on command
///
/// In immediate mode every stage settles inside the call that starts it. In
/// deferred mode stages stay pending until released, which lets a test pick
/// the order completions arrive in.
pub struct ScriptedLoader {
    state: Mutex<LoaderState>,
}

impl ScriptedLoader {
    /// Loader completing every stage synchronously
    pub fn immediate() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LoaderState::default()),
        })
    }

    /// Loader holding every stage until released
    pub fn deferred() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LoaderState {
                deferred: true,
                ..LoaderState::default()
            }),
        })
    }

    /// Make loads of `asset` fail with NotFound
    pub fn fail_texture(&self, asset: &str) {
        self.state.lock().unwrap().failing_textures.insert(asset.to_string());
    }

    /// Make building the renderable for `asset` fail with InvalidData
    pub fn fail_renderable(&self, asset: &str) {
        self.state.lock().unwrap().failing_renderables.insert(asset.to_string());
    }

    /// Complete every pending texture, returning how many were released
    pub fn release_textures(&self) -> usize {
        let (pending, failing) = {
            let mut state = self.state.lock().unwrap();
            (std::mem::take(&mut state.pending_textures), state.failing_textures.clone())
        };
        let count = pending.len();
        for (asset, completer) in pending {
            completer.complete(texture_result(&asset, &failing));
        }
        count
    }

    /// Complete pending textures for one asset only
    pub fn release_texture(&self, asset: &str) -> usize {
        let (matching, failing) = {
            let mut state = self.state.lock().unwrap();
            let (matching, rest) = std::mem::take(&mut state.pending_textures)
                .into_iter()
                .partition::<Vec<_>, _>(|(name, _)| name == asset);
            state.pending_textures = rest;
            (matching, state.failing_textures.clone())
        };
        let count = matching.len();
        for (name, completer) in matching {
            completer.complete(texture_result(&name, &failing));
        }
        count
    }

    /// Complete every pending material
    pub fn release_materials(&self) -> usize {
        let pending = std::mem::take(&mut self.state.lock().unwrap().pending_materials);
        let count = pending.len();
        for (texture, completer) in pending {
            completer.complete(Ok(Material::textured(texture)));
        }
        count
    }

    /// Drop every pending material completer without completing it
    pub fn abandon_materials(&self) -> usize {
        let pending = std::mem::take(&mut self.state.lock().unwrap().pending_materials);
        pending.len()
    }

    /// Texture loads started so far
    pub fn texture_requests(&self) -> usize {
        self.state.lock().unwrap().texture_requests
    }

    /// Material loads started so far
    pub fn material_requests(&self) -> usize {
        self.state.lock().unwrap().material_requests
    }
}

fn texture_result(asset: &str, failing: &HashSet<String>) -> Result<Texture, AssetError> {
    if failing.contains(asset) {
        Err(AssetError::NotFound(asset.to_string()))
    } else {
        Ok(Texture::new(asset, ImageData::solid_color(2, 2, [200, 200, 200, 255])))
    }
}

impl AssetLoader for ScriptedLoader {
    fn load_texture(&self, asset: &str) -> LoadStageHandle<Texture> {
        let mut state = self.state.lock().unwrap();
        state.texture_requests += 1;
        if state.deferred {
            let (handle, completer) = LoadStageHandle::pending(asset);
            state.pending_textures.push((asset.to_string(), completer));
            return handle;
        }
        match texture_result(asset, &state.failing_textures) {
            Ok(texture) => LoadStageHandle::ready(asset, texture),
            Err(error) => LoadStageHandle::failed(asset, error),
        }
    }

    fn compose_material(&self, texture: &Texture) -> LoadStageHandle<Material> {
        let mut state = self.state.lock().unwrap();
        state.material_requests += 1;
        if state.deferred {
            let (handle, completer) = LoadStageHandle::pending(texture.name.clone());
            state.pending_materials.push((texture.clone(), completer));
            return handle;
        }
        LoadStageHandle::ready(texture.name.clone(), Material::textured(texture.clone()))
    }

    fn build_renderable(&self, mesh: &Mesh, material: &Material) -> Result<Renderable, AssetError> {
        let asset = &material.texture.name;
        if self.state.lock().unwrap().failing_renderables.contains(asset) {
            return Err(AssetError::InvalidData(format!("no renderable for '{}'", asset)));
        }
        Ok(Renderable::new(mesh.clone(), material.clone()))
    }
}

#[derive(Default)]
struct AnchorLog {
    next_id: u64,
    fail_next: usize,
    created: Vec<(AnchorHandle, Pose)>,
    detached: Vec<AnchorHandle>,
}

/// Anchor provider that records calls and can be told to fail
#[derive(Clone, Default)]
pub struct FakeAnchors {
    log: Arc<Mutex<AnchorLog>>,
}

impl FakeAnchors {
    /// Provider that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` anchor creations
    pub fn fail_next(&self, count: usize) {
        self.log.lock().unwrap().fail_next = count;
    }

    /// Every anchor created, in order
    pub fn created(&self) -> Vec<(AnchorHandle, Pose)> {
        self.log.lock().unwrap().created.clone()
    }

    /// Every anchor detached, in order
    pub fn detached(&self) -> Vec<AnchorHandle> {
        self.log.lock().unwrap().detached.clone()
    }

    /// Anchors created and not yet detached
    pub fn live(&self) -> usize {
        let log = self.log.lock().unwrap();
        log.created.len() - log.detached.len()
    }
}

impl AnchorProvider for FakeAnchors {
    fn create_anchor(&mut self, pose: &Pose) -> Result<AnchorHandle, TrackingError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_next > 0 {
            log.fail_next -= 1;
            return Err(TrackingError::AnchorCreationFailed("scripted failure".into()));
        }
        log.next_id += 1;
        let anchor = AnchorHandle(log.next_id);
        log.created.push((anchor, *pose));
        Ok(anchor)
    }

    fn detach_anchor(&mut self, anchor: AnchorHandle) {
        self.log.lock().unwrap().detached.push(anchor);
    }
}

/// Notification seen by [`RecordingUi`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// `on_image_detected`
    Detected(TrackedImageId),
    /// `on_scanning_guidance_visible`
    GuidanceVisible(bool),
}

/// UI listener that records every notification
#[derive(Clone, Default)]
pub struct RecordingUi {
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl RecordingUi {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications so far
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl UiListener for RecordingUi {
    fn on_image_detected(&mut self, image: TrackedImageId) {
        self.events.lock().unwrap().push(UiEvent::Detected(image));
    }

    fn on_scanning_guidance_visible(&mut self, visible: bool) {
        self.events.lock().unwrap().push(UiEvent::GuidanceVisible(visible));
    }
}
