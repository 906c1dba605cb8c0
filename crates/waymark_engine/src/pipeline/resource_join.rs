//! Resource join pipeline
//!
//! One composition per subtree root. A composition starts a texture load for
//! every catalog entry, chains a material load onto each texture as soon as it
//! is ready, and settles one [`CompletionJoin`] slot per marker when its last
//! stage is done. Once the join fires the markers that made it through are
//! built and attached in one go.
//!
//! Loader threads never touch the scene. Stage callbacks only push a
//! [`StageEvent`] into a channel that the render thread drains in
//! [`ResourceJoinPipeline::process_completions`].

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use thiserror::Error;

use super::join::CompletionJoin;
use crate::assets::{AssetError, AssetLoader, LoadStageHandle, Material, Mesh, Renderable, StageStatus, Texture};
use crate::catalog::{MarkerCatalog, MarkerDescriptor};
use crate::foundation::collections::{CompositionId, NodeHandle, SlotMap};
use crate::scene::{SceneError, SceneGraph};

/// Why a marker was left out of its composition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A load stage failed
    #[error("Asset stage failed: {0}")]
    Asset(#[from] AssetError),

    /// The node could not be attached
    #[error("Scene attachment failed: {0}")]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageKind {
    Texture,
    Material,
}

/// Completion notice sent from a loader thread
#[derive(Debug, Clone, Copy)]
struct StageEvent {
    composition: CompositionId,
    index: usize,
    stage: StageKind,
}

/// Per-marker load progress
#[derive(Debug)]
pub struct MarkerInstance {
    descriptor: MarkerDescriptor,
    texture: LoadStageHandle<Texture>,
    material: Option<LoadStageHandle<Material>>,
    renderable: Option<Renderable>,
    node: Option<NodeHandle>,
    failure: Option<PipelineError>,
}

impl MarkerInstance {
    fn new(descriptor: MarkerDescriptor, texture: LoadStageHandle<Texture>) -> Self {
        Self {
            descriptor,
            texture,
            material: None,
            renderable: None,
            node: None,
            failure: None,
        }
    }

    /// Catalog entry this instance was created from
    pub fn descriptor(&self) -> &MarkerDescriptor {
        &self.descriptor
    }

    /// Texture stage status
    pub fn texture_status(&self) -> StageStatus {
        self.texture.status()
    }

    /// Material stage status, `None` until the material load was issued
    pub fn material_status(&self) -> Option<StageStatus> {
        self.material.as_ref().map(LoadStageHandle::status)
    }

    /// Built renderable, once attached
    pub fn renderable(&self) -> Option<&Renderable> {
        self.renderable.as_ref()
    }

    /// Scene node, present only when every stage succeeded
    pub fn node(&self) -> Option<NodeHandle> {
        self.node
    }

    /// Why the instance was excluded
    pub fn failure(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    fn fail(&mut self, error: PipelineError) {
        log::warn!("Marker '{}' excluded: {}", self.descriptor.asset, error);
        self.failure = Some(error);
    }
}

struct Composition {
    parent: NodeHandle,
    catalog: Arc<MarkerCatalog>,
    instances: Vec<MarkerInstance>,
    join: CompletionJoin,
    composed: bool,
}

/// Progress summary of one composition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeStats {
    /// The join fired and attachment ran
    pub composed: bool,
    /// Markers attached to the scene
    pub attached: usize,
    /// Markers excluded by a failure
    pub failed: usize,
    /// Markers still loading
    pub pending: usize,
}

/// Composes marker subtrees from a catalog
pub struct ResourceJoinPipeline {
    loader: Arc<dyn AssetLoader>,
    compositions: SlotMap<CompositionId, Composition>,
    by_parent: HashMap<NodeHandle, CompositionId>,
    events_tx: Sender<StageEvent>,
    events_rx: Receiver<StageEvent>,
}

impl ResourceJoinPipeline {
    /// Create a pipeline loading through `loader`
    pub fn new(loader: Arc<dyn AssetLoader>) -> Self {
        let (events_tx, events_rx) = channel::unbounded();
        Self {
            loader,
            compositions: SlotMap::with_key(),
            by_parent: HashMap::new(),
            events_tx,
            events_rx,
        }
    }

    /// Start composing `catalog` under `parent`
    ///
    /// Returns immediately. If `parent` already has a composition, composed or
    /// still loading, its id is returned and nothing new is started.
    pub fn compose(&mut self, catalog: Arc<MarkerCatalog>, parent: NodeHandle) -> CompositionId {
        if let Some(&existing) = self.by_parent.get(&parent) {
            if self.compositions.contains_key(existing) {
                log::debug!("Parent {:?} already composing as {:?}", parent, existing);
                return existing;
            }
        }

        let instances: Vec<MarkerInstance> = catalog
            .descriptors()
            .iter()
            .map(|descriptor| MarkerInstance::new(descriptor.clone(), self.loader.load_texture(&descriptor.asset)))
            .collect();
        let marker_count = instances.len();

        let id = self.compositions.insert(Composition {
            parent,
            catalog,
            join: CompletionJoin::new(marker_count),
            composed: marker_count == 0,
            instances,
        });
        self.by_parent.insert(parent, id);

        if let Some(composition) = self.compositions.get(id) {
            for (index, instance) in composition.instances.iter().enumerate() {
                let events = self.events_tx.clone();
                instance.texture.on_settled(move || {
                    let event = StageEvent {
                        composition: id,
                        index,
                        stage: StageKind::Texture,
                    };
                    if events.send(event).is_err() {
                        log::debug!("Pipeline dropped before texture completion of {:?}", id);
                    }
                });
            }
        }

        if marker_count == 0 {
            log::info!("Composition {:?} has no markers, composed immediately", id);
        } else {
            log::debug!("Composition {:?} started with {} marker(s)", id, marker_count);
        }
        id
    }

    /// Apply every completion delivered since the last call
    ///
    /// Never blocks. Returns the number of nodes attached during this call.
    pub fn process_completions(&mut self, scene: &mut dyn SceneGraph) -> usize {
        let mut attached = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            attached += self.handle_event(event, scene);
        }
        attached
    }

    /// Forget a composition; later completions for it are ignored
    ///
    /// The scene is left alone, the owner of the subtree root destroys it.
    pub fn discard(&mut self, id: CompositionId) -> bool {
        match self.compositions.remove(id) {
            Some(composition) => {
                if self.by_parent.get(&composition.parent) == Some(&id) {
                    self.by_parent.remove(&composition.parent);
                }
                log::debug!("Composition {:?} discarded", id);
                true
            }
            None => false,
        }
    }

    /// Progress of a composition, `None` once discarded
    pub fn composition_status(&self, id: CompositionId) -> Option<ComposeStats> {
        let composition = self.compositions.get(id)?;
        let mut stats = ComposeStats {
            composed: composition.composed,
            ..ComposeStats::default()
        };
        for instance in &composition.instances {
            if instance.node.is_some() {
                stats.attached += 1;
            } else if instance.failure.is_some() {
                stats.failed += 1;
            } else {
                stats.pending += 1;
            }
        }
        Some(stats)
    }

    /// Marker instances of a composition
    pub fn instances(&self, id: CompositionId) -> Option<&[MarkerInstance]> {
        self.compositions.get(id).map(|composition| composition.instances.as_slice())
    }

    /// Catalog a composition was started with
    pub fn catalog(&self, id: CompositionId) -> Option<&Arc<MarkerCatalog>> {
        self.compositions.get(id).map(|composition| &composition.catalog)
    }

    /// Composition attached under `parent`, if any
    pub fn composition_for(&self, parent: NodeHandle) -> Option<CompositionId> {
        self.by_parent
            .get(&parent)
            .copied()
            .filter(|id| self.compositions.contains_key(*id))
    }

    /// Number of live compositions
    pub fn active_count(&self) -> usize {
        self.compositions.len()
    }

    fn handle_event(&mut self, event: StageEvent, scene: &mut dyn SceneGraph) -> usize {
        let Some(composition) = self.compositions.get_mut(event.composition) else {
            log::debug!("Ignoring {:?} completion for discarded {:?}", event.stage, event.composition);
            return 0;
        };
        let Some(instance) = composition.instances.get_mut(event.index) else {
            return 0;
        };

        let last_stage_done = match event.stage {
            StageKind::Texture => match instance.texture.outcome() {
                Some(Ok(texture)) => {
                    let material = self.loader.compose_material(&texture);
                    log::trace!("Material '{}' requested for {:?}", material.label(), event.composition);
                    let events = self.events_tx.clone();
                    let (composition_id, index) = (event.composition, event.index);
                    material.on_settled(move || {
                        let event = StageEvent {
                            composition: composition_id,
                            index,
                            stage: StageKind::Material,
                        };
                        if events.send(event).is_err() {
                            log::debug!("Pipeline dropped before material completion of {:?}", composition_id);
                        }
                    });
                    instance.material = Some(material);
                    false
                }
                Some(Err(error)) => {
                    instance.fail(error.into());
                    true
                }
                None => false,
            },
            StageKind::Material => match instance.material.as_ref().map(LoadStageHandle::status) {
                Some(StageStatus::Ready) => true,
                Some(StageStatus::Failed) => {
                    let error = instance
                        .material
                        .as_ref()
                        .and_then(LoadStageHandle::error)
                        .unwrap_or_else(|| AssetError::LoadFailed(instance.descriptor.asset.clone()));
                    instance.fail(error.into());
                    true
                }
                _ => false,
            },
        };

        if last_stage_done && composition.join.settle(event.index) {
            return self.finish(event.composition, scene);
        }
        0
    }

    fn finish(&mut self, id: CompositionId, scene: &mut dyn SceneGraph) -> usize {
        let Some(composition) = self.compositions.get_mut(id) else {
            return 0;
        };
        composition.composed = true;

        let parent = composition.parent;
        if !scene.contains(parent) {
            log::debug!("Subtree root {:?} is gone, composition {:?} not attached", parent, id);
            return 0;
        }

        let mut attached = 0;
        for instance in composition.instances.iter_mut().filter(|instance| instance.failure.is_none()) {
            let Some(material) = instance.material.as_ref().and_then(LoadStageHandle::value) else {
                let error = AssetError::LoadFailed(format!("material for '{}'", instance.descriptor.asset));
                instance.fail(error.into());
                continue;
            };

            let mesh = Mesh::quad(instance.descriptor.size);
            let renderable = match self.loader.build_renderable(&mesh, &material) {
                Ok(renderable) => renderable,
                Err(error) => {
                    instance.fail(error.into());
                    continue;
                }
            };

            match attach_marker(scene, parent, &instance.descriptor, renderable.clone()) {
                Ok(node) => {
                    instance.renderable = Some(renderable);
                    instance.node = Some(node);
                    attached += 1;
                }
                Err(error) => instance.fail(error.into()),
            }
        }

        log::info!(
            "Composition {:?} attached {} of {} marker(s)",
            id,
            attached,
            composition.instances.len()
        );
        attached
    }
}

/// Create a fully set-up marker node and parent it last
///
/// A node that fails any step is destroyed, so the scene never holds a
/// half-built marker.
fn attach_marker(
    scene: &mut dyn SceneGraph,
    parent: NodeHandle,
    descriptor: &MarkerDescriptor,
    renderable: Renderable,
) -> Result<NodeHandle, SceneError> {
    let node = scene.create_node();
    let result = scene
        .set_renderable(node, renderable)
        .and_then(|()| scene.set_local_position(node, descriptor.offset))
        .and_then(|()| scene.attach_behavior(node, descriptor.orientation))
        .and_then(|()| scene.set_parent(node, parent));

    match result {
        Ok(()) => Ok(node),
        Err(error) => {
            if let Err(cleanup) = scene.destroy_node(node) {
                log::debug!("Could not destroy half-built marker {:?}: {}", node, cleanup);
            }
            Err(error)
        }
    }
}
