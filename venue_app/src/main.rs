//! Venue waymarks demo
//!
//! Runs a scripted AR session against the waymark engine with the in-memory
//! scene graph and the threaded asset loader, logging what gets anchored.
//!
//! Usage: `venue_demo [config.toml|config.ron]`, reading `waymarks.toml` when
//! present and no path is given

mod session;

use std::sync::Arc;
use std::time::Duration;

use waymark_engine::foundation::logging;
use waymark_engine::prelude::*;

use session::{AppEvent, ConsoleUi, ScriptedSession, SessionAnchors, SessionFrame, POSTER};

const FRAME_COUNT: u32 = 240;
const FRAME_TIME: Duration = Duration::from_millis(16);
const DEFAULT_CONFIG_PATH: &str = "waymarks.toml";

/// Demo application state
pub struct VenueApp {
    lifecycle: ImageAnchorLifecycle,
    scene: SimpleSceneGraph,
    orientation: OrientationSystem,
}

impl VenueApp {
    /// Build the app from a validated configuration
    pub fn new(config: &WaymarkConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut loader_config = config.loader.clone();
        if loader_config.missing_texture_color.is_none() {
            // Venue artwork ships separately; show placeholders instead of gaps
            loader_config.missing_texture_color = Some([64, 160, 255, 255]);
        }
        let loader = Arc::new(WorkerPoolLoader::new(loader_config)?);
        let catalog = config.catalog();
        log::info!("Catalog has {} marker(s)", catalog.len());

        let lifecycle = ImageAnchorLifecycle::new(
            config.anchoring.clone(),
            catalog,
            loader,
            Box::new(SessionAnchors::default()),
            Box::new(ConsoleUi::default()),
        );

        Ok(Self {
            lifecycle,
            scene: SimpleSceneGraph::new(),
            orientation: OrientationSystem::new(),
        })
    }

    /// Play the session to the end
    pub fn run(&mut self, session: ScriptedSession) {
        self.lifecycle.on_resume();
        for frame in session {
            self.step(&frame);
            std::thread::sleep(FRAME_TIME);
        }
        self.lifecycle.dismiss_all(&mut self.scene);
        log::info!("Session over, {} node(s) left in the scene", self.scene.node_count());
    }

    fn step(&mut self, frame: &SessionFrame) {
        match frame.event {
            Some(AppEvent::Pause) => {
                log::info!("App paused");
                self.lifecycle.dismiss_all(&mut self.scene);
            }
            Some(AppEvent::Resume) => {
                log::info!("App resumed");
                self.lifecycle.on_resume();
            }
            None => {}
        }

        self.scene.set_camera_position(Some(frame.camera));
        self.lifecycle.on_frame(&frame.tracking, &mut self.scene);
        let attached = self.lifecycle.process_completions(&mut self.scene);
        let oriented = self.orientation.update(&mut self.scene);

        if attached > 0 {
            log::info!("Frame {}: {} marker(s) attached", frame.index, attached);
        }
        if frame.index % 30 == 0 {
            self.report(frame.index, oriented);
        }
    }

    fn report(&self, index: u32, oriented: usize) {
        let state = self.lifecycle.state(POSTER);
        match self.lifecycle.record(POSTER) {
            Some(record) => {
                let stats = self
                    .lifecycle
                    .pipeline()
                    .composition_status(record.composition())
                    .unwrap_or_default();
                log::info!(
                    "Frame {}: poster {:?}, {} attached, {} failed, {} loading, {} oriented",
                    index,
                    state,
                    stats.attached,
                    stats.failed,
                    stats.pending,
                    oriented
                );
                for node in self.scene.children(record.subtree()) {
                    if let (Some(position), Some(rotation)) =
                        (self.scene.world_position(node), self.scene.world_rotation(node))
                    {
                        log::debug!("  marker at {:?} facing {:?}", position, rotation * -Vec3::z());
                    }
                }
            }
            None => log::info!("Frame {}: poster {:?}", index, state),
        }
    }
}

fn load_config() -> Result<WaymarkConfig, Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            WaymarkConfig::load_from_file(&path)?
        }
        None => WaymarkConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default_filter("info");

    log::info!("Starting venue waymarks demo");

    let config = load_config()?;
    let mut app = VenueApp::new(&config)?;
    app.run(ScriptedSession::new(FRAME_COUNT));

    log::info!("Venue demo completed successfully");
    Ok(())
}
