//! Scripted AR session
//!
//! Stands in for a device tracking session: a camera walking around a poster
//! on the wall, with the poster first out of view, then detected, tracked,
//! interrupted by the app going to the background, and finally lost.

use waymark_engine::foundation::math::{Quat, Vec3};
use waymark_engine::tracking::{
    AnchorHandle, AnchorProvider, Pose, TrackedImageId, TrackedImageUpdate, TrackingError, TrackingFrame,
    TrackingMethod, TrackingState, UiListener,
};

/// The venue poster
pub const POSTER: TrackedImageId = TrackedImageId(0);

/// Application lifecycle events interleaved with frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// App moved to the background
    Pause,
    /// App returned to the foreground
    Resume,
}

/// One simulated camera frame
pub struct SessionFrame {
    /// Frame number
    pub index: u32,
    /// Camera world position
    pub camera: Vec3,
    /// What the tracker reported
    pub tracking: TrackingFrame,
    /// App event raised before this frame, if any
    pub event: Option<AppEvent>,
}

/// Deterministic tracking script
pub struct ScriptedSession {
    frame: u32,
    length: u32,
}

impl ScriptedSession {
    /// Script running for `length` frames
    pub fn new(length: u32) -> Self {
        Self { frame: 0, length }
    }

    fn poster_pose() -> Pose {
        // Poster hangs on the wall two meters ahead, facing the room
        Pose::new(
            Vec3::new(0.0, 1.4, -2.0),
            Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2),
        )
    }

    fn camera_at(&self, index: u32) -> Vec3 {
        let t = index as f32 / self.length.max(1) as f32;
        let angle = (t - 0.5) * std::f32::consts::PI;
        Vec3::new(2.5 * angle.sin(), 1.6, -2.0 + 2.5 * angle.cos())
    }

    fn poster_state(&self, index: u32) -> Option<(TrackingState, TrackingMethod)> {
        let phase = index * 10 / self.length.max(1);
        match phase {
            0 => None,
            1 => Some((TrackingState::Paused, TrackingMethod::NotTracking)),
            2..=4 => Some((TrackingState::Tracking, TrackingMethod::FullTracking)),
            5 => Some((TrackingState::Tracking, TrackingMethod::LastKnownPose)),
            6 => Some((TrackingState::Paused, TrackingMethod::NotTracking)),
            7 | 8 => Some((TrackingState::Tracking, TrackingMethod::FullTracking)),
            _ => Some((TrackingState::Stopped, TrackingMethod::NotTracking)),
        }
    }
}

impl Iterator for ScriptedSession {
    type Item = SessionFrame;

    fn next(&mut self) -> Option<SessionFrame> {
        if self.frame >= self.length {
            return None;
        }
        let index = self.frame;
        self.frame += 1;

        let camera_state = if index < self.length / 20 {
            TrackingState::Paused
        } else {
            TrackingState::Tracking
        };
        let updates = self
            .poster_state(index)
            .map(|(state, method)| {
                vec![TrackedImageUpdate::new(POSTER, state, method)
                    .with_pose(Self::poster_pose())
                    .with_extents(0.6, 0.85)]
            })
            .unwrap_or_default();

        let event = if index == self.length * 6 / 10 {
            Some(AppEvent::Pause)
        } else if index == self.length * 6 / 10 + 2 {
            Some(AppEvent::Resume)
        } else {
            None
        };

        Some(SessionFrame {
            index,
            camera: self.camera_at(index),
            tracking: TrackingFrame { camera_state, updates },
            event,
        })
    }
}

/// Anchor provider handing out sequential handles
#[derive(Default)]
pub struct SessionAnchors {
    next: u64,
    live: usize,
}

impl AnchorProvider for SessionAnchors {
    fn create_anchor(&mut self, pose: &Pose) -> Result<AnchorHandle, TrackingError> {
        self.next += 1;
        self.live += 1;
        log::debug!("Anchor {} created at {:?}", self.next, pose.translation);
        Ok(AnchorHandle(self.next))
    }

    fn detach_anchor(&mut self, anchor: AnchorHandle) {
        self.live = self.live.saturating_sub(1);
        log::debug!("Anchor {:?} detached, {} live", anchor, self.live);
    }
}

/// UI listener printing hints to the log
#[derive(Default)]
pub struct ConsoleUi {
    guidance_visible: Option<bool>,
}

impl UiListener for ConsoleUi {
    fn on_image_detected(&mut self, image: TrackedImageId) {
        log::debug!("UI: detected {}", image);
    }

    fn on_scanning_guidance_visible(&mut self, visible: bool) {
        if self.guidance_visible != Some(visible) {
            log::info!("UI: scanning guidance {}", if visible { "shown" } else { "hidden" });
        }
        self.guidance_visible = Some(visible);
    }
}
