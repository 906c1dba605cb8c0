//! Tracked image anchoring
//!
//! The AR tracking session lives outside this crate. It reports what it sees
//! as [`TrackedImageUpdate`]s and creates world anchors through an
//! [`AnchorProvider`]; user-facing hints go out through a [`UiListener`].
//! [`ImageAnchorLifecycle`] sits between the two and owns the anchored scene
//! content of every tracked image.

pub mod lifecycle;

pub use lifecycle::{AnchorRecord, ImageAnchorLifecycle, ImageState};

use std::fmt;

use thiserror::Error;

use crate::foundation::math::{Quat, Vec3};

/// Identity of a reference image, assigned by the tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackedImageId(pub u32);

impl fmt::Display for TrackedImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image #{}", self.0)
    }
}

/// Session-level tracking state of an image or the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingState {
    /// Seen but not yet tracked; may resume
    Paused,
    /// Actively tracked with a usable pose
    Tracking,
    /// No longer tracked and will not resume
    Stopped,
}

/// How the current pose of a tracked image was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackingMethod {
    /// No pose this frame
    #[default]
    NotTracking,
    /// Image is in view and tracked
    FullTracking,
    /// Image is out of view; pose is the last one known
    LastKnownPose,
}

/// Rigid world-space pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position
    pub translation: Vec3,
    /// Orientation
    pub rotation: Quat,
}

impl Pose {
    /// Pose from parts
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation }
    }

    /// Pose at `translation` with no rotation
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::identity())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_translation(Vec3::zeros())
    }
}

/// Per-image update delivered by the tracking session
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedImageUpdate {
    /// Which image
    pub image: TrackedImageId,
    /// Tracking state this frame
    pub state: TrackingState,
    /// How the pose was obtained
    pub method: TrackingMethod,
    /// Pose of the image center
    pub center_pose: Pose,
    /// Estimated physical width
    pub extent_x: f32,
    /// Estimated physical height
    pub extent_z: f32,
}

impl TrackedImageUpdate {
    /// Update for `image` with a default pose and no extents
    pub fn new(image: TrackedImageId, state: TrackingState, method: TrackingMethod) -> Self {
        Self {
            image,
            state,
            method,
            center_pose: Pose::default(),
            extent_x: 0.0,
            extent_z: 0.0,
        }
    }

    /// Set the image center pose
    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.center_pose = pose;
        self
    }

    /// Set the estimated extents
    #[must_use]
    pub fn with_extents(mut self, extent_x: f32, extent_z: f32) -> Self {
        self.extent_x = extent_x;
        self.extent_z = extent_z;
        self
    }
}

/// Everything the session reported for one camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingFrame {
    /// Camera tracking state; images are only processed while Tracking
    pub camera_state: TrackingState,
    /// Images updated this frame
    pub updates: Vec<TrackedImageUpdate>,
}

/// Opaque handle to a world anchor owned by the tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorHandle(pub u64);

/// Tracking collaborator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    /// The session refused to create an anchor
    #[error("Anchor creation failed: {0}")]
    AnchorCreationFailed(String),

    /// The session is not running
    #[error("Tracking session is not running")]
    SessionNotRunning,
}

/// World anchor management provided by the tracking session
pub trait AnchorProvider {
    /// Create an anchor at a world pose
    fn create_anchor(&mut self, pose: &Pose) -> Result<AnchorHandle, TrackingError>;

    /// Release an anchor; unknown handles are ignored
    fn detach_anchor(&mut self, anchor: AnchorHandle);
}

/// User-facing notifications
pub trait UiListener {
    /// A reference image was detected
    fn on_image_detected(&mut self, image: TrackedImageId);

    /// Show or hide the "point the camera at the image" guidance
    fn on_scanning_guidance_visible(&mut self, visible: bool);
}
