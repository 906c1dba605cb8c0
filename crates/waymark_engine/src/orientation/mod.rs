//! Marker orientation
//!
//! Keeps anchored markers turned toward the viewer. Each node carries one
//! [`OrientationBehavior`] picked from a small closed set, and the
//! [`OrientationSystem`] re-evaluates all of them once per frame from the
//! camera and node world positions.

pub mod behavior;
pub mod system;

pub use behavior::OrientationBehavior;
pub use system::OrientationSystem;
