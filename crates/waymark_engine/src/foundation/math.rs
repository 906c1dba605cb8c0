//! Math utilities and types
//!
//! Provides the vector, quaternion and transform types shared by the scene
//! graph, the orientation behaviors and the tracking layer. All coordinates are
//! Y-up right-handed; a node's forward axis is -Z.

pub use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Tolerance below which a direction is treated as degenerate
pub const DIRECTION_EPSILON: f32 = 1.0e-6;

/// World up axis
pub fn up() -> Vec3 {
    Vec3::y()
}

/// Node forward axis in local space
pub fn forward() -> Vec3 {
    -Vec3::z()
}

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Combine this (parent) transform with a child's local transform
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }
}

/// Rotation whose forward axis (-Z) points along `direction` with +Y kept
/// as close to `up` as possible
///
/// Returns `None` when `direction` has no length or is parallel to `up`,
/// since no unique rotation exists for either.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    let forward = direction.try_normalize(DIRECTION_EPSILON)?;
    if forward.cross(&up).norm_squared() < DIRECTION_EPSILON {
        return None;
    }
    // face_towards aligns +Z, the node faces along -Z
    Some(Quat::face_towards(&-forward, &up))
}
