//! Marker catalog
//!
//! The static table of markers anchored to every tracked image. A catalog is
//! immutable once built; swapping it means handing out a new `Arc`, and
//! compositions already in flight keep the one they started with.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec2, Vec3};
use crate::orientation::OrientationBehavior;

fn default_size() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

/// One marker placed relative to a tracked image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescriptor {
    /// Texture asset reference (file name or `solid:RRGGBB`)
    pub asset: String,
    /// Position relative to the image anchor, in meters
    pub offset: Vec3,
    /// How the marker turns toward the viewer
    #[serde(default)]
    pub orientation: OrientationBehavior,
    /// Quad width and height, in meters
    #[serde(default = "default_size")]
    pub size: Vec2,
}

impl MarkerDescriptor {
    /// Upright 1×1 marker
    pub fn new(asset: impl Into<String>, offset: Vec3) -> Self {
        Self {
            asset: asset.into(),
            offset,
            orientation: OrientationBehavior::default(),
            size: default_size(),
        }
    }

    /// Replace the orientation behavior
    #[must_use]
    pub fn with_orientation(mut self, orientation: OrientationBehavior) -> Self {
        self.orientation = orientation;
        self
    }

    /// Replace the quad size
    #[must_use]
    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }
}

/// Ordered, immutable set of marker descriptors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerCatalog {
    markers: Vec<MarkerDescriptor>,
}

impl MarkerCatalog {
    /// Build a catalog from descriptors
    pub fn new(markers: Vec<MarkerDescriptor>) -> Self {
        Self { markers }
    }

    /// The venue map: six rooms, the stairs, a floor arrow and a red guide ray
    /// standing at the anchor itself
    pub fn venue_default() -> Self {
        let rooms = [
            ("room1.png", Vec3::new(2.0, -2.0, 1.0)),
            ("room2.png", Vec3::new(2.0, 2.0, 1.0)),
            ("room3.png", Vec3::new(-4.0, -1.5, 1.0)),
            ("room4.png", Vec3::new(-4.5, -2.0, 1.0)),
            ("room5.png", Vec3::new(-5.0, -1.5, 1.0)),
            ("room6.png", Vec3::new(-1.0, -2.5, 1.0)),
            ("upstairs.png", Vec3::new(-0.5, -3.0, 1.0)),
        ];

        let mut markers: Vec<MarkerDescriptor> = rooms
            .into_iter()
            .map(|(asset, offset)| MarkerDescriptor::new(asset, offset))
            .collect();
        markers.push(
            MarkerDescriptor::new("arrow.png", Vec3::new(0.0, 0.1, 0.5))
                .with_orientation(OrientationBehavior::AxisConstrainedDirectional { vertical: false }),
        );
        markers.push(
            MarkerDescriptor::new("solid:ff0000", Vec3::zeros())
                .with_size(Vec2::new(0.02, 1.5))
                .with_orientation(OrientationBehavior::AxisConstrainedDirectional { vertical: false }),
        );

        Self::new(markers)
    }

    /// Descriptors in catalog order
    pub fn descriptors(&self) -> &[MarkerDescriptor] {
        &self.markers
    }

    /// Number of markers
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the catalog has no markers
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Reject descriptors that cannot produce a marker
    pub fn validate(&self) -> Result<(), String> {
        for (index, marker) in self.markers.iter().enumerate() {
            if marker.asset.trim().is_empty() {
                return Err(format!("marker {} has an empty asset reference", index));
            }
            if !(marker.size.x > 0.0 && marker.size.y > 0.0) {
                return Err(format!("marker '{}' has a non-positive size", marker.asset));
            }
            if !marker.offset.iter().all(|c| c.is_finite()) {
                return Err(format!("marker '{}' has a non-finite offset", marker.asset));
            }
        }
        Ok(())
    }
}
