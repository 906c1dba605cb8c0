//! Marker texture pixels
//!
//! Textures either come from image files found by the loader, or are
//! generated from a `solid:` color reference.

use std::path::Path;

use crate::assets::AssetError;

/// Prefix of asset references that describe a generated solid-color texture
pub const SOLID_COLOR_PREFIX: &str = "solid:";

/// Edge length of generated solid-color textures
const SOLID_COLOR_SIZE: u32 = 4;

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Row-major RGBA bytes
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per pixel, always 4
    pub channels: u8,
}

impl ImageData {
    /// Decode an image file into RGBA8
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let rgba = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?
            .into_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded {} ({}x{})", path.display(), width, height);

        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Uniformly colored image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            data: color.repeat(pixels),
            width,
            height,
            channels: 4,
        }
    }

    /// Generate the texture for a `solid:RRGGBB` or `solid:RRGGBBAA` reference
    ///
    /// Returns `None` when the reference does not use the solid prefix.
    pub fn from_solid_reference(reference: &str) -> Option<Result<Self, AssetError>> {
        let hex = reference.strip_prefix(SOLID_COLOR_PREFIX)?;
        Some(parse_hex_color(hex).map(|color| Self::solid_color(SOLID_COLOR_SIZE, SOLID_COLOR_SIZE, color)))
    }

    /// Whether the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn parse_hex_color(hex: &str) -> Result<[u8; 4], AssetError> {
    let invalid = || AssetError::InvalidData(format!("Bad color '{}', expected RRGGBB or RRGGBBAA", hex));
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }

    let mut color = [0, 0, 0, 255];
    for (slot, index) in color.iter_mut().zip((0..hex.len()).step_by(2)) {
        *slot = u8::from_str_radix(&hex[index..index + 2], 16).map_err(|_| invalid())?;
    }
    Ok(color)
}
