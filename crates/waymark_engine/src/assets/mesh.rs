//! Mesh representation for marker geometry
//!
//! Markers are textured quads. The mesh is backend-agnostic geometry data; the
//! renderer uploads it however it likes.

use crate::foundation::math::Vec2;

/// Vertex data structure with position, normal, and texture coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Geometry made of vertices and triangle indices
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Create a quad in the XY plane centered on the origin
    ///
    /// The front face looks down +Z, so a node whose forward axis (-Z) points
    /// away from the viewer shows the texture upright and unmirrored.
    pub fn quad(size: Vec2) -> Self {
        let (hw, hh) = (size.x * 0.5, size.y * 0.5);
        let normal = [0.0, 0.0, 1.0];

        let vertices = vec![
            Vertex::new([-hw, -hh, 0.0], normal, [0.0, 1.0]),
            Vertex::new([hw, -hh, 0.0], normal, [1.0, 1.0]),
            Vertex::new([hw, hh, 0.0], normal, [1.0, 0.0]),
            Vertex::new([-hw, hh, 0.0], normal, [0.0, 0.0]),
        ];
        let indices = vec![0, 1, 2, 2, 3, 0];

        Self::new(vertices, indices)
    }

    /// Whether the mesh has no drawable triangles
    pub fn is_empty(&self) -> bool {
        self.indices.len() < 3
    }

    /// Check that every index points at a vertex and triangles are complete
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!("{} indices do not form whole triangles", self.indices.len()));
        }
        let vertex_count = self.vertices.len();
        if let Some(bad) = self.indices.iter().find(|index| **index as usize >= vertex_count) {
            return Err(format!("index {} out of range for {} vertices", bad, vertex_count));
        }
        Ok(())
    }
}
